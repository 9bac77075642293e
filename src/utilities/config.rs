use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use super::ffmpeg::EncodeOptions;
use crate::animation::Settings;
use crate::animation::retry::RetryPolicy;

pub const DEFAULT_SUBJECT: &str = "a seed growing into a plant and then blooming into a flower";
pub const DEFAULT_STYLE: &str = "in a 8-bit pixel art style";
pub const DEFAULT_TEMPLATE: &str = "Create an animation by generating multiple frames, showing";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    MissingApiKey,
    ZeroFrameRate,
    ZeroOutputWidth,
    ZeroRetries,
    InvalidRetryDelay,
}

/// Generate an animated GIF with Gemini image generation.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Config {
    /// Google AI Studio API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// what the animation shows
    #[arg(long, env = "ANIMATE_SUBJECT", default_value = DEFAULT_SUBJECT)]
    pub subject: String,

    /// visual style appended after the subject
    #[arg(long, env = "ANIMATE_STYLE", default_value = DEFAULT_STYLE)]
    pub style: String,

    /// instruction placed before the subject
    #[arg(long, env = "ANIMATE_TEMPLATE", default_value = DEFAULT_TEMPLATE)]
    pub template: String,

    #[arg(long, env = "ANIMATE_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// input frames per second of the animation
    #[arg(long, default_value_t = 2)]
    pub frame_rate: u32,

    /// width of the animation in pixels, height keeps the aspect ratio
    #[arg(long, default_value_t = 512)]
    pub output_width: u32,

    /// requests made at most while fewer than two frames come back
    #[arg(long, default_value_t = 3)]
    pub max_retries: u32,

    /// seconds to wait between requests
    #[arg(long, default_value_t = 1.0)]
    pub retry_delay: f64,

    /// directory the animation is written to
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    #[arg(long, env = "FFMPEG", default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 300)]
    pub request_timeout: u64,

    /// seconds ffmpeg may run before being killed, 0 disables the limit
    #[arg(long, default_value_t = 300)]
    pub encoder_timeout: u64,

    /// also append log lines to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    pub fn prompt(&self) -> String {
        format!("{} {} {}", self.template, self.subject, self.style)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        if self.frame_rate == 0 {
            return Err(ConfigError::ZeroFrameRate);
        }

        if self.output_width == 0 {
            return Err(ConfigError::ZeroOutputWidth);
        }

        if self.max_retries == 0 {
            return Err(ConfigError::ZeroRetries);
        }

        if Duration::try_from_secs_f64(self.retry_delay).is_err() {
            return Err(ConfigError::InvalidRetryDelay);
        }

        Ok(())
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// # Panics
    ///
    /// If the retry delay does not fit a [`Duration`], which [`Self::validate`] rejects.
    pub fn settings(&self) -> Settings {
        Settings {
            prompt: self.prompt(),
            retry_policy: RetryPolicy {
                max_attempts: self.max_retries,
                delay: Duration::from_secs_f64(self.retry_delay),
            },
            encode_options: EncodeOptions {
                frame_rate: self.frame_rate,
                width: self.output_width,
                timeout: (self.encoder_timeout > 0)
                    .then(|| Duration::from_secs(self.encoder_timeout)),
            },
            output_dir: self.output_dir.clone(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MissingApiKey => "the API key is empty, set GEMINI_API_KEY or pass --api-key",
            Self::ZeroFrameRate => "--frame-rate must be greater than 0",
            Self::ZeroOutputWidth => "--output-width must be greater than 0",
            Self::ZeroRetries => "--max-retries must be at least 1",
            Self::InvalidRetryDelay => "--retry-delay must be a non-negative number of seconds",
        })
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod test {
    use clap::CommandFactory;

    use super::*;

    const ENV_OPTIONS: [(&str, &str); 5] = [
        ("--subject", DEFAULT_SUBJECT),
        ("--style", DEFAULT_STYLE),
        ("--template", DEFAULT_TEMPLATE),
        ("--model", DEFAULT_MODEL),
        ("--ffmpeg", "ffmpeg"),
    ];

    /// Options that can come from the environment are always passed on the
    /// command line, so exported variables don't change the outcome.
    fn parse(arguments: &[&str]) -> Config {
        let mut command_line = vec!["gemini-animate", "--api-key", "secret"];

        for (option, value) in ENV_OPTIONS {
            if !arguments.contains(&option) {
                command_line.extend([option, value]);
            }
        }

        command_line.extend(arguments);
        Config::try_parse_from(command_line).unwrap()
    }

    #[test]
    fn test_default_values() {
        let command = Config::command();
        let default_value = |id: &str| {
            let arg = command.get_arguments().find(|arg| arg.get_id() == id).unwrap();
            arg.get_default_values()
                .iter()
                .map(|value| value.to_string_lossy().into_owned())
                .collect::<Vec<_>>()
        };

        assert_eq!(default_value("subject"), [DEFAULT_SUBJECT]);
        assert_eq!(default_value("style"), [DEFAULT_STYLE]);
        assert_eq!(default_value("template"), [DEFAULT_TEMPLATE]);
        assert_eq!(default_value("model"), [DEFAULT_MODEL]);
        assert_eq!(default_value("ffmpeg"), ["ffmpeg"]);
        assert_eq!(default_value("retry_delay"), ["1"]);
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);

        assert_eq!(config.validate(), Ok(()));
        assert_eq!(
            config.prompt(),
            "Create an animation by generating multiple frames, showing a seed growing into a \
             plant and then blooming into a flower in a 8-bit pixel art style"
        );

        let settings = config.settings();
        assert_eq!(settings.retry_policy.max_attempts, 3);
        assert_eq!(settings.retry_policy.delay, Duration::from_secs(1));
        assert_eq!(
            settings.encode_options,
            EncodeOptions { frame_rate: 2, width: 512, timeout: Some(Duration::from_secs(300)) }
        );
        assert_eq!(settings.output_dir, PathBuf::from("."));
    }

    #[test]
    fn test_overrides() {
        let config = parse(&[
            "--subject",
            "a red circle bouncing",
            "--style",
            "as a watercolor",
            "--frame-rate",
            "5",
            "--output-width",
            "256",
            "--max-retries",
            "1",
            "--retry-delay",
            "0.25",
            "--encoder-timeout",
            "0",
        ]);

        assert_eq!(
            config.prompt(),
            "Create an animation by generating multiple frames, showing a red circle bouncing \
             as a watercolor"
        );

        let settings = config.settings();
        assert_eq!(settings.retry_policy.max_attempts, 1);
        assert_eq!(settings.retry_policy.delay, Duration::from_millis(250));
        assert_eq!(settings.encode_options.frame_rate, 5);
        assert_eq!(settings.encode_options.width, 256);
        assert_eq!(settings.encode_options.timeout, None);
    }

    #[test]
    fn test_validate() {
        assert_eq!(parse(&["--frame-rate", "0"]).validate(), Err(ConfigError::ZeroFrameRate));
        assert_eq!(parse(&["--output-width", "0"]).validate(), Err(ConfigError::ZeroOutputWidth));
        assert_eq!(parse(&["--max-retries", "0"]).validate(), Err(ConfigError::ZeroRetries));
        assert_eq!(parse(&["--retry-delay", "0"]).validate(), Ok(()));

        for retry_delay in ["--retry-delay=-5", "--retry-delay=NaN", "--retry-delay=1e300"] {
            assert_eq!(parse(&[retry_delay]).validate(), Err(ConfigError::InvalidRetryDelay));
        }

        let mut config = parse(&[]);
        config.api_key = " ".into();
        assert_eq!(config.validate(), Err(ConfigError::MissingApiKey));
    }
}
