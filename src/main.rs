use std::env;
use std::process::ExitCode;

use clap::Parser;
use reqwest::Client;

use animation::Outcome;
use apis::google_aistudio::GoogleAiStudio;
use utilities::config::Config;
use utilities::ffmpeg::Ffmpeg;
use utilities::logchamp;

mod animation;
mod apis;
mod utilities;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let config = Config::parse();

    if let Err(err) = logchamp::init(config.log_file.as_deref(), config.verbose) {
        eprintln!("failed to initialize logging: {err}");
        return ExitCode::FAILURE;
    }

    if let Err(err) = config.validate() {
        log::error!("invalid configuration: {err}");
        return ExitCode::from(2);
    }

    let http_client = match http_client(&config) {
        Ok(http_client) => http_client,
        Err(err) => {
            log::error!("failed to create HTTP client: {err}");
            return ExitCode::FAILURE;
        }
    };

    let generator = GoogleAiStudio::new(http_client, config.api_key.clone(), &config.model);
    let encoder = Ffmpeg::new(config.ffmpeg.clone());
    log::info!("using model {}", generator.model());

    let exit_code = match animation::run(&generator, &encoder, &config.settings()).await {
        Ok(Outcome::Assembled(artifact)) => {
            println!("{}", artifact.path.display());
            ExitCode::SUCCESS
        }
        Ok(Outcome::NothingToAssemble | Outcome::EncodingFailed(_)) => ExitCode::FAILURE,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    };

    log::info!("completed");
    log::logger().flush();

    exit_code
}

fn http_client(config: &Config) -> reqwest::Result<Client> {
    let mut http_client = Client::builder();

    if let Ok(user_agent) = env::var("USER_AGENT") {
        http_client = http_client.user_agent(user_agent);
    }

    http_client.timeout(config.request_timeout()).build()
}
