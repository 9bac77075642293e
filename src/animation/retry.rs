use std::time::Duration;

use tokio::time::Instant;

use crate::apis::google_aistudio::{ContentGenerator, GenerateContentResponse, GenerationError};

/// Appended to the prompt every time a response comes back with fewer than two frames.
pub const MORE_FRAMES_CLAUSE: &str =
    "Please create at least 5 distinct frames showing different stages of the animation.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// constant pause between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, delay: Duration::from_secs(1) }
    }
}

pub struct Generation {
    pub response: GenerateContentResponse,
    pub attempts: u32,
    /// the prompt of the last attempt
    pub prompt: String,
}

/// Requests frames until a response holds more than one image or the attempts
/// run out, in which case the last response is returned as it is. Errors are
/// never retried.
pub async fn generate_frames<G: ContentGenerator + ?Sized>(
    generator: &G,
    prompt: &str,
    policy: RetryPolicy,
) -> Result<Generation, GenerationError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut prompt = prompt.to_owned();
    let mut attempt = 1;

    loop {
        log::info!("attempt {attempt}/{max_attempts}: sending request with prompt: {prompt}");

        let start = Instant::now();
        let response = generator.generate_content(&prompt).await?;

        if let Some(block_reason) = response.block_reason() {
            log::warn!("prompt blocked by Google: {block_reason}");
        }

        let frame_count = response.image_count();
        log::info!(
            "received {frame_count} frames in response ({:.2}s)",
            start.elapsed().as_secs_f32()
        );

        if frame_count > 1 {
            log::info!("received {frame_count} frames on attempt {attempt}");
            return Ok(Generation { response, attempts: attempt, prompt });
        }

        if attempt >= max_attempts {
            log::warn!(
                "failed to get multiple frames after {max_attempts} attempts, \
                 proceeding with {frame_count} frames"
            );
            return Ok(Generation { response, attempts: attempt, prompt });
        }

        log::warn!("only received {frame_count} frame(s), retrying with enhanced prompt");
        prompt.push(' ');
        prompt.push_str(MORE_FRAMES_CLAUSE);
        tokio::time::sleep(policy.delay).await;
        attempt += 1;
    }
}
