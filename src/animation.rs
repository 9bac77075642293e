use std::path::{Path, PathBuf};
use std::{fmt, io};

use uuid::Uuid;

use crate::apis::google_aistudio::{ContentGenerator, GenerationError};
use crate::utilities::ffmpeg::{ArtifactInfo, EncodeError, EncodeOptions, Encoder};
use crate::utilities::frame_store::{FrameError, FrameStore};

pub mod partition;
pub mod retry;

use retry::RetryPolicy;

#[derive(Clone, Debug)]
pub struct Settings {
    pub prompt: String,
    pub retry_policy: RetryPolicy,
    pub encode_options: EncodeOptions,
    pub output_dir: PathBuf,
}

#[derive(Debug)]
pub enum Outcome {
    Assembled(ArtifactInfo),
    NothingToAssemble,
    EncodingFailed(EncodeError),
}

#[derive(Debug)]
pub enum AnimationError {
    Generation(GenerationError),
    Frame(FrameError),
    Workspace(io::Error),
}

/// Generates frames, stores them in a temporary workspace and merges them
/// into an animation. Encoder failures end the run without an artifact but
/// are not errors; the workspace is removed on every path.
pub async fn run<G, E>(
    generator: &G,
    encoder: &E,
    settings: &Settings,
) -> Result<Outcome, AnimationError>
where
    G: ContentGenerator + ?Sized,
    E: Encoder + ?Sized,
{
    let generation =
        retry::generate_frames(generator, &settings.prompt, settings.retry_policy).await?;

    log::debug!("final prompt after {} attempts: {}", generation.attempts, generation.prompt);

    if generation.response.image_count() == 1 {
        log::warn!("the animation will consist of a single frame");
    }

    let workspace = tempfile::Builder::new()
        .prefix("gemini-animate-")
        .tempdir()
        .map_err(AnimationError::Workspace)?;
    log::info!("created temporary directory at {}", workspace.path().display());

    let mut store = FrameStore::new(workspace.path());
    let partition = partition::partition(generation.response, &mut store)?;
    log::debug!(
        "partitioned {} frames and {} text parts",
        partition.frames.len(),
        partition.texts.len()
    );

    let outcome = assemble(encoder, &store, settings).await;

    let workspace_path = workspace.path().to_path_buf();
    if let Err(err) = workspace.close() {
        log::warn!("failed to remove temporary directory {}: {err}", workspace_path.display());
    }

    Ok(outcome)
}

async fn assemble<E: Encoder + ?Sized>(
    encoder: &E,
    store: &FrameStore,
    settings: &Settings,
) -> Outcome {
    if store.is_empty() {
        log::warn!("no frames were generated, nothing to assemble");
        return Outcome::NothingToAssemble;
    }

    log::info!("found {} frames to process", store.len());

    let output_path = output_path(&settings.output_dir);
    log::info!("will save animation to {}", output_path.display());

    match store.listing() {
        Ok(names) => log::info!("files in temporary directory: {}", names.join(", ")),
        Err(err) => log::warn!("failed to list temporary directory: {err}"),
    }

    match encoder.encode(store.directory(), &output_path, &settings.encode_options).await {
        Ok(artifact) => {
            log::info!("animation saved to {}", artifact.path.display());
            log::info!("file size: {} bytes", artifact.size);
            Outcome::Assembled(artifact)
        }
        Err(err) => {
            log::error!("failed to create animation: {err}");

            if let EncodeError::Failed { stdout, stderr, .. } = &err {
                log::error!("ffmpeg stdout: {stdout}");
                log::error!("ffmpeg stderr: {stderr}");
            }

            Outcome::EncodingFailed(err)
        }
    }
}

/// A fresh `animation_<uuid>.gif` path inside `output_dir`, made absolute when possible.
fn output_path(output_dir: &Path) -> PathBuf {
    let path = output_dir.join(format!("animation_{}.gif", Uuid::new_v4()));
    std::path::absolute(&path).unwrap_or(path)
}

impl fmt::Display for AnimationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generation(err) => write!(f, "{err}"),
            Self::Frame(err) => write!(f, "{err}"),
            Self::Workspace(err) => write!(f, "failed to create temporary directory: {err}"),
        }
    }
}

impl std::error::Error for AnimationError {}

impl From<GenerationError> for AnimationError {
    fn from(value: GenerationError) -> Self {
        Self::Generation(value)
    }
}

impl From<FrameError> for AnimationError {
    fn from(value: FrameError) -> Self {
        Self::Frame(value)
    }
}
