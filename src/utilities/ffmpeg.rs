use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use std::{fmt, io};

use async_trait::async_trait;
use tokio::process::Command;

use super::frame_store::FRAME_GLOB;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeOptions {
    /// input frames per second
    pub frame_rate: u32,
    /// output width in pixels, height follows the aspect ratio
    pub width: u32,
    pub timeout: Option<Duration>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactInfo {
    pub path: PathBuf,
    pub size: u64,
}

#[derive(Debug)]
pub enum EncodeError {
    Spawn(io::Error),
    Timeout(Duration),
    Failed { status: ExitStatus, stdout: String, stderr: String },
    MissingOutput(PathBuf),
}

/// Merges the frames of a directory into a single animation file.
#[async_trait]
pub trait Encoder {
    async fn encode(
        &self,
        frames_dir: &Path,
        output_path: &Path,
        options: &EncodeOptions,
    ) -> Result<ArtifactInfo, EncodeError>;
}

pub struct Ffmpeg {
    program: PathBuf,
}

impl Ffmpeg {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }

    pub fn arguments(
        frames_dir: &Path,
        output_path: &Path,
        options: &EncodeOptions,
    ) -> Vec<OsString> {
        vec![
            "-y".into(),
            "-framerate".into(),
            options.frame_rate.to_string().into(),
            "-pattern_type".into(),
            "glob".into(),
            "-i".into(),
            frames_dir.join(FRAME_GLOB).into(),
            "-vf".into(),
            format!("scale={}:-1:flags=lanczos", options.width).into(),
            output_path.into(),
        ]
    }
}

#[async_trait]
impl Encoder for Ffmpeg {
    async fn encode(
        &self,
        frames_dir: &Path,
        output_path: &Path,
        options: &EncodeOptions,
    ) -> Result<ArtifactInfo, EncodeError> {
        let arguments = Self::arguments(frames_dir, output_path, options);

        log::info!(
            "running ffmpeg command: {} {}",
            self.program.display(),
            arguments.iter().map(|argument| argument.to_string_lossy()).collect::<Vec<_>>().join(" ")
        );

        let mut command = Command::new(&self.program);
        command.args(&arguments).stdin(Stdio::null()).kill_on_drop(true);

        let output = match options.timeout {
            Some(timeout) => tokio::time::timeout(timeout, command.output())
                .await
                .map_err(|_| EncodeError::Timeout(timeout))?,
            None => command.output().await,
        }
        .map_err(EncodeError::Spawn)?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(EncodeError::Failed { status: output.status, stdout, stderr });
        }

        log::debug!("ffmpeg stdout: {stdout}");

        artifact_info(output_path).await
    }
}

async fn artifact_info(path: &Path) -> Result<ArtifactInfo, EncodeError> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_file() => {
            Ok(ArtifactInfo { path: path.to_path_buf(), size: metadata.len() })
        }
        _ => Err(EncodeError::MissingOutput(path.to_path_buf())),
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn(err) => write!(f, "failed to start encoder: {err}"),
            Self::Timeout(timeout) => {
                write!(f, "encoder did not finish within {}s", timeout.as_secs_f32())
            }
            Self::Failed { status, .. } => write!(f, "encoder failed with {status}"),
            Self::MissingOutput(path) => {
                write!(f, "encoder succeeded but {} was not created", path.display())
            }
        }
    }
}

impl std::error::Error for EncodeError {}
