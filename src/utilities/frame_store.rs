use std::path::{Path, PathBuf};
use std::{fmt, fs, io};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat};

/// Matches every file name produced by [`frame_file_name`]. ffmpeg expands
/// the glob in lexical order, so frame numbers must keep the same width.
pub const FRAME_GLOB: &str = "frame_*.png";

/// Frames beyond this would need a fourth digit and sort out of order.
pub const MAX_FRAMES: usize = 1000;

#[derive(Debug)]
pub enum FrameError {
    Base64(base64::DecodeError),
    Image(image::ImageError),
    Io(io::Error),
    TooManyFrames,
}

/// Writes frames into a workspace directory in the order they are saved.
pub struct FrameStore {
    directory: PathBuf,
    paths: Vec<PathBuf>,
}

impl FrameStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self { directory: directory.into(), paths: Vec::new() }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub const fn len(&self) -> usize {
        self.paths.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn save(&mut self, image: &DynamicImage) -> Result<PathBuf, FrameError> {
        if self.paths.len() >= MAX_FRAMES {
            return Err(FrameError::TooManyFrames);
        }

        let path = self.directory.join(frame_file_name(self.paths.len()));
        image.save_with_format(&path, ImageFormat::Png)?;
        log::debug!("saved {}x{} frame to {}", image.width(), image.height(), path.display());
        self.paths.push(path.clone());

        Ok(path)
    }

    /// Sorted names of all files currently in the workspace.
    pub fn listing(&self) -> io::Result<Vec<String>> {
        let mut names = fs::read_dir(&self.directory)?
            .map(|entry| entry.map(|entry| entry.file_name().to_string_lossy().into_owned()))
            .collect::<io::Result<Vec<_>>>()?;

        names.sort_unstable();

        Ok(names)
    }
}

pub fn frame_file_name(index: usize) -> String {
    format!("frame_{index:03}.png")
}

/// Decodes base64 inline data into an image, guessing the format from its contents.
pub fn decode_image(data: &str) -> Result<DynamicImage, FrameError> {
    let bytes = STANDARD.decode(data)?;
    Ok(image::load_from_memory(&bytes)?)
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base64(err) => write!(f, "frame data is not valid base64: {err}"),
            Self::Image(err) => write!(f, "failed to process frame image: {err}"),
            Self::Io(err) => write!(f, "failed to write frame: {err}"),
            Self::TooManyFrames => write!(f, "more than {MAX_FRAMES} frames in one animation"),
        }
    }
}

impl std::error::Error for FrameError {}

impl From<base64::DecodeError> for FrameError {
    fn from(value: base64::DecodeError) -> Self {
        Self::Base64(value)
    }
}

impl From<image::ImageError> for FrameError {
    fn from(value: image::ImageError) -> Self {
        Self::Image(value)
    }
}

impl From<io::Error> for FrameError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}
