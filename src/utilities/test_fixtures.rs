use std::collections::VecDeque;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::Mutex;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use super::ffmpeg::{ArtifactInfo, EncodeError, EncodeOptions, Encoder};
use crate::apis::google_aistudio::{
    Blob, Candidate, ContentGenerator, ContentResponse, GenerateContentResponse, GenerationError,
    PartResponse,
};

pub const IMAGE_SIZE: u32 = 4;

pub fn image(color: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(IMAGE_SIZE, IMAGE_SIZE, Rgb(color)))
}

pub fn png_base64(color: [u8; 3]) -> String {
    let mut bytes = Vec::new();
    image(color).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
    STANDARD.encode(bytes)
}

pub fn text_part(text: &str) -> PartResponse {
    PartResponse { text: Some(text.into()), inline_data: None }
}

pub fn image_part(color: [u8; 3]) -> PartResponse {
    PartResponse {
        text: None,
        inline_data: Some(Blob { mime_type: "image/png".into(), data: png_base64(color) }),
    }
}

pub fn response(parts: Vec<PartResponse>) -> GenerateContentResponse {
    GenerateContentResponse {
        candidates: vec![Candidate {
            content: Some(ContentResponse { parts }),
            finish_reason: Some("STOP".into()),
        }],
        prompt_feedback: None,
    }
}

/// A response with `count` image parts, each a different shade of red.
pub fn frames_response(count: u8) -> GenerateContentResponse {
    response((0..count).map(|i| image_part([i.wrapping_mul(40), 0, 0])).collect())
}

/// Replies with the scripted results in order and records every prompt.
pub struct ScriptedGenerator {
    results: Mutex<VecDeque<Result<GenerateContentResponse, GenerationError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(responses: impl IntoIterator<Item = GenerateContentResponse>) -> Self {
        Self::with_results(responses.into_iter().map(Ok))
    }

    pub fn with_results(
        results: impl IntoIterator<Item = Result<GenerateContentResponse, GenerationError>>,
    ) -> Self {
        Self {
            results: Mutex::new(results.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    async fn generate_content(
        &self,
        prompt: &str,
    ) -> Result<GenerateContentResponse, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.into());
        self.results.lock().unwrap().pop_front().expect("no scripted response left")
    }
}

#[derive(Clone, Copy)]
pub enum EncoderBehavior {
    WriteOutput,
    ExitCode(i32),
    NoOutput,
}

pub struct EncoderCall {
    pub frames_dir: PathBuf,
    pub frame_names: Vec<String>,
    pub output_path: PathBuf,
    pub options: EncodeOptions,
}

/// Stands in for ffmpeg: records what it was asked to encode and what the
/// workspace held at that moment.
pub struct RecordingEncoder {
    behavior: EncoderBehavior,
    calls: Mutex<Vec<EncoderCall>>,
}

impl RecordingEncoder {
    pub fn new(behavior: EncoderBehavior) -> Self {
        Self { behavior, calls: Mutex::new(Vec::new()) }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn take_calls(&self) -> Vec<EncoderCall> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }
}

#[async_trait]
impl Encoder for RecordingEncoder {
    async fn encode(
        &self,
        frames_dir: &Path,
        output_path: &Path,
        options: &EncodeOptions,
    ) -> Result<ArtifactInfo, EncodeError> {
        let mut frame_names = std::fs::read_dir(frames_dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        frame_names.sort_unstable();

        self.calls.lock().unwrap().push(EncoderCall {
            frames_dir: frames_dir.to_path_buf(),
            frame_names,
            output_path: output_path.to_path_buf(),
            options: *options,
        });

        match self.behavior {
            EncoderBehavior::WriteOutput => {
                std::fs::write(output_path, b"GIF89a").unwrap();
                Ok(ArtifactInfo { path: output_path.to_path_buf(), size: 6 })
            }
            EncoderBehavior::ExitCode(code) => Err(EncodeError::Failed {
                status: exit_status(code),
                stdout: String::new(),
                stderr: "Conversion failed!".into(),
            }),
            EncoderBehavior::NoOutput => Err(EncodeError::MissingOutput(output_path.into())),
        }
    }
}

#[cfg(unix)]
fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code.cast_unsigned())
}
