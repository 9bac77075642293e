use std::fmt;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

pub const API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const API_KEY_HEADER: &str = "x-goog-api-key";

const RESPONSE_MODALITIES: &[&str] = &["TEXT", "IMAGE"];

#[derive(Debug)]
pub enum GenerationError {
    Network(reqwest::Error),
    Google(Error),
    Status(StatusCode),
    InvalidUrl(url::ParseError),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
    role: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum Part<'a> {
    Text(&'a str),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: &'static [&'static str],
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<ContentResponse>,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ContentResponse {
    #[serde(default)]
    pub parts: Vec<PartResponse>,
}

/// A response part as it appears on the wire. Both fields are optional since
/// the API adds new part kinds over time.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartResponse {
    pub text: Option<String>,
    pub inline_data: Option<Blob>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    /// base64-encoded bytes
    pub data: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponsePart {
    Text(String),
    Image(Blob),
    Unsupported,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Deserialize)]
pub struct ErrorResponse {
    pub error: Error,
}

#[derive(Debug, Deserialize)]
pub struct Error {
    pub code: u16,
    pub message: String,
    #[serde(default)]
    pub status: String,
}

impl GenerateContentResponse {
    pub fn first_candidate(&self) -> Option<&Candidate> {
        self.candidates.first()
    }

    /// Number of image parts in the first candidate.
    pub fn image_count(&self) -> usize {
        self.first_candidate()
            .map_or(0, |candidate| candidate.parts().iter().filter(|part| part.is_image()).count())
    }

    pub fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback.as_ref().and_then(|feedback| feedback.block_reason.as_deref())
    }
}

impl Candidate {
    pub fn parts(&self) -> &[PartResponse] {
        self.content.as_ref().map(|content| content.parts.as_slice()).unwrap_or_default()
    }
}

impl PartResponse {
    pub const fn is_image(&self) -> bool {
        self.text.is_none() && self.inline_data.is_some()
    }
}

impl From<PartResponse> for ResponsePart {
    fn from(part: PartResponse) -> Self {
        match (part.text, part.inline_data) {
            (Some(text), _) => Self::Text(text),
            (None, Some(blob)) => Self::Image(blob),
            (None, None) => Self::Unsupported,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.status.is_empty() {
            write!(f, "Google error {}: {}", self.code, self.message)
        } else {
            write!(f, "Google error {} ({}): {}", self.code, self.status, self.message)
        }
    }
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(err) => write!(f, "request to Google AI Studio failed: {err}"),
            Self::Google(err) => write!(f, "{err}"),
            Self::Status(status) => write!(f, "Google AI Studio returned HTTP {status}"),
            Self::InvalidUrl(err) => write!(f, "invalid API URL: {err}"),
        }
    }
}

impl std::error::Error for GenerationError {}

impl From<reqwest::Error> for GenerationError {
    fn from(value: reqwest::Error) -> Self {
        Self::Network(value.without_url())
    }
}

/// Something that turns a prompt into a multimodal model response.
#[async_trait]
pub trait ContentGenerator {
    async fn generate_content(
        &self,
        prompt: &str,
    ) -> Result<GenerateContentResponse, GenerationError>;
}

pub struct GoogleAiStudio {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GoogleAiStudio {
    pub fn new(http_client: reqwest::Client, api_key: String, model: &str) -> Self {
        Self {
            http_client,
            api_key,
            model: model.strip_prefix("models/").unwrap_or(model).into(),
            base_url: API_BASE_URL.into(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ContentGenerator for GoogleAiStudio {
    async fn generate_content(
        &self,
        prompt: &str,
    ) -> Result<GenerateContentResponse, GenerationError> {
        let url = Url::parse(&format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        ))
        .map_err(GenerationError::InvalidUrl)?;

        // the key stays out of the URL, which ends up in error messages
        let response = self
            .http_client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&GenerateContentRequest {
                contents: [Content { parts: [Part::Text(prompt)], role: "user" }],
                generation_config: GenerationConfig { response_modalities: RESPONSE_MODALITIES },
            })
            .send()
            .await?;

        let status = response.status();

        if status != StatusCode::OK {
            return Err(match response.json::<ErrorResponse>().await {
                Ok(error_response) => GenerationError::Google(error_response.error),
                Err(_) => GenerationError::Status(status),
            });
        }

        Ok(response.json().await?)
    }
}
