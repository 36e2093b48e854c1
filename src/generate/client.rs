use std::sync::OnceLock;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::gate::SingleFlight;
use super::prompt::{NEGATIVE_PROMPT, STYLE_PROMPT};

pub const API_KEY_ENV: &str = "SONOSCOPE_API_KEY";
pub const MAX_IMAGES: u32 = 3;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(240);

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("no image generation endpoint configured")]
    NotConfigured,

    #[error("image service request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("image service answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("image service completed without image URLs")]
    EmptyResult,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImages {
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub meta: serde_json::Value,
}

/// Remote service that paints images from a text prompt.
pub trait ImageGenerator {
    fn generate(&self, prompt: &str, count: u32) -> Result<GeneratedImages, GenerateError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationRequest<'a> {
    positive_prompt: &'a str,
    negative_prompt: &'a str,
    style_prompt: &'a str,
    steps: u32,
    guidance: f32,
    number_of_images: u32,
}

/// JSON-over-HTTP image generator. Requests are serialized through a
/// [`SingleFlight`] gate, so concurrent callers queue in arrival order.
pub struct HttpImageGenerator {
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
    client: OnceLock<Client>,
    gate: SingleFlight,
}

impl HttpImageGenerator {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            client: OnceLock::new(),
            gate: SingleFlight::new(),
        }
    }

    /// Generator for `endpoint`, with the bearer token from `SONOSCOPE_API_KEY` if set.
    pub fn from_env(endpoint: Option<String>) -> Result<Self, GenerateError> {
        let endpoint = endpoint
            .filter(|e| !e.trim().is_empty())
            .ok_or(GenerateError::NotConfigured)?;
        let mut generator = Self::new(endpoint);
        generator.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty());
        Ok(generator)
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a preconfigured HTTP client instead of building one lazily.
    /// Replaces any client set earlier.
    pub fn with_client(mut self, client: Client) -> Self {
        if self.client.get().is_some() {
            log::debug!("Replacing previously configured HTTP client");
        }
        self.client = OnceLock::from(client);
        self
    }

    fn client(&self) -> Result<&Client, GenerateError> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let built = Client::builder().timeout(self.timeout).build()?;
        Ok(self.client.get_or_init(|| built))
    }

    fn send(&self, prompt: &str, count: u32) -> Result<GeneratedImages, GenerateError> {
        let client = self.client()?;
        let body = GenerationRequest {
            positive_prompt: prompt,
            negative_prompt: NEGATIVE_PROMPT,
            style_prompt: STYLE_PROMPT,
            steps: 20,
            guidance: 7.5,
            number_of_images: count.clamp(1, MAX_IMAGES),
        };
        log::info!(
            "Requesting {} image(s) from {} (prompt {} chars)",
            body.number_of_images,
            self.endpoint,
            prompt.len()
        );

        let mut request = client.post(&self.endpoint).json(&body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            log::error!("Image service returned {}: {}", status, body);
            return Err(GenerateError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let images: GeneratedImages = response.json()?;
        if images.image_urls.is_empty() {
            return Err(GenerateError::EmptyResult);
        }
        log::info!("Image service returned {} URL(s)", images.image_urls.len());
        Ok(images)
    }
}

impl ImageGenerator for HttpImageGenerator {
    fn generate(&self, prompt: &str, count: u32) -> Result<GeneratedImages, GenerateError> {
        self.gate.run(|| self.send(prompt, count))
    }
}
