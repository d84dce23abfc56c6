//! Client for the TinyPNG ("Tinify") compression API.

use crate::config::Config;
use crate::constants::{TINIFY_COUNT_HEADER, TINIFY_USER};
use crate::error::{CompressionError, Error, Result};
use reqwest::blocking::{Client, Response};
use reqwest::header::LOCATION;
use serde::Deserialize;

/// Turns raw image bytes into compressed image bytes.
///
/// Implementations must be callable from several worker threads at once.
pub trait Compressor: Send + Sync {
    fn compress(&self, data: &[u8]) -> std::result::Result<Vec<u8>, CompressionError>;
}

#[derive(Debug, Deserialize)]
struct ShrinkResponse {
    output: ShrinkOutput,
}

#[derive(Debug, Deserialize)]
struct ShrinkOutput {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: String,
    message: String,
}

pub struct TinifyClient {
    http: Client,
    endpoint: String,
    token: String,
}

impl TinifyClient {
    pub fn new(token: impl Into<String>, endpoint: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("tinyr2/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::CompressionClient(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.tinify_token, &config.tinify_endpoint)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Uploads the source image and returns the URL of the compressed output.
    fn shrink(&self, data: &[u8]) -> std::result::Result<String, CompressionError> {
        let response = self
            .http
            .post(format!("{}/shrink", self.endpoint))
            .basic_auth(TINIFY_USER, Some(&self.token))
            .body(data.to_vec())
            .send()
            .map_err(|e| CompressionError::Transport(e.to_string()))?;

        log_compression_count(&response);
        let response = ensure_success(response)?;

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let url = match location {
            Some(location) => location,
            None => {
                let body: ShrinkResponse = response
                    .json()
                    .map_err(|e| CompressionError::InvalidResponse(e.to_string()))?;
                body.output.url
            }
        };

        Ok(resolve_output_url(&self.endpoint, &url))
    }

    fn download(&self, url: &str) -> std::result::Result<Vec<u8>, CompressionError> {
        let response = self
            .http
            .get(url)
            .basic_auth(TINIFY_USER, Some(&self.token))
            .send()
            .map_err(|e| CompressionError::Transport(e.to_string()))?;
        let response = ensure_success(response)?;

        let bytes = response
            .bytes()
            .map_err(|e| CompressionError::Transport(e.to_string()))?;
        if bytes.is_empty() {
            return Err(CompressionError::InvalidResponse(
                "compressed output is empty".to_string(),
            ));
        }
        Ok(bytes.to_vec())
    }
}

impl Compressor for TinifyClient {
    fn compress(&self, data: &[u8]) -> std::result::Result<Vec<u8>, CompressionError> {
        let output_url = self.shrink(data)?;
        crate::verbose!("Fetching compressed output from {}", output_url);
        self.download(&output_url)
    }
}

fn ensure_success(response: Response) -> std::result::Result<Response, CompressionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(parse_rejection(status.as_u16(), &body))
}

fn parse_rejection(status: u16, body: &str) -> CompressionError {
    match serde_json::from_str::<ApiError>(body) {
        Ok(api_error) => CompressionError::Rejected {
            status,
            error: api_error.error,
            message: api_error.message,
        },
        Err(_) => CompressionError::Rejected {
            status,
            error: "HTTP error".to_string(),
            message: if body.trim().is_empty() {
                "no details".to_string()
            } else {
                body.trim().to_string()
            },
        },
    }
}

fn resolve_output_url(endpoint: &str, location: &str) -> String {
    if location.starts_with('/') {
        format!("{}{}", endpoint, location)
    } else {
        location.to_string()
    }
}

fn log_compression_count(response: &Response) {
    if let Some(count) = response
        .headers()
        .get(TINIFY_COUNT_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        crate::verbose!("Tinify compressions this month: {}", count);
    }
}
