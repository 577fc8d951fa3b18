use crate::core::codec::encode_base64;
use crate::server::CLASSIFY_PATH;
use crate::utils::error::{EchoError, Result};
use crate::utils::validation::validate_url;
use reqwest::Client;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct ClientReport {
    pub status: u16,
    /// Parsed JSON body, or the raw text as a JSON string when it is not JSON.
    pub body: serde_json::Value,
}

#[derive(Serialize)]
struct Payload<'a> {
    image: &'a str,
}

/// Joins a server base URL with the classify route, tolerating a trailing slash.
pub fn classify_url(server_url: &str) -> String {
    format!("{}{}", server_url.trim_end_matches('/'), CLASSIFY_PATH)
}

pub struct ClassifyClient {
    client: Client,
}

impl ClassifyClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Base64 encodes the file at `image_path` and posts it to `api_url`.
    pub async fn send_image_for_classification<P: AsRef<Path>>(
        &self,
        image_path: P,
        api_url: &str,
    ) -> Result<ClientReport> {
        let image_path = image_path.as_ref();
        if !image_path.exists() {
            return Err(EchoError::FileNotFound {
                path: image_path.display().to_string(),
            });
        }

        validate_url("api_url", api_url).map_err(|_| EchoError::InvalidUrl {
            url: api_url.to_string(),
        })?;

        let image_data = tokio::fs::read(image_path).await?;
        let encoded = encode_base64(&image_data);

        tracing::info!(
            "Sending POST request to {} with image {}...",
            api_url,
            image_path.display()
        );

        let response = self
            .client
            .post(api_url)
            .json(&Payload { image: &encoded })
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    EchoError::ConnectionError {
                        url: api_url.to_string(),
                    }
                } else {
                    EchoError::HttpError(e)
                }
            })?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));

        tracing::debug!("API response status: {}", status);
        Ok(ClientReport { status, body })
    }
}

impl Default for ClassifyClient {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot helper around [`ClassifyClient`].
pub async fn send_image_for_classification<P: AsRef<Path>>(
    image_path: P,
    api_url: &str,
) -> Result<ClientReport> {
    ClassifyClient::new()
        .send_image_for_classification(image_path, api_url)
        .await
}
