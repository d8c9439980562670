use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use serde_json::Value;
use shared::{
    domain::{ModelMetrics, UploadedImage},
    error::ClientError,
};
use tracing::{debug, info, warn};

pub mod config;
pub mod decoder;
pub mod presentation;
pub mod workflow;

pub use config::{load_settings, Settings};
pub use presentation::Presenter;
pub use workflow::{Phase, SessionError, SessionState, Workflow};

pub const METRICS_TIMEOUT: Duration = Duration::from_secs(5);
/// Covers model inference latency on the backend.
pub const PREDICT_TIMEOUT: Duration = Duration::from_secs(30);
const UPLOAD_FIELD: &str = "file";

/// Network seam of the workflow.
#[async_trait]
pub trait DiagnosisBackend: Send + Sync {
    async fn fetch_metrics(&self) -> Result<ModelMetrics, ClientError>;
    /// Submits the image and returns the parsed, not yet validated, body.
    async fn predict(&self, image: &UploadedImage) -> Result<Value, ClientError>;
}

pub struct BackendClient {
    http: Client,
    base_url: String,
    metrics_timeout: Duration,
    predict_timeout: Duration,
}

impl BackendClient {
    pub fn new(settings: &Settings) -> Self {
        Self {
            http: Client::new(),
            base_url: settings.api_url.clone(),
            metrics_timeout: METRICS_TIMEOUT,
            predict_timeout: PREDICT_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, metrics_timeout: Duration, predict_timeout: Duration) -> Self {
        self.metrics_timeout = metrics_timeout;
        self.predict_timeout = predict_timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn read_json(response: Response, timeout: Duration) -> Result<Value, ClientError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Http {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| map_transport_error(e, timeout))?;
        serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[async_trait]
impl DiagnosisBackend for BackendClient {
    async fn fetch_metrics(&self) -> Result<ModelMetrics, ClientError> {
        let url = format!("{}/metrics", self.base_url);
        debug!(%url, "fetching model metrics");

        let result: Result<ModelMetrics, ClientError> = async {
            let response = self
                .http
                .get(&url)
                .timeout(self.metrics_timeout)
                .send()
                .await
                .map_err(|e| map_transport_error(e, self.metrics_timeout))?;
            let body = Self::read_json(response, self.metrics_timeout).await?;
            decoder::decode_metrics(&body)
        }
        .await;

        match &result {
            Ok(_) => info!(%url, "model metrics fetched"),
            Err(err) => warn!(%url, kind = %err.kind(), "metrics fetch failed: {err}"),
        }
        result
    }

    async fn predict(&self, image: &UploadedImage) -> Result<Value, ClientError> {
        let url = format!("{}/predict", self.base_url);
        info!(
            %url,
            filename = image.filename(),
            mime_type = image.mime_type(),
            size_bytes = image.bytes().len(),
            "submitting image for prediction"
        );

        let part = multipart::Part::bytes(image.bytes().to_vec())
            .file_name(image.filename().to_string())
            .mime_str(image.mime_type())
            .map_err(|e| ClientError::Request(e.to_string()))?;
        let form = multipart::Form::new().part(UPLOAD_FIELD, part);

        let result: Result<Value, ClientError> = async {
            let response = self
                .http
                .post(&url)
                .multipart(form)
                .timeout(self.predict_timeout)
                .send()
                .await
                .map_err(|e| map_transport_error(e, self.predict_timeout))?;
            Self::read_json(response, self.predict_timeout).await
        }
        .await;

        if let Err(err) = &result {
            warn!(%url, kind = %err.kind(), "prediction request failed: {err}");
        }
        result
    }
}

fn map_transport_error(err: reqwest::Error, timeout: Duration) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout {
            seconds: timeout.as_secs().max(1),
        }
    } else if err.is_builder() {
        ClientError::Request(err.to_string())
    } else if err.is_decode() {
        ClientError::Decode(err.to_string())
    } else {
        ClientError::Connection(err.to_string())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
