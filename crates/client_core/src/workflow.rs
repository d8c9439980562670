//! Session state machine driving backend calls from user actions.
//!
//! `select_image` borrows the workflow mutably for the whole request, so a
//! second prediction cannot be issued while one is in flight.

use shared::{
    domain::{ModelMetrics, PredictionResult, UploadedImage},
    error::{ClientError, FailureKind},
};
use tracing::{info, warn};

use crate::{decoder, presentation::Presenter, DiagnosisBackend};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NoImage,
    ImageSelected,
    Requesting,
    ResultReady,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionError {
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    phase: Phase,
    result: Option<PredictionResult>,
    last_error: Option<SessionError>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            phase: Phase::NoImage,
            result: None,
            last_error: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Set only in `ResultReady`.
    pub fn result(&self) -> Option<&PredictionResult> {
        self.result.as_ref()
    }

    /// Set only in `Error`.
    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }
}

pub struct Workflow<B, P> {
    backend: B,
    presenter: P,
    state: SessionState,
    metrics: Option<ModelMetrics>,
}

impl<B: DiagnosisBackend, P: Presenter> Workflow<B, P> {
    pub fn new(backend: B, presenter: P) -> Self {
        Self {
            backend,
            presenter,
            state: SessionState::new(),
            metrics: None,
        }
    }

    /// Renders the initial state, then loads the metrics panel.
    pub async fn start(&mut self) {
        self.presenter.render_idle();
        self.refresh_metrics().await;
    }

    /// Refetches metrics and replaces the cache. A failure clears the cache
    /// and leaves the prediction flow untouched.
    pub async fn refresh_metrics(&mut self) -> Option<&ModelMetrics> {
        match self.backend.fetch_metrics().await {
            Ok(metrics) => {
                self.presenter.render_metrics(&metrics);
                self.metrics = Some(metrics);
            }
            Err(err) => {
                warn!(kind = %err.kind(), "metrics unavailable: {err}");
                self.metrics = None;
                self.presenter.render_metrics_unavailable(err.kind());
            }
        }
        self.metrics.as_ref()
    }

    /// Runs one full selection: `ImageSelected`, `Requesting`, then
    /// `ResultReady` or `Error`. Backend and decode failures end in `Error`
    /// and never reach the caller.
    pub async fn select_image(&mut self, image: UploadedImage) -> &SessionState {
        self.state.result = None;
        self.state.last_error = None;
        self.state.phase = Phase::ImageSelected;
        info!(filename = image.filename(), "image selected");
        self.presenter.render_image_selected(&image);

        self.state.phase = Phase::Requesting;
        self.presenter.render_pending();

        match self.run_prediction(&image).await {
            Ok(result) => {
                info!(
                    label = %result.label,
                    confidence = result.confidence_percent,
                    "prediction ready"
                );
                self.state.phase = Phase::ResultReady;
                self.presenter.render_result(&result);
                self.state.result = Some(result);
            }
            Err(err) => {
                let error = SessionError {
                    kind: err.kind(),
                    message: err.user_message(),
                };
                warn!(kind = %error.kind, filename = image.filename(), "prediction failed: {err}");
                self.state.phase = Phase::Error;
                self.presenter.render_error(error.kind, &error.message);
                self.state.last_error = Some(error);
            }
        }

        &self.state
    }

    async fn run_prediction(&self, image: &UploadedImage) -> Result<PredictionResult, ClientError> {
        let payload = self.backend.predict(image).await?;
        decoder::decode_prediction(&payload)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn metrics(&self) -> Option<&ModelMetrics> {
        self.metrics.as_ref()
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn into_presenter(self) -> P {
        self.presenter
    }
}

#[cfg(test)]
#[path = "tests/workflow_tests.rs"]
mod tests;
