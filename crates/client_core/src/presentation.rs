//! Render calls the workflow makes into the UI layer.
//!
//! Each workflow transition results in exactly one call. The metrics panel is
//! rendered independently of the prediction panel.

use shared::{
    domain::{ModelMetrics, PredictionResult, UploadedImage},
    error::FailureKind,
};

pub trait Presenter {
    /// Initial state: nothing selected yet.
    fn render_idle(&mut self);
    fn render_image_selected(&mut self, image: &UploadedImage);
    /// A prediction request is in flight.
    fn render_pending(&mut self);
    fn render_result(&mut self, result: &PredictionResult);
    fn render_error(&mut self, kind: FailureKind, message: &str);
    fn render_metrics(&mut self, metrics: &ModelMetrics);
    fn render_metrics_unavailable(&mut self, kind: FailureKind);
}
