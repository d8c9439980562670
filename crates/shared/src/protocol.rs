//! Wire shapes of the inference API.

use serde::{Deserialize, Serialize};

use crate::domain::Label;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub metrics: MetricsPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsPayload {
    pub accuracy: f64,
    pub auc_roc: f64,
    pub recall: f64,
    pub specificity: f64,
    pub f1_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: Label,
    pub confidence: f64,
    pub probabilities: ProbabilitiesPayload,
    pub gradcam_image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbabilitiesPayload {
    #[serde(rename = "NORMAL")]
    pub normal: f64,
    #[serde(rename = "PNEUMONIA")]
    pub pneumonia: f64,
}
