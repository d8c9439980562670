//! Turns parsed API payloads into validated domain records.
//!
//! Decoding is pure: inputs are borrowed, and each call yields one record or
//! one typed error. Nothing is defaulted; a missing or mistyped field is a
//! contract violation and surfaces as `ClientError::Schema`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::Value;
use shared::{
    domain::{ModelMetrics, OverlayImage, PredictionResult, Probabilities},
    error::ClientError,
    protocol::{MetricsResponse, PredictResponse},
};

/// Allowed distance between the probability sum and 100.
pub const PROBABILITY_SUM_TOLERANCE: f64 = 0.5;
/// Allowed distance between `confidence` and the predicted class probability.
pub const CONFIDENCE_TOLERANCE: f64 = 0.01;

pub fn decode_prediction(payload: &Value) -> Result<PredictionResult, ClientError> {
    let response = PredictResponse::deserialize(payload)
        .map_err(|e| ClientError::Schema(format!("prediction payload: {e}")))?;

    let confidence = percent("confidence", response.confidence)?;
    let probabilities = Probabilities {
        normal: percent("probabilities.NORMAL", response.probabilities.normal)?,
        pneumonia: percent("probabilities.PNEUMONIA", response.probabilities.pneumonia)?,
    };

    if (probabilities.sum() - 100.0).abs() > PROBABILITY_SUM_TOLERANCE {
        return Err(ClientError::Schema(format!(
            "probabilities sum to {:.3}, expected 100",
            probabilities.sum()
        )));
    }

    let label_probability = probabilities.get(response.prediction);
    if (confidence - label_probability).abs() > CONFIDENCE_TOLERANCE {
        return Err(ClientError::Schema(format!(
            "confidence {confidence} disagrees with probability {label_probability} of {}",
            response.prediction
        )));
    }

    let overlay = decode_overlay(&response.gradcam_image)?;

    Ok(PredictionResult {
        label: response.prediction,
        confidence_percent: label_probability,
        probabilities,
        overlay,
    })
}

pub fn decode_metrics(payload: &Value) -> Result<ModelMetrics, ClientError> {
    let response = MetricsResponse::deserialize(payload)
        .map_err(|e| ClientError::Schema(format!("metrics payload: {e}")))?;
    let m = response.metrics;

    let metrics = ModelMetrics {
        accuracy: m.accuracy,
        auc_roc: m.auc_roc,
        recall: m.recall,
        specificity: m.specificity,
        f1_score: m.f1_score,
    };

    for (name, value) in metrics.fields() {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(ClientError::Schema(format!(
                "metric {name} = {value} is outside [0, 1]"
            )));
        }
    }

    Ok(metrics)
}

/// Decodes a base64 image string into a verified PNG or JPEG container.
pub fn decode_overlay(encoded: &str) -> Result<OverlayImage, ClientError> {
    let encoded = strip_data_uri(encoded.trim());
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| ClientError::ImageDecode(format!("invalid base64: {e}")))?;

    let format = image::guess_format(&bytes)
        .map_err(|e| ClientError::ImageDecode(format!("unrecognized container: {e}")))?;
    let decoded = image::load_from_memory_with_format(&bytes, format)
        .map_err(|e| ClientError::ImageDecode(e.to_string()))?;

    let (width, height) = (decoded.width(), decoded.height());
    if width == 0 || height == 0 {
        return Err(ClientError::ImageDecode(format!(
            "image has empty dimensions {width}x{height}"
        )));
    }

    Ok(OverlayImage {
        bytes,
        width,
        height,
        mime_type: format.to_mime_type(),
    })
}

fn strip_data_uri(encoded: &str) -> &str {
    match encoded.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") && prefix.ends_with(";base64") => rest,
        _ => encoded,
    }
}

fn percent(field: &str, value: f64) -> Result<f64, ClientError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(ClientError::Schema(format!(
            "{field} = {value} is outside [0, 100]"
        )))
    }
}

#[cfg(test)]
#[path = "tests/decoder_tests.rs"]
mod tests;
