use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SelectionError;

/// MIME types the prediction endpoint accepts for uploads.
pub const ACCEPTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Label {
    Normal,
    Pneumonia,
}

impl Label {
    pub fn as_str(self) -> &'static str {
        match self {
            Label::Normal => "NORMAL",
            Label::Pneumonia => "PNEUMONIA",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-class probabilities, in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probabilities {
    pub normal: f64,
    pub pneumonia: f64,
}

impl Probabilities {
    pub fn get(&self, label: Label) -> f64 {
        match label {
            Label::Normal => self.normal,
            Label::Pneumonia => self.pneumonia,
        }
    }

    pub fn sum(&self) -> f64 {
        self.normal + self.pneumonia
    }
}

/// Decoded Grad-CAM overlay. `bytes` is the image container exactly as the
/// backend encoded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub mime_type: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub label: Label,
    pub confidence_percent: f64,
    pub probabilities: Probabilities,
    pub overlay: OverlayImage,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub auc_roc: f64,
    pub recall: f64,
    pub specificity: f64,
    pub f1_score: f64,
}

impl ModelMetrics {
    pub fn fields(&self) -> [(&'static str, f64); 5] {
        [
            ("accuracy", self.accuracy),
            ("auc_roc", self.auc_roc),
            ("recall", self.recall),
            ("specificity", self.specificity),
            ("f1_score", self.f1_score),
        ]
    }
}

/// A user-selected image, valid for exactly one prediction request.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedImage {
    bytes: Vec<u8>,
    filename: String,
    mime_type: String,
}

impl UploadedImage {
    pub fn new(
        bytes: Vec<u8>,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Result<Self, SelectionError> {
        let filename = filename.into();
        let mime_type = mime_type.into().to_ascii_lowercase();

        if !ACCEPTED_MIME_TYPES.contains(&mime_type.as_str()) {
            return Err(SelectionError::UnsupportedType {
                filename,
                mime_type,
            });
        }
        if bytes.is_empty() {
            return Err(SelectionError::Empty { filename });
        }

        Ok(Self {
            bytes,
            filename,
            mime_type,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

impl fmt::Debug for UploadedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedImage")
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
