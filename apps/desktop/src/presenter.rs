//! Terminal rendering of the workflow.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use client_core::Presenter;
use shared::{
    domain::{Label, ModelMetrics, OverlayImage, PredictionResult, UploadedImage},
    error::{FailureKind, BACKEND_START_HINT},
};

const BAR_WIDTH: usize = 30;
const DISCLAIMER: &str = "This tool assists diagnosis for academic use only. \
It does not replace the opinion of a healthcare professional.";

pub struct TerminalPresenter<W: Write> {
    out: W,
    overlay_dir: Option<PathBuf>,
    current_file: Option<String>,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W, overlay_dir: Option<PathBuf>) -> Self {
        Self {
            out,
            overlay_dir,
            current_file: None,
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(err) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::warn!("failed to write to terminal: {err}");
        }
    }

    fn save_overlay(&self, overlay: &OverlayImage) -> Option<PathBuf> {
        let dir = self.overlay_dir.as_ref()?;
        let stem = self
            .current_file
            .as_deref()
            .and_then(|name| Path::new(name).file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "overlay".to_string());
        let extension = if overlay.mime_type == "image/jpeg" {
            "jpg"
        } else {
            "png"
        };
        let path = dir.join(format!("{stem}_gradcam.{extension}"));

        match fs::write(&path, &overlay.bytes) {
            Ok(()) => Some(path),
            Err(err) => {
                tracing::warn!(path = %path.display(), "failed to save overlay: {err}");
                None
            }
        }
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn render_idle(&mut self) {
        let text = format!(
            "Chest X-ray pneumonia detection\n{DISCLAIMER}\n\nSelect a chest X-ray (JPEG, PNG) to start the analysis.\n"
        );
        self.emit(&text);
    }

    fn render_image_selected(&mut self, image: &UploadedImage) {
        self.current_file = Some(image.filename().to_string());
        let text = format!(
            "\nUploaded image: {} ({}, {} bytes)\n",
            image.filename(),
            image.mime_type(),
            image.bytes().len()
        );
        self.emit(&text);
    }

    fn render_pending(&mut self) {
        self.emit("Analysis in progress...\n");
    }

    fn render_result(&mut self, result: &PredictionResult) {
        let text = format_result(result, self.save_overlay(&result.overlay).as_deref());
        self.emit(&text);
    }

    fn render_error(&mut self, kind: FailureKind, message: &str) {
        self.emit(&format!("Error ({kind}): {message}\n"));
    }

    fn render_metrics(&mut self, metrics: &ModelMetrics) {
        self.emit(&format_metrics(metrics));
    }

    fn render_metrics_unavailable(&mut self, kind: FailureKind) {
        let text = match kind {
            FailureKind::Connection => {
                format!("Model metrics: API not connected. Start it with: `{BACKEND_START_HINT}`\n")
            }
            other => format!("Model metrics: API unavailable ({other})\n"),
        };
        self.emit(&text);
    }
}

fn format_result(result: &PredictionResult, saved_overlay: Option<&Path>) -> String {
    let verdict = match result.label {
        Label::Normal => "No sign of pneumonia detected.",
        Label::Pneumonia => "Signs of pneumonia detected. Consult a physician.",
    };
    let mut text = format!(
        "\n== Result ==\n\
         {}  (confidence {}%)\n\
         {verdict}\n\
         Probabilities: Normal {}% | Pneumonia {}%\n\
         Pneumonia [{}]\n\
         Grad-CAM overlay: {}x{} {} (red/yellow regions show where the model focused)\n",
        result.label,
        result.confidence_percent,
        result.probabilities.normal,
        result.probabilities.pneumonia,
        progress_bar(result.probabilities.pneumonia),
        result.overlay.width,
        result.overlay.height,
        result.overlay.mime_type
    );
    if let Some(path) = saved_overlay {
        text.push_str(&format!("Overlay saved to {}\n", path.display()));
    }
    text
}

fn format_metrics(metrics: &ModelMetrics) -> String {
    format!(
        "\n== Model metrics ==\n\
         Accuracy     {:.1}%\n\
         AUC-ROC      {:.4}\n\
         Recall       {:.1}%\n\
         Specificity  {:.1}%\n\
         F1-Score     {:.4}\n",
        metrics.accuracy * 100.0,
        metrics.auc_roc,
        metrics.recall * 100.0,
        metrics.specificity * 100.0,
        metrics.f1_score
    )
}

fn progress_bar(percent: f64) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::Probabilities;

    fn result(label: Label, normal: f64, pneumonia: f64) -> PredictionResult {
        PredictionResult {
            label,
            confidence_percent: match label {
                Label::Normal => normal,
                Label::Pneumonia => pneumonia,
            },
            probabilities: Probabilities { normal, pneumonia },
            overlay: OverlayImage {
                bytes: b"\x89PNG fake".to_vec(),
                width: 224,
                height: 224,
                mime_type: "image/png",
            },
        }
    }

    fn rendered(presenter: TerminalPresenter<Vec<u8>>) -> String {
        String::from_utf8(presenter.into_inner()).expect("utf8")
    }

    #[test]
    fn progress_bar_tracks_pneumonia_probability() {
        assert_eq!(progress_bar(0.0), ".".repeat(BAR_WIDTH));
        assert_eq!(progress_bar(100.0), "#".repeat(BAR_WIDTH));
        assert_eq!(progress_bar(50.0).matches('#').count(), BAR_WIDTH / 2);
    }

    #[test]
    fn pneumonia_result_advises_physician() {
        let mut presenter = TerminalPresenter::new(Vec::new(), None);
        presenter.render_result(&result(Label::Pneumonia, 23.6, 76.4));
        let text = rendered(presenter);
        assert!(text.contains("PNEUMONIA  (confidence 76.4%)"));
        assert!(text.contains("Consult a physician"));
        assert!(text.contains("Normal 23.6% | Pneumonia 76.4%"));
        assert!(text.contains("224x224"));
    }

    #[test]
    fn normal_result_lists_every_line() {
        let text = format_result(
            &result(Label::Normal, 98.2, 1.8),
            Some(Path::new("/tmp/a_gradcam.png")),
        );
        let bar = format!("Pneumonia [#{}]", ".".repeat(BAR_WIDTH - 1));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "",
                "== Result ==",
                "NORMAL  (confidence 98.2%)",
                "No sign of pneumonia detected.",
                "Probabilities: Normal 98.2% | Pneumonia 1.8%",
                bar.as_str(),
                "Grad-CAM overlay: 224x224 image/png (red/yellow regions show where the model focused)",
                "Overlay saved to /tmp/a_gradcam.png",
            ]
        );
    }

    #[test]
    fn metrics_use_percent_and_four_decimals() {
        let mut presenter = TerminalPresenter::new(Vec::new(), None);
        presenter.render_metrics(&ModelMetrics {
            accuracy: 0.9247,
            auc_roc: 0.97123,
            recall: 0.9641,
            specificity: 0.859,
            f1_score: 0.94129,
        });
        let text = rendered(presenter);
        assert!(text.contains("Accuracy     92.5%"));
        assert!(text.contains("AUC-ROC      0.9712"));
        assert!(text.contains("Specificity  85.9%"));
        assert!(text.contains("F1-Score     0.9413"));
    }

    #[test]
    fn unavailable_metrics_name_start_command_only_when_disconnected() {
        let mut presenter = TerminalPresenter::new(Vec::new(), None);
        presenter.render_metrics_unavailable(FailureKind::Connection);
        presenter.render_metrics_unavailable(FailureKind::Http { status: 503 });
        let text = rendered(presenter);
        assert_eq!(text.matches(BACKEND_START_HINT).count(), 1);
        assert!(text.contains("API unavailable (http error 503)"));
    }

    #[test]
    fn saves_overlay_named_after_selected_file() {
        let dir = std::env::temp_dir().join(format!(
            "xray_assist_overlay_{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        fs::create_dir_all(&dir).expect("dir");
        let mut presenter = TerminalPresenter::new(Vec::new(), Some(dir.clone()));
        let image = UploadedImage::new(vec![1, 2], "patient-3.jpeg", "image/jpeg").expect("image");
        presenter.render_image_selected(&image);
        presenter.render_result(&result(Label::Normal, 98.2, 1.8));

        let saved = dir.join("patient-3_gradcam.png");
        assert_eq!(fs::read(&saved).expect("saved"), b"\x89PNG fake");
        assert!(rendered(presenter).contains("Overlay saved to"));
        fs::remove_dir_all(dir).expect("cleanup");
    }
}
