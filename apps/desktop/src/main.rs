use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{load_settings, BackendClient, Phase, Settings, Workflow};
use shared::domain::UploadedImage;

mod presenter;

use presenter::TerminalPresenter;

/// Chest X-ray pneumonia screening client.
#[derive(Parser, Debug)]
struct Args {
    /// Prediction API base URL; overrides API_URL.
    #[arg(long)]
    api_url: Option<String>,
    /// Directory where decoded Grad-CAM overlays are saved.
    #[arg(long)]
    overlay_dir: Option<PathBuf>,
    /// JPEG or PNG chest X-rays, analysed one after another.
    images: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let settings = match args.api_url.as_deref() {
        Some(url) => Settings::from_api_url(Some(url))?,
        None => load_settings()?,
    };
    tracing::info!(api_url = %settings.api_url, "using prediction API");

    if let Some(dir) = &args.overlay_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create overlay dir '{}'", dir.display()))?;
    }

    let presenter = TerminalPresenter::new(std::io::stdout(), args.overlay_dir.clone());
    let mut workflow = Workflow::new(BackendClient::new(&settings), presenter);
    workflow.start().await;

    let mut failed = false;
    for path in &args.images {
        let image = match load_upload(path) {
            Ok(image) => image,
            Err(err) => {
                tracing::warn!(path = %path.display(), "skipping selection: {err:#}");
                failed = true;
                continue;
            }
        };
        if workflow.select_image(image).await.phase() == Phase::Error {
            failed = true;
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn load_upload(path: &Path) -> Result<UploadedImage> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read '{}'", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let mime_type = mime_guess::from_path(path).first_or_octet_stream();

    Ok(UploadedImage::new(bytes, filename, mime_type.essence_str())?)
}
