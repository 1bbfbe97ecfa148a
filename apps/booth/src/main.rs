mod config;
mod script;
mod session;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use camera_core::{
    BoothOptions, FrameSourceProvider, MissingFrameSourceProvider, PhotoBooth, PngFileExporter,
    StillImageProvider, TerminalBell, EJECT_WINDOW,
};
use caption_service::{
    CaptionBackend, CaptionService, HttpCaptionBackend, HttpCaptionConfig, MissingCaptionBackend,
};
use clap::Parser;
use shared::locale::Locale;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    config::{load_settings, Settings},
    session::Session,
};

#[derive(Parser, Debug)]
#[command(about = "Instant camera booth driven by a command script")]
struct Args {
    /// Still image used as the camera feed.
    #[arg(long)]
    frame: Option<PathBuf>,
    #[arg(long)]
    config: Option<PathBuf>,
    /// Command file; stdin when omitted.
    #[arg(long)]
    script: Option<PathBuf>,
    /// Overrides the configured and environment locale, e.g. `zh_CN.UTF-8`.
    #[arg(long)]
    locale: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if args.locale.is_some() {
        settings.locale = args.locale;
    }
    let locale = settings.locale();
    info!(locale = locale.tag(), language = %locale.language(), "booth: starting");

    let booth = PhotoBooth::new(
        BoothOptions {
            locale: locale.clone(),
            viewport: settings.viewport(),
            eject_window: EJECT_WINDOW,
        },
        caption_service(&settings, &locale)?,
        Arc::new(PngFileExporter::new(settings.export_dir())),
        Arc::new(TerminalBell),
    );

    let provider: Box<dyn FrameSourceProvider> = match &args.frame {
        Some(path) => Box::new(StillImageProvider::new(path)),
        None => Box::new(MissingFrameSourceProvider),
    };
    if let Err(err) = booth.attach_source(provider.as_ref()).await {
        warn!("booth: capture disabled: {err}");
    }

    let session = Session::new(booth);
    match &args.script {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read script '{}'", path.display()))?;
            for (index, line) in raw.lines().enumerate() {
                session.run_line(index + 1, line).await?;
            }
        }
        None => {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            let mut index = 0;
            while let Some(line) = lines.next_line().await? {
                index += 1;
                session.run_line(index, &line).await?;
            }
        }
    }

    session.booth().wait_for_captions().await;
    Ok(())
}

fn caption_service(settings: &Settings, locale: &Locale) -> Result<CaptionService> {
    let backend: Arc<dyn CaptionBackend> = match settings.caption_endpoint_url()? {
        Some(endpoint) => {
            info!(endpoint = %endpoint, model = %settings.caption_model, "booth: remote captions enabled");
            let mut config = HttpCaptionConfig::new(
                endpoint,
                settings.caption_api_key.clone(),
                settings.caption_model.clone(),
            );
            config.timeout = settings.caption_timeout();
            Arc::new(HttpCaptionBackend::new(config)?)
        }
        None => {
            warn!("booth: no caption endpoint configured, using fallback captions");
            Arc::new(MissingCaptionBackend)
        }
    };
    Ok(CaptionService::new(backend, locale).with_timeout(settings.caption_timeout()))
}
