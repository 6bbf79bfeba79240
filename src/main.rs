use anyhow::{Context, Result};
use callscribe::{
    AppState, Config, FsRecordingStore, NullEngineFactory, Orchestrator, SessionConfig,
    SilentFeedbackGate, WavCaptureFactory,
};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "callscribe", about = "Recording session service with live WPM metrics")]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config/callscribe")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Recording data path: {}", cfg.audio.data_path);

    let store = Arc::new(FsRecordingStore::new(&cfg.audio.data_path)?);
    let capture_factory = Arc::new(WavCaptureFactory::new(
        cfg.audio.sample_rate,
        cfg.audio.channels,
    ));

    let session_config = SessionConfig {
        sample_interval: Duration::from_secs(cfg.session.sample_interval_secs),
        ..SessionConfig::default()
    };

    let session = Orchestrator::spawn(
        session_config,
        store,
        capture_factory,
        Arc::new(NullEngineFactory),
        Arc::new(SilentFeedbackGate),
    );

    // Warm the recording cache from the catalog
    session.refresh_recordings().await?;

    let router = callscribe::create_router(AppState::new(session));
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);
    axum::serve(listener, router).await?;

    Ok(())
}
