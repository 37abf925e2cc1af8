use anyhow::{Context, Result};
use clap::Parser;
use loqa_listen::recognition::{NatsRecognitionProvider, RecognitionProvider, UnsupportedProvider};
use loqa_listen::{
    create_router, forward_events, AppState, Config, ListenMode, NatsClient, NatsEventSink,
    RecognitionSettings, SupervisorHandle,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Wake-word voice assistant listener
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/voice-assistant")]
    config: String,

    /// Override the listen mode from the config file
    #[arg(long, value_enum)]
    mode: Option<ListenMode>,

    /// Override the wake phrase from the config file
    #[arg(long)]
    wake_phrase: Option<String>,

    /// Run without a recognizer (the API reports no support)
    #[arg(long)]
    no_nats: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut cfg = Config::load(&args.config)?;
    if let Some(mode) = args.mode {
        cfg.supervisor.mode = mode;
    }
    if let Some(phrase) = args.wake_phrase {
        cfg.wake_word.phrase = phrase;
    }

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Wake phrase: \"{}\" (mode={:?})", cfg.wake_word.phrase, cfg.supervisor.mode);

    // Capability probe: a recognizer exists only if the transcript stream is reachable
    let instance_id = format!("assistant-{}", uuid::Uuid::new_v4());
    let nats_client = if args.no_nats {
        None
    } else {
        match NatsClient::connect(&cfg.recognition.nats_url, instance_id).await {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                warn!("Speech recognition unavailable: {:#}", e);
                None
            }
        }
    };

    let provider: Arc<dyn RecognitionProvider> = match &nats_client {
        Some(client) => Arc::new(NatsRecognitionProvider::new(
            Arc::clone(client),
            &cfg.recognition,
        )),
        None => Arc::new(UnsupportedProvider),
    };

    let settings = RecognitionSettings {
        lang: cfg.recognition.lang.clone(),
        ..RecognitionSettings::default()
    };
    let supervisor =
        SupervisorHandle::spawn(provider, cfg.supervisor.clone(), settings, &cfg.wake_word)?;

    if let Some(client) = &nats_client {
        let sink = Arc::new(NatsEventSink::new(Arc::clone(client), cfg.events.subject.clone()));
        forward_events(supervisor.subscribe_events(), sink);
    }

    if supervisor.has_support() {
        supervisor.start().await?;
    }

    let app = create_router(AppState::new(supervisor.clone()));
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind HTTP server to {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("HTTP server failed")?;

    supervisor.shutdown().await?;

    Ok(())
}
