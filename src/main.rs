use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use support_triage::config::TriageConfig;
use support_triage::llm::{RemoteClassifier, create_classifier};
use support_triage::pipeline::processor::TriageProcessor;
use support_triage::pipeline::rules::KeywordClassifier;
use support_triage::pipeline::types::TriageMode;
use support_triage::tickets::inbox::{demo_inbox, load_inbox};
use support_triage::tickets::routes::{AppState, ticket_routes};
use support_triage::tickets::store::TicketStore;

/// Timeout for the Ollama status probe.
const STATUS_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = TriageConfig::from_env().context("Failed to load configuration")?;

    // Initialize tracing (stderr, plus daily files when TRIAGE_LOG_DIR is set)
    let file_layer = config.log_dir.as_ref().map(|dir| {
        fmt::layer()
            .with_writer(tracing_appender::rolling::daily(dir, "support-triage.log"))
            .with_ansi(false)
            .with_target(false)
    });
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .init();

    eprintln!("📬 Support Triage v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Mode: {}", config.mode);
    eprintln!("   AI provider: {}", config.provider);
    eprintln!("   API: http://0.0.0.0:{}/api/tickets", config.http_port);
    eprintln!("   WS: ws://0.0.0.0:{}/ws\n", config.http_port);

    // ── AI classifier ───────────────────────────────────────────────────
    let remote = build_remote(&config);
    let processor = Arc::new(TriageProcessor::new(
        KeywordClassifier::default_rules(),
        remote,
        config.max_concurrent,
    ));

    // ── Inbox ───────────────────────────────────────────────────────────
    let inbox = match config.inbox_path {
        Some(ref path) => load_inbox(path)
            .with_context(|| format!("Failed to load inbox from {}", path.display()))?,
        None => demo_inbox(),
    };

    // ── Initial triage ──────────────────────────────────────────────────
    let store = TicketStore::new();
    let batch = processor.triage_batch(inbox.clone(), config.mode).await;
    store.replace_all(batch.tickets).await;
    if let Some(info) = batch.rate_limits.into_iter().last() {
        store.record_rate_limit(info).await;
    }

    // ── HTTP / WebSocket server ─────────────────────────────────────────
    let http = reqwest::Client::builder()
        .timeout(STATUS_PROBE_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")?;

    let app = ticket_routes(AppState {
        store,
        processor,
        inbox: Arc::new(inbox),
        default_mode: config.mode,
        ollama_base_url: config.ollama_base_url.clone(),
        http,
    });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.http_port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.http_port))?;
    tracing::info!(port = config.http_port, "Ticket server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
        })
        .await
        .context("Server error")?;

    Ok(())
}

/// Build the AI classifier, degrading to keyword-only when it can't be set up.
fn build_remote(config: &TriageConfig) -> Option<Arc<dyn RemoteClassifier>> {
    let llm = match config.llm_config() {
        Ok(llm) => llm,
        Err(e) if config.mode == TriageMode::Keyword => {
            tracing::info!(error = %e, "AI classifier not configured, keyword mode only");
            return None;
        }
        Err(e) => {
            tracing::warn!(error = %e, "AI classifier not configured, using keyword-only triage");
            return None;
        }
    };

    match create_classifier(&llm) {
        Ok(remote) => Some(remote),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to create AI classifier, using keyword-only triage");
            None
        }
    }
}
