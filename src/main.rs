use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use onboarding_chat::channels::CliChannel;
use onboarding_chat::config::AppConfig;
use onboarding_chat::onboarding::{
    CannedCatalog, ResponseCatalog, SessionRegistry, onboarding_routes, spawn_prune_task,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();

    // Keep the guard alive so buffered file logs are flushed on exit.
    let _log_guard = init_tracing(&config);

    let catalog: Arc<dyn ResponseCatalog> = Arc::new(CannedCatalog);

    // ── Session registry ────────────────────────────────────────────────
    let registry = SessionRegistry::new(catalog, config.session_idle_timeout);
    let _prune_handle = spawn_prune_task(Arc::clone(&registry), config.prune_interval);

    // ── HTTP / WebSocket server ─────────────────────────────────────────
    let addr = SocketAddr::new(config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind onboarding server on {addr}"))?;
    let app = onboarding_routes(Arc::clone(&registry));

    eprintln!("👋 Onboarding Chat v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   REST: http://{}/api/sessions", addr);
    eprintln!("   WS:   ws://{}/ws/sessions/{{id}}", addr);
    if let Some(ref dir) = config.log_dir {
        eprintln!("   Logs: {}", dir.display());
    }

    let server = tokio::spawn(async move {
        tracing::info!(%addr, "Onboarding server started");
        axum::serve(listener, app).await
    });

    // ── Terminal session ────────────────────────────────────────────────
    if config.cli_enabled {
        // Registered like any other session so it can be inspected over REST.
        let session = registry.create().await?;
        eprintln!("   Session: {}", session.id());
        eprintln!("   Type your answers and press Enter. /quit to exit.\n");
        CliChannel::new(session).run().await?;
        server.abort();
        return Ok(());
    }

    server.await??;
    Ok(())
}

/// Install the global subscriber. Returns the file writer guard when file
/// logging is enabled.
fn init_tracing(config: &AppConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stderr keeps log lines out of the REPL's stdout.
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    match config.log_dir {
        Some(ref dir) => {
            let appender = tracing_appender::rolling::daily(dir, "onboarding-chat.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(file_layer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
            None
        }
    }
}
