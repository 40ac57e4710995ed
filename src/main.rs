//! Rest Timer - a drift-corrected, persistent rest timer service
//!
//! This is the main entry point for the rest-timer server.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use rest_timer::{
    api::create_router,
    config::Config,
    services::notifier::ConsoleNotifier,
    state::AppState,
    storage::{JsonFileStore, KvStore, MemoryStore},
    tasks::tick_scheduler_task,
    utils::{clock::SystemClock, shutdown_signal},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("rest_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting rest-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, state_dir={:?}",
        config.host, config.port, config.state_dir
    );

    // Open durable storage; a failing backend degrades to in-memory state
    let store: Box<dyn KvStore> = match &config.state_dir {
        Some(dir) => match JsonFileStore::open(dir.clone()) {
            Ok(store) => Box::new(store),
            Err(e) => {
                warn!("Falling back to in-memory state: {}", e);
                Box::new(MemoryStore::new())
            }
        },
        None => Box::new(MemoryStore::new()),
    };

    // Create application state; this attaches to persisted timer state and
    // runs the recovery reconciliation once
    let state = Arc::new(AppState::new(
        config.port,
        config.host.clone(),
        Box::new(SystemClock),
        store,
        Box::new(ConsoleNotifier),
    ));

    // Start the tick scheduler background task
    let tick_state = Arc::clone(&state);
    tokio::spawn(async move {
        tick_scheduler_task(tick_state).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /timer/start    - Start a rest countdown");
    info!("  POST /timer/pause    - Pause the countdown");
    info!("  POST /timer/resume   - Resume a paused countdown");
    info!("  POST /timer/skip     - Cancel without completion effects");
    info!("  POST /timer/reset    - Reset to idle");
    info!("  POST /timer/add      - Add seconds to the countdown");
    info!("  POST /timer/subtract - Subtract seconds from the countdown");
    info!("  GET  /timer          - Current timer snapshot");
    info!("  GET  /settings       - Timer settings, POST to update");
    info!("  GET  /status         - Full server status");
    info!("  GET  /health         - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
