//! OX trading HTTP service.
//!
//! # Startup Order
//!
//! ```text
//! config file ──▶ ConfigStore ──▶ validate
//!                                    │
//!                                    ▼
//!                 LogSink::initialize(log section) + tracing bridge
//!                                    │
//!                                    ▼
//!                 HttpServer::initialize(server section)  (/health)
//!                                    │
//!                                    ▼
//!                 register routes ──▶ start ──▶ ConfigWatcher
//!                                    │
//!                          Ctrl+C / SIGTERM
//!                                    │
//!                                    ▼
//!                 HttpServer::stop ──▶ LogSink::shutdown
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ox_service::config::watcher::ConfigWatcher;
use ox_service::config::{ConfigStore, ServiceConfig};
use ox_service::errors::{ErrorCatalog, ErrorCode};
use ox_service::http::{ApiError, ApiRequest, ApiResponse, HttpServer, DEFAULT_SERVICE_NAME};
use ox_service::lifecycle::signals::shutdown_signal;
use ox_service::observability::{LogSink, LogSinkLayer};
use ox_service::{log_info, log_warn};

#[derive(Parser, Debug)]
#[command(name = "ox-service", version, about = "OX trading HTTP service")]
struct Args {
    /// Configuration file (JSON, or TOML by extension)
    #[arg(short, long, default_value = "config/service.json")]
    config: PathBuf,

    /// Service name reported by /health
    #[arg(long, default_value = DEFAULT_SERVICE_NAME)]
    name: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration (falls back to defaults if the file is unusable)
    let store = Arc::new(ConfigStore::new());
    let loaded = store.load_from_file(&args.config);
    store.validate()?;
    let config = store.snapshot();

    // Initialize log sink and route tracing events into it
    let sink = Arc::new(LogSink::new());
    sink.initialize(&config.log)?;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ox_service=debug,info".into()),
        )
        .with(LogSinkLayer::new(sink.clone()))
        .init();

    log_info!(sink, "{} v{} starting", args.name, env!("CARGO_PKG_VERSION"));
    match loaded {
        Ok(()) => log_info!(sink, "Configuration loaded from {}", args.config.display()),
        Err(e) => log_warn!(sink, "Using default configuration: {}", e),
    }

    let mut server = HttpServer::new(sink.clone(), Arc::new(ErrorCatalog::new()))
        .with_name(args.name.clone());
    server.initialize(&config.server)?;
    register_routes(&mut server, store.clone(), sink.clone());
    server.start()?;

    // Hot reload; the watcher stops when dropped
    let _watcher = ConfigWatcher::new(store.clone()).and_then(|(watcher, mut updates)| {
        match watcher.run() {
            Ok(handle) => {
                let sink = sink.clone();
                tokio::spawn(async move {
                    while let Some(config) = updates.recv().await {
                        apply_reloaded(&sink, &config);
                    }
                });
                Some(handle)
            }
            Err(e) => {
                log_warn!(sink, "Config watcher unavailable: {}", e);
                None
            }
        }
    });

    shutdown_signal().await;

    tokio::task::block_in_place(|| server.stop());
    log_info!(sink, "Shutdown complete");
    sink.shutdown();
    Ok(())
}

/// Changes that can be applied without restarting the listener.
fn apply_reloaded(sink: &LogSink, config: &ServiceConfig) {
    if sink.level() != config.log.level {
        sink.set_level(config.log.level);
    }
    log_info!(sink, "Configuration reloaded (log level {})", config.log.level);
}

fn register_routes(server: &mut HttpServer, store: Arc<ConfigStore>, sink: Arc<LogSink>) {
    let current = store.clone();
    server.route(Method::GET, "/api/config", move |_req: ApiRequest| {
        let snapshot = current.snapshot();
        async move { ApiResponse::from_serialize(&*snapshot) }
    });

    server.route(Method::POST, "/api/config/reload", move |_req: ApiRequest| {
        let result = store.reload().map(|()| store.snapshot());
        if let Ok(config) = &result {
            apply_reloaded(&sink, config);
        }
        async move {
            match result {
                Ok(config) => ApiResponse::from_serialize(&*config),
                Err(e) => Err(ApiError::new(ErrorCode::ConfigError)
                    .with_status(StatusCode::INTERNAL_SERVER_ERROR)
                    .with_detail(e.to_string())),
            }
        }
    });
}
