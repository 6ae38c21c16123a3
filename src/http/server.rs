//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Validate the server section and register the built-in `/health` route
//! - Collect routes before start, freeze them when the listener starts
//! - Run the axum serve loop on a dedicated thread with its own runtime
//! - Stop the listener and join its thread
//!
//! # States
//! ```text
//! Uninitialized → Initialized   initialize()
//! Initialized   → Running       start()
//! Running       → Stopped       stop()
//! ```
//! `Stopped` is terminal for an instance.
//!
//! # Readiness
//! `start()` waits at most [`START_GRACE`] for the listener thread to
//! report a bound socket. A bind failure inside that window is returned;
//! if the window passes without a report, `start()` returns `Ok` and any
//! later failure only shows up as `is_running() == false`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use axum::http::{Method, StatusCode};
use serde_json::json;
use tokio::net::TcpListener;

use crate::config::schema::ServerConfig;
use crate::config::validation::validate_server;
use crate::errors::ErrorCatalog;
use crate::http::pipeline::{build_app, CorsPolicy, PipelineState};
use crate::http::request::ApiRequest;
use crate::http::response::{ApiError, ApiResponse};
use crate::lifecycle::{Shutdown, ShutdownSignal};
use crate::observability::LogSink;
use crate::routing::{Handler, RouteTable};
use crate::{log_error, log_info, log_warn};

/// Name reported by `GET /health` unless overridden.
pub const DEFAULT_SERVICE_NAME: &str = "ox_trading_service";

/// Path of the built-in health route.
pub const HEALTH_PATH: &str = "/health";

/// How long `start()` waits for the listener to report readiness.
pub const START_GRACE: Duration = Duration::from_millis(100);

/// How long `stop()` waits for in-flight requests before detaching.
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Lifecycle state of an [`HttpServer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Uninitialized,
    Initialized,
    Running,
    Stopped,
}

/// Error type for server lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid server configuration: {0}")]
    InvalidConfig(String),

    #[error("Server not initialized")]
    NotInitialized,

    #[error("Server is already running")]
    AlreadyRunning,

    #[error("Server has been stopped")]
    Stopped,

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("Failed to build listener runtime: {0}")]
    Runtime(std::io::Error),

    #[error("Failed to spawn listener thread: {0}")]
    Spawn(std::io::Error),

    #[error("Listener thread exited before reporting readiness")]
    ListenerExited,
}

struct Listener {
    shutdown: Shutdown,
    thread: JoinHandle<()>,
    exited: mpsc::Receiver<()>,
}

/// HTTP service with a fixed middleware pipeline.
pub struct HttpServer {
    name: String,
    config: Option<ServerConfig>,
    routes: RouteTable,
    catalog: Arc<ErrorCatalog>,
    sink: Arc<LogSink>,
    cors: CorsPolicy,
    request_logging: bool,
    state: ServerState,
    serving: Arc<AtomicBool>,
    local_addr: Option<SocketAddr>,
    listener: Option<Listener>,
}

impl HttpServer {
    /// Create an uninitialized server logging to `sink`.
    pub fn new(sink: Arc<LogSink>, catalog: Arc<ErrorCatalog>) -> Self {
        Self {
            name: DEFAULT_SERVICE_NAME.to_string(),
            config: None,
            routes: RouteTable::new(),
            catalog,
            sink,
            cors: CorsPolicy::default(),
            request_logging: true,
            state: ServerState::Uninitialized,
            serving: Arc::new(AtomicBool::new(false)),
            local_addr: None,
            listener: None,
        }
    }

    /// Service name reported by `/health`. Takes effect at `initialize`.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Validate `config` and register the built-in health route.
    pub fn initialize(&mut self, config: &ServerConfig) -> Result<(), ServerError> {
        match self.state {
            ServerState::Running => return Err(ServerError::AlreadyRunning),
            ServerState::Stopped => return Err(ServerError::Stopped),
            ServerState::Uninitialized | ServerState::Initialized => {}
        }

        let mut errors = Vec::new();
        validate_server(config, &mut errors);
        if !errors.is_empty() {
            let reason = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            log_error!(self.sink, "Invalid server configuration: {}", reason);
            return Err(ServerError::InvalidConfig(reason));
        }

        self.config = Some(config.clone());

        let name = self.name.clone();
        self.routes.insert(Method::GET, HEALTH_PATH, move |_req: ApiRequest| {
            let body = json!({"status": "ok", "service": name});
            async move { Ok::<_, ApiError>(ApiResponse::raw(StatusCode::OK, body)) }
        });

        self.state = ServerState::Initialized;
        log_info!(self.sink, "HTTP server initialized on {}", config.bind_address());
        Ok(())
    }

    /// Register `handler` for exact `method` + `path`, replacing any
    /// previous handler for the same pair.
    ///
    /// The built-in `GET /health` cannot be replaced; such a registration
    /// is ignored with a warning. Routes registered after `start()` are not
    /// served by the running listener.
    pub fn route<H: Handler>(&mut self, method: Method, path: impl Into<String>, handler: H) {
        let path = path.into();
        if method == Method::GET && path == HEALTH_PATH {
            log_warn!(self.sink, "GET {} is built in and cannot be replaced", HEALTH_PATH);
            return;
        }
        if self.state == ServerState::Running {
            log_warn!(
                self.sink,
                "Route {} {} registered while running; the listener will not serve it",
                method,
                path
            );
        }
        if self.routes.insert(method.clone(), path.clone(), handler) {
            log_info!(self.sink, "Route {} {} replaced", method, path);
        }
    }

    pub fn enable_cors(&mut self, enable: bool) {
        self.cors.enabled = enable;
    }

    pub fn set_cors_origin(&mut self, origin: impl Into<String>) {
        self.cors.origin = origin.into();
    }

    pub fn enable_request_logging(&mut self, enable: bool) {
        self.request_logging = enable;
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Running and the serve loop has not exited.
    pub fn is_running(&self) -> bool {
        self.state == ServerState::Running && self.serving.load(Ordering::SeqCst)
    }

    /// Address the listener bound to, once known.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Bind and serve on a dedicated thread. See the module docs for what
    /// the return value does and does not guarantee.
    pub fn start(&mut self) -> Result<(), ServerError> {
        let config = match self.state {
            ServerState::Initialized => self.config.clone().ok_or(ServerError::NotInitialized)?,
            ServerState::Uninitialized => {
                log_error!(self.sink, "Server not initialized");
                return Err(ServerError::NotInitialized);
            }
            ServerState::Running => {
                log_warn!(self.sink, "Server is already running");
                return Err(ServerError::AlreadyRunning);
            }
            ServerState::Stopped => return Err(ServerError::Stopped),
        };

        let app = build_app(PipelineState {
            routes: self.routes.freeze(),
            catalog: self.catalog.clone(),
            sink: self.sink.clone(),
            cors: self.cors.clone(),
            request_logging: self.request_logging,
        });

        let shutdown = Shutdown::new();
        let signal = shutdown.subscribe();
        let (ready_tx, ready_rx) = mpsc::channel();
        let (exited_tx, exited_rx) = mpsc::channel();
        let serving = self.serving.clone();
        let sink = self.sink.clone();
        let workers = config.threads.clamp(1, 32) as usize;

        let thread = thread::Builder::new()
            .name(format!("{}-listener", self.name))
            .spawn(move || {
                match tokio::runtime::Builder::new_multi_thread()
                    .worker_threads(workers)
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => {
                        runtime.block_on(serve(config, app, signal, ready_tx, serving, sink));
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(ServerError::Runtime(e)));
                    }
                }
                let _ = exited_tx.send(());
            })
            .map_err(ServerError::Spawn)?;

        match ready_rx.recv_timeout(START_GRACE) {
            Ok(Ok(addr)) => {
                self.local_addr = Some(addr);
                log_info!(self.sink, "HTTP server started successfully");
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                log_error!(self.sink, "Failed to start HTTP server: {}", e);
                return Err(e);
            }
            Err(RecvTimeoutError::Timeout) => {
                log_warn!(
                    self.sink,
                    "HTTP server readiness not confirmed within {}ms",
                    START_GRACE.as_millis()
                );
            }
            Err(RecvTimeoutError::Disconnected) => {
                let _ = thread.join();
                return Err(ServerError::ListenerExited);
            }
        }

        self.listener = Some(Listener {
            shutdown,
            thread,
            exited: exited_rx,
        });
        self.state = ServerState::Running;
        Ok(())
    }

    /// Stop serving and release the listener. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if self.state != ServerState::Running {
            return;
        }

        if let Some(listener) = self.listener.take() {
            listener.shutdown.trigger();
            match listener.exited.recv_timeout(STOP_TIMEOUT) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    let _ = listener.thread.join();
                }
                Err(RecvTimeoutError::Timeout) => {
                    log_warn!(
                        self.sink,
                        "Listener did not exit within {}s; detaching",
                        STOP_TIMEOUT.as_secs()
                    );
                }
            }
        }

        self.serving.store(false, Ordering::SeqCst);
        self.state = ServerState::Stopped;
        log_info!(self.sink, "HTTP server stopped");
    }
}

impl Drop for HttpServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn serve(
    config: ServerConfig,
    app: axum::Router,
    signal: ShutdownSignal,
    ready: mpsc::Sender<Result<SocketAddr, ServerError>>,
    serving: Arc<AtomicBool>,
    sink: Arc<LogSink>,
) {
    let address = config.bind_address();
    log_info!(sink, "Starting HTTP server on {}", address);

    let listener = match TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(source) => {
            log_error!(sink, "Failed to bind {}: {}", address, source);
            let _ = ready.send(Err(ServerError::Bind { address, source }));
            return;
        }
    };

    let local_addr = match listener.local_addr() {
        Ok(addr) => addr,
        Err(source) => {
            let _ = ready.send(Err(ServerError::Bind { address, source }));
            return;
        }
    };

    serving.store(true, Ordering::SeqCst);
    let _ = ready.send(Ok(local_addr));

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(signal.recv())
        .await
    {
        log_error!(sink, "HTTP server error: {}", e);
    }

    serving.store(false, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> HttpServer {
        HttpServer::new(Arc::new(LogSink::new()), Arc::new(ErrorCatalog::new()))
    }

    fn config(port: i64) -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".into(),
            port,
            threads: 2,
        }
    }

    #[test]
    fn test_initialize_registers_health() {
        let mut server = server();
        assert_eq!(server.state(), ServerState::Uninitialized);

        server.initialize(&config(8888)).unwrap();
        assert_eq!(server.state(), ServerState::Initialized);
        assert!(!server.is_running());
        assert!(server.routes().contains(&Method::GET, "/health"));
    }

    #[tokio::test]
    async fn test_health_route_cannot_be_replaced() {
        let mut server = server().with_name("ox_test");
        server.initialize(&config(8888)).unwrap();
        server.route(Method::GET, HEALTH_PATH, |_req: ApiRequest| async move {
            Ok::<_, ApiError>(ApiResponse::raw(StatusCode::OK, json!({"status": "hijacked"})))
        });
        // Other methods on the same path are ordinary routes.
        server.route(Method::POST, HEALTH_PATH, |_req: ApiRequest| async move {
            Ok::<_, ApiError>(ApiResponse::success(json!(null)))
        });

        let handler = server.routes().get(&Method::GET, HEALTH_PATH).unwrap().clone();
        let reply = handler
            .call(ApiRequest::empty(Method::GET, HEALTH_PATH))
            .await
            .unwrap();
        assert_eq!(reply.body(), json!({"status": "ok", "service": "ox_test"}));
        assert!(server.routes().contains(&Method::POST, HEALTH_PATH));
    }

    #[test]
    fn test_initialize_rejects_invalid_config() {
        let mut server = server();
        let result = server.initialize(&config(0));
        assert!(matches!(result, Err(ServerError::InvalidConfig(_))));
        assert_eq!(server.state(), ServerState::Uninitialized);
    }

    #[test]
    fn test_start_requires_initialize() {
        let mut server = server();
        assert!(matches!(server.start(), Err(ServerError::NotInitialized)));
        server.stop();
        assert_eq!(server.state(), ServerState::Uninitialized);
    }

    #[test]
    fn test_start_stop_lifecycle() {
        let mut server = server();
        server.initialize(&config(28411)).unwrap();

        server.start().unwrap();
        assert_eq!(server.state(), ServerState::Running);
        for _ in 0..50 {
            if server.is_running() {
                break;
            }
            thread::sleep(Duration::from_millis(20));
        }
        assert!(server.is_running());
        assert!(matches!(server.start(), Err(ServerError::AlreadyRunning)));

        server.stop();
        server.stop();
        assert_eq!(server.state(), ServerState::Stopped);
        assert!(!server.is_running());
        assert!(matches!(server.start(), Err(ServerError::Stopped)));
    }

    #[test]
    fn test_bind_conflict_is_reported() {
        let _taken = std::net::TcpListener::bind("127.0.0.1:28412").unwrap();

        let mut server = server();
        server.initialize(&config(28412)).unwrap();
        assert!(matches!(server.start(), Err(ServerError::Bind { .. })));
        assert_eq!(server.state(), ServerState::Initialized);
    }
}
