//! Shared utilities for integration tests.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use ox_service::config::{LogConfig, LogLevel, ServerConfig};
use ox_service::{ErrorCatalog, HttpServer, LogSink};

/// Server config on loopback with a fixed test port.
pub fn server_config(port: i64) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".into(),
        port,
        threads: 2,
    }
}

/// A sink writing only to `dir/service.log` (dated).
#[allow(dead_code)]
pub fn file_sink(dir: &Path, level: LogLevel) -> Arc<LogSink> {
    let sink = Arc::new(LogSink::new());
    sink.initialize(&LogConfig {
        level,
        file: dir.join("service.log").to_string_lossy().into_owned(),
        console_output: false,
        file_output: true,
    })
    .unwrap();
    sink
}

/// An initialized (not started) server logging to `sink`.
#[allow(dead_code)]
pub fn new_server(port: i64, sink: Arc<LogSink>) -> HttpServer {
    let mut server = HttpServer::new(sink, Arc::new(ErrorCatalog::new()));
    server.initialize(&server_config(port)).unwrap();
    server
}

/// Start `server` and wait until its listener accepts connections.
#[allow(dead_code)]
pub async fn start(server: &mut HttpServer) {
    server.start().unwrap();
    for _ in 0..50 {
        if server.is_running() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("server did not come up");
}

/// HTTP client that never pools or proxies.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
