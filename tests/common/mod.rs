//! Shared utilities for end-to-end tests.

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use catalog_api::config::AppConfig;
use catalog_api::http::HttpServer;
use catalog_api::lifecycle::Shutdown;

/// A server running on an ephemeral port.
#[allow(dead_code)]
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config_updates: mpsc::UnboundedSender<AppConfig>,
    pub handle: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

#[allow(dead_code)]
impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Stop the server and wait for it to drain.
    pub async fn stop(self) {
        self.shutdown.trigger();
        self.handle.await.unwrap().unwrap();
    }
}

/// Start a server for `config` on `127.0.0.1:0`.
pub async fn start_server(mut config: AppConfig) -> TestServer {
    config.listener.bind_address = "127.0.0.1:0".into();
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (config_updates, updates_rx) = mpsc::unbounded_channel();
    let server = HttpServer::new(config);
    let handle = tokio::spawn(server.run(listener, updates_rx, shutdown.subscribe()));

    TestServer {
        addr,
        shutdown,
        config_updates,
        handle,
    }
}

/// Config with the whole-response cache switched on or off.
#[allow(dead_code)]
pub fn config(response_cache: bool) -> AppConfig {
    let mut config = AppConfig::default();
    config.response_cache.enabled = response_cache;
    config
}
