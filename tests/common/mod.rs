#![allow(dead_code)]

use ivescripts::{config, start_server_with_config};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, oneshot};

/// Key configured by `Config::test_config_with_port`
pub const TEST_API_KEY: &str = "test-api-key";

/// Test server with proper shutdown support
pub struct TestServer {
    port: u16,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestServer {
    /// Start a test server on an ephemeral port with the in-memory store
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with_config(config::Config::test_config_with_port(0)).await
    }

    pub async fn start_with_config(config: config::Config) -> anyhow::Result<Self> {
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let port = start_server_with_config(config, shutdown_rx).await?;

        Ok(Self {
            port,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// Get the port the server is running on
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            // Give server time to shut down
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Tracks the servers a test started so they can be stopped together
pub struct TestContext {
    servers: Arc<Mutex<Vec<TestServer>>>,
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            servers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Start a new server and add it to the context
    pub async fn start_server(&self) -> anyhow::Result<u16> {
        self.start_server_with_config(config::Config::test_config_with_port(0))
            .await
    }

    pub async fn start_server_with_config(&self, config: config::Config) -> anyhow::Result<u16> {
        let server = TestServer::start_with_config(config).await?;
        let port = server.port();
        self.servers.lock().await.push(server);
        Ok(port)
    }

    /// Cleanup all servers
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        let mut servers = self.servers.lock().await;
        for server in servers.drain(..) {
            server.shutdown().await;
        }
        Ok(())
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for server to be ready with retries
pub async fn wait_for_server(port: u16, max_attempts: u32) -> anyhow::Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(500))
        .build()?;

    for attempt in 1..=max_attempts {
        if let Ok(response) = client
            .get(format!("http://127.0.0.1:{}/health", port))
            .send()
            .await
            && response.status().is_success()
        {
            return Ok(());
        }

        if attempt < max_attempts {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    Err(anyhow::anyhow!(
        "Server not ready after {} attempts",
        max_attempts
    ))
}

/// URL of the collection for `video`
pub fn video_url(port: u16, video: &str) -> String {
    format!(
        "http://127.0.0.1:{}/scripts/v1/{}",
        port,
        urlencoding::encode(video)
    )
}

/// URL of a single script entry
pub fn script_url(port: u16, video: &str, script: &str) -> String {
    format!("{}/{}", video_url(port, video), urlencoding::encode(script))
}
