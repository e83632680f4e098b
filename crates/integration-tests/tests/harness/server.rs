//! Test server wrapper that starts stablegate on a random port

use std::net::SocketAddr;
use std::sync::Arc;

use stablegate_config::Config;
use stablegate_imagegen::Generator;
use stablegate_server::Server;
use tokio_util::sync::CancellationToken;

use super::fake_client::FakeClient;

/// A running test server instance
pub struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    client: reqwest::Client,
}

impl TestServer {
    /// Start a test server wired to the configured (never contacted) gRPC endpoint
    pub async fn start(config: Config) -> anyhow::Result<Self> {
        let server = Server::new(&config)?;
        Self::serve(server).await
    }

    /// Start a test server whose generator talks to a fake client
    pub async fn with_client(config: Config, client: Arc<FakeClient>) -> anyhow::Result<Self> {
        let generator = Generator::from_config_with_client(&config.generation, client)?;
        let server = Server::with_generator(&config, Arc::new(generator));
        Self::serve(server).await
    }

    async fn serve(server: Server) -> anyhow::Result<Self> {
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        // Bind the listener here so we know the actual port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            axum::serve(listener, server.into_router())
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self {
            addr,
            shutdown,
            client: reqwest::Client::new(),
        })
    }

    /// Base URL of the running test server
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Get a reference to the HTTP client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
