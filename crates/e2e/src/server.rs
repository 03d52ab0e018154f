//! Static file server for the application under test

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::wait::wait_until;

/// Configuration for serving the application
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory holding the application's files
    pub root: PathBuf,

    /// Document fetched to decide the server is up
    pub entry: String,

    /// Port to listen on (None = any free port)
    pub port: Option<u16>,

    /// Timeout for server startup
    pub startup_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            entry: "index.html".to_string(),
            port: None,
            startup_timeout: Duration::from_secs(10),
        }
    }
}

/// Handle to a running in-process server
pub struct StaticServer {
    addr: SocketAddr,
    base_url: String,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl StaticServer {
    /// Serve `config.root` on localhost and wait until it answers
    pub async fn start(config: ServerConfig) -> E2eResult<Self> {
        if !config.root.is_dir() {
            return Err(E2eError::ServerStartup(format!(
                "{} is not a directory",
                config.root.display()
            )));
        }

        let listener = TcpListener::bind(("127.0.0.1", config.port.unwrap_or(0)))
            .await
            .map_err(|e| E2eError::ServerStartup(format!("Failed to bind: {}", e)))?;
        let addr = listener.local_addr()?;
        let base_url = format!("http://{}", addr);

        info!("Serving {} at {}", config.root.display(), base_url);

        let router = Router::new().fallback_service(ServeDir::new(&config.root));
        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let shutdown = async {
                let _ = rx.await;
            };
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
            {
                warn!("Static server stopped: {}", e);
            }
        });

        let server = StaticServer {
            addr,
            base_url,
            shutdown: Some(tx),
            task: Some(task),
        };

        server
            .wait_for_healthy(&config.entry, config.startup_timeout)
            .await?;
        info!("Server is healthy at {}", server.base_url);
        Ok(server)
    }

    async fn wait_for_healthy(&self, entry: &str, timeout: Duration) -> E2eResult<()> {
        let url = self.url(entry);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        wait_until(&url, timeout, Duration::from_millis(50), || {
            let client = client.clone();
            let url = url.clone();
            async move {
                match client.get(&url).send().await {
                    Ok(resp) if resp.status().is_success() => true,
                    Ok(resp) => {
                        debug!("Health check returned {}", resp.status());
                        false
                    }
                    Err(_) => false,
                }
            }
        })
        .await
        .map_err(|e| E2eError::ServerStartup(e.to_string()))
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of a document under the root
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Stop accepting connections and wait for the server task
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        debug!("Static server at {} stopped", self.base_url);
    }
}

impl Drop for StaticServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Resolve the application root against the working directory
pub fn resolve_root(root: &Path) -> E2eResult<PathBuf> {
    let root = if root.is_absolute() {
        root.to_path_buf()
    } else {
        std::env::current_dir()?.join(root)
    };
    Ok(root)
}
