//! Server Implementation
//!
//! HTTP / WebSocket 服务器启动和优雅关闭

use crate::api;
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::core::{Config, Result, ServerState};
use crate::orders::DelayMonitor;

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> Result<()> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config)?,
        };

        let mut tasks = BackgroundTasks::new();
        let monitor = DelayMonitor::new(
            state.coordinator.clone(),
            state.gateway.clone(),
            self.config.delay_thresholds(),
            self.config.delay_interval(),
            tasks.shutdown_token(),
        );
        tasks.spawn("delay_monitor", TaskKind::Periodic, monitor.run());
        tasks.log_summary();

        let app = api::build_app(state.clone());
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(%addr, environment = %self.config.environment, "POS edge server listening");

        let shutdown_token = state.shutdown.clone();
        let shutdown = async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = shutdown_token.cancelled() => {}
            }
            tracing::info!("Shutting down...");
            // 通知 WebSocket 连接退出，否则 graceful shutdown 会一直等待
            shutdown_token.cancel();
        };

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        let timeout = self.config.shutdown_timeout();
        if tokio::time::timeout(timeout, tasks.shutdown()).await.is_err() {
            tracing::warn!(
                timeout_ms = timeout.as_millis() as u64,
                "Background tasks did not stop in time"
            );
        }
        Ok(())
    }
}
