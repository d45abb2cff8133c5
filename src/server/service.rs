use super::auth::ResolvedServerAuth;
use super::routes;
use super::settings_store::ClusterConfigStore;
use crate::config::{BindMode, Config, ServerConfig};
use crate::plugins::PanelRegistry;

use anyhow::{Context, Result};
use axum::Router;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};

/// Shared state for the config server.
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<ServerConfig>,
    pub auth: Arc<ResolvedServerAuth>,
    pub settings: Arc<ClusterConfigStore>,
    pub panels: Arc<PanelRegistry>,
    pub shutdown_tx: broadcast::Sender<()>,
    pub start_time: std::time::Instant,
    pub version: String,
}

impl ServerState {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let settings = ClusterConfigStore::from_path(config.state_file.as_deref())?;
        let (shutdown_tx, _) = broadcast::channel(1);
        Ok(Self {
            config: Arc::new(config.clone()),
            auth: Arc::new(ResolvedServerAuth::from_config(&config.auth)),
            settings: Arc::new(settings),
            panels: Arc::new(PanelRegistry::with_builtin()),
            shutdown_tx,
            start_time: std::time::Instant::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// Trusted proxy subnets as shown in the SSO form, `None` when unset.
    pub fn trusted_proxies_display(&self) -> Option<String> {
        if self.config.trusted_proxies.is_empty() {
            None
        } else {
            Some(self.config.trusted_proxies.join(", "))
        }
    }
}

/// Reference backend serving the authenticator config endpoints.
pub struct ConfigServer {
    state: ServerState,
    addr: SocketAddr,
    shutdown_rx: broadcast::Receiver<()>,
}

impl ConfigServer {
    pub fn new(config: &Config, port: Option<u16>, bind: Option<&str>) -> Result<Self> {
        let port = port.unwrap_or(config.server.port);
        let addr = resolve_bind_address(&config.server, bind, port)?;

        info!("Resolving server authentication");
        let state = ServerState::new(&config.server)?;
        let shutdown_rx = state.shutdown_tx.subscribe();

        Ok(Self {
            state,
            addr,
            shutdown_rx,
        })
    }

    pub fn state(&self) -> &ServerState {
        &self.state
    }

    /// The configured address. [`ConfigServer::serve`] may be given another listener.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Sender that stops [`ConfigServer::serve`] when signalled.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.state.shutdown_tx.clone()
    }

    pub fn shutdown(&self) {
        let _ = self.state.shutdown_tx.send(());
    }

    /// Serve on `listener` until a shutdown is requested.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let Self {
            state,
            mut shutdown_rx,
            ..
        } = self;
        let local = listener.local_addr()?;
        let app = build_router(state.clone());

        info!("headerauth v{} listening on {}", state.version, local);
        print_startup_banner(&state, &local);

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await?;

        info!("Config server shut down gracefully");
        Ok(())
    }

    /// Bind the configured address and serve until Ctrl+C or SIGTERM.
    pub async fn run_until_shutdown(self) -> Result<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("Cannot bind {}", self.addr))?;
        tokio::spawn(shutdown_signal(self.shutdown_handle()));
        self.serve(listener).await
    }
}

fn build_router(state: ServerState) -> Router {
    routes::build_routes(state)
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }

    let _ = shutdown_tx.send(());
}

/// Resolve the bind address from configuration.
pub fn resolve_bind_address(
    config: &ServerConfig,
    bind_override: Option<&str>,
    port: u16,
) -> Result<SocketAddr> {
    let bind = match bind_override {
        Some(b) => b.parse::<BindMode>().map_err(anyhow::Error::msg)?,
        None => config.bind,
    };

    let host = match bind {
        BindMode::Loopback => "127.0.0.1",
        BindMode::Lan => "0.0.0.0",
        BindMode::Custom => config
            .custom_bind_host
            .as_deref()
            .context("Custom bind mode requires server.customBindHost")?,
    };

    let ip: IpAddr = host
        .parse()
        .with_context(|| format!("Invalid bind host '{host}'"))?;
    Ok(SocketAddr::new(ip, port))
}

fn print_startup_banner(state: &ServerState, addr: &SocketAddr) {
    info!("-------------------------------------------");
    info!("  headerauth config server v{}", state.version);
    info!("  Listening on: http://{}", addr);
    info!("  Auth mode: {}", state.auth.mode());
    info!(
        "  Trusted proxies: {}",
        state.trusted_proxies_display().as_deref().unwrap_or("none")
    );
    for panel in state.panels.list() {
        info!("  Panel {}: http://{}{}", panel.name, addr, panel.slice.config_path());
    }
    info!("  Health: http://{}/api/health", addr);
    info!("-------------------------------------------");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_modes_resolve() {
        let mut config = ServerConfig::default();
        assert_eq!(
            resolve_bind_address(&config, None, 9000).unwrap(),
            "127.0.0.1:9000".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            resolve_bind_address(&config, Some("lan"), 9001).unwrap(),
            "0.0.0.0:9001".parse::<SocketAddr>().unwrap()
        );

        config.bind = BindMode::Custom;
        assert!(resolve_bind_address(&config, None, 9000).is_err());
        config.custom_bind_host = Some("::1".into());
        assert_eq!(
            resolve_bind_address(&config, None, 9000).unwrap(),
            "[::1]:9000".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn invalid_bind_override_rejected() {
        let config = ServerConfig::default();
        let err = resolve_bind_address(&config, Some("tailnet"), 9000).unwrap_err();
        assert_eq!(err.to_string(), "invalid bind mode: tailnet");
    }

    #[test]
    fn trusted_proxies_joined_for_display() {
        let mut config = ServerConfig::default();
        assert_eq!(ServerState::new(&config).unwrap().trusted_proxies_display(), None);

        config.trusted_proxies = vec!["10.0.0.0/8".into(), "192.168.0.0/16".into()];
        assert_eq!(
            ServerState::new(&config).unwrap().trusted_proxies_display().as_deref(),
            Some("10.0.0.0/8, 192.168.0.0/16")
        );
    }
}
