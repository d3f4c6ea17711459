//! Binding and running the observer API.

use std::net::SocketAddr;
use std::sync::Arc;

use codeshop_core::config::InfrastructureConfig;
use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Where the observer API listens.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface address, e.g. `127.0.0.1`.
    pub host: String,
    /// TCP port; 0 picks a free one.
    pub port: u16,
}

impl ServerConfig {
    fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let text = format!("{}:{}", self.host, self.port);
        text.parse().map_err(|source| ServerError::Address { text, source })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from(&InfrastructureConfig::default())
    }
}

impl From<&InfrastructureConfig> for ServerConfig {
    fn from(infra: &InfrastructureConfig) -> Self {
        Self {
            host: infra.observer_host.clone(),
            port: infra.observer_port,
        }
    }
}

/// Why the observer API could not start or stopped serving.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Host and port do not form a socket address.
    #[error("`{text}` is not a socket address")]
    Address {
        /// The rejected `host:port`.
        text: String,
        /// Parser error.
        source: std::net::AddrParseError,
    },

    /// The listener could not be opened.
    #[error("cannot listen on {addr}")]
    Bind {
        /// Address that was tried.
        addr: SocketAddr,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Accepting connections failed.
    #[error("observer API stopped serving")]
    Serve(#[source] std::io::Error),
}

/// Serve the observer API on `config` until the process exits.
///
/// # Errors
///
/// [`ServerError::Address`] or [`ServerError::Bind`] when the listener
/// cannot be set up, [`ServerError::Serve`] if serving fails later.
pub async fn start_server(config: &ServerConfig, state: Arc<AppState>) -> Result<(), ServerError> {
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!(%addr, "Observer API listening");

    axum::serve(listener, build_router(state))
        .await
        .map_err(ServerError::Serve)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use codeshop_core::config::CompanyConfig;
    use codeshop_core::operator::OperatorState;
    use codeshop_core::store::EntityStore;
    use tokio::sync::Mutex;

    use super::*;

    #[test]
    fn config_follows_infrastructure_settings() {
        let infra = InfrastructureConfig {
            observer_host: "0.0.0.0".to_owned(),
            observer_port: 9100,
            ..InfrastructureConfig::default()
        };
        let config = ServerConfig::from(&infra);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9100);
        assert_eq!(config.socket_addr().unwrap().port(), 9100);
    }

    #[tokio::test]
    async fn unparsable_host_is_rejected_before_binding() {
        let config = CompanyConfig::default();
        let operator = Arc::new(OperatorState::new(&config.simulation));
        let store = Arc::new(Mutex::new(EntityStore::new(config)));
        let state = Arc::new(AppState::new(store, operator));

        let server = ServerConfig {
            host: "not a host".to_owned(),
            port: 0,
        };
        let result = start_server(&server, state).await;
        assert!(matches!(result, Err(ServerError::Address { .. })));
    }
}
