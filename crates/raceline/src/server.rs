//! Server assembly: WebSocket accept loop plus the HTTP status surface.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use raceline_countdown::CountdownConfig;
use raceline_transport::{Transport, WebSocketTransport};

use crate::coordinator::SharedState;
use crate::error::RacelineError;
use crate::handler::handle_connection;
use crate::http;

/// Builder for [`RacelineServer`].
pub struct RacelineServerBuilder {
    ws_addr: String,
    http_addr: Option<String>,
    countdown: CountdownConfig,
}

impl RacelineServerBuilder {
    /// Address the WebSocket endpoint binds to. Use port 0 in tests to
    /// get an ephemeral port.
    pub fn bind(mut self, addr: impl Into<String>) -> Self {
        self.ws_addr = addr.into();
        self
    }

    /// Address for the HTTP status endpoints. Off unless set.
    pub fn http_bind(mut self, addr: impl Into<String>) -> Self {
        self.http_addr = Some(addr.into());
        self
    }

    /// Overrides the countdown timing.
    pub fn countdown(mut self, config: CountdownConfig) -> Self {
        self.countdown = config;
        self
    }

    /// Binds the listeners and returns a server ready to run.
    pub async fn build(self) -> Result<RacelineServer, RacelineError> {
        let transport = WebSocketTransport::bind(&self.ws_addr).await?;
        let http_listener = match &self.http_addr {
            Some(addr) => Some(TcpListener::bind(addr).await?),
            None => None,
        };
        Ok(RacelineServer {
            transport,
            http_listener,
            shared: Arc::new(SharedState::with_countdown(self.countdown)),
        })
    }
}

/// The session-coordination server: accepts WebSocket connections and
/// spawns a handler task per client.
pub struct RacelineServer {
    transport: WebSocketTransport,
    http_listener: Option<TcpListener>,
    shared: Arc<SharedState>,
}

impl RacelineServer {
    pub fn builder() -> RacelineServerBuilder {
        RacelineServerBuilder {
            ws_addr: "0.0.0.0:3000".to_string(),
            http_addr: None,
            countdown: CountdownConfig::default(),
        }
    }

    /// The bound WebSocket address (resolves port 0 binds).
    pub fn local_addr(&self) -> Result<SocketAddr, RacelineError> {
        Ok(self.transport.local_addr()?)
    }

    /// The bound HTTP address, if the status surface is enabled.
    pub fn http_addr(&self) -> Option<SocketAddr> {
        self.http_listener
            .as_ref()
            .and_then(|l| l.local_addr().ok())
    }

    /// Handle to the shared session state.
    pub fn shared(&self) -> Arc<SharedState> {
        Arc::clone(&self.shared)
    }

    /// Runs the accept loop forever (and the HTTP surface, if enabled).
    pub async fn run(mut self) -> Result<(), RacelineError> {
        if let Some(listener) = self.http_listener.take() {
            if let Ok(addr) = listener.local_addr() {
                info!(%addr, "http status surface listening");
            }
            let shared = Arc::clone(&self.shared);
            tokio::spawn(async move {
                if let Err(err) = http::serve(listener, shared).await {
                    error!(error = %err, "http surface stopped");
                }
            });
        }

        info!(addr = %self.local_addr()?, "accepting websocket connections");
        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let shared = Arc::clone(&self.shared);
                    tokio::spawn(handle_connection(conn, shared));
                }
                Err(err) => {
                    // Per-connection accept failures (e.g. a bad
                    // handshake) don't take the server down.
                    error!(error = %err, "failed to accept connection");
                }
            }
        }
    }
}
