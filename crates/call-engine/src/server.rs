//! # Hotline Server
//!
//! TCP front end for the call center engine. Clients send one JSON request
//! per line and receive one JSON response per line; ring timeout
//! notifications are pushed to every connected client as they happen.
//!
//! ```text
//! ┌────────────┐  {"command":"call","id":1}     ┌──────────────────┐
//! │   client   │ ─────────────────────────────▶ │ connection task  │──┐
//! │            │ ◀───────────────────────────── │  (one per peer)  │  │ execute
//! └────────────┘  {"message":"Call 1 ..."}      └────────▲─────────┘  ▼
//!                                                        │   ┌──────────────────┐
//!                                      notifications ────┴───│ CallCenterEngine │
//!                                                            └──────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use hotline_call_engine::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let mut server = HotlineServerBuilder::new()
//!     .with_config(HotlineConfig::default())
//!     .build()
//!     .await?;
//!
//! server.start()?;
//! println!("listening on {}", server.local_addr());
//!
//! tokio::signal::ctrl_c().await?;
//! server.stop().await;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::net::SocketAddr;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::command::{Request, Response};
use crate::config::HotlineConfig;
use crate::error::{HotlineError, Result};
use crate::framing::{Frame, FrameReader};
use crate::orchestrator::CallCenterEngine;

/// TCP server bound to a listen address and backed by one engine
pub struct HotlineServer {
    /// The engine shared by all connections
    engine: CallCenterEngine,

    /// Server configuration
    config: HotlineConfig,

    /// Bound listener, handed to the accept task on start
    listener: Option<TcpListener>,

    /// Actual bound address (resolves port 0)
    local_addr: SocketAddr,

    /// Handle to the accept task
    accept_handle: Option<JoinHandle<()>>,
}

impl HotlineServer {
    /// Bind the listener and start the engine task
    pub async fn new(config: HotlineConfig) -> Result<Self> {
        config.validate()?;
        let bind_addr = config.server.socket_addr()?;

        let engine = CallCenterEngine::start(&config)?;
        let listener = TcpListener::bind(bind_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("🚀 Hotline server bound to {}", local_addr);

        Ok(Self {
            engine,
            config,
            listener: Some(listener),
            local_addr,
            accept_handle: None,
        })
    }

    /// Start accepting connections
    pub fn start(&mut self) -> Result<()> {
        let listener = self
            .listener
            .take()
            .ok_or_else(|| HotlineError::config("server already started"))?;

        let engine = self.engine.clone();
        let max_frame_length = self.config.server.max_frame_length;
        self.accept_handle = Some(tokio::spawn(accept_loop(listener, engine, max_frame_length)));
        info!("✅ Hotline server accepting connections on {}", self.local_addr);
        Ok(())
    }

    /// Stop accepting and close every open connection
    pub async fn stop(&mut self) {
        info!("🛑 Stopping hotline server...");

        if let Some(handle) = self.accept_handle.take() {
            handle.abort();
            let _ = handle.await;
        }

        info!("✅ Hotline server stopped");
    }

    /// Start, wait for `shutdown` to resolve, then stop
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.start()?;
        shutdown.await;
        self.stop().await;
        Ok(())
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        self.accept_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Get a reference to the engine
    pub fn engine(&self) -> &CallCenterEngine {
        &self.engine
    }

    pub fn config(&self) -> &HotlineConfig {
        &self.config
    }
}

impl Drop for HotlineServer {
    fn drop(&mut self) {
        if let Some(handle) = self.accept_handle.take() {
            handle.abort();
        }
    }
}

async fn accept_loop(listener: TcpListener, engine: CallCenterEngine, max_frame_length: usize) {
    // Dropping the set on abort tears down every connection task
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let span = info_span!("connection", id = %Uuid::new_v4(), %peer);
                    let engine = engine.clone();
                    connections.spawn(
                        async move {
                            if let Err(e) = serve_connection(stream, engine, max_frame_length).await {
                                warn!("Connection closed with error: {}", e);
                            }
                        }
                        .instrument(span),
                    );
                }
                Err(e) => warn!("Failed to accept connection: {}", e),
            },
            Some(finished) = connections.join_next() => {
                if let Err(e) = finished {
                    if e.is_panic() {
                        error!("Connection task panicked: {}", e);
                    }
                }
            }
        }
    }
}

async fn serve_connection(
    stream: TcpStream,
    engine: CallCenterEngine,
    max_frame_length: usize,
) -> Result<()> {
    info!("🔌 Client connected");

    let (reader, mut writer) = stream.into_split();
    let mut frames = FrameReader::new(reader, max_frame_length);
    let mut notifications = engine.subscribe();

    loop {
        tokio::select! {
            frame = frames.next_frame() => {
                let line = match frame? {
                    Some(Frame::Line(line)) => line,
                    Some(Frame::Rejected(e)) => {
                        warn!("Rejected frame: {}", e);
                        writer.write_all(Response::new(e.to_string()).to_line()?.as_bytes()).await?;
                        continue;
                    }
                    None => break,
                };
                if line.trim().is_empty() {
                    continue;
                }

                let response = match Request::from_json(&line) {
                    Ok(request) => {
                        debug!("📨 Request: {} {}", request.command, request.id);
                        engine.respond(&request).await
                    }
                    Err(e) => {
                        warn!("Undecodable frame {:?}: {}", line, e);
                        Response::new(e.to_string())
                    }
                };
                writer.write_all(response.to_line()?.as_bytes()).await?;
            }
            notification = notifications.recv() => match notification {
                Ok(notification) => {
                    let frame = Response::notification(notification.message);
                    writer.write_all(frame.to_line()?.as_bytes()).await?;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Client fell behind, {} notifications dropped", skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    info!("🔌 Client disconnected");
    Ok(())
}

/// Builder for HotlineServer with fluent API
pub struct HotlineServerBuilder {
    config: Option<HotlineConfig>,
    bind_addr: Option<String>,
}

impl HotlineServerBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            config: None,
            bind_addr: None,
        }
    }

    /// Set the configuration
    pub fn with_config(mut self, config: HotlineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Override the configured listen address
    pub fn with_bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = Some(addr.into());
        self
    }

    /// Build the server
    pub async fn build(self) -> Result<HotlineServer> {
        let mut config = self
            .config
            .ok_or_else(|| HotlineError::config("Configuration not provided"))?;

        if let Some(addr) = self.bind_addr {
            config.server.bind_addr = addr;
        }

        HotlineServer::new(config).await
    }
}

impl Default for HotlineServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
