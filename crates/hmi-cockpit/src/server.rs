//! [`CockpitServer`] – HTTP + WebSocket server for the panel UI.
//!
//! Listens on `0.0.0.0:8080` (configurable via
//! [`CockpitServer::with_port`]).
//!
//! * Regular HTTP requests → 200 OK with the embedded panel HTML.
//! * WebSocket upgrades → bidirectional bridge to the [`HmiPanel`].

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use hmi_bus::BusAdapter;
use hmi_panel::{HmiPanel, PanelEvent};
use hmi_types::HmiError;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::warn;

/// Default TCP port for the panel HTTP/WebSocket server.
pub const DEFAULT_PORT: u16 = 8080;

/// The compiled-in panel single-page application (HTML + CSS + JS).
const PANEL_HTML: &str = include_str!("panel.html");

// ---------------------------------------------------------------------------
// CockpitServer
// ---------------------------------------------------------------------------

/// Lightweight HTTP + WebSocket server that serves the panel UI and
/// bridges the panel's notification channel to every connected browser.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use hmi_bus::MessageBus;
/// use hmi_panel::HmiPanel;
/// use hmi_cockpit::CockpitServer;
///
/// #[tokio::main]
/// async fn main() {
///     let bus = MessageBus::default();
///     let panel = Arc::new(HmiPanel::new(bus));
///     panel.load_config(None);
///     CockpitServer::new(Arc::clone(&panel))
///         .run_server()
///         .await
///         .expect("cockpit server failed");
/// }
/// ```
pub struct CockpitServer {
    panel: Arc<HmiPanel>,
    port: u16,
}

impl CockpitServer {
    /// Create a server for `panel` on the [`DEFAULT_PORT`].
    pub fn new(panel: Arc<HmiPanel>) -> Self {
        Self {
            panel,
            port: DEFAULT_PORT,
        }
    }

    /// Override the listening port (builder-style).
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Return the configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Start the server.
    ///
    /// Listens for TCP connections and dispatches each one as either a
    /// WebSocket bridge (when the HTTP request contains `Upgrade:
    /// websocket`) or a plain HTTP response serving the panel HTML.
    ///
    /// # Errors
    ///
    /// Returns [`HmiError::Io`] if the TCP listener cannot bind.
    pub async fn run_server(&self) -> Result<(), HmiError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr).await?;

        println!("[hmi-cockpit] panel UI listening on http://localhost:{}", self.port);

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let panel = Arc::clone(&self.panel);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, peer, panel).await {
                            warn!(%peer, "client error: {e}");
                        }
                    });
                }
                Err(e) => {
                    warn!("accept error: {e}");
                }
            }
        }
    }
}

#[async_trait]
impl BusAdapter for CockpitServer {
    fn name(&self) -> &str {
        "cockpit"
    }

    async fn run(&self) -> Result<(), HmiError> {
        self.run_server().await
    }
}

// ---------------------------------------------------------------------------
// Per-connection handler
// ---------------------------------------------------------------------------

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    panel: Arc<HmiPanel>,
) -> Result<(), HmiError> {
    // Peek at the first bytes of the request to decide whether to upgrade
    // to WebSocket or serve the static HTML.  `peek` does not consume the
    // data, so tungstenite's handshaker sees the full HTTP request.
    let mut buf = [0u8; 1024];
    let n = stream.peek(&mut buf).await?;

    let header_preview = String::from_utf8_lossy(&buf[..n]);
    let is_ws_upgrade = header_preview.lines().any(|line| {
        line.to_lowercase().starts_with("upgrade:") && line.to_lowercase().contains("websocket")
    });

    if is_ws_upgrade {
        handle_ws(stream, peer, panel).await
    } else {
        serve_html(stream).await
    }
}

// ---------------------------------------------------------------------------
// Plain HTTP: serve the embedded panel HTML
// ---------------------------------------------------------------------------

async fn serve_html(mut stream: TcpStream) -> Result<(), HmiError> {
    let body = PANEL_HTML;
    let response = format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: text/html; charset=utf-8\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// WebSocket: bidirectional panel bridge
// ---------------------------------------------------------------------------

async fn handle_ws(
    stream: TcpStream,
    peer: SocketAddr,
    panel: Arc<HmiPanel>,
) -> Result<(), HmiError> {
    let ws_stream = accept_async(stream).await.map_err(|e| {
        HmiError::Channel(format!("WS handshake from {peer}: {e}"))
    })?;

    let (mut ws_tx, mut ws_rx) = ws_stream.split();
    let mut panel_rx = panel.subscribe_events();

    // Bring a fresh tab in sync before live events start flowing.
    let snapshot = [
        PanelEvent::NamespaceChanged {
            namespace: panel.namespace(),
        },
        PanelEvent::Display {
            text: panel.display_text(),
            selected: panel.selected_line(),
        },
    ];
    for event in snapshot {
        if let Ok(json) = serde_json::to_string(&event) {
            if ws_tx.send(Message::Text(json.into())).await.is_err() {
                return Ok(());
            }
        }
    }

    loop {
        tokio::select! {
            // ── Downstream: panel → browser ────────────────────────────────
            result = panel_rx.recv() => {
                match result {
                    Ok(event) => {
                        match serde_json::to_string(&event) {
                            Ok(json) => {
                                if ws_tx.send(Message::Text(json.into())).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                warn!("serialization error: {e}");
                            }
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        warn!(%peer, "ws client lagged by {n} events");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            // ── Upstream: browser → panel ───────────────────────────────────
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_upstream_message(text.as_str(), &panel);
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Upstream message parser
// ---------------------------------------------------------------------------

/// Parse an incoming WebSocket text message from the panel browser and
/// apply it to the [`HmiPanel`].
///
/// Recognised ops:
///
/// | Op | Effect |
/// |---|---|
/// | `press` + `target: "hmi"` (default) | publishes the button code on the HMI button topic |
/// | `press` + `target: "create3"` | publishes the button code on the Create3 button topic |
/// | `set_namespace` | changes the robot namespace, rebinding all topics |
///
/// Unknown messages are silently ignored.
pub(crate) fn handle_upstream_message(text: &str, panel: &Arc<HmiPanel>) {
    let Ok(json) = serde_json::from_str::<Value>(text) else {
        return;
    };

    let op = json.get("op").and_then(|o| o.as_str()).unwrap_or("");

    if op == "press" {
        let Some(button) = json.get("button").and_then(|b| b.as_i64()) else {
            return;
        };
        let target = json.get("target").and_then(|t| t.as_str()).unwrap_or("hmi");
        match target {
            "create3" => panel.press_create3_button(button as i32),
            _ => panel.press_hmi_button(button as i32),
        }
        return;
    }

    if op == "set_namespace" {
        if let Some(ns) = json.get("value").and_then(|v| v.as_str()) {
            if !ns.trim().is_empty() {
                panel.set_namespace(ns.trim());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
