//! HTTP and WebSocket front end
//!
//! Routes:
//! - `GET /ws` — WebSocket upgrade; one socket is one chat connection
//! - `GET /health` — hub occupancy as JSON
//! - everything else — the static client directory, when configured

use crate::config::ServerConfig;
use crate::error::{ChatError, Result};
use crate::hub::{Hub, HubHandle};
use crate::protocol::ClientEvent;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Build the application router around a running hub
pub fn router(hub: HubHandle, config: &ServerConfig) -> Result<Router> {
    let mut app: Router<HubHandle> = Router::new()
        .route("/ws", get(ws_upgrade))
        .route("/health", get(health));

    if let Some(dir) = &config.static_dir {
        tracing::info!(dir = %dir.display(), "Serving static client");
        app = app.fallback_service(ServeDir::new(dir));
    }

    Ok(app
        .layer(cors_layer(&config.cors_origins)?)
        .layer(TraceLayer::new_for_http())
        .with_state(hub))
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    if origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }

    let origins = origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|e| ChatError::Config(format!("Invalid CORS origin '{}': {}", o, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST]))
}

async fn health(
    State(hub): State<HubHandle>,
) -> std::result::Result<Json<serde_json::Value>, StatusCode> {
    let stats = hub
        .stats()
        .await
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;
    Ok(Json(serde_json::json!({ "status": "ok", "stats": stats })))
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(hub): State<HubHandle>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

async fn handle_socket(socket: WebSocket, hub: HubHandle) {
    let connection = match hub.connect().await {
        Ok(connection) => connection,
        Err(e) => {
            tracing::warn!(error = %e, "Rejecting WebSocket, hub unavailable");
            return;
        }
    };
    let (conn, mut events) = connection.into_parts();
    let (mut sender, mut receiver) = socket.split();

    // Hub → socket. Ends when the hub drops this connection's channel.
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let frame = match event.to_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to encode outbound event");
                    continue;
                }
            };
            if sender.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    // Socket → hub
    let recv_hub = hub.clone();
    let recv_conn = conn.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            let submitted = match msg {
                Message::Text(text) => match ClientEvent::parse(&text) {
                    Ok(event) => recv_hub.dispatch(&recv_conn, event),
                    Err(e) => {
                        tracing::warn!(conn = %recv_conn, error = %e, "Malformed frame");
                        recv_hub.report(&recv_conn, e)
                    }
                },
                Message::Close(_) => break,
                _ => Ok(()),
            };
            if submitted.is_err() {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
            // Wait out a dispatch that was already in flight
            let _ = recv_task.await;
        }
        _ = &mut recv_task => {}
    }

    if let Err(e) = hub.disconnect(&conn) {
        tracing::debug!(conn = %conn, error = %e, "Disconnect after hub shutdown");
    }
}

/// A running chat server: the hub plus the HTTP listener
pub struct ChatServer {
    addr: SocketAddr,
    hub: HubHandle,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

impl ChatServer {
    /// Validate `config`, start the hub, bind, and begin serving
    pub async fn start(config: &ServerConfig) -> Result<Self> {
        config.validate()?;

        let hub = Hub::spawn(config);
        let app = router(hub.clone(), config)?;

        let listener = TcpListener::bind(config.socket_addr()?).await?;
        let addr = listener.local_addr()?;

        let (shutdown, signal) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    signal.await.ok();
                })
                .await
        });

        tracing::info!(%addr, "Chat server listening");
        Ok(Self {
            addr,
            hub,
            shutdown,
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn hub(&self) -> &HubHandle {
        &self.hub
    }

    /// Stop accepting, close every chat connection, and wait for the listener
    pub async fn stop(self) -> Result<()> {
        let _ = self.shutdown.send(());
        self.hub.shutdown().await;

        match self.task.await {
            Ok(result) => result.map_err(ChatError::from),
            Err(e) => Err(ChatError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                e,
            ))),
        }
    }
}

/// Serve until Ctrl-C, then shut down gracefully
pub async fn run(config: &ServerConfig) -> Result<()> {
    let server = ChatServer::start(config).await?;
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");
    server.stop().await
}
