use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::{handle_health, handle_webhook};
use crate::dispatch::Dispatcher;

pub struct RelayServer {
    pub port: u16,
    pub dispatcher: Arc<Dispatcher>,
}

impl RelayServer {
    pub fn new(port: u16, dispatcher: Arc<Dispatcher>) -> Self {
        Self { port, dispatcher }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handle_health))
            .route("/webhook", post(handle_webhook))
            .with_state(self.dispatcher.clone())
            .layer(TraceLayer::new_for_http())
    }

    pub async fn start(&self) -> Result<(), String> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!(%addr, "relay listening");
        axum::Server::bind(&addr)
            .serve(self.router().into_make_service())
            .await
            .map_err(|err| err.to_string())
    }
}
