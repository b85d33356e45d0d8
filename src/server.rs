use std::collections::HashSet;

use anyhow::{Context, Result};
use axum::{body::Bytes, extract::State, http::StatusCode, routing::post, Router};
use teloxide::types::Update;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::RouterError;

/// Where deliveries for one endpoint go.
#[derive(Clone)]
pub struct WebhookRoute {
    pub endpoint: String,
    pub path: String,
    pub tx: mpsc::Sender<Update>,
}

fn route_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// One `POST` route per endpoint, each feeding that endpoint's stream.
pub fn router(routes: Vec<WebhookRoute>) -> Result<Router, RouterError> {
    let mut seen = HashSet::new();
    let mut app = Router::new();
    for mut route in routes {
        route.path = route_path(&route.path);
        if !seen.insert(route.path.clone()) {
            return Err(RouterError::Config(format!(
                "configure listen_path: {} is used by more than one endpoint",
                route.path
            )));
        }
        info!(
            "listening for a webhook for endpoint {} on {}",
            route.endpoint, route.path
        );
        let path = route.path.clone();
        app = app.route(&path, post(deliver).with_state(route));
    }
    Ok(app)
}

async fn deliver(State(route): State<WebhookRoute>, body: Bytes) -> StatusCode {
    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!("endpoint {}: cannot parse update: {}", route.endpoint, e);
            return StatusCode::BAD_REQUEST;
        }
    };
    debug!("endpoint {}: update {} received", route.endpoint, update.id.0);
    match route.tx.send(update).await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Binds the listen address; a bare ":port" listens on all interfaces.
pub async fn bind(listen_address: &str) -> Result<TcpListener> {
    let addr = if listen_address.starts_with(':') {
        format!("0.0.0.0{}", listen_address)
    } else {
        listen_address.to_string()
    };
    TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))
}

pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    axum::serve(listener, app)
        .await
        .context("Webhook server error")
}
