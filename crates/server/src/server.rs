use axum::{
    Json, Router,
    http::{HeaderValue, Method},
    routing::{delete, get, post},
};
use tower_http::cors::{Any, CorsLayer};

use std::sync::Arc;

use crate::{expenses, groups, settlements};
use api_types::health::Health;
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

async fn health() -> Json<Health> {
    Json(Health { ok: true })
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/groups", get(groups::list).post(groups::create))
        .route(
            "/api/groups/{group_id}",
            get(groups::get).delete(groups::delete),
        )
        .route("/api/groups/{group_id}/settle", post(groups::settle))
        .route(
            "/api/groups/{group_id}/expenses",
            get(expenses::list).post(expenses::create),
        )
        .route(
            "/api/groups/{group_id}/expenses/{expense_id}",
            delete(expenses::delete),
        )
        .route(
            "/api/groups/{group_id}/settlements",
            get(settlements::list),
        )
        .route(
            "/api/groups/{group_id}/settlements-by-category",
            get(settlements::by_category),
        )
        .with_state(state)
}

/// Browser access is limited to `origin` when given, open to any origin
/// otherwise.
fn cors(origin: Option<&str>) -> Result<CorsLayer, std::io::Error> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);

    match origin {
        Some(origin) => {
            let origin = HeaderValue::from_str(origin).map_err(|err| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("invalid cors origin {origin:?}: {err}"),
                )
            })?;
            Ok(layer.allow_origin(origin))
        }
        None => Ok(layer.allow_origin(Any)),
    }
}

pub async fn run(engine: Engine, address: &str, cors_origin: Option<&str>) {
    let listener = match tokio::net::TcpListener::bind(address).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {address}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener, cors_origin).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
    cors_origin: Option<&str>,
) -> Result<(), std::io::Error> {
    let cors = cors(cors_origin)?;
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state).layer(cors)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
    cors_origin: Option<String>,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener, cors_origin.as_deref()).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
