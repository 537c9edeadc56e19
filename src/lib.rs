use anyhow::Context;
use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, error, info, warn};

pub mod auth;
pub mod collection;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod openapi;
pub mod openapi_schemas;
pub mod registry;
pub mod store;
pub mod validation;

use crate::config::{Config, CorsConfig};
use crate::registry::ScriptRegistry;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ScriptRegistry>,
    pub api_key: Option<Arc<str>>,
}

impl AppState {
    pub fn new(registry: ScriptRegistry, api_key: Option<String>) -> Self {
        Self {
            registry: Arc::new(registry),
            api_key: api_key.map(Arc::from),
        }
    }
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(auth::API_KEY_HEADER),
            HeaderName::from_static(middleware::REQUEST_ID_HEADER),
        ]);

    if config.allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Assemble the HTTP surface. Mutating routes sit behind the API-key gate.
pub fn build_router(state: AppState, cors: &CorsConfig) -> Router {
    let protected = Router::new()
        .route(
            "/scripts/v1/{video}/{script}",
            post(handlers::upsert_script).delete(handlers::delete_script),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    Router::new()
        .route("/scripts/v1/{video}", get(handlers::list_scripts))
        .route("/health", get(handlers::health))
        .route("/openapi.json", get(openapi::openapi_json))
        .route("/", get(openapi::docs_page))
        .merge(protected)
        .layer(axum::middleware::from_fn(
            crate::middleware::request_id_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors))
        .with_state(state)
}

/// Open the configured store, bind and serve until `shutdown_rx` fires.
///
/// Returns the bound port, which differs from the configured one when that
/// was 0.
pub async fn start_server_with_config(
    config: Config,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> anyhow::Result<u16> {
    let store = store::open_store(&config.store).await?;

    if config.auth.api_key.is_none() {
        warn!("No API key configured; mutating endpoints will refuse every request");
    }

    let state = AppState::new(ScriptRegistry::new(store), config.auth.api_key.clone());
    let app = build_router(state, &config.cors);

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    let local_addr = listener.local_addr()?;
    info!("listening on {}", local_addr);
    debug!(
        "Server configuration - host: {}, port: {}",
        config.server.host, config.server.port
    );

    tokio::spawn(async move {
        let shutdown = async {
            let _ = shutdown_rx.await;
            info!("Shutdown signal received");
        };
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
        {
            error!("server error: {}", e);
        }
    });

    Ok(local_addr.port())
}
