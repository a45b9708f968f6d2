pub mod handlers;

use std::future::Future;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

pub use handlers::ApiState;

/// Build the full HTTP surface. Everything lives under `/api`; health and
/// metrics are also served at the root for probes and scrapers.
pub fn router(state: ApiState, cors_origins: &[String]) -> Router {
    let api_routes = Router::new()
        .route("/announce", post(handlers::handle_announce))
        .route("/peers", post(handlers::handle_get_peers))
        .route("/complete", post(handlers::handle_complete))
        .route("/signal", post(handlers::handle_signal))
        .route("/signals", get(handlers::handle_poll_signals))
        .route("/turn-credentials", get(handlers::handle_turn_credentials))
        .route("/health", get(handlers::handle_health))
        .route("/metrics", get(handlers::handle_metrics));

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(handlers::handle_health))
        .route("/metrics", get(handlers::handle_metrics))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(allowed))
}

/// Serve `app` on an already-bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "API listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
