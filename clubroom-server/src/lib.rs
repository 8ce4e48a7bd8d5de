use std::time::Duration;

use axum::{error_handling::HandleErrorLayer, http::StatusCode, routing::get, BoxError, Router};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

mod error;
mod extractors;
mod handlers;
mod lifecycle;
mod parent;
mod policy;
mod store;
#[cfg(test)]
mod tests;

pub use error::Error;
pub use extractors::{AppState, Auth, PreAuth, AUTH_HEADER};
pub use parent::{Parent, ParentKind, ParentRegistry};
pub use store::{ReconcileReport, Store};

/// Assemble the full application router. The comment router is built once
/// and nested under every parent surface; reply depth beyond one path level
/// lives in the data relationship, reachable through `/api/comments`.
pub fn app(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/", get(root))
        .nest("/api/users", handlers::users::router())
        .nest("/api/clubs", handlers::clubs::router())
        .nest("/api/posts", handlers::posts::router())
        .nest("/api/gigs", handlers::gigs::router())
        .nest("/api/comments", handlers::comments::root_router())
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(on_middleware_error))
                .timeout(request_timeout),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> &'static str {
    "clubroom"
}

async fn on_middleware_error(err: BoxError) -> (StatusCode, String) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            String::from("request timed out"),
        )
    } else {
        tracing::error!(?err, "middleware error");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("unhandled internal error: {err}"),
        )
    }
}
