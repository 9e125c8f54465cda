//! Route wiring.

use axum::{Router, routing::any};
use tower_http::trace::TraceLayer;

use crate::dispatcher::{DispatchState, send_message};

/// Path of the send-message endpoint.
pub const SEND_MESSAGE_PATH: &str = "/kirim-pesan";

/// Router with only the send-message endpoint.
///
/// Every method is routed to the dispatcher so that rejected methods still
/// get a JSON body.
#[must_use]
pub fn api_router(state: DispatchState) -> Router {
    routes().layer(TraceLayer::new_for_http()).with_state(state)
}

fn routes() -> Router<DispatchState> {
    Router::new().route(SEND_MESSAGE_PATH, any(send_message))
}

/// Full router: the send-message endpoint plus static assets from `web_dir`
/// (requires `static-files` feature).
///
/// # Example
/// ```ignore
/// let app = router(DispatchState::new(sessions), "web");
/// axum::serve(listener, app).await?;
/// ```
#[cfg(feature = "static-files")]
#[must_use]
pub fn router(state: DispatchState, web_dir: impl AsRef<std::path::Path>) -> Router {
    use tower_http::services::ServeDir;

    routes()
        .fallback_service(ServeDir::new(web_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
