use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use scheduling_cell::SchedulingState;
use scheduling_cell::router::scheduling_routes;

pub fn create_router(state: Arc<SchedulingState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic scheduling API is running!" }))
        .nest("/appointments", scheduling_routes(state))
}
