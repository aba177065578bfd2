use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::state::SchedulingState;

pub fn scheduling_routes(state: Arc<SchedulingState>) -> Router {
    // Protected routes
    let protected_routes = Router::new()
        // Availability and booking
        .route("/slots/{doctor_id}", get(handlers::get_available_slots))
        .route("/", post(handlers::book_appointment))

        // Lifecycle transitions
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route("/{appointment_id}/complete", post(handlers::complete_appointment))

        // Listings
        .route("/patient", get(handlers::list_patient_appointments))
        .route("/doctor", get(handlers::list_doctor_appointments))

        // Doctor dashboard
        .route("/doctors/{doctor_id}/dashboard", get(handlers::get_doctor_dashboard))

        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
