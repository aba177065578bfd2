// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::{parse_subject, require_doctor, require_patient};

use crate::models::{BookSlotRequest, Requester, SchedulingError};
use crate::state::SchedulingState;

/// GET /appointments/slots/{doctor_id}
pub async fn get_available_slots(
    State(state): State<Arc<SchedulingState>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let days = state
        .booking
        .available_slots(doctor_id)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "doctor_id": doctor_id,
        "days": days
    })))
}

/// POST /appointments
pub async fn book_appointment(
    State(state): State<Arc<SchedulingState>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookSlotRequest>,
) -> Result<Json<Value>, AppError> {
    let requester = requester_from(&user)?;
    info!(
        "Booking request for doctor {} at {} {}",
        request.doctor_id, request.slot_date, request.slot_time
    );

    let appointment = state
        .booking
        .book(requester, request)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

/// POST /appointments/{appointment_id}/cancel
pub async fn cancel_appointment(
    State(state): State<Arc<SchedulingState>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let requester = requester_from(&user)?;
    let appointment = state
        .lifecycle
        .cancel(requester, appointment_id)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

/// POST /appointments/{appointment_id}/complete
pub async fn complete_appointment(
    State(state): State<Arc<SchedulingState>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let requester = requester_from(&user)?;
    let appointment = state
        .lifecycle
        .complete(requester, appointment_id)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

/// GET /appointments/patient
pub async fn list_patient_appointments(
    State(state): State<Arc<SchedulingState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let patient_id = require_patient(&user)?;
    let appointments = state
        .booking
        .appointments_for_patient(patient_id)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "appointments": appointments
    })))
}

/// GET /appointments/doctor
pub async fn list_doctor_appointments(
    State(state): State<Arc<SchedulingState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let doctor_id = require_doctor(&user)?;
    let appointments = state
        .booking
        .appointments_for_doctor(doctor_id)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "appointments": appointments
    })))
}

/// GET /appointments/doctors/{doctor_id}/dashboard
pub async fn get_doctor_dashboard(
    State(state): State<Arc<SchedulingState>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let requester = requester_from(&user)?;
    let summary = state
        .dashboard
        .summarize(requester, doctor_id)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "dashboard": summary
    })))
}

fn requester_from(user: &User) -> Result<Requester, AppError> {
    if user.has_role("admin") {
        return Ok(Requester::Admin);
    }
    if user.has_role("doctor") {
        return Ok(Requester::Doctor(parse_subject(user)?));
    }
    if user.has_role("patient") {
        return Ok(Requester::Patient(parse_subject(user)?));
    }
    Err(AppError::Auth("Unrecognized role".to_string()))
}

fn map_scheduling_error(err: SchedulingError) -> AppError {
    let message = err.to_string();
    match err {
        SchedulingError::DoctorNotFound | SchedulingError::AppointmentNotFound => {
            AppError::NotFound(message)
        }
        SchedulingError::DoctorUnavailable
        | SchedulingError::InvalidSlot
        | SchedulingError::SlotInPast => AppError::BadRequest(message),
        SchedulingError::SlotTaken | SchedulingError::AlreadyFinalized => {
            AppError::Conflict(message)
        }
        SchedulingError::Unauthorized => AppError::Auth(message),
        SchedulingError::Storage(_) => AppError::Storage(message),
    }
}
