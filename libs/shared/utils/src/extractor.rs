use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::jwt::validate_token;

/// Authentication middleware: validates the bearer token and stores the
/// resulting `User` in request extensions for downstream handlers.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    if !auth_value.starts_with("Bearer ") {
        return Err(AppError::Auth("Invalid authorization header format".to_string()));
    }

    let token = &auth_value[7..];

    let user = validate_token(token, &config.jwt_secret).map_err(AppError::Auth)?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Caller must be a patient; returns their id.
pub fn require_patient(user: &User) -> Result<Uuid, AppError> {
    if !user.has_role("patient") {
        return Err(AppError::Auth("Patient role required".to_string()));
    }
    parse_subject(user)
}

/// Caller must be a doctor; returns their id.
pub fn require_doctor(user: &User) -> Result<Uuid, AppError> {
    if !user.has_role("doctor") {
        return Err(AppError::Auth("Doctor role required".to_string()));
    }
    parse_subject(user)
}

pub fn is_admin(user: &User) -> bool {
    user.has_role("admin")
}

pub fn parse_subject(user: &User) -> Result<Uuid, AppError> {
    Uuid::parse_str(&user.id)
        .map_err(|_| AppError::Auth("Token subject is not a valid id".to_string()))
}
