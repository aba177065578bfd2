use std::env;
use tracing::warn;

pub const DEFAULT_HORIZON_DAYS: u32 = 14;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    /// How many calendar days ahead the availability listing looks.
    pub booking_horizon_days: u32,
    /// Whether cancelling an appointment frees its slot for rebooking.
    pub release_cancelled_slots: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using empty value");
                    String::new()
                }),
            booking_horizon_days: env::var("BOOKING_HORIZON_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_HORIZON_DAYS),
            release_cancelled_slots: env::var("RELEASE_CANCELLED_SLOTS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.jwt_secret.is_empty() && self.booking_horizon_days > 0
    }
}
