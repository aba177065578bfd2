// libs/scheduling-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Fixed duration in minutes separating consecutive slot start times.
pub const SLOT_MINUTES: u32 = 30;

/// How many appointments the doctor dashboard surfaces as "recent".
pub const RECENT_APPOINTMENTS_LIMIT: usize = 5;

/// Slot time labels travel as `HH:MM` strings on the wire.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}

// ==============================================================================
// DOCTOR SCHEDULE PREFERENCES
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DayOfWeek {
    Sun,
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
}

impl DayOfWeek {
    pub fn from_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Sun => DayOfWeek::Sun,
            Weekday::Mon => DayOfWeek::Mon,
            Weekday::Tue => DayOfWeek::Tue,
            Weekday::Wed => DayOfWeek::Wed,
            Weekday::Thu => DayOfWeek::Thu,
            Weekday::Fri => DayOfWeek::Fri,
            Weekday::Sat => DayOfWeek::Sat,
        }
    }

    pub fn weekdays() -> Vec<DayOfWeek> {
        vec![
            DayOfWeek::Mon,
            DayOfWeek::Tue,
            DayOfWeek::Wed,
            DayOfWeek::Thu,
            DayOfWeek::Fri,
        ]
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            DayOfWeek::Sun => "SUN",
            DayOfWeek::Mon => "MON",
            DayOfWeek::Tue => "TUE",
            DayOfWeek::Wed => "WED",
            DayOfWeek::Thu => "THU",
            DayOfWeek::Fri => "FRI",
            DayOfWeek::Sat => "SAT",
        };
        write!(f, "{}", tag)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferredHours {
    pub start: String,
    pub end: String,
}

/// Weekly availability preferences as supplied by the profile service.
/// Both fields are optional and may carry malformed values; nothing in the
/// scheduling core consumes them before `resolve()` has run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulePreferences {
    pub preferred_days: Option<Vec<DayOfWeek>>,
    pub preferred_hours: Option<PreferredHours>,
}

impl SchedulePreferences {
    /// Produce a fully-populated preferences record. Missing or empty
    /// preferred days fall back to Mon-Fri, missing or malformed hours to
    /// 09:00-17:00. This is the only place default-coalescing happens.
    pub fn resolve(&self) -> ResolvedPreferences {
        let days: HashSet<DayOfWeek> = match &self.preferred_days {
            Some(days) if !days.is_empty() => days.iter().copied().collect(),
            _ => DayOfWeek::weekdays().into_iter().collect(),
        };

        let (start, end) = match &self.preferred_hours {
            Some(hours) => (
                parse_hhmm(&hours.start).unwrap_or_else(default_start),
                parse_hhmm(&hours.end).unwrap_or_else(default_end),
            ),
            None => (default_start(), default_end()),
        };

        ResolvedPreferences { days, start, end }
    }
}

fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}

fn default_start() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap()
}

fn default_end() -> NaiveTime {
    NaiveTime::from_hms_opt(17, 0, 0).unwrap()
}

/// Validated preferences with every field populated. `start >= end` is
/// tolerated and simply yields zero slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPreferences {
    pub days: HashSet<DayOfWeek>,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub id: Uuid,
    /// Global on/off switch; an unavailable doctor accepts no bookings.
    pub available: bool,
    pub consultation_fee: f64,
    pub preferences: SchedulePreferences,
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub slot_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub slot_time: NaiveTime,
    /// Fee snapshot taken at booking time; never updated afterwards.
    pub amount: f64,
    pub paid: bool,
    pub cancelled: bool,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    /// Pending means neither terminal flag has been set.
    pub fn is_pending(&self) -> bool {
        !self.cancelled && !self.is_completed
    }
}

/// The two terminal transitions an appointment can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalTransition {
    Cancel,
    Complete,
}

/// Who is asking for a lifecycle transition or a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requester {
    Patient(Uuid),
    Doctor(Uuid),
    Admin,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSlotRequest {
    pub doctor_id: Uuid,
    pub slot_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub slot_time: NaiveTime,
    /// Only honoured for admins booking on behalf of a patient.
    #[serde(default)]
    pub patient_id: Option<Uuid>,
}

/// One bookable day in an availability listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySlots {
    pub date: NaiveDate,
    pub slots: Vec<SlotView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotView {
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    pub booked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub earnings_total: f64,
    pub appointment_count: usize,
    pub unique_patient_count: usize,
    pub recent_appointments: Vec<Appointment>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulingError {
    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Doctor is not accepting appointments")]
    DoctorUnavailable,

    #[error("Requested time is not a bookable slot for this doctor")]
    InvalidSlot,

    #[error("Requested slot is in the past")]
    SlotInPast,

    #[error("Slot is already booked")]
    SlotTaken,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Appointment is already completed or cancelled")]
    AlreadyFinalized,

    #[error("Not authorized for this appointment")]
    Unauthorized,

    #[error("Storage error: {0}")]
    Storage(String),
}
