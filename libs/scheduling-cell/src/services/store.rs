// libs/scheduling-cell/src/services/store.rs
//
// Seams to the collaborators the scheduling core does not own: server time,
// the doctor profile service, and the appointment store. In-memory
// implementations back the binary and the tests; a database-backed
// implementation would slot in behind the same traits.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Appointment, DoctorProfile, SchedulingError, TerminalTransition};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("appointment already finalized")]
    AlreadyFinalized,

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for SchedulingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => SchedulingError::AppointmentNotFound,
            StoreError::AlreadyFinalized => SchedulingError::AlreadyFinalized,
            StoreError::Unavailable(msg) => SchedulingError::Storage(msg),
        }
    }
}

/// Server time source; client-supplied "now" is never trusted.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for tests.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().expect("clock lock poisoned") = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock poisoned")
    }
}

/// Read path into the (out-of-scope) doctor profile service.
#[async_trait]
pub trait DoctorDirectory: Send + Sync {
    async fn get_doctor(&self, doctor_id: Uuid) -> Result<Option<DoctorProfile>, StoreError>;
}

#[derive(Default)]
pub struct InMemoryDoctorDirectory {
    doctors: RwLock<HashMap<Uuid, DoctorProfile>>,
}

impl InMemoryDoctorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, profile: DoctorProfile) {
        let mut doctors = self.doctors.write().expect("doctor directory lock poisoned");
        doctors.insert(profile.id, profile);
    }
}

#[async_trait]
impl DoctorDirectory for InMemoryDoctorDirectory {
    async fn get_doctor(&self, doctor_id: Uuid) -> Result<Option<DoctorProfile>, StoreError> {
        let doctors = self.doctors.read().expect("doctor directory lock poisoned");
        Ok(doctors.get(&doctor_id).cloned())
    }
}

/// Appointment persistence. Appointments are soft state: created once,
/// finalized at most once, never deleted.
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn insert(&self, appointment: Appointment) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, StoreError>;

    /// Newest first.
    async fn list_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<Appointment>, StoreError>;

    /// Newest first.
    async fn list_for_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>, StoreError>;

    /// Atomically apply a terminal transition. Fails with `AlreadyFinalized`
    /// once the appointment has left the pending state, so a concurrent
    /// double-transition can never double-apply.
    async fn finalize(
        &self,
        id: Uuid,
        transition: TerminalTransition,
    ) -> Result<Appointment, StoreError>;
}

#[derive(Default)]
pub struct InMemoryAppointmentRepository {
    appointments: RwLock<HashMap<Uuid, Appointment>>,
}

impl InMemoryAppointmentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryAppointmentRepository {
    async fn insert(&self, appointment: Appointment) -> Result<(), StoreError> {
        let mut appointments = self
            .appointments
            .write()
            .expect("appointment store lock poisoned");
        appointments.insert(appointment.id, appointment);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let appointments = self
            .appointments
            .read()
            .expect("appointment store lock poisoned");
        Ok(appointments.get(&id).cloned())
    }

    async fn list_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<Appointment>, StoreError> {
        let appointments = self
            .appointments
            .read()
            .expect("appointment store lock poisoned");
        let mut result: Vec<Appointment> = appointments
            .values()
            .filter(|a| a.doctor_id == doctor_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn list_for_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>, StoreError> {
        let appointments = self
            .appointments
            .read()
            .expect("appointment store lock poisoned");
        let mut result: Vec<Appointment> = appointments
            .values()
            .filter(|a| a.patient_id == patient_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn finalize(
        &self,
        id: Uuid,
        transition: TerminalTransition,
    ) -> Result<Appointment, StoreError> {
        let mut appointments = self
            .appointments
            .write()
            .expect("appointment store lock poisoned");
        let appointment = appointments.get_mut(&id).ok_or(StoreError::NotFound)?;

        if !appointment.is_pending() {
            return Err(StoreError::AlreadyFinalized);
        }
        match transition {
            TerminalTransition::Cancel => appointment.cancelled = true,
            TerminalTransition::Complete => appointment.is_completed = true,
        }
        Ok(appointment.clone())
    }
}
