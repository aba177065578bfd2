// libs/scheduling-cell/src/services/lifecycle.rs
use std::sync::Arc;

use shared_config::AppConfig;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{Appointment, Requester, SchedulingError, TerminalTransition};
use crate::services::ledger::SlotLedger;
use crate::services::store::AppointmentRepository;

/// What happens to the reserved slot when an appointment is cancelled.
/// Keeping the reservation is the default; operators who want cancelled
/// slots to reopen opt in via configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotReleasePolicy {
    KeepReserved,
    ReleaseSlot,
}

impl SlotReleasePolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        if config.release_cancelled_slots {
            SlotReleasePolicy::ReleaseSlot
        } else {
            SlotReleasePolicy::KeepReserved
        }
    }
}

/// Drives the pending -> cancelled / pending -> completed transitions.
pub struct AppointmentLifecycleService {
    appointments: Arc<dyn AppointmentRepository>,
    ledger: Arc<SlotLedger>,
    policy: SlotReleasePolicy,
}

impl AppointmentLifecycleService {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        ledger: Arc<SlotLedger>,
        policy: SlotReleasePolicy,
    ) -> Self {
        Self {
            appointments,
            ledger,
            policy,
        }
    }

    /// Cancel a pending appointment. Allowed for the owning patient, the
    /// owning doctor, or an admin.
    pub async fn cancel(
        &self,
        requester: Requester,
        appointment_id: Uuid,
    ) -> Result<Appointment, SchedulingError> {
        let appointment = self.load(appointment_id).await?;
        if !Self::may_cancel(requester, &appointment) {
            return Err(SchedulingError::Unauthorized);
        }

        let cancelled = self
            .appointments
            .finalize(appointment_id, TerminalTransition::Cancel)
            .await?;
        info!("Cancelled appointment {}", appointment_id);

        if self.policy == SlotReleasePolicy::ReleaseSlot {
            if let Err(e) =
                self.ledger
                    .release(cancelled.doctor_id, cancelled.slot_date, cancelled.slot_time)
            {
                warn!(
                    "Slot for cancelled appointment {} was not reserved: {}",
                    appointment_id, e
                );
            }
        }

        Ok(cancelled)
    }

    /// Complete a pending appointment. Allowed for the owning doctor or an
    /// admin; patients never complete appointments.
    pub async fn complete(
        &self,
        requester: Requester,
        appointment_id: Uuid,
    ) -> Result<Appointment, SchedulingError> {
        let appointment = self.load(appointment_id).await?;
        if !Self::may_complete(requester, &appointment) {
            return Err(SchedulingError::Unauthorized);
        }

        let completed = self
            .appointments
            .finalize(appointment_id, TerminalTransition::Complete)
            .await?;
        info!("Completed appointment {}", appointment_id);
        Ok(completed)
    }

    async fn load(&self, appointment_id: Uuid) -> Result<Appointment, SchedulingError> {
        self.appointments
            .get(appointment_id)
            .await?
            .ok_or(SchedulingError::AppointmentNotFound)
    }

    fn may_cancel(requester: Requester, appointment: &Appointment) -> bool {
        match requester {
            Requester::Patient(id) => id == appointment.patient_id,
            Requester::Doctor(id) => id == appointment.doctor_id,
            Requester::Admin => true,
        }
    }

    fn may_complete(requester: Requester, appointment: &Appointment) -> bool {
        match requester {
            Requester::Doctor(id) => id == appointment.doctor_id,
            Requester::Admin => true,
            Requester::Patient(_) => false,
        }
    }
}
