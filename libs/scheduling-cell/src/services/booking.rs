// libs/scheduling-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::models::{
    Appointment, BookSlotRequest, DaySlots, Requester, SchedulingError, SlotView,
};
use crate::services::availability::{compute_slots, slot_on_grid};
use crate::services::ledger::{LedgerError, SlotLedger};
use crate::services::store::{AppointmentRepository, Clock, DoctorDirectory};

/// Orchestrates slot listing and the reserve-then-persist booking flow.
pub struct BookingService {
    doctors: Arc<dyn DoctorDirectory>,
    appointments: Arc<dyn AppointmentRepository>,
    ledger: Arc<SlotLedger>,
    clock: Arc<dyn Clock>,
    horizon_days: u32,
}

impl BookingService {
    pub fn new(
        doctors: Arc<dyn DoctorDirectory>,
        appointments: Arc<dyn AppointmentRepository>,
        ledger: Arc<SlotLedger>,
        clock: Arc<dyn Clock>,
        horizon_days: u32,
    ) -> Self {
        Self {
            doctors,
            appointments,
            ledger,
            clock,
            horizon_days,
        }
    }

    /// The bookable grid for one doctor over the configured horizon, with
    /// already-reserved slots annotated rather than hidden. An existing but
    /// unavailable doctor yields an empty listing, not an error.
    pub async fn available_slots(&self, doctor_id: Uuid) -> Result<Vec<DaySlots>, SchedulingError> {
        let doctor = self
            .doctors
            .get_doctor(doctor_id)
            .await?
            .ok_or(SchedulingError::DoctorNotFound)?;

        if !doctor.available {
            debug!("Doctor {} is unavailable, returning empty slot listing", doctor_id);
            return Ok(Vec::new());
        }

        let prefs = doctor.preferences.resolve();
        let now = self.clock.now();
        let days = compute_slots(&prefs, now, self.horizon_days)
            .into_iter()
            .map(|day| {
                let booked = self.ledger.booked_times(doctor_id, day.date);
                DaySlots {
                    date: day.date,
                    slots: day
                        .times
                        .into_iter()
                        .map(|time| SlotView {
                            time,
                            booked: booked.contains(&time),
                        })
                        .collect(),
                }
            })
            .collect();

        Ok(days)
    }

    /// Book a slot: validate the doctor and the requested grid position,
    /// reserve the slot, then persist the appointment. If persistence fails
    /// the reservation is released so the slot is not stranded.
    pub async fn book(
        &self,
        requester: Requester,
        request: BookSlotRequest,
    ) -> Result<Appointment, SchedulingError> {
        let patient_id = Self::resolve_patient(requester, request.patient_id)?;

        info!(
            "Booking slot {} {} with doctor {} for patient {}",
            request.slot_date, request.slot_time, request.doctor_id, patient_id
        );

        // Step 1: the doctor must exist and be accepting appointments.
        let doctor = self
            .doctors
            .get_doctor(request.doctor_id)
            .await?
            .ok_or(SchedulingError::DoctorNotFound)?;
        if !doctor.available {
            return Err(SchedulingError::DoctorUnavailable);
        }

        // Step 2: the requested time must lie on the doctor's grid.
        let prefs = doctor.preferences.resolve();
        if !slot_on_grid(&prefs, request.slot_date, request.slot_time) {
            return Err(SchedulingError::InvalidSlot);
        }

        // Step 3: no booking into the past, by server time.
        let slot_instant: NaiveDateTime = request.slot_date.and_time(request.slot_time);
        if slot_instant <= self.clock.now().naive_utc() {
            return Err(SchedulingError::SlotInPast);
        }

        // Step 4: claim the slot. This is the contention point; exactly one
        // concurrent request gets past it.
        self.ledger
            .reserve(request.doctor_id, request.slot_date, request.slot_time)
            .map_err(|e| match e {
                LedgerError::AlreadyBooked => SchedulingError::SlotTaken,
                LedgerError::NotBooked => SchedulingError::Storage(e.to_string()),
            })?;

        // Step 5: persist, releasing the reservation if persistence fails.
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id,
            doctor_id: request.doctor_id,
            slot_date: request.slot_date,
            slot_time: request.slot_time,
            amount: doctor.consultation_fee,
            paid: false,
            cancelled: false,
            is_completed: false,
            created_at: self.clock.now(),
        };

        if let Err(e) = self.appointments.insert(appointment.clone()).await {
            warn!(
                "Persisting appointment {} failed, releasing slot: {}",
                appointment.id, e
            );
            if let Err(release_err) =
                self.ledger
                    .release(request.doctor_id, request.slot_date, request.slot_time)
            {
                error!(
                    "Failed to release slot {} {} for doctor {} after persistence failure: {}",
                    request.slot_date, request.slot_time, request.doctor_id, release_err
                );
            }
            return Err(e.into());
        }

        info!("Booked appointment {}", appointment.id);
        Ok(appointment)
    }

    pub async fn appointments_for_patient(
        &self,
        patient_id: Uuid,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        Ok(self.appointments.list_for_patient(patient_id).await?)
    }

    pub async fn appointments_for_doctor(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        Ok(self.appointments.list_for_doctor(doctor_id).await?)
    }

    /// Patients book for themselves; admins must name the patient. Doctors
    /// do not book appointments.
    fn resolve_patient(
        requester: Requester,
        requested_patient: Option<Uuid>,
    ) -> Result<Uuid, SchedulingError> {
        match requester {
            Requester::Patient(id) => match requested_patient {
                Some(other) if other != id => Err(SchedulingError::Unauthorized),
                _ => Ok(id),
            },
            Requester::Admin => requested_patient.ok_or(SchedulingError::Unauthorized),
            Requester::Doctor(_) => Err(SchedulingError::Unauthorized),
        }
    }
}
