// libs/scheduling-cell/src/services/ledger.rs
//
// Authoritative record of which slots are already consumed per doctor.
// Reservation is a conditional insert under a per-doctor mutex, so
// concurrent bookings for different doctors never contend with each other.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("slot is already booked")]
    AlreadyBooked,

    #[error("slot is not booked")]
    NotBooked,
}

type BookedSlots = HashMap<NaiveDate, HashSet<NaiveTime>>;

#[derive(Default)]
pub struct SlotLedger {
    doctors: RwLock<HashMap<Uuid, Arc<Mutex<BookedSlots>>>>,
}

impl SlotLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve (doctor, date, time). Exactly one of N concurrent calls for
    /// the same key succeeds; the rest observe `AlreadyBooked`. Never
    /// overwrites an existing reservation.
    pub fn reserve(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<(), LedgerError> {
        let entry = self.doctor_entry(doctor_id);
        let mut slots = entry.lock().expect("slot ledger lock poisoned");

        let times = slots.entry(date).or_default();
        if !times.insert(time) {
            return Err(LedgerError::AlreadyBooked);
        }
        debug!("Reserved slot {} {} for doctor {}", date, time, doctor_id);
        Ok(())
    }

    /// Release (doctor, date, time). Releasing a slot that is not held is a
    /// no-op reported as `NotBooked`.
    pub fn release(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<(), LedgerError> {
        let entry = {
            let doctors = self.doctors.read().expect("slot ledger lock poisoned");
            doctors.get(&doctor_id).cloned()
        };
        let Some(entry) = entry else {
            return Err(LedgerError::NotBooked);
        };

        let mut slots = entry.lock().expect("slot ledger lock poisoned");
        match slots.get_mut(&date) {
            Some(times) => {
                if !times.remove(&time) {
                    return Err(LedgerError::NotBooked);
                }
                if times.is_empty() {
                    slots.remove(&date);
                }
                debug!("Released slot {} {} for doctor {}", date, time, doctor_id);
                Ok(())
            }
            None => Err(LedgerError::NotBooked),
        }
    }

    pub fn is_booked(&self, doctor_id: Uuid, date: NaiveDate, time: NaiveTime) -> bool {
        self.booked_times(doctor_id, date).contains(&time)
    }

    /// All reserved times for one doctor-day, for display annotation.
    pub fn booked_times(&self, doctor_id: Uuid, date: NaiveDate) -> HashSet<NaiveTime> {
        let entry = {
            let doctors = self.doctors.read().expect("slot ledger lock poisoned");
            doctors.get(&doctor_id).cloned()
        };
        match entry {
            Some(entry) => {
                let slots = entry.lock().expect("slot ledger lock poisoned");
                slots.get(&date).cloned().unwrap_or_default()
            }
            None => HashSet::new(),
        }
    }

    fn doctor_entry(&self, doctor_id: Uuid) -> Arc<Mutex<BookedSlots>> {
        {
            let doctors = self.doctors.read().expect("slot ledger lock poisoned");
            if let Some(entry) = doctors.get(&doctor_id) {
                return Arc::clone(entry);
            }
        }
        let mut doctors = self.doctors.write().expect("slot ledger lock poisoned");
        Arc::clone(doctors.entry(doctor_id).or_default())
    }
}
