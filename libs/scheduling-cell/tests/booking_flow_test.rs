// libs/scheduling-cell/tests/booking_flow_test.rs
//
// End-to-end booking flow over the in-memory stores: contention on a single
// slot, reservation rollback when persistence fails, and listing annotation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use scheduling_cell::models::{
    Appointment, BookSlotRequest, DoctorProfile, PreferredHours, Requester, SchedulePreferences,
    SchedulingError, TerminalTransition,
};
use scheduling_cell::services::booking::BookingService;
use scheduling_cell::services::ledger::SlotLedger;
use scheduling_cell::services::store::{
    AppointmentRepository, InMemoryAppointmentRepository, InMemoryDoctorDirectory, ManualClock,
    StoreError,
};

struct TestSetup {
    service: Arc<BookingService>,
    ledger: Arc<SlotLedger>,
    doctor_id: Uuid,
}

impl TestSetup {
    fn new(appointments: Arc<dyn AppointmentRepository>) -> Self {
        let doctors = Arc::new(InMemoryDoctorDirectory::new());
        let doctor_id = Uuid::new_v4();
        doctors.upsert(DoctorProfile {
            id: doctor_id,
            available: true,
            consultation_fee: 120.0,
            preferences: SchedulePreferences {
                preferred_days: None,
                preferred_hours: Some(PreferredHours {
                    start: "09:00".to_string(),
                    end: "12:00".to_string(),
                }),
            },
        });

        let ledger = Arc::new(SlotLedger::new());
        // Friday morning
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 9, 4, 8, 0, 0).unwrap(),
        ));
        let service = Arc::new(BookingService::new(
            doctors,
            appointments,
            ledger.clone(),
            clock,
            14,
        ));

        Self {
            service,
            ledger,
            doctor_id,
        }
    }

    fn request(&self, time: &str) -> BookSlotRequest {
        BookSlotRequest {
            doctor_id: self.doctor_id,
            slot_date: NaiveDate::from_ymd_opt(2026, 9, 4).unwrap(),
            slot_time: NaiveTime::parse_from_str(time, "%H:%M").unwrap(),
            patient_id: None,
        }
    }
}

#[tokio::test]
async fn test_contended_slot_has_exactly_one_winner() {
    let setup = TestSetup::new(Arc::new(InMemoryAppointmentRepository::new()));

    let mut handles = Vec::new();
    for _ in 0..12 {
        let service = setup.service.clone();
        let request = setup.request("10:00");
        handles.push(tokio::spawn(async move {
            service
                .book(Requester::Patient(Uuid::new_v4()), request)
                .await
        }));
    }

    let mut wins = 0;
    let mut taken = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => wins += 1,
            Err(SchedulingError::SlotTaken) => taken += 1,
            Err(other) => panic!("unexpected booking error: {other}"),
        }
    }

    assert_eq!(wins, 1);
    assert_eq!(taken, 11);
}

/// Repository whose insert always fails, for exercising the rollback path.
struct FailingRepository;

#[async_trait]
impl AppointmentRepository for FailingRepository {
    async fn insert(&self, _appointment: Appointment) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn get(&self, _id: Uuid) -> Result<Option<Appointment>, StoreError> {
        Ok(None)
    }

    async fn list_for_doctor(&self, _doctor_id: Uuid) -> Result<Vec<Appointment>, StoreError> {
        Ok(Vec::new())
    }

    async fn list_for_patient(&self, _patient_id: Uuid) -> Result<Vec<Appointment>, StoreError> {
        Ok(Vec::new())
    }

    async fn finalize(
        &self,
        _id: Uuid,
        _transition: TerminalTransition,
    ) -> Result<Appointment, StoreError> {
        Err(StoreError::NotFound)
    }
}

#[tokio::test]
async fn test_failed_persistence_releases_the_reservation() {
    let setup = TestSetup::new(Arc::new(FailingRepository));
    let request = setup.request("10:00");

    let result = setup
        .service
        .book(Requester::Patient(Uuid::new_v4()), request.clone())
        .await;
    assert!(matches!(result, Err(SchedulingError::Storage(_))));

    // The compensating release must leave the slot open again.
    assert!(!setup
        .ledger
        .is_booked(setup.doctor_id, request.slot_date, request.slot_time));
}

#[tokio::test]
async fn test_listing_marks_booked_slots_without_hiding_them() {
    let setup = TestSetup::new(Arc::new(InMemoryAppointmentRepository::new()));

    let appointment = setup
        .service
        .book(Requester::Patient(Uuid::new_v4()), setup.request("09:30"))
        .await
        .unwrap();

    let days = setup.service.available_slots(setup.doctor_id).await.unwrap();
    assert!(!days.is_empty());

    let friday = days
        .iter()
        .find(|d| d.date == appointment.slot_date)
        .expect("booked day should still be listed");
    let times: Vec<_> = friday.slots.iter().map(|s| s.time).collect();
    assert!(times.contains(&appointment.slot_time));

    for slot in &friday.slots {
        assert_eq!(slot.booked, slot.time == appointment.slot_time);
    }
}

#[tokio::test]
async fn test_patient_listing_is_newest_first() {
    let setup = TestSetup::new(Arc::new(InMemoryAppointmentRepository::new()));
    let patient_id = Uuid::new_v4();
    let patient = Requester::Patient(patient_id);

    let first = setup
        .service
        .book(patient, setup.request("09:00"))
        .await
        .unwrap();
    let second = setup
        .service
        .book(patient, setup.request("09:30"))
        .await
        .unwrap();

    let listed = setup
        .service
        .appointments_for_patient(patient_id)
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed[0].created_at >= listed[1].created_at);
    let ids: Vec<_> = listed.iter().map(|a| a.id).collect();
    assert!(ids.contains(&first.id));
    assert!(ids.contains(&second.id));
}
