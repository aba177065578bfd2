// libs/scheduling-cell/src/services/dashboard.rs
use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::models::{
    DashboardSummary, Requester, SchedulingError, RECENT_APPOINTMENTS_LIMIT,
};
use crate::services::store::AppointmentRepository;

/// Read-only aggregation over a doctor's appointment history.
pub struct DashboardService {
    appointments: Arc<dyn AppointmentRepository>,
}

impl DashboardService {
    pub fn new(appointments: Arc<dyn AppointmentRepository>) -> Self {
        Self { appointments }
    }

    /// Earnings count an appointment's fee exactly once when it is completed
    /// or paid (or both). Unique patients include cancelled appointments.
    /// Only the owning doctor or an admin may see the summary.
    pub async fn summarize(
        &self,
        requester: Requester,
        doctor_id: Uuid,
    ) -> Result<DashboardSummary, SchedulingError> {
        match requester {
            Requester::Doctor(id) if id == doctor_id => {}
            Requester::Admin => {}
            _ => return Err(SchedulingError::Unauthorized),
        }

        let appointments = self.appointments.list_for_doctor(doctor_id).await?;

        let earnings_total: f64 = appointments
            .iter()
            .filter(|a| a.is_completed || a.paid)
            .map(|a| a.amount)
            .sum();

        let unique_patient_count = appointments
            .iter()
            .map(|a| a.patient_id)
            .collect::<HashSet<Uuid>>()
            .len();

        let appointment_count = appointments.len();
        let recent_appointments = appointments
            .into_iter()
            .take(RECENT_APPOINTMENTS_LIMIT)
            .collect();

        debug!(
            "Dashboard for doctor {}: {} appointments, {} unique patients",
            doctor_id, appointment_count, unique_patient_count
        );

        Ok(DashboardSummary {
            earnings_total,
            appointment_count,
            unique_patient_count,
            recent_appointments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Appointment;
    use crate::services::store::InMemoryAppointmentRepository;
    use chrono::{Duration, NaiveDate, NaiveTime, Utc};

    fn appointment(
        doctor_id: Uuid,
        patient_id: Uuid,
        amount: f64,
        paid: bool,
        completed: bool,
        cancelled: bool,
        age_minutes: i64,
    ) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            patient_id,
            doctor_id,
            slot_date: NaiveDate::from_ymd_opt(2026, 9, 7).unwrap(),
            slot_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            amount,
            paid,
            cancelled,
            is_completed: completed,
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    #[tokio::test]
    async fn test_earnings_count_each_appointment_once() {
        let repo = Arc::new(InMemoryAppointmentRepository::new());
        let doctor = Uuid::new_v4();
        let patient = Uuid::new_v4();

        // completed+paid counts once, completed-only counts, paid-only
        // counts, pending and cancelled do not
        for (amount, paid, completed, cancelled) in [
            (100.0, true, true, false),
            (50.0, false, true, false),
            (25.0, true, false, false),
            (999.0, false, false, false),
            (999.0, false, false, true),
        ] {
            repo.insert(appointment(
                doctor, patient, amount, paid, completed, cancelled, 0,
            ))
            .await
            .unwrap();
        }

        let service = DashboardService::new(repo);
        let summary = service
            .summarize(Requester::Doctor(doctor), doctor)
            .await
            .unwrap();
        assert_eq!(summary.earnings_total, 175.0);
        assert_eq!(summary.appointment_count, 5);
    }

    #[tokio::test]
    async fn test_unique_patients_include_cancelled() {
        let repo = Arc::new(InMemoryAppointmentRepository::new());
        let doctor = Uuid::new_v4();
        let returning = Uuid::new_v4();
        let cancelled_only = Uuid::new_v4();

        repo.insert(appointment(doctor, returning, 10.0, false, false, false, 3))
            .await
            .unwrap();
        repo.insert(appointment(doctor, returning, 10.0, false, false, false, 2))
            .await
            .unwrap();
        repo.insert(appointment(
            doctor,
            cancelled_only,
            10.0,
            false,
            false,
            true,
            1,
        ))
        .await
        .unwrap();

        let service = DashboardService::new(repo);
        let summary = service.summarize(Requester::Admin, doctor).await.unwrap();
        assert_eq!(summary.unique_patient_count, 2);
    }

    #[tokio::test]
    async fn test_recent_is_capped_and_newest_first() {
        let repo = Arc::new(InMemoryAppointmentRepository::new());
        let doctor = Uuid::new_v4();
        for age in 0..8 {
            repo.insert(appointment(
                doctor,
                Uuid::new_v4(),
                10.0,
                false,
                false,
                false,
                age,
            ))
            .await
            .unwrap();
        }

        let service = DashboardService::new(repo);
        let summary = service
            .summarize(Requester::Doctor(doctor), doctor)
            .await
            .unwrap();
        assert_eq!(summary.recent_appointments.len(), RECENT_APPOINTMENTS_LIMIT);
        let stamps: Vec<_> = summary
            .recent_appointments
            .iter()
            .map(|a| a.created_at)
            .collect();
        let mut sorted = stamps.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(stamps, sorted);
    }

    #[tokio::test]
    async fn test_other_doctor_cannot_view_dashboard() {
        let repo = Arc::new(InMemoryAppointmentRepository::new());
        let doctor = Uuid::new_v4();
        let service = DashboardService::new(repo);

        let other = service
            .summarize(Requester::Doctor(Uuid::new_v4()), doctor)
            .await;
        assert_eq!(other, Err(SchedulingError::Unauthorized));

        let patient = service
            .summarize(Requester::Patient(Uuid::new_v4()), doctor)
            .await;
        assert_eq!(patient, Err(SchedulingError::Unauthorized));
    }
}
