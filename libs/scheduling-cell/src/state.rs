// libs/scheduling-cell/src/state.rs
use std::sync::Arc;

use shared_config::AppConfig;

use crate::services::booking::BookingService;
use crate::services::dashboard::DashboardService;
use crate::services::ledger::SlotLedger;
use crate::services::lifecycle::{AppointmentLifecycleService, SlotReleasePolicy};
use crate::services::store::{
    AppointmentRepository, Clock, DoctorDirectory, InMemoryAppointmentRepository,
    InMemoryDoctorDirectory, SystemClock,
};

/// Shared state for the scheduling routes: configuration plus the three
/// services wired over one ledger and one appointment store.
pub struct SchedulingState {
    pub config: Arc<AppConfig>,
    pub booking: BookingService,
    pub lifecycle: AppointmentLifecycleService,
    pub dashboard: DashboardService,
}

impl SchedulingState {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self::with_parts(
            config,
            Arc::new(InMemoryDoctorDirectory::new()),
            Arc::new(InMemoryAppointmentRepository::new()),
            Arc::new(SystemClock),
        )
    }

    /// Wire the services over caller-supplied collaborators. Tests use this
    /// to inject a manual clock and pre-seeded stores.
    pub fn with_parts(
        config: Arc<AppConfig>,
        doctors: Arc<dyn DoctorDirectory>,
        appointments: Arc<dyn AppointmentRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ledger = Arc::new(SlotLedger::new());
        let booking = BookingService::new(
            doctors,
            appointments.clone(),
            ledger.clone(),
            clock,
            config.booking_horizon_days,
        );
        let lifecycle = AppointmentLifecycleService::new(
            appointments.clone(),
            ledger,
            SlotReleasePolicy::from_config(&config),
        );
        let dashboard = DashboardService::new(appointments);

        Self {
            config,
            booking,
            lifecycle,
            dashboard,
        }
    }
}
