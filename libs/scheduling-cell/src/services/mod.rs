pub mod availability;
pub mod booking;
pub mod dashboard;
pub mod ledger;
pub mod lifecycle;
pub mod store;
