pub mod bookings;
pub mod config;
pub mod error;
pub mod telemetry;
