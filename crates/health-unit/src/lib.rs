pub mod clinic;
pub mod config;
pub mod error;
pub mod telemetry;
