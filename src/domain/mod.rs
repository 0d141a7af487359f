pub mod endpoint;
pub mod push_session;
pub mod reading;
pub mod telemetry;
