// Common library shared by the dcrond binary and the test suites

pub mod config;
pub mod errors;
pub mod identity;
pub mod job;
pub mod labels;
pub mod registry;
pub mod runtime;
pub mod schedule;
pub mod scheduler;
pub mod telemetry;
