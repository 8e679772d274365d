// Sensor telemetry recorder and live viewer
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod presentation;
