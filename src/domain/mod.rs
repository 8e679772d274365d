// Domain layer - data points, channels, series and sessions
pub mod channel;
pub mod series;
pub mod session;
pub mod telemetry;
pub mod window;
