// Application layer - recording on the server, synchronization and charting on the viewer
pub mod chart_surface;
pub mod recording_service;
pub mod series_registry;
pub mod sync_client;
pub mod telemetry_repository;
pub mod window_controller;
