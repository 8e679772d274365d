// Infrastructure layer - file storage, configuration, HTTP client and chart output
pub mod config;
pub mod http_source;
pub mod json_file_repository;
pub mod tracing_surface;
