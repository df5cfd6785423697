// Infrastructure layer - Configuration and telemetry adapters
pub mod config;
pub mod simulated_source;
