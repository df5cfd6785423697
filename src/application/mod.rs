// Application layer - Series ingestion, rendering adapters and the pipeline loop
pub mod plot_pipeline;
pub mod render_surface;
pub mod request_sequencer;
pub mod series_element;
pub mod series_events;
pub mod series_line;
pub mod stacked_coordinator;
pub mod telemetry_source;
