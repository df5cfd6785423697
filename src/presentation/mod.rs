// Presentation layer - Render surfaces
pub mod tracing_surface;
