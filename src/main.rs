// Main entry point - Dependency injection and pipeline startup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::sync::Arc;
use std::time::Duration;

use crate::application::plot_pipeline::PlotPipeline;
use crate::domain::point::{SeriesId, TimeWindow};
use crate::infrastructure::config::load_pipeline_config;
use crate::infrastructure::simulated_source::SimulatedSource;
use crate::presentation::tracing_surface::TracingSurface;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_pipeline_config()?;
    config.validate()?;

    // Telemetry source (infrastructure layer)
    let source = Arc::new(SimulatedSource::new(
        config.feeds.clone(),
        Duration::from_millis(config.history.latency_ms),
    ));

    // Render surface (presentation layer)
    let surface = TracingSurface::new(config.render.label_char_width, config.render.hover_every);

    // Pipeline (application layer)
    let mut pipeline = PlotPipeline::new(source, surface, &config);

    let now = chrono::Utc::now().timestamp_millis() as f64;
    let window = TimeWindow::new(now - config.history.window_ms, now);
    let series: Vec<SeriesId> = config
        .feeds
        .iter()
        .map(|feed| SeriesId::new(feed.id.clone()))
        .collect();
    pipeline.navigate(&series, window);

    let run_for = config.run_for_secs.map(Duration::from_secs);
    let shutdown = async move {
        match run_for {
            Some(duration) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = tokio::time::sleep(duration) => {}
                }
            }
            None => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    };

    tracing::info!("Starting plot pipeline with {} series", series.len());
    pipeline.run(shutdown).await;
    tracing::info!(
        "Drew {} frames, dropped {} points",
        pipeline.surface().frames_drawn(),
        pipeline.dropped_points()
    );

    Ok(())
}
