// Source trait for live and historical telemetry
use crate::domain::point::{Datum, Point, SeriesId, TimeWindow};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Historical points inside `window`, ascending by domain
    async fn request(&self, series: &SeriesId, window: TimeWindow) -> anyhow::Result<Vec<Point>>;

    /// Start delivering live datums for `series` into `sink`
    fn subscribe(&self, series: &SeriesId, sink: mpsc::Sender<Datum>) -> anyhow::Result<FeedHandle>;
}

/// Keeps a live feed running. Unsubscribing (or dropping) stops it.
#[derive(Debug)]
pub struct FeedHandle {
    series: SeriesId,
    task: Option<JoinHandle<()>>,
}

impl FeedHandle {
    pub fn new(series: SeriesId, task: JoinHandle<()>) -> Self {
        Self {
            series,
            task: Some(task),
        }
    }

    pub fn unsubscribe(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("Unsubscribed feed for {}", self.series);
        }
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
