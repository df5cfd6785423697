// Simulated telemetry source - sine feeds with late and re-sent samples
use crate::application::telemetry_source::{FeedHandle, TelemetrySource};
use crate::domain::point::{Datum, Point, SeriesId, TimeWindow};
use crate::infrastructure::config::FeedConfig;
use anyhow::Context;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub struct SimulatedSource {
    feeds: HashMap<SeriesId, FeedConfig>,
    latency: Duration,
}

impl SimulatedSource {
    pub fn new(feeds: Vec<FeedConfig>, latency: Duration) -> Self {
        let feeds = feeds
            .into_iter()
            .map(|feed| (SeriesId::new(feed.id.clone()), feed))
            .collect();
        Self { feeds, latency }
    }

    fn feed(&self, series: &SeriesId) -> anyhow::Result<&FeedConfig> {
        self.feeds
            .get(series)
            .with_context(|| format!("Unknown telemetry series {}", series))
    }

    /// Points on the feed's sampling grid inside `window`.
    fn generate(feed: &FeedConfig, window: TimeWindow) -> Vec<Point> {
        let period = feed.period_ms as f64;
        let first = (window.start / period).ceil() as i64;
        let last = (window.end / period).floor() as i64;
        (first..=last)
            .map(|step| {
                let domain = step as f64 * period;
                Point::new(domain, sample_value(feed, domain))
            })
            .collect()
    }
}

fn sample_value(feed: &FeedConfig, domain: f64) -> f64 {
    feed.amplitude * (domain / feed.wavelength_ms * std::f64::consts::TAU).sin()
}

fn now_ms() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64
}

#[async_trait]
impl TelemetrySource for SimulatedSource {
    async fn request(&self, series: &SeriesId, window: TimeWindow) -> anyhow::Result<Vec<Point>> {
        let feed = self.feed(series)?;
        tokio::time::sleep(self.latency).await;

        let points = Self::generate(feed, window);
        tracing::debug!(
            "Served {} historical points for {} over {}ms",
            points.len(),
            series,
            window.span()
        );
        Ok(points)
    }

    fn subscribe(&self, series: &SeriesId, sink: mpsc::Sender<Datum>) -> anyhow::Result<FeedHandle> {
        let feed = self.feed(series)?.clone();
        let id = series.clone();

        let task = tokio::spawn(async move {
            let period = feed.period_ms as f64;
            let mut ticker = tokio::time::interval(Duration::from_millis(feed.period_ms));
            let mut held_back: Option<Point> = None;
            let mut tick: u64 = 0;

            loop {
                ticker.tick().await;
                tick += 1;
                let domain = (now_ms() / period).floor() * period;
                let point = Point::new(domain, sample_value(&feed, domain));

                let mut batch = Vec::with_capacity(3);
                if feed.out_of_order_every > 0 && tick % feed.out_of_order_every as u64 == 0 {
                    // deliver this one after the next sample
                    held_back = Some(point);
                } else {
                    batch.push(point);
                    batch.extend(held_back.take());
                    if feed.resend_every > 0 && tick % feed.resend_every as u64 == 0 {
                        batch.push(point);
                    }
                }

                for point in batch {
                    if sink.send(Datum::new(id.clone(), point)).await.is_err() {
                        return;
                    }
                }
            }
        });

        tracing::info!("Subscribed simulated feed {}", series);
        Ok(FeedHandle::new(series.clone(), task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(id: &str) -> FeedConfig {
        FeedConfig {
            id: id.to_string(),
            period_ms: 100,
            amplitude: 2.0,
            wavelength_ms: 400.0,
            out_of_order_every: 0,
            resend_every: 0,
        }
    }

    #[tokio::test]
    async fn test_request_samples_window_on_grid() {
        let source = SimulatedSource::new(vec![feed("a")], Duration::ZERO);

        let points = source
            .request(&SeriesId::new("a"), TimeWindow::new(50.0, 420.0))
            .await
            .unwrap();

        let domains: Vec<f64> = points.iter().map(|p| p.domain).collect();
        assert_eq!(domains, vec![100.0, 200.0, 300.0, 400.0]);
        assert!((points[0].range - 2.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unknown_series_is_an_error() {
        let source = SimulatedSource::new(vec![feed("a")], Duration::ZERO);
        let (tx, _rx) = mpsc::channel(4);

        assert!(source
            .request(&SeriesId::new("b"), TimeWindow::new(0.0, 1.0))
            .await
            .is_err());
        assert!(source.subscribe(&SeriesId::new("b"), tx).is_err());
    }

    #[tokio::test]
    async fn test_subscription_delivers_until_unsubscribed() {
        let mut config = feed("live");
        config.period_ms = 5;
        let source = SimulatedSource::new(vec![config], Duration::ZERO);
        let (tx, mut rx) = mpsc::channel(16);

        let handle = source.subscribe(&SeriesId::new("live"), tx).unwrap();
        let datum = rx.recv().await.unwrap();
        assert_eq!(datum.series, SeriesId::new("live"));

        handle.unsubscribe();
        // the aborted task drops its sender, so the channel drains and closes
        while rx.recv().await.is_some() {}
    }
}
