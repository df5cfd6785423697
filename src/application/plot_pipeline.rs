// Plot pipeline - feeds, history requests and redraws on one event loop
use crate::application::render_surface::{AxisState, RenderSurface};
use crate::application::request_sequencer::RequestTicket;
use crate::application::series_element::SeriesElement;
use crate::application::series_line::{AddOutcome, InsertSummary, SeriesLine};
use crate::application::stacked_coordinator::{CoordinatorEvent, StackedSeriesCoordinator};
use crate::application::telemetry_source::{FeedHandle, TelemetrySource};
use crate::domain::point::{Datum, Point, SeriesId, TimeWindow};
use crate::infrastructure::config::{BufferSettings, ElementSettings, PipelineConfig};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const DATUM_CHANNEL_CAPACITY: usize = 1024;

/// Completion of one historical request.
#[derive(Debug)]
pub struct HistoryResponse {
    pub ticket: RequestTicket,
    pub series: SeriesId,
    pub result: anyhow::Result<Vec<Point>>,
}

pub struct PlotPipeline<R: RenderSurface> {
    source: Arc<dyn TelemetrySource>,
    surface: R,
    buffer_settings: BufferSettings,
    element_settings: ElementSettings,
    redraw_interval: Duration,
    lines: HashMap<SeriesId, SeriesLine>,
    feeds: HashMap<SeriesId, FeedHandle>,
    coordinator: StackedSeriesCoordinator,
    coordinator_events: mpsc::UnboundedReceiver<CoordinatorEvent>,
    datum_tx: mpsc::Sender<Datum>,
    datum_rx: mpsc::Receiver<Datum>,
    history_tx: mpsc::UnboundedSender<HistoryResponse>,
    history_rx: mpsc::UnboundedReceiver<HistoryResponse>,
    bounds: Option<TimeWindow>,
    /// Span of the live window kept behind wall-clock now, when following.
    follow_span: Option<f64>,
    highlight: Option<f64>,
    needs_redraw: bool,
    dropped_points: usize,
}

impl<R: RenderSurface> PlotPipeline<R> {
    pub fn new(source: Arc<dyn TelemetrySource>, surface: R, config: &PipelineConfig) -> Self {
        let mut coordinator = StackedSeriesCoordinator::new();
        let coordinator_events = coordinator.subscribe();
        let (datum_tx, datum_rx) = mpsc::channel(DATUM_CHANNEL_CAPACITY);
        let (history_tx, history_rx) = mpsc::unbounded_channel();

        Self {
            source,
            surface,
            buffer_settings: config.buffer.clone(),
            element_settings: config.element.clone(),
            redraw_interval: Duration::from_millis(config.render.redraw_interval_ms),
            lines: HashMap::new(),
            feeds: HashMap::new(),
            coordinator,
            coordinator_events,
            datum_tx,
            datum_rx,
            history_tx,
            history_rx,
            bounds: None,
            follow_span: config.history.follow_live.then_some(config.history.window_ms),
            highlight: None,
            needs_redraw: false,
            dropped_points: 0,
        }
    }

    pub fn surface(&self) -> &R {
        &self.surface
    }

    /// Points dropped under capacity pressure since start.
    pub fn dropped_points(&self) -> usize {
        self.dropped_points
    }

    /// Start plotting a series: live feed, line and renderer element.
    pub fn add_series(&mut self, series: &SeriesId) -> anyhow::Result<()> {
        if self.lines.contains_key(series) {
            return Ok(());
        }
        let feed = self.source.subscribe(series, self.datum_tx.clone())?;

        let mut line = SeriesLine::new(series.clone(), &self.buffer_settings);
        let mut element = SeriesElement::new(series.clone(), &self.element_settings);
        element.attach(line.subscribe());
        self.coordinator.add_child(element);

        self.lines.insert(series.clone(), line);
        self.feeds.insert(series.clone(), feed);
        tracing::info!("Plotting series {}", series);
        Ok(())
    }

    pub fn remove_series(&mut self, series: &SeriesId) -> bool {
        if let Some(feed) = self.feeds.remove(series) {
            feed.unsubscribe();
        }
        let Some(mut line) = self.lines.remove(series) else {
            return false;
        };
        if let Some(mut element) = self.coordinator.remove_child(series) {
            if let Some(listener) = element.listener() {
                line.unsubscribe(listener);
            }
            element.destroy();
        }
        line.destroy();
        self.needs_redraw = true;
        tracing::info!("Stopped plotting series {}", series);
        true
    }

    /// Switch to a new set of series and load their history for `window`.
    /// Responses to any earlier navigation are discarded when they arrive.
    /// Series whose feed cannot be subscribed are skipped with a warning.
    pub fn navigate(&mut self, series: &[SeriesId], window: TimeWindow) -> RequestTicket {
        let ticket = self.coordinator.begin_navigation();

        let stale: Vec<SeriesId> = self
            .lines
            .keys()
            .filter(|id| !series.contains(id))
            .cloned()
            .collect();
        for id in &stale {
            self.remove_series(id);
        }
        // Kept series keep their feed but reload history from scratch
        for line in self.lines.values_mut() {
            line.clear();
        }

        let mut plotted: Vec<SeriesId> = Vec::new();
        for id in series {
            if plotted.contains(id) {
                continue;
            }
            match self.add_series(id) {
                Ok(()) => plotted.push(id.clone()),
                Err(e) => tracing::warn!("Skipping series {}: {:#}", id, e),
            }
        }

        self.bounds = Some(window);
        for id in &plotted {
            self.request_history(ticket, id.clone(), window);
        }
        tracing::info!(
            "Navigated to {} of {} series (request {})",
            plotted.len(),
            series.len(),
            ticket.sequence()
        );
        ticket
    }

    fn request_history(&self, ticket: RequestTicket, series: SeriesId, window: TimeWindow) {
        let source = self.source.clone();
        let tx = self.history_tx.clone();

        tokio::spawn(async move {
            let result = source.request(&series, window).await;
            let _ = tx.send(HistoryResponse {
                ticket,
                series,
                result,
            });
        });
    }

    pub fn apply_history(&mut self, response: HistoryResponse) -> Option<InsertSummary> {
        if !self.coordinator.accepts(response.ticket) {
            tracing::debug!(
                "Discarding stale history for {} (request {})",
                response.series,
                response.ticket.sequence()
            );
            return None;
        }
        let line = self.lines.get_mut(&response.series)?;

        let mut points = match response.result {
            Ok(points) => points,
            Err(e) => {
                tracing::warn!("History request for {} failed: {:#}", response.series, e);
                return None;
            }
        };
        // Bounds may have narrowed while the request was in flight
        if let Some(bounds) = self.bounds {
            points.retain(|p| bounds.contains(p.domain));
        }
        match line.add_series(&points) {
            Ok(summary) => {
                self.dropped_points += line.take_warnings().len();
                Some(summary)
            }
            Err(e) => {
                tracing::warn!("Malformed history for {}: {}", response.series, e);
                None
            }
        }
    }

    /// Route one live datum to its line.
    pub fn ingest(&mut self, datum: Datum) -> Option<AddOutcome> {
        let Some(line) = self.lines.get_mut(&datum.series) else {
            tracing::debug!("Dropping datum for detached series {}", datum.series);
            return None;
        };
        if self.bounds.is_some_and(|b| datum.point.domain < b.start) {
            tracing::debug!("Dropping datum for {} before window start", datum.series);
            return None;
        }
        match line.add_point(datum.point) {
            Ok(outcome) => {
                self.dropped_points += line.take_warnings().len();
                Some(outcome)
            }
            Err(e) => {
                tracing::warn!("Malformed datum for {}: {}", line.id(), e);
                None
            }
        }
    }

    /// Time conductor bounds changed: drop points outside the window.
    pub fn set_bounds(&mut self, window: TimeWindow) -> usize {
        self.bounds = Some(window);
        self.lines
            .values_mut()
            .map(|line| line.retain_window(window))
            .sum()
    }

    /// Slide the bounds so they end at `now`. No-op unless following live data.
    pub fn follow(&mut self, now: f64) -> usize {
        let Some(span) = self.follow_span else {
            return 0;
        };
        let removed = self.set_bounds(TimeWindow::new(now - span, now));
        if removed > 0 {
            tracing::debug!("Window moved to {}, dropped {} points", now, removed);
        }
        removed
    }

    pub fn highlight(&mut self, origin: &SeriesId, domain: Option<f64>) -> usize {
        if self.highlight != domain {
            self.needs_redraw = true;
        }
        self.highlight = domain;
        let relayed = self.coordinator.highlight(origin, domain);
        for (series, point) in self.highlighted_points() {
            tracing::debug!("Highlight {} at {}: {}", series, point.domain, point.range);
        }
        relayed
    }

    /// Nearest stored point of every highlighted series.
    pub fn highlighted_points(&self) -> Vec<(SeriesId, Point)> {
        self.coordinator
            .series()
            .filter_map(|id| {
                let domain = self.coordinator.highlight_of(id)?;
                let (_, point) = self.lines.get(id)?.nearest(domain)?;
                Some((id.clone(), point))
            })
            .collect()
    }

    /// Bring every element up to date and redraw if anything changed,
    /// including the shared axis or the highlight.
    pub fn redraw(&mut self) -> bool {
        let changed = self.coordinator.sync();
        self.drain_coordinator_events();
        if !changed && !self.needs_redraw {
            return false;
        }
        self.needs_redraw = false;

        let axis = AxisState {
            max_tick_width: self.coordinator.max_tick_width(),
            highlight: self.highlight,
        };
        let frames = self.coordinator.frames();
        let widths = self.surface.redraw(&frames, axis);

        for (series, width) in widths {
            self.coordinator.on_tick_width_changed(&series, width);
        }
        if let Some((origin, domain)) = self.surface.hover() {
            self.highlight(&origin, domain);
        }
        self.drain_coordinator_events();
        true
    }

    // A new group maximum must reach the surface; highlight changes are flagged in `highlight`
    fn drain_coordinator_events(&mut self) {
        while let Ok(event) = self.coordinator_events.try_recv() {
            match event {
                CoordinatorEvent::TickWidthChanged(width) => {
                    tracing::debug!("Group tick width is now {}", width);
                    self.needs_redraw = true;
                }
                CoordinatorEvent::Highlight { target, domain } => {
                    tracing::debug!("Relayed highlight {:?} to {}", domain, target);
                }
            }
        }
    }

    /// Process datums, history responses and redraw ticks until `shutdown` resolves.
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) {
        let mut ticker = tokio::time::interval(self.redraw_interval);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                Some(datum) = self.datum_rx.recv() => {
                    self.ingest(datum);
                }
                Some(response) = self.history_rx.recv() => {
                    self.apply_history(response);
                }
                _ = ticker.tick() => {
                    self.follow(chrono::Utc::now().timestamp_millis() as f64);
                    self.redraw();
                }
            }
        }

        self.stop_feeds();
        self.redraw();
    }

    fn stop_feeds(&mut self) {
        for (_, feed) in self.feeds.drain() {
            feed.unsubscribe();
        }
        tracing::info!(
            "Pipeline stopped with {} series, {} points dropped",
            self.lines.len(),
            self.dropped_points
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::series_element::RenderFrame;
    use async_trait::async_trait;

    struct FakeSource {
        history: Vec<Point>,
        unavailable: Option<SeriesId>,
    }

    #[async_trait]
    impl TelemetrySource for FakeSource {
        async fn request(&self, _series: &SeriesId, window: TimeWindow) -> anyhow::Result<Vec<Point>> {
            Ok(self
                .history
                .iter()
                .copied()
                .filter(|p| window.contains(p.domain))
                .collect())
        }

        fn subscribe(&self, series: &SeriesId, sink: mpsc::Sender<Datum>) -> anyhow::Result<FeedHandle> {
            if self.unavailable.as_ref() == Some(series) {
                anyhow::bail!("no feed for {}", series);
            }
            let task = tokio::spawn(async move {
                let _sink = sink;
                std::future::pending::<()>().await
            });
            Ok(FeedHandle::new(series.clone(), task))
        }
    }

    #[derive(Default)]
    struct RecordingSurface {
        redraws: usize,
        counts: Vec<(SeriesId, usize)>,
        widths: HashMap<SeriesId, f64>,
        last_axis: AxisState,
        hover: Option<(SeriesId, Option<f64>)>,
    }

    impl RenderSurface for RecordingSurface {
        fn redraw(&mut self, frames: &[RenderFrame<'_>], axis: AxisState) -> Vec<(SeriesId, f64)> {
            self.redraws += 1;
            self.last_axis = axis;
            self.counts = frames
                .iter()
                .map(|frame| (frame.series.clone(), frame.count))
                .collect();
            frames
                .iter()
                .filter_map(|frame| {
                    let width = self.widths.get(frame.series)?;
                    Some((frame.series.clone(), *width))
                })
                .collect()
        }

        fn hover(&mut self) -> Option<(SeriesId, Option<f64>)> {
            self.hover.take()
        }
    }

    fn history() -> Vec<Point> {
        (0..10).map(|i| Point::new(i as f64 * 10.0, i as f64)).collect()
    }

    fn config() -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.buffer.baseline_points = 16;
        config.element.initial_slots = 32;
        config.render.redraw_interval_ms = 5;
        config.history.follow_live = false;
        config
    }

    fn pipeline_with(source: FakeSource, config: &PipelineConfig) -> PlotPipeline<RecordingSurface> {
        PlotPipeline::new(Arc::new(source), RecordingSurface::default(), config)
    }

    fn pipeline() -> PlotPipeline<RecordingSurface> {
        let source = FakeSource {
            history: history(),
            unavailable: None,
        };
        pipeline_with(source, &config())
    }

    fn ids(names: &[&str]) -> Vec<SeriesId> {
        names.iter().map(|name| SeriesId::new(*name)).collect()
    }

    #[tokio::test]
    async fn test_navigate_loads_history_and_redraws() {
        let mut pipeline = pipeline();
        pipeline.surface.widths.insert(SeriesId::new("a"), 30.0);
        pipeline.surface.widths.insert(SeriesId::new("b"), 45.0);

        pipeline.navigate(&ids(&["a", "b"]), TimeWindow::new(0.0, 50.0));
        for _ in 0..2 {
            let response = pipeline.history_rx.recv().await.unwrap();
            let summary = pipeline.apply_history(response).unwrap();
            assert_eq!(summary.inserted, 6);
        }

        assert!(pipeline.redraw());
        assert_eq!(pipeline.surface().redraws, 1);
        assert_eq!(
            pipeline.surface().counts,
            vec![(SeriesId::new("a"), 6), (SeriesId::new("b"), 6)]
        );
        assert_eq!(pipeline.coordinator.max_tick_width(), 45.0);
        // the widened axis is drawn once, then nothing is pending
        assert!(pipeline.redraw());
        assert_eq!(pipeline.surface().last_axis.max_tick_width, 45.0);
        assert!(!pipeline.redraw());
        assert_eq!(pipeline.surface().redraws, 2);
    }

    #[tokio::test]
    async fn test_group_tick_width_change_reaches_surface() {
        let mut pipeline = pipeline();
        let a = SeriesId::new("a");
        pipeline.surface.widths.insert(a.clone(), 30.0);
        pipeline.add_series(&a).unwrap();
        pipeline.ingest(Datum::new(a.clone(), Point::new(1.0, 1.0)));

        assert!(pipeline.redraw());
        assert_eq!(pipeline.surface().last_axis.max_tick_width, 0.0);
        assert_eq!(pipeline.coordinator.max_tick_width(), 30.0);

        assert!(pipeline.redraw());
        assert_eq!(pipeline.surface().last_axis.max_tick_width, 30.0);
        assert!(!pipeline.redraw());
        assert_eq!(pipeline.surface().redraws, 2);
    }

    #[tokio::test]
    async fn test_stale_history_is_discarded() {
        let mut pipeline = pipeline();
        let window = TimeWindow::new(0.0, 100.0);
        let first = pipeline.navigate(&ids(&["a"]), window);
        let second = pipeline.navigate(&ids(&["a"]), window);

        let stale = HistoryResponse {
            ticket: first,
            series: SeriesId::new("a"),
            result: Ok(history()),
        };
        assert!(pipeline.apply_history(stale).is_none());
        assert!(pipeline.lines.get(&SeriesId::new("a")).unwrap().is_empty());

        let fresh = HistoryResponse {
            ticket: second,
            series: SeriesId::new("a"),
            result: Ok(history()),
        };
        assert!(pipeline.apply_history(fresh).is_some());
        assert_eq!(pipeline.lines.get(&SeriesId::new("a")).unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_failed_history_is_absorbed() {
        let mut pipeline = pipeline();
        let ticket = pipeline.navigate(&ids(&["a"]), TimeWindow::new(0.0, 1.0));

        let failed = HistoryResponse {
            ticket,
            series: SeriesId::new("a"),
            result: Err(anyhow::anyhow!("backend unavailable")),
        };
        assert!(pipeline.apply_history(failed).is_none());
    }

    #[tokio::test]
    async fn test_navigate_skips_series_without_feed() {
        let source = FakeSource {
            history: history(),
            unavailable: Some(SeriesId::new("bad")),
        };
        let mut pipeline = pipeline_with(source, &config());
        pipeline.add_series(&SeriesId::new("old")).unwrap();

        let ticket = pipeline.navigate(&ids(&["a", "bad", "b"]), TimeWindow::new(0.0, 20.0));

        assert!(pipeline.lines.get(&SeriesId::new("old")).is_none());
        assert!(pipeline.lines.get(&SeriesId::new("bad")).is_none());
        let mut loaded = Vec::new();
        for _ in 0..2 {
            let response = pipeline.history_rx.recv().await.unwrap();
            assert_eq!(response.ticket, ticket);
            loaded.push(response.series.clone());
            assert_eq!(pipeline.apply_history(response).unwrap().inserted, 3);
        }
        loaded.sort();
        assert_eq!(loaded, ids(&["a", "b"]));
    }

    #[tokio::test]
    async fn test_navigate_reloads_kept_series() {
        let mut pipeline = pipeline();
        let a = SeriesId::new("a");
        pipeline.add_series(&a).unwrap();
        pipeline.ingest(Datum::new(a.clone(), Point::new(500.0, 1.0)));
        pipeline.redraw();

        pipeline.navigate(&ids(&["a"]), TimeWindow::new(0.0, 20.0));

        assert!(pipeline.lines.get(&a).unwrap().is_empty());
        assert!(pipeline.redraw());
        assert_eq!(pipeline.surface().counts, vec![(a, 0)]);
    }

    #[tokio::test]
    async fn test_history_is_clipped_to_current_bounds() {
        let mut pipeline = pipeline();
        let a = SeriesId::new("a");
        let ticket = pipeline.navigate(&ids(&["a"]), TimeWindow::new(0.0, 100.0));
        pipeline.set_bounds(TimeWindow::new(30.0, 60.0));

        let response = HistoryResponse {
            ticket,
            series: a.clone(),
            result: Ok(history()),
        };
        let summary = pipeline.apply_history(response).unwrap();

        assert_eq!(summary.inserted, 4);
        let domains: Vec<f64> = pipeline.lines.get(&a).unwrap().points().iter().map(|p| p.domain).collect();
        assert_eq!(domains, vec![30.0, 40.0, 50.0, 60.0]);
    }

    #[tokio::test]
    async fn test_follow_slides_bounds_with_now() {
        let mut config = config();
        config.history.follow_live = true;
        config.history.window_ms = 30.0;
        let source = FakeSource {
            history: Vec::new(),
            unavailable: None,
        };
        let mut pipeline = pipeline_with(source, &config);
        let a = SeriesId::new("a");
        pipeline.add_series(&a).unwrap();
        for point in history() {
            pipeline.ingest(Datum::new(a.clone(), point));
        }

        assert_eq!(pipeline.follow(60.0), 6);
        assert_eq!(pipeline.lines.get(&a).unwrap().len(), 4);
        assert_eq!(pipeline.follow(90.0), 3);
        assert_eq!(pipeline.ingest(Datum::new(a.clone(), Point::new(40.0, 0.0))), None);
        assert_eq!(pipeline.lines.get(&a).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_follow_is_off_when_disabled() {
        let mut pipeline = pipeline();
        let a = SeriesId::new("a");
        pipeline.add_series(&a).unwrap();
        pipeline.ingest(Datum::new(a.clone(), Point::new(1.0, 1.0)));
        assert_eq!(pipeline.follow(1.0e12), 0);
        assert_eq!(pipeline.lines.get(&a).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_datum_after_removal_is_ignored() {
        let mut pipeline = pipeline();
        let a = SeriesId::new("a");
        pipeline.add_series(&a).unwrap();
        assert_eq!(
            pipeline.ingest(Datum::new(a.clone(), Point::new(1.0, 1.0))),
            Some(AddOutcome::Inserted(0))
        );

        pipeline.redraw();

        assert!(pipeline.remove_series(&a));
        assert!(!pipeline.remove_series(&a));
        assert_eq!(pipeline.ingest(Datum::new(a.clone(), Point::new(2.0, 2.0))), None);
        assert!(!pipeline.coordinator.contains(&a));
        assert!(pipeline.redraw());
        assert!(pipeline.surface().counts.is_empty());
    }

    #[tokio::test]
    async fn test_bounds_change_trims_lines() {
        let mut pipeline = pipeline();
        let a = SeriesId::new("a");
        pipeline.add_series(&a).unwrap();
        for point in history() {
            pipeline.ingest(Datum::new(a.clone(), point));
        }

        let removed = pipeline.set_bounds(TimeWindow::new(25.0, 70.0));

        assert_eq!(removed, 5);
        assert_eq!(pipeline.lines.get(&a).unwrap().len(), 5);
        assert_eq!(pipeline.ingest(Datum::new(a.clone(), Point::new(5.0, 0.0))), None);
        assert!(pipeline.redraw());
        assert_eq!(pipeline.surface().counts, vec![(a, 5)]);
    }

    #[tokio::test]
    async fn test_highlight_resolves_nearest_points() {
        let mut pipeline = pipeline();
        let (a, b) = (SeriesId::new("a"), SeriesId::new("b"));
        pipeline.add_series(&a).unwrap();
        pipeline.add_series(&b).unwrap();
        pipeline.ingest(Datum::new(a.clone(), Point::new(10.0, 1.0)));
        pipeline.ingest(Datum::new(b.clone(), Point::new(14.0, 2.0)));
        assert!(pipeline.redraw());
        assert!(!pipeline.redraw());
        assert!(pipeline.highlighted_points().is_empty());

        assert_eq!(pipeline.highlight(&a, Some(12.0)), 1);

        assert_eq!(
            pipeline.highlighted_points(),
            vec![(a.clone(), Point::new(10.0, 1.0)), (b, Point::new(14.0, 2.0))]
        );
        // no data changed, the highlight alone triggers the redraw
        assert!(pipeline.redraw());
        assert_eq!(pipeline.surface().last_axis.highlight, Some(12.0));
        assert!(!pipeline.redraw());

        pipeline.highlight(&a, Some(12.0));
        assert!(!pipeline.redraw());
    }

    #[tokio::test]
    async fn test_surface_hover_becomes_highlight() {
        let mut pipeline = pipeline();
        let a = SeriesId::new("a");
        pipeline.add_series(&a).unwrap();
        pipeline.ingest(Datum::new(a.clone(), Point::new(10.0, 1.0)));
        pipeline.surface.hover = Some((a.clone(), Some(11.0)));

        assert!(pipeline.redraw());
        assert_eq!(pipeline.highlighted_points(), vec![(a, Point::new(10.0, 1.0))]);

        assert!(pipeline.redraw());
        assert_eq!(pipeline.surface().last_axis.highlight, Some(11.0));
    }

    #[tokio::test]
    async fn test_run_ingests_until_shutdown() {
        let mut pipeline = pipeline();
        let a = SeriesId::new("a");
        pipeline.add_series(&a).unwrap();
        let tx = pipeline.datum_tx.clone();
        tx.send(Datum::new(a.clone(), Point::new(5.0, 1.0))).await.unwrap();
        tx.send(Datum::new(a.clone(), Point::new(3.0, 1.0))).await.unwrap();

        pipeline
            .run(tokio::time::sleep(Duration::from_millis(50)))
            .await;

        assert_eq!(pipeline.lines.get(&a).unwrap().len(), 2);
        assert!(pipeline.surface().redraws >= 1);
        assert_eq!(pipeline.surface().counts, vec![(a, 2)]);
    }
}
