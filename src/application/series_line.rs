// SeriesLine - sorted ingestion of one telemetry series
use crate::application::series_events::{ListenerId, SeriesEvent, SeriesNotifier, SeriesSubscription};
use crate::domain::error::{BufferError, BufferResult};
use crate::domain::point::{Point, SeriesId, TimeWindow};
use crate::domain::point_buffer::{Insertion, PointBuffer};
use crate::infrastructure::config::BufferSettings;
use serde::Deserialize;

/// What to do with a point whose domain value is already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    #[default]
    Reject,
    Overwrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Inserted(usize),
    Replaced(usize),
    Duplicate,
    /// Capacity could not be reclaimed; see `take_warnings`.
    Dropped,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InsertSummary {
    pub inserted: usize,
    pub replaced: usize,
    pub duplicates: usize,
    pub dropped: usize,
}

impl InsertSummary {
    fn record(&mut self, outcome: AddOutcome) {
        match outcome {
            AddOutcome::Inserted(_) => self.inserted += 1,
            AddOutcome::Replaced(_) => self.replaced += 1,
            AddOutcome::Duplicate => self.duplicates += 1,
            AddOutcome::Dropped => self.dropped += 1,
        }
    }
}

/// Non-fatal report that a point was dropped under capacity pressure.
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityWarning {
    pub series: SeriesId,
    pub dropped: Point,
    pub max_capacity: usize,
}

pub struct SeriesLine {
    id: SeriesId,
    buffer: PointBuffer,
    duplicate_policy: DuplicatePolicy,
    trim_batch: usize,
    notifier: SeriesNotifier,
    warnings: Vec<CapacityWarning>,
    /// Newest domain given up to capacity pressure. Nothing at or below it is stored again.
    evicted_through: Option<f64>,
}

impl SeriesLine {
    pub fn new(id: SeriesId, settings: &BufferSettings) -> Self {
        Self {
            id,
            buffer: PointBuffer::new(settings.baseline_points, settings.max_doublings),
            duplicate_policy: settings.duplicate_policy,
            trim_batch: settings.trim_batch.max(1),
            notifier: SeriesNotifier::default(),
            warnings: Vec::new(),
            evicted_through: None,
        }
    }

    pub fn id(&self) -> &SeriesId {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn points(&self) -> Vec<Point> {
        self.buffer.iter().collect()
    }

    /// Register a listener. It first receives a `Reset` with the current points.
    pub fn subscribe(&mut self) -> SeriesSubscription {
        let subscription = self.notifier.subscribe();
        self.notifier
            .send_to(subscription.id(), SeriesEvent::Reset(self.points()));
        subscription
    }

    pub fn unsubscribe(&mut self, listener: ListenerId) -> bool {
        self.notifier.unsubscribe(listener)
    }

    pub fn add_point(&mut self, point: Point) -> BufferResult<AddOutcome> {
        if self.is_evicted(point.domain) {
            return Ok(self.drop_point(point));
        }
        match self.buffer.find_insertion_index(point.domain)? {
            Insertion::Duplicate(index) => self.resolve_duplicate(index, point),
            Insertion::At(index) => match self.buffer.insert_point(point.domain, point.range, index) {
                Ok(()) => {
                    self.notifier.emit(SeriesEvent::Add { point, index });
                    Ok(AddOutcome::Inserted(index))
                }
                Err(BufferError::CapacityExceeded { .. }) => self.evict_and_retry(point),
                Err(e) => Err(e),
            },
        }
    }

    /// Insert a whole series. Input order does not matter; points are merged
    /// into the existing data as runs that fit between stored neighbours.
    pub fn add_series(&mut self, points: &[Point]) -> BufferResult<InsertSummary> {
        let mut summary = InsertSummary::default();
        if points.is_empty() {
            return Ok(summary);
        }
        if let Some(bad) = points.iter().find(|p| !p.domain.is_finite()) {
            return Err(BufferError::NonFiniteDomain(bad.domain));
        }

        let mut sorted = points.to_vec();
        sorted.sort_by(|a, b| a.domain.total_cmp(&b.domain));

        let mut rest = sorted.as_slice();
        while let Some(&first) = rest.first() {
            if self.is_evicted(first.domain) {
                summary.record(self.drop_point(first));
                rest = &rest[1..];
                continue;
            }
            let index = match self.buffer.find_insertion_index(first.domain)? {
                Insertion::Duplicate(index) => {
                    summary.record(self.resolve_duplicate(index, first)?);
                    rest = &rest[1..];
                    continue;
                }
                Insertion::At(index) => index,
            };

            let ceiling = self.buffer.domain(index);
            let run_len = contiguous_run(rest, ceiling);
            let (run, remaining) = rest.split_at(run_len);

            match self.buffer.insert(run, index) {
                Ok(()) => {
                    for (offset, &point) in run.iter().enumerate() {
                        self.notifier.emit(SeriesEvent::Add {
                            point,
                            index: index + offset,
                        });
                    }
                    summary.inserted += run.len();
                }
                Err(BufferError::CapacityExceeded { .. }) => {
                    for &point in run {
                        summary.record(self.add_point(point)?);
                    }
                }
                Err(e) => return Err(e),
            }
            rest = remaining;
        }

        tracing::debug!(
            "Series {} merged {} points ({} inserted, {} duplicates, {} dropped)",
            self.id,
            points.len(),
            summary.inserted,
            summary.duplicates,
            summary.dropped
        );
        Ok(summary)
    }

    /// Evict the `n` oldest points.
    pub fn trim(&mut self, n: usize) -> Vec<Point> {
        let evicted = self.buffer.trim(n);
        for &point in &evicted {
            self.notifier.emit(SeriesEvent::Remove { point, index: 0 });
        }
        evicted
    }

    /// Drop everything outside `window`. Returns how many points went.
    pub fn retain_window(&mut self, window: TimeWindow) -> usize {
        let mut removed = self.trim(self.buffer.lower_bound(window.start));

        let tail = self.buffer.upper_bound(window.end);
        let tail_len = self.buffer.len() - tail;
        if let Ok(points) = self.buffer.remove(tail, tail_len) {
            for point in points {
                self.notifier.emit(SeriesEvent::Remove { point, index: tail });
                removed.push(point);
            }
        }
        removed.len()
    }

    /// Drop every point and forget past evictions.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.evicted_through = None;
        self.notifier.emit(SeriesEvent::Reset(Vec::new()));
    }

    /// Stored point closest in domain to `domain`; ties go to the earlier one.
    pub fn nearest(&self, domain: f64) -> Option<(usize, Point)> {
        if !domain.is_finite() {
            return None;
        }
        let index = self.buffer.lower_bound(domain);
        let after = self.buffer.point(index).map(|p| (index, p));
        let before = index
            .checked_sub(1)
            .and_then(|i| self.buffer.point(i).map(|p| (i, p)));
        match (before, after) {
            (Some(b), Some(a)) => {
                if domain - b.1.domain <= a.1.domain - domain {
                    Some(b)
                } else {
                    Some(a)
                }
            }
            (b, a) => b.or(a),
        }
    }

    pub fn take_warnings(&mut self) -> Vec<CapacityWarning> {
        std::mem::take(&mut self.warnings)
    }

    /// Tell listeners this series is gone. No events follow.
    pub fn destroy(&mut self) {
        self.notifier.emit(SeriesEvent::Destroy);
        self.notifier = SeriesNotifier::default();
    }

    fn resolve_duplicate(&mut self, index: usize, point: Point) -> BufferResult<AddOutcome> {
        match self.duplicate_policy {
            DuplicatePolicy::Reject => {
                tracing::debug!("Series {} ignored duplicate at {}", self.id, point.domain);
                Ok(AddOutcome::Duplicate)
            }
            DuplicatePolicy::Overwrite => {
                let previous = self.buffer.replace_range(index, point.range)?;
                self.notifier.emit(SeriesEvent::Remove {
                    point: previous,
                    index,
                });
                self.notifier.emit(SeriesEvent::Add { point, index });
                Ok(AddOutcome::Replaced(index))
            }
        }
    }

    fn evict_and_retry(&mut self, point: Point) -> BufferResult<AddOutcome> {
        let evicted = self.trim(self.trim_batch);
        tracing::debug!(
            "Series {} full, evicted {} oldest points",
            self.id,
            evicted.len()
        );
        if let Some(newest) = evicted.last() {
            self.evicted_through = Some(newest.domain);
        }

        if !self.is_evicted(point.domain) {
            match self.buffer.find_insertion_index(point.domain)? {
                Insertion::Duplicate(index) => return self.resolve_duplicate(index, point),
                Insertion::At(index) => {
                    match self.buffer.insert_point(point.domain, point.range, index) {
                        Ok(()) => {
                            self.notifier.emit(SeriesEvent::Add { point, index });
                            return Ok(AddOutcome::Inserted(index));
                        }
                        Err(BufferError::CapacityExceeded { .. }) => {}
                        Err(e) => return Err(e),
                    }
                }
            }
        }
        Ok(self.drop_point(point))
    }

    fn is_evicted(&self, domain: f64) -> bool {
        self.evicted_through.is_some_and(|mark| domain <= mark)
    }

    fn drop_point(&mut self, point: Point) -> AddOutcome {
        let warning = CapacityWarning {
            series: self.id.clone(),
            dropped: point,
            max_capacity: self.buffer.max_capacity(),
        };
        tracing::warn!(
            "Series {} dropped point at {} (max capacity {})",
            self.id,
            point.domain,
            warning.max_capacity
        );
        self.warnings.push(warning);
        AddOutcome::Dropped
    }
}

/// Length of the ascending prefix of `points` that stays below `ceiling`.
fn contiguous_run(points: &[Point], ceiling: Option<f64>) -> usize {
    let mut len = 0;
    let mut previous = f64::NEG_INFINITY;
    for point in points {
        let below_ceiling = ceiling.is_none_or(|c| point.domain < c);
        if !below_ceiling || point.domain <= previous {
            break;
        }
        previous = point.domain;
        len += 1;
    }
    len
}
