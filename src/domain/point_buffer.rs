// PointBuffer - interleaved domain/range storage kept in domain order
use crate::domain::error::{BufferError, BufferResult};
use crate::domain::point::Point;

/// Default number of points a fresh buffer can hold before growing.
pub const DEFAULT_BASELINE_POINTS: usize = 10_000;

const SLOTS_PER_POINT: usize = 2;

/// Result of looking up where a domain value belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// Insert at this index to keep domain order.
    At(usize),
    /// A point with exactly this domain value is already stored at this index.
    Duplicate(usize),
}

/// Growable block of interleaved `(domain, range)` slots.
///
/// Invariants:
/// - `slots.len() == capacity * 2`, and capacity is `baseline * 2^k`
/// - domain values over `0..count` are strictly increasing
/// - slots past `count * 2` are zero
#[derive(Debug, Clone, PartialEq)]
pub struct PointBuffer {
    slots: Vec<f64>,
    count: usize,
    baseline: usize,
    max_capacity: usize,
}

impl PointBuffer {
    /// Create a buffer holding `baseline` points that may double at most
    /// `max_doublings` times.
    pub fn new(baseline: usize, max_doublings: u32) -> Self {
        let baseline = baseline.max(1);
        let mut max_capacity = baseline;
        for _ in 0..max_doublings {
            match max_capacity.checked_mul(2 * SLOTS_PER_POINT) {
                Some(_) => max_capacity *= 2,
                None => break,
            }
        }

        Self {
            slots: vec![0.0; baseline * SLOTS_PER_POINT],
            count: 0,
            baseline,
            max_capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of points that fit without growing.
    pub fn capacity(&self) -> usize {
        self.slots.len() / SLOTS_PER_POINT
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    pub fn domain(&self, index: usize) -> Option<f64> {
        (index < self.count).then(|| self.slots[index * SLOTS_PER_POINT])
    }

    pub fn point(&self, index: usize) -> Option<Point> {
        (index < self.count).then(|| self.point_unchecked(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = Point> + '_ {
        self.as_slice()
            .chunks_exact(SLOTS_PER_POINT)
            .map(|pair| Point::new(pair[0], pair[1]))
    }

    /// Live slots only: `[d0, r0, d1, r1, ...]`.
    pub fn as_slice(&self) -> &[f64] {
        &self.slots[..self.count * SLOTS_PER_POINT]
    }

    /// Index of the first stored point whose domain is `>= domain`.
    pub fn lower_bound(&self, domain: f64) -> usize {
        self.partition(|stored| stored < domain)
    }

    /// Index of the first stored point whose domain is `> domain`.
    pub fn upper_bound(&self, domain: f64) -> usize {
        self.partition(|stored| stored <= domain)
    }

    pub fn find_insertion_index(&self, domain: f64) -> BufferResult<Insertion> {
        check_domain(domain)?;
        let index = self.lower_bound(domain);
        if self.domain(index) == Some(domain) {
            Ok(Insertion::Duplicate(index))
        } else {
            Ok(Insertion::At(index))
        }
    }

    /// Splice a single point in at `index`. The buffer is unchanged on error.
    pub fn insert_point(&mut self, domain: f64, range: f64, index: usize) -> BufferResult<()> {
        self.insert(&[Point::new(domain, range)], index)
    }

    /// Splice a strictly ascending run of points in at `index`.
    pub fn insert(&mut self, series: &[Point], index: usize) -> BufferResult<()> {
        if series.is_empty() {
            return Ok(());
        }
        if index > self.count {
            return Err(BufferError::IndexOutOfBounds {
                index,
                len: self.count,
            });
        }
        for point in series {
            check_domain(point.domain)?;
        }

        let out_of_order = BufferError::OutOfOrder {
            index,
            len: series.len(),
        };
        if series.windows(2).any(|pair| pair[0].domain >= pair[1].domain) {
            return Err(out_of_order);
        }
        let first = series[0].domain;
        let last = series[series.len() - 1].domain;
        if index > 0 && self.slots[(index - 1) * SLOTS_PER_POINT] >= first {
            return Err(out_of_order);
        }
        if index < self.count && self.slots[index * SLOTS_PER_POINT] <= last {
            return Err(out_of_order);
        }

        self.ensure_capacity(series.len())?;

        let start = index * SLOTS_PER_POINT;
        let end = self.count * SLOTS_PER_POINT;
        let width = series.len() * SLOTS_PER_POINT;
        self.slots.copy_within(start..end, start + width);
        for (offset, point) in series.iter().enumerate() {
            let slot = start + offset * SLOTS_PER_POINT;
            self.slots[slot] = point.domain;
            self.slots[slot + 1] = point.range;
        }
        self.count += series.len();
        Ok(())
    }

    /// Remove `count` points starting at `index`, returning them in order.
    pub fn remove(&mut self, index: usize, count: usize) -> BufferResult<Vec<Point>> {
        let end = index.checked_add(count).filter(|&end| end <= self.count);
        let Some(end) = end else {
            return Err(BufferError::IndexOutOfBounds {
                index: index.saturating_add(count),
                len: self.count,
            });
        };

        let removed = (index..end).map(|i| self.point_unchecked(i)).collect();
        let live_end = self.count * SLOTS_PER_POINT;
        self.slots
            .copy_within(end * SLOTS_PER_POINT..live_end, index * SLOTS_PER_POINT);
        self.count -= count;
        self.slots[self.count * SLOTS_PER_POINT..live_end].fill(0.0);
        Ok(removed)
    }

    /// Evict the `n` oldest points (fewer if the buffer holds less).
    pub fn trim(&mut self, n: usize) -> Vec<Point> {
        let n = n.min(self.count);
        // in bounds after clamping
        self.remove(0, n).unwrap_or_default()
    }

    /// Overwrite the range value at `index`, returning the previous point.
    pub fn replace_range(&mut self, index: usize, range: f64) -> BufferResult<Point> {
        let previous = self.point(index).ok_or(BufferError::IndexOutOfBounds {
            index,
            len: self.count,
        })?;
        self.slots[index * SLOTS_PER_POINT + 1] = range;
        Ok(previous)
    }

    /// Drop every point and shrink back to the baseline allocation.
    pub fn clear(&mut self) {
        self.slots = vec![0.0; self.baseline * SLOTS_PER_POINT];
        self.count = 0;
    }

    fn ensure_capacity(&mut self, additional: usize) -> BufferResult<()> {
        let exceeded = BufferError::CapacityExceeded {
            max: self.max_capacity,
        };
        let required = self.count.checked_add(additional).ok_or(exceeded.clone())?;
        if required <= self.capacity() {
            return Ok(());
        }

        let mut capacity = self.capacity();
        while capacity < required {
            if capacity >= self.max_capacity {
                return Err(exceeded);
            }
            capacity *= 2;
        }

        tracing::debug!(
            "Growing point buffer from {} to {} points",
            self.capacity(),
            capacity
        );
        self.slots.resize(capacity * SLOTS_PER_POINT, 0.0);
        Ok(())
    }

    fn partition(&self, mut before: impl FnMut(f64) -> bool) -> usize {
        let (mut lo, mut hi) = (0, self.count);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if before(self.slots[mid * SLOTS_PER_POINT]) {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    fn point_unchecked(&self, index: usize) -> Point {
        let slot = index * SLOTS_PER_POINT;
        Point::new(self.slots[slot], self.slots[slot + 1])
    }
}

impl Default for PointBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BASELINE_POINTS, 8)
    }
}

fn check_domain(domain: f64) -> BufferResult<()> {
    if domain.is_finite() {
        Ok(())
    } else {
        Err(BufferError::NonFiniteDomain(domain))
    }
}
