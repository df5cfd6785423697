// Telemetry point domain models
use std::fmt;

/// Identifier of one telemetry source / series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesId(String);

impl SeriesId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A (domain, range) sample. Domain is usually a timestamp in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub domain: f64,
    pub range: f64,
}

impl Point {
    pub fn new(domain: f64, range: f64) -> Self {
        Self { domain, range }
    }
}

impl From<(f64, f64)> for Point {
    fn from((domain, range): (f64, f64)) -> Self {
        Self::new(domain, range)
    }
}

/// Closed domain window, as supplied by the time conductor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, domain: f64) -> bool {
        domain >= self.start && domain <= self.end
    }

    pub fn span(&self) -> f64 {
        self.end - self.start
    }
}

/// A sample delivered by a live telemetry subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct Datum {
    pub series: SeriesId,
    pub point: Point,
}

impl Datum {
    pub fn new(series: SeriesId, point: Point) -> Self {
        Self { series, point }
    }
}
