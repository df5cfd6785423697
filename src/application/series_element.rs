// SeriesElement - mirrors a series into a renderer-ready vertex buffer
use crate::application::series_events::{ListenerId, SeriesEvent, SeriesSubscription};
use crate::domain::point::{Point, SeriesId};
use crate::infrastructure::config::ElementSettings;
use serde::Deserialize;

/// Initial vertex slots (10,000 points at two slots each).
pub const DEFAULT_INITIAL_SLOTS: usize = 20_000;
/// Slots added each time the vertex buffer runs out of room.
pub const DEFAULT_GROW_SLOTS: usize = 20_000;

/// Where the renderer-relative coordinate origin comes from.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginPolicy {
    /// The first point added after construction or a fresh reset.
    #[default]
    FirstPointObserved,
    ExplicitPivot { domain: f64, range: f64 },
}

/// Subtracted from every point before narrowing to `f32`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Offset {
    pub domain: f64,
    pub range: f64,
}

impl From<Point> for Offset {
    fn from(point: Point) -> Self {
        Self {
            domain: point.domain,
            range: point.range,
        }
    }
}

/// Turns one point into a fixed number of vertex slots.
pub trait VertexEncoder {
    fn arity(&self) -> usize;
    fn encode(&self, point: Point, offset: Offset, out: &mut [f32]);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DomainRangeEncoder;

impl VertexEncoder for DomainRangeEncoder {
    fn arity(&self) -> usize {
        2
    }

    fn encode(&self, point: Point, offset: Offset, out: &mut [f32]) {
        out[0] = (point.domain - offset.domain) as f32;
        out[1] = (point.range - offset.range) as f32;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementState {
    Uninitialized,
    Active,
    Destroyed,
}

/// Borrowed view handed to a render surface.
#[derive(Debug, Clone, Copy)]
pub struct RenderFrame<'a> {
    pub series: &'a SeriesId,
    pub vertices: &'a [f32],
    pub count: usize,
    pub arity: usize,
    pub offset: Option<Offset>,
}

pub struct SeriesElement<E: VertexEncoder = DomainRangeEncoder> {
    series: SeriesId,
    encoder: E,
    offset: Option<Offset>,
    buffer: Box<[f32]>,
    count: usize,
    initial_slots: usize,
    grow_slots: usize,
    state: ElementState,
    subscription: Option<SeriesSubscription>,
    dirty: bool,
}

impl SeriesElement {
    pub fn new(series: SeriesId, settings: &ElementSettings) -> Self {
        Self::with_encoder(series, settings, DomainRangeEncoder)
    }
}

impl<E: VertexEncoder> SeriesElement<E> {
    pub fn with_encoder(series: SeriesId, settings: &ElementSettings, encoder: E) -> Self {
        let initial_slots = settings.initial_slots.max(encoder.arity());
        Self {
            series,
            encoder,
            offset: pivot_offset(settings.origin),
            buffer: vec![0.0; initial_slots].into_boxed_slice(),
            count: 0,
            initial_slots,
            grow_slots: settings.grow_slots.max(1),
            state: ElementState::Uninitialized,
            subscription: None,
            dirty: false,
        }
    }

    pub fn series(&self) -> &SeriesId {
        &self.series
    }

    pub fn state(&self) -> ElementState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Registration this element is listening on, if attached.
    pub fn listener(&self) -> Option<ListenerId> {
        self.subscription.as_ref().map(|s| s.id())
    }

    pub fn vertices(&self) -> &[f32] {
        &self.buffer[..self.count * self.encoder.arity()]
    }

    pub fn render_frame(&self) -> RenderFrame<'_> {
        RenderFrame {
            series: &self.series,
            vertices: self.vertices(),
            count: self.count,
            arity: self.encoder.arity(),
            offset: self.offset,
        }
    }

    /// Returns whether the buffer changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Start listening to a series. Replaces any previous subscription.
    pub fn attach(&mut self, subscription: SeriesSubscription) {
        if self.state == ElementState::Destroyed {
            tracing::debug!("Ignoring attach on destroyed element {}", self.series);
            return;
        }
        if let Some(mut previous) = self.subscription.replace(subscription) {
            previous.close();
        }
    }

    /// Apply every queued event in order. Returns how many were applied.
    pub fn sync(&mut self) -> usize {
        let mut applied = 0;
        while self.state != ElementState::Destroyed {
            let Some(event) = self.subscription.as_mut().and_then(|s| s.try_next()) else {
                break;
            };
            self.apply(event);
            applied += 1;
        }
        applied
    }

    pub fn apply(&mut self, event: SeriesEvent) {
        match event {
            SeriesEvent::Add { point, index } => self.add(point, index),
            SeriesEvent::Remove { point, index } => self.remove(point, index),
            SeriesEvent::Reset(points) => self.reset(&points),
            SeriesEvent::Destroy => self.destroy(),
        }
    }

    pub fn add(&mut self, point: Point, index: usize) {
        if self.state == ElementState::Destroyed {
            tracing::debug!("Dropping add on destroyed element {}", self.series);
            return;
        }
        if index > self.count {
            tracing::warn!(
                "Element {} got add at {} with only {} points",
                self.series,
                index,
                self.count
            );
            return;
        }

        let offset = *self.offset.get_or_insert(Offset::from(point));
        self.state = ElementState::Active;

        let arity = self.encoder.arity();
        let insertion = index * arity;
        let used = self.count * arity;
        self.grow_if_needed(arity);

        let mut vertex = vec![0.0f32; arity];
        self.encoder.encode(point, offset, &mut vertex);

        if used > insertion {
            let capacity = self.buffer.len();
            let mut staging = std::mem::take(&mut self.buffer).into_vec();
            staging.splice(insertion..insertion, vertex);
            staging.truncate(capacity);
            self.buffer = staging.into_boxed_slice();
        } else {
            self.buffer[insertion..insertion + arity].copy_from_slice(&vertex);
        }

        self.count += 1;
        self.dirty = true;
    }

    pub fn remove(&mut self, point: Point, index: usize) {
        if self.state == ElementState::Destroyed {
            tracing::debug!("Dropping remove on destroyed element {}", self.series);
            return;
        }
        if index >= self.count {
            tracing::warn!(
                "Element {} got remove of {} at {} with only {} points",
                self.series,
                point.domain,
                index,
                self.count
            );
            return;
        }

        let arity = self.encoder.arity();
        let removal = index * arity;
        let used = self.count * arity;
        self.buffer.copy_within(removal + arity..used, removal);
        self.buffer[used - arity..used].fill(0.0);
        self.count -= 1;
        self.dirty = true;
    }

    /// Rebuild from `points`, keeping the offset if one is already set.
    pub fn reset(&mut self, points: &[Point]) {
        if self.state == ElementState::Destroyed {
            return;
        }
        self.buffer = vec![0.0; self.initial_slots].into_boxed_slice();
        self.count = 0;
        self.dirty = true;
        for (index, &point) in points.iter().enumerate() {
            self.add(point, index);
        }
    }

    /// Detach and release. Nothing mutates the element afterwards.
    pub fn destroy(&mut self) {
        if self.state == ElementState::Destroyed {
            return;
        }
        if let Some(mut subscription) = self.subscription.take() {
            subscription.close();
        }
        self.state = ElementState::Destroyed;
        self.buffer = Box::default();
        self.count = 0;
        self.dirty = false;
        tracing::debug!("Destroyed element {}", self.series);
    }

    fn grow_if_needed(&mut self, required: usize) {
        let used = self.count * self.encoder.arity();
        let mut size = self.buffer.len();
        while size - used <= required {
            size += self.grow_slots;
        }
        if size != self.buffer.len() {
            let mut staging = std::mem::take(&mut self.buffer).into_vec();
            staging.resize(size, 0.0);
            self.buffer = staging.into_boxed_slice();
        }
    }
}

fn pivot_offset(origin: OriginPolicy) -> Option<Offset> {
    match origin {
        OriginPolicy::FirstPointObserved => None,
        OriginPolicy::ExplicitPivot { domain, range } => Some(Offset { domain, range }),
    }
}
