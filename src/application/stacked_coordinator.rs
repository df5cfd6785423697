// Stacked series coordination - shared tick widths, highlights and request tickets
use crate::application::request_sequencer::{RequestSequencer, RequestTicket};
use crate::application::series_element::{ElementState, RenderFrame, SeriesElement};
use crate::domain::point::SeriesId;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorEvent {
    /// The group's maximum tick width changed.
    TickWidthChanged(f64),
    /// Highlight relayed from another member of the group.
    Highlight {
        target: SeriesId,
        domain: Option<f64>,
    },
}

/// A child and the metadata tracked for it. Kept in one slot so the
/// tick-width set can never drift from the child set.
struct ChildSlot {
    element: SeriesElement,
    tick_width: f64,
    highlight: Option<f64>,
}

#[derive(Default)]
pub struct StackedSeriesCoordinator {
    children: Vec<ChildSlot>,
    max_tick_width: f64,
    requests: RequestSequencer,
    subscribers: Vec<UnboundedSender<CoordinatorEvent>>,
}

impl StackedSeriesCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> UnboundedReceiver<CoordinatorEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Returns false if a child for the same series is already present.
    pub fn add_child(&mut self, element: SeriesElement) -> bool {
        if self.contains(element.series()) {
            tracing::warn!("Series {} is already stacked", element.series());
            return false;
        }
        self.children.push(ChildSlot {
            element,
            tick_width: 0.0,
            highlight: None,
        });
        true
    }

    pub fn remove_child(&mut self, series: &SeriesId) -> Option<SeriesElement> {
        let position = self.position(series)?;
        let slot = self.children.remove(position);
        self.recompute_max();
        Some(slot.element)
    }

    pub fn contains(&self, series: &SeriesId) -> bool {
        self.position(series).is_some()
    }

    pub fn series(&self) -> impl Iterator<Item = &SeriesId> {
        self.children.iter().map(|slot| slot.element.series())
    }

    pub fn max_tick_width(&self) -> f64 {
        self.max_tick_width
    }

    pub fn highlight_of(&self, series: &SeriesId) -> Option<f64> {
        self.position(series).and_then(|i| self.children[i].highlight)
    }

    /// Record a member's tick width. Returns the new group maximum when it changed.
    pub fn on_tick_width_changed(&mut self, source: &SeriesId, width: f64) -> Option<f64> {
        if !width.is_finite() || width < 0.0 {
            tracing::warn!("Ignoring tick width {} from {}", width, source);
            return None;
        }
        let Some(position) = self.position(source) else {
            tracing::debug!("Tick width from untracked series {}", source);
            return None;
        };
        self.children[position].tick_width = width;
        self.recompute_max()
    }

    /// Relay a highlight to every other member. Returns how many received it.
    pub fn highlight(&mut self, origin: &SeriesId, domain: Option<f64>) -> usize {
        if self.position(origin).is_none() {
            return 0;
        }
        let mut relayed = Vec::new();
        for slot in &mut self.children {
            slot.highlight = domain;
            if slot.element.series() != origin {
                relayed.push(CoordinatorEvent::Highlight {
                    target: slot.element.series().clone(),
                    domain,
                });
            }
        }
        let count = relayed.len();
        for event in relayed {
            self.publish(event);
        }
        count
    }

    /// Supersede every in-flight historical request.
    pub fn begin_navigation(&mut self) -> RequestTicket {
        self.requests.next()
    }

    pub fn accepts(&self, ticket: RequestTicket) -> bool {
        self.requests.is_current(ticket)
    }

    /// Drain every child's pending events. Returns true if any buffer changed.
    pub fn sync(&mut self) -> bool {
        let mut dirty = false;
        for slot in &mut self.children {
            slot.element.sync();
            dirty |= slot.element.take_dirty();
        }
        dirty
    }

    /// Frames of every live child. Children whose series was destroyed draw nothing.
    pub fn frames(&self) -> Vec<RenderFrame<'_>> {
        self.children
            .iter()
            .filter(|slot| slot.element.state() != ElementState::Destroyed)
            .map(|slot| slot.element.render_frame())
            .collect()
    }

    fn recompute_max(&mut self) -> Option<f64> {
        let max = self
            .children
            .iter()
            .map(|slot| slot.tick_width)
            .fold(0.0, f64::max);
        if max == self.max_tick_width {
            return None;
        }
        self.max_tick_width = max;
        self.publish(CoordinatorEvent::TickWidthChanged(max));
        Some(max)
    }

    fn publish(&mut self, event: CoordinatorEvent) {
        self.subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn position(&self, series: &SeriesId) -> Option<usize> {
        self.children
            .iter()
            .position(|slot| slot.element.series() == series)
    }
}
