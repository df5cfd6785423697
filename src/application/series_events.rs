// Series change notifications - explicit subscribe/unsubscribe handles
use crate::domain::point::Point;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Change published by a series model, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesEvent {
    Add { point: Point, index: usize },
    Remove { point: Point, index: usize },
    /// Every listener must discard its state and rebuild from these points.
    Reset(Vec<Point>),
    Destroy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Default)]
pub struct SeriesNotifier {
    next_id: u64,
    listeners: Vec<(ListenerId, UnboundedSender<SeriesEvent>)>,
}

impl SeriesNotifier {
    pub fn subscribe(&mut self) -> SeriesSubscription {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners.push((id, tx));
        SeriesSubscription { id, events: rx }
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    /// Deliver to one listener only.
    pub fn send_to(&mut self, id: ListenerId, event: SeriesEvent) {
        if let Some((_, tx)) = self.listeners.iter().find(|(listener, _)| *listener == id) {
            let _ = tx.send(event);
        }
    }

    /// Deliver to every live listener, pruning the ones that hung up.
    pub fn emit(&mut self, event: SeriesEvent) {
        self.listeners
            .retain(|(_, tx)| tx.send(event.clone()).is_ok());
    }
}

/// Receiving end of one listener registration.
#[derive(Debug)]
pub struct SeriesSubscription {
    id: ListenerId,
    events: UnboundedReceiver<SeriesEvent>,
}

impl SeriesSubscription {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Next queued event, if any. Never waits.
    pub fn try_next(&mut self) -> Option<SeriesEvent> {
        self.events.try_recv().ok()
    }

    /// Stop further delivery; the notifier drops this listener on its next emit.
    pub fn close(&mut self) {
        self.events.close();
    }
}
