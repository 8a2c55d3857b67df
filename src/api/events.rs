//! Typed events delivered to application code and the bus that fans them out

use crate::algorithms::Boundary;
use crate::core::{Accuracy, Coordinate, FixStatus, SatelliteView, StreamKind, Timestamped, Velocity};
use crate::core::{LocationError, LocationResult};
use std::sync::mpsc::{self, Receiver};

/// Payload of an `Updated` event
#[derive(Debug, Clone, PartialEq)]
pub enum LocationUpdate {
    Position { position: Coordinate, accuracy: Accuracy },
    Velocity { velocity: Velocity, accuracy: Accuracy },
    Satellite(SatelliteView),
}

impl LocationUpdate {
    pub fn kind(&self) -> StreamKind {
        match self {
            LocationUpdate::Position { .. } => StreamKind::Position,
            LocationUpdate::Velocity { .. } => StreamKind::Velocity,
            LocationUpdate::Satellite(_) => StreamKind::Satellite,
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            LocationUpdate::Position { position, .. } => position.timestamp(),
            LocationUpdate::Velocity { velocity, .. } => velocity.timestamp(),
            LocationUpdate::Satellite(view) => view.timestamp(),
        }
    }
}

/// Everything a provider can tell its subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    ServiceEnabled(FixStatus),
    ServiceDisabled,
    Updated(LocationUpdate),
    ZoneIn {
        boundary: Boundary,
        position: Coordinate,
        accuracy: Accuracy,
    },
    ZoneOut {
        boundary: Boundary,
        position: Coordinate,
        accuracy: Accuracy,
    },
}

/// Callback invoked for every published event
pub type EventCallback = Box<dyn FnMut(&LocationEvent)>;

/// Subscription handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u32);

impl SubscriptionHandle {
    pub fn id(&self) -> u32 {
        self.0
    }
}

/// Per-provider fan-out of events to any number of subscribers.
///
/// Subscribers are called synchronously in subscription order.
#[derive(Default)]
pub struct EventBus {
    next_id: u32,
    subscribers: Vec<(SubscriptionHandle, EventCallback)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, callback: EventCallback) -> SubscriptionHandle {
        self.next_id += 1;
        let handle = SubscriptionHandle(self.next_id);
        self.subscribers.push((handle, callback));
        handle
    }

    pub fn unsubscribe(&mut self, handle: SubscriptionHandle) -> LocationResult<()> {
        let before = self.subscribers.len();
        self.subscribers.retain(|(h, _)| *h != handle);
        if self.subscribers.len() == before {
            return Err(LocationError::Parameter);
        }
        Ok(())
    }

    pub fn publish(&mut self, event: &LocationEvent) {
        for (_, callback) in self.subscribers.iter_mut() {
            callback(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// Subscriber that queues events on a channel, for consumers that drain
/// events on their own schedule.
pub fn event_channel() -> (EventCallback, Receiver<LocationEvent>) {
    let (tx, rx) = mpsc::channel();
    let callback: EventCallback = Box::new(move |event: &LocationEvent| {
        // A dropped receiver just means nobody is listening any more
        let _ = tx.send(event.clone());
    });
    (callback, rx)
}
