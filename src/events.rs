//! Start / end notifications.
//!
//! Controllers never call user code from the render pass. They post
//! [`AnimationEvent`]s into a channel and the application drains it on its
//! own thread, at its own pace.
//!
//! ```ignore
//! let events = controller.events();
//! for event in events.try_iter() {
//!     match event {
//!         AnimationEvent::Started => log::info!("confetti!"),
//!         AnimationEvent::Ended { cycle } => log::info!("cycle {cycle} done"),
//!     }
//! }
//! ```

use crossbeam_channel::{Receiver, Sender, TrySendError};

/// Events kept for a listener that is not draining. Newer ones are dropped.
pub const EVENT_CAPACITY: usize = 256;

/// Lifecycle notification from a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationEvent {
    /// A restart began a new animation.
    Started,
    /// A cycle played to its end. `cycle` counts from 1 since the last
    /// restart; infinite animations emit one per loop.
    Ended { cycle: u64 },
}

/// Sending half owned by a controller, plus a receiver template to hand out.
#[derive(Debug, Clone)]
pub struct EventBridge {
    sender: Sender<AnimationEvent>,
    receiver: Receiver<AnimationEvent>,
}

impl Default for EventBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBridge {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::bounded(EVENT_CAPACITY);
        Self { sender, receiver }
    }

    /// Post an event. Never blocks: when the queue is full the event is
    /// dropped. The bridge holds a receiver itself, so the channel cannot be
    /// disconnected.
    pub fn emit(&self, event: AnimationEvent) {
        log::debug!("animation event {event:?}");
        if let Err(TrySendError::Full(event)) = self.sender.try_send(event) {
            log::trace!("event queue full, dropping {event:?}");
        }
    }

    /// Receiver for the application. Clones share one queue: each event is
    /// delivered to exactly one of them.
    pub fn receiver(&self) -> Receiver<AnimationEvent> {
        self.receiver.clone()
    }
}
