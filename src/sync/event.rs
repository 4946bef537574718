//! One-to-many event notification.
//!
//! [`Event`] queues subscribers in arrival order. Each subscriber waits on
//! its own single-use ticket (a capacity-1 [`SyncChannel`]) which the event
//! actor either releases or closes.
//!
//! - `publish_one`: releases the oldest waiting subscriber.
//! - `publish_all`: releases every waiting subscriber.
//! - Publishing with nobody waiting is a no-op; it is **not** remembered
//!   for a later subscriber.
//! - `destroy`: closes every pending ticket and makes every later
//!   subscription resolve to [`ChannelOpResult::Closed`] immediately.
//!
//! A subscriber whose [`try_subscribe`](Event::try_subscribe) times out
//! withdraws its ticket, so a later `publish_one` reaches someone who is
//! still waiting. If the release and the timeout race, the release wins.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use crate::actor::{self, Actor, ActorHandle, Reply};
use crate::channel::{ChannelOpResult, SyncChannel};
use crate::config::SyncConfig;
use crate::sync::Destroy;

enum EventRequest {
    Subscribe(SyncChannel),
    Withdraw { ticket: SyncChannel, done: Reply<()> },
    PublishOne,
    PublishAll,
    Waiting(Reply<usize>),
    Destroy,
}

#[derive(Default)]
struct EventActor {
    tickets: VecDeque<SyncChannel>,
    destroyed: bool,
}

impl EventActor {
    fn release(ticket: &SyncChannel) {
        // Tickets are fresh capacity-1 channels released at most once.
        let released = ticket.try_send();
        debug_assert!(released.is_success(), "event ticket released twice");
    }

    fn close_all(&mut self) {
        for ticket in self.tickets.drain(..) {
            ticket.close();
        }
    }
}

impl Actor for EventActor {
    type Message = EventRequest;

    fn handle(&mut self, msg: EventRequest) {
        match msg {
            EventRequest::Subscribe(ticket) => {
                if self.destroyed {
                    ticket.close();
                } else {
                    self.tickets.push_back(ticket);
                }
            }
            EventRequest::Withdraw { ticket, done } => {
                self.tickets.retain(|queued| !queued.same_channel(&ticket));
                done.send(());
            }
            EventRequest::PublishOne => {
                if let Some(ticket) = self.tickets.pop_front() {
                    Self::release(&ticket);
                    tracing::trace!(remaining = self.tickets.len(), "event released one subscriber");
                }
            }
            EventRequest::PublishAll => {
                let released = self.tickets.len();
                for ticket in self.tickets.drain(..) {
                    Self::release(&ticket);
                }
                if released > 0 {
                    tracing::trace!(released, "event released all subscribers");
                }
            }
            EventRequest::Waiting(reply) => reply.send(self.tickets.len()),
            EventRequest::Destroy => {
                if !self.destroyed {
                    self.destroyed = true;
                    tracing::debug!(pending = self.tickets.len(), "event destroyed");
                    self.close_all();
                }
            }
        }
    }

    fn on_stop(&mut self) {
        self.close_all();
    }
}

/// A one-to-many notifier.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
/// use tokensync::channel::ChannelOpResult;
/// use tokensync::sync::Event;
///
/// let event = Arc::new(Event::new());
/// let waiter = {
///     let event = Arc::clone(&event);
///     thread::spawn(move || event.subscribe())
/// };
/// while event.waiting() == 0 {
///     thread::yield_now();
/// }
/// event.publish_all();
/// assert_eq!(waiter.join().unwrap(), ChannelOpResult::Success);
/// ```
pub struct Event {
    actor: ActorHandle<EventActor>,
}

impl Event {
    /// Spawns a new event actor.
    ///
    /// # Panics
    ///
    /// Panics if the actor thread cannot be spawned.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&SyncConfig::default())
    }

    /// Like [`new`](Self::new), naming the actor thread from `config`.
    ///
    /// # Panics
    ///
    /// Panics if the actor thread cannot be spawned.
    #[must_use]
    pub fn with_config(config: &SyncConfig) -> Self {
        Self {
            actor: actor::spawn_or_panic("event", EventActor::default(), config),
        }
    }

    /// Releases the oldest waiting subscriber, if any.
    pub fn publish_one(&self) {
        self.actor.send(EventRequest::PublishOne);
    }

    /// Releases every waiting subscriber, if any.
    pub fn publish_all(&self) {
        self.actor.send(EventRequest::PublishAll);
    }

    /// Blocks until released by a publish or until the event is destroyed.
    ///
    /// Returns [`ChannelOpResult::Success`] or [`ChannelOpResult::Closed`].
    pub fn subscribe(&self) -> ChannelOpResult {
        self.register().recv()
    }

    /// Like [`subscribe`](Self::subscribe), giving up after `timeout` with
    /// [`ChannelOpResult::Timeout`].
    pub fn try_subscribe(&self, timeout: Duration) -> ChannelOpResult {
        let ticket = self.register();
        match ticket.timeout_recv(timeout) {
            ChannelOpResult::Timeout => {
                let withdrawn = ticket.clone();
                self.actor.call(|done| EventRequest::Withdraw {
                    ticket: withdrawn,
                    done,
                });
                // The actor has either dropped the ticket from its queue or
                // already released/closed it; in the latter case honor that.
                match ticket.try_recv() {
                    ChannelOpResult::Failure => ChannelOpResult::Timeout,
                    other => other,
                }
            }
            other => other,
        }
    }

    /// Number of subscribers currently queued.
    #[must_use]
    pub fn waiting(&self) -> usize {
        self.actor.call(EventRequest::Waiting)
    }

    /// Tears the event down: pending and future subscriptions resolve to
    /// [`ChannelOpResult::Closed`]. Calling it again has no further effect.
    pub fn destroy(&self) {
        self.actor.send(EventRequest::Destroy);
    }

    fn register(&self) -> SyncChannel {
        let ticket = SyncChannel::with_capacity(1);
        self.actor.send(EventRequest::Subscribe(ticket.clone()));
        ticket
    }
}

impl Destroy for Event {
    fn destroy(&self) {
        Self::destroy(self);
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("actor", &self.actor)
            .finish()
    }
}
