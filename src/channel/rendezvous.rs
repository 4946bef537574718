//! Bounded rendezvous queue.
//!
//! [`Channel`] is the only primitive in this crate that parks a thread until
//! another thread acts. Every lock, cell and event is expressed in terms of
//! its `send`/`recv` pair.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        RENDEZVOUS QUEUE                          │
//! │                                                                  │
//! │   send(v) ──► buffer has room? ── yes ──► buffer ──► recv() ──► v│
//! │                     │                                 ▲          │
//! │                     no                                │          │
//! │                     ▼                                 │          │
//! │              parked senders (FIFO) ───────────────────┘          │
//! │              sender returns once its value is taken              │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Room is `capacity` plus the number of receivers currently parked in
//! `recv`, so a capacity-0 channel hands a value over only when a receiver
//! is already waiting for it, and `try_send` on such a channel succeeds
//! exactly when someone is blocked on the other side.
//!
//! # Closing
//!
//! Closing is one-way. Buffered and parked values are discarded, every
//! receive afterwards reports [`RecvError::Closed`], and every send (blocked
//! or future) panics.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

const SEND_ON_CLOSED: &str = "send on a closed rendezvous channel";

/// Error returned by the receive operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RecvError {
    /// Nothing to receive right now (non-blocking receive only).
    #[error("rendezvous channel is empty")]
    Empty,
    /// The deadline passed before anything arrived.
    #[error("timed out waiting on rendezvous channel")]
    Timeout,
    /// The channel was closed.
    #[error("receiving on a closed rendezvous channel")]
    Closed,
}

/// Error returned by [`Channel::try_send`] when there is no room.
///
/// The rejected value is handed back.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TrySendError<T>(pub T);

impl<T> TrySendError<T> {
    /// Returns the value that could not be sent.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for TrySendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TrySendError(..)")
    }
}

impl<T> fmt::Display for TrySendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rendezvous channel is full")
    }
}

impl<T> std::error::Error for TrySendError<T> {}

struct State<T> {
    /// Values accepted without a parked sender behind them.
    buffer: VecDeque<T>,
    /// Senders that found no room, oldest first, tagged with their ticket.
    parked: VecDeque<(u64, T)>,
    /// Ticket handed to the next parked sender.
    next_ticket: u64,
    /// Number of parked values taken so far. Tickets are delivered strictly
    /// in order, so ticket `t` has been taken iff `delivered > t`.
    delivered: u64,
    /// Receivers currently parked in a blocking receive.
    waiting_receivers: usize,
    closed: bool,
}

impl<T> State<T> {
    fn has_room(&self, capacity: usize) -> bool {
        self.parked.is_empty() && self.buffer.len() < capacity + self.waiting_receivers
    }

    /// Takes the oldest value, refilling the buffer from parked senders.
    fn take(&mut self, capacity: usize) -> Option<T> {
        if let Some(value) = self.buffer.pop_front() {
            while self.buffer.len() < capacity {
                let Some((_, parked)) = self.parked.pop_front() else {
                    break;
                };
                self.buffer.push_back(parked);
                self.delivered += 1;
            }
            return Some(value);
        }

        let (_, value) = self.parked.pop_front()?;
        self.delivered += 1;
        Some(value)
    }
}

/// A bounded FIFO queue with an open/closed lifecycle.
///
/// Capacity `0` is a synchronous handoff; capacity `n > 0` buffers up to `n`
/// values before senders park.
pub struct Channel<T> {
    capacity: usize,
    state: Mutex<State<T>>,
    /// Parked receivers.
    recv_cv: Condvar,
    /// Parked senders.
    send_cv: Condvar,
}

impl<T> Channel<T> {
    /// Creates an open channel with the given buffer capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(State {
                buffer: VecDeque::with_capacity(capacity),
                parked: VecDeque::new(),
                next_ticket: 0,
                delivered: 0,
                waiting_receivers: 0,
                closed: false,
            }),
            recv_cv: Condvar::new(),
            send_cv: Condvar::new(),
        }
    }

    /// Returns the buffer capacity given at construction.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of values waiting to be received, including those
    /// held by parked senders.
    #[must_use]
    pub fn len(&self) -> usize {
        let state = self.state.lock();
        state.buffer.len() + state.parked.len()
    }

    /// Returns true if nothing is waiting to be received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true once [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Sends a value, blocking until there is room for it.
    ///
    /// # Panics
    ///
    /// Panics if the channel is closed, either on entry or while this sender
    /// is parked.
    pub fn send(&self, value: T) {
        let mut state = self.state.lock();
        assert!(!state.closed, "{SEND_ON_CLOSED}");

        if state.has_room(self.capacity) {
            state.buffer.push_back(value);
            drop(state);
            self.recv_cv.notify_one();
            return;
        }

        let ticket = state.next_ticket;
        state.next_ticket += 1;
        state.parked.push_back((ticket, value));
        self.recv_cv.notify_one();

        loop {
            self.send_cv.wait(&mut state);
            if state.delivered > ticket {
                return;
            }
            if state.closed {
                drop(state);
                panic!("{SEND_ON_CLOSED}");
            }
        }
    }

    /// Sends a value only if there is room for it right now.
    ///
    /// # Panics
    ///
    /// Panics if the channel is closed.
    pub fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        let mut state = self.state.lock();
        assert!(!state.closed, "{SEND_ON_CLOSED}");

        if !state.has_room(self.capacity) {
            return Err(TrySendError(value));
        }
        state.buffer.push_back(value);
        drop(state);
        self.recv_cv.notify_one();
        Ok(())
    }

    /// Like `try_send`, but hands the value back instead of panicking when
    /// the channel is closed. Used by reply slots whose reader may be gone.
    pub(crate) fn offer(&self, value: T) -> Result<(), T> {
        let mut state = self.state.lock();
        if state.closed || !state.has_room(self.capacity) {
            return Err(value);
        }
        state.buffer.push_back(value);
        drop(state);
        self.recv_cv.notify_one();
        Ok(())
    }

    /// Receives a value, blocking until one arrives or the channel closes.
    pub fn recv(&self) -> Result<T, RecvError> {
        self.recv_until(None)
    }

    /// Receives a value, blocking for at most `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvError> {
        // An overflowing deadline is as good as no deadline.
        self.recv_until(Instant::now().checked_add(timeout))
    }

    /// Receives a value without blocking.
    pub fn try_recv(&self) -> Result<T, RecvError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(RecvError::Closed);
        }
        let delivered = state.delivered;
        match state.take(self.capacity) {
            Some(value) => {
                let woke_sender = state.delivered != delivered;
                drop(state);
                if woke_sender {
                    self.send_cv.notify_all();
                }
                Ok(value)
            }
            None => Err(RecvError::Empty),
        }
    }

    fn recv_until(&self, deadline: Option<Instant>) -> Result<T, RecvError> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return Err(RecvError::Closed);
            }

            let delivered = state.delivered;
            if let Some(value) = state.take(self.capacity) {
                let woke_sender = state.delivered != delivered;
                drop(state);
                if woke_sender {
                    self.send_cv.notify_all();
                }
                return Ok(value);
            }

            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Err(RecvError::Timeout);
            }

            // A parked receiver widens the room seen by senders.
            state.waiting_receivers += 1;
            match deadline {
                Some(deadline) => {
                    let _ = self.recv_cv.wait_until(&mut state, deadline);
                }
                None => self.recv_cv.wait(&mut state),
            }
            state.waiting_receivers -= 1;
        }
    }

    /// Closes the channel.
    ///
    /// Returns `false` if it was already closed. Blocked receivers return
    /// [`RecvError::Closed`]; blocked senders panic.
    pub fn close(&self) -> bool {
        let (buffer, parked) = {
            let mut state = self.state.lock();
            if state.closed {
                return false;
            }
            state.closed = true;
            (
                std::mem::take(&mut state.buffer),
                std::mem::take(&mut state.parked),
            )
        };
        self.recv_cv.notify_all();
        self.send_cv.notify_all();
        // Discarded values may own other channels; drop them unlocked.
        drop(buffer);
        drop(parked);
        true
    }
}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Channel")
            .field("capacity", &self.capacity)
            .field("buffered", &state.buffer.len())
            .field("parked_senders", &state.parked.len())
            .field("waiting_receivers", &state.waiting_receivers)
            .field("closed", &state.closed)
            .finish()
    }
}
