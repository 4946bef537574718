//! Two-party rendezvous barrier.
//!
//! One side calls [`Barrier::sync_left`], the other [`Barrier::sync_right`];
//! whichever arrives first waits for the other. Underneath it is a single
//! send/receive pair on an unbuffered [`SyncChannel`].
//!
//! A barrier is single-shot: it pairs exactly one left with one right. Later
//! calls pair with each other in whatever way the channel matches them, which
//! is not a meaningful handshake.

use std::fmt;

use crate::channel::SyncChannel;

/// A one-shot handshake between two threads.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
/// use tokensync::sync::Barrier;
///
/// let barrier = Arc::new(Barrier::new());
/// let left = {
///     let barrier = Arc::clone(&barrier);
///     thread::spawn(move || barrier.sync_left())
/// };
/// barrier.sync_right();
/// left.join().unwrap();
/// ```
pub struct Barrier {
    channel: SyncChannel,
}

impl Barrier {
    /// Creates a barrier that has not been passed yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            channel: SyncChannel::new(),
        }
    }

    /// Blocks until the right side arrives.
    pub fn sync_left(&self) {
        self.channel.send();
    }

    /// Completes the handshake only if the right side is already waiting.
    #[must_use = "a failed handshake must be retried or handled"]
    pub fn try_sync_left(&self) -> bool {
        self.channel.try_send().is_success()
    }

    /// Blocks until the left side arrives.
    pub fn sync_right(&self) {
        let _ = self.channel.recv();
    }

    /// Completes the handshake only if the left side is already waiting.
    #[must_use = "a failed handshake must be retried or handled"]
    pub fn try_sync_right(&self) -> bool {
        self.channel.try_recv().is_success()
    }
}

impl Default for Barrier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Barrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Barrier")
            .field("left_waiting", &!self.channel.is_empty())
            .finish()
    }
}
