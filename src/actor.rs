//! Actor abstraction for thread-owned, message-driven state.
//!
//! An actor exclusively owns a piece of state and serializes every access to
//! it by handling one mailbox message at a time. Callers never touch the state
//! directly; they send a message and, when they need an answer, block on a
//! single-use reply slot.
//!
//! - **Thread-owned**: each actor runs on its own named OS thread.
//! - **Rendezvous mailbox**: the mailbox is an unbuffered
//!   [`Channel`](crate::channel::Channel), so `send` returns once the actor
//!   has taken the message.
//! - **Lifecycle hooks**: `on_start` and `on_stop` bracket the message loop.
//!
//! Dropping the [`ActorHandle`] closes the mailbox; the actor finishes the
//! message in hand, runs `on_stop` and exits. An actor whose handler panics
//! closes its own mailbox on the way out, so later sends panic rather than
//! park.
//!
//! # Example
//!
//! ```
//! use tokensync::actor::{self, Actor, Reply};
//! use tokensync::SyncConfig;
//!
//! struct Counter {
//!     count: u64,
//! }
//!
//! enum Msg {
//!     Add(u64),
//!     Get(Reply<u64>),
//! }
//!
//! impl Actor for Counter {
//!     type Message = Msg;
//!
//!     fn handle(&mut self, msg: Msg) {
//!         match msg {
//!             Msg::Add(n) => self.count += n,
//!             Msg::Get(reply) => reply.send(self.count),
//!         }
//!     }
//! }
//!
//! let handle = actor::spawn("counter", Counter { count: 0 }, &SyncConfig::default())
//!     .expect("spawn");
//! handle.send(Msg::Add(5));
//! handle.send(Msg::Add(10));
//! assert_eq!(handle.call(Msg::Get), 15);
//! let counter = handle.join().expect("actor panicked");
//! assert_eq!(counter.count, 15);
//! ```

use std::fmt;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::channel::{Channel, RecvError};
use crate::config::SyncConfig;

/// A message-driven actor.
///
/// Each actor:
/// - Owns mutable state (`self`)
/// - Receives messages sequentially (no data races)
/// - Runs until its mailbox is closed
pub trait Actor: Send + 'static {
    /// The type of messages this actor can receive.
    type Message: Send + 'static;

    /// Called once on the actor thread before any message is handled.
    fn on_start(&mut self) {}

    /// Handle a single message with exclusive access to the state.
    fn handle(&mut self, msg: Self::Message);

    /// Called once after the mailbox closes.
    fn on_stop(&mut self) {}
}

/// Single-use slot through which an actor answers a request.
///
/// Dropping an unanswered `Reply` closes the slot, so the caller observes a
/// stopped actor instead of blocking forever.
pub struct Reply<T> {
    slot: Option<Arc<Channel<T>>>,
}

impl<T> Reply<T> {
    /// Delivers the answer. Does nothing if the caller has gone away.
    pub fn send(mut self, value: T) {
        if let Some(slot) = self.slot.take() {
            let _ = slot.offer(value);
        }
    }
}

impl<T> Drop for Reply<T> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            slot.close();
        }
    }
}

impl<T> fmt::Debug for Reply<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reply")
            .field("pending", &self.slot.is_some())
            .finish()
    }
}

/// Handle to a running actor, used to send messages and manage its lifecycle.
///
/// When the handle is dropped the mailbox is closed, which causes the actor
/// loop to exit.
pub struct ActorHandle<A: Actor> {
    kind: &'static str,
    mailbox: Arc<Channel<A::Message>>,
    thread: Option<JoinHandle<A>>,
}

impl<A: Actor> ActorHandle<A> {
    /// Sends a message, blocking until the actor takes it.
    ///
    /// # Panics
    ///
    /// Panics if the actor has been stopped.
    pub fn send(&self, msg: A::Message) {
        self.mailbox.send(msg);
    }

    /// Sends a request built around a fresh reply slot and waits for the
    /// answer.
    ///
    /// # Panics
    ///
    /// Panics if the actor has been stopped, or if it drops the request
    /// without answering (for example because its handler panicked).
    pub fn call<R: Send>(&self, make: impl FnOnce(Reply<R>) -> A::Message) -> R {
        let slot = Arc::new(Channel::new(1));
        self.send(make(Reply {
            slot: Some(Arc::clone(&slot)),
        }));
        match slot.recv() {
            Ok(value) => value,
            Err(RecvError::Closed | RecvError::Empty | RecvError::Timeout) => {
                panic!("{} actor stopped before replying", self.kind)
            }
        }
    }

    /// Returns the actor kind this handle was spawned with.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Returns true once the mailbox has been closed.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.mailbox.is_closed()
    }

    /// Closes the mailbox. The actor exits after the message in hand.
    pub fn stop(&self) {
        if self.mailbox.close() {
            tracing::debug!(kind = self.kind, "actor stop requested");
        }
    }

    /// Stops the actor and waits for it, returning its final state.
    pub fn join(mut self) -> thread::Result<A> {
        self.stop();
        match self.thread.take() {
            Some(thread) => thread.join(),
            None => unreachable!("actor thread joined twice"),
        }
    }
}

impl<A: Actor> Drop for ActorHandle<A> {
    fn drop(&mut self) {
        // The thread is detached; it exits on its own once it sees the
        // closed mailbox.
        self.stop();
    }
}

impl<A: Actor> fmt::Debug for ActorHandle<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorHandle")
            .field("kind", &self.kind)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// Spawns `actor` on a dedicated thread named `<prefix>-<kind>`.
pub fn spawn<A: Actor>(
    kind: &'static str,
    actor: A,
    config: &SyncConfig,
) -> io::Result<ActorHandle<A>> {
    let mailbox = Arc::new(Channel::new(0));
    let mut builder = thread::Builder::new().name(config.thread_name(kind));
    if let Some(stack_size) = config.actor_stack_size {
        builder = builder.stack_size(stack_size);
    }

    let actor_mailbox = Arc::clone(&mailbox);
    let thread = builder.spawn(move || run_actor_loop(kind, actor, &actor_mailbox))?;
    tracing::debug!(kind, thread = ?thread.thread().id(), "actor spawned");

    Ok(ActorHandle {
        kind,
        mailbox,
        thread: Some(thread),
    })
}

/// Like [`spawn`], for constructors that mirror `std::thread::spawn`.
///
/// # Panics
///
/// Panics if the OS refuses to create the thread.
pub(crate) fn spawn_or_panic<A: Actor>(
    kind: &'static str,
    actor: A,
    config: &SyncConfig,
) -> ActorHandle<A> {
    spawn(kind, actor, config)
        .unwrap_or_else(|err| panic!("failed to spawn {kind} actor thread: {err}"))
}

/// Closes the mailbox when the actor thread exits, including by unwinding,
/// so senders observe a stopped actor instead of parking forever.
struct CloseOnExit<'a, M> {
    kind: &'static str,
    mailbox: &'a Channel<M>,
}

impl<M> Drop for CloseOnExit<'_, M> {
    fn drop(&mut self) {
        if self.mailbox.close() {
            tracing::debug!(
                kind = self.kind,
                panicking = thread::panicking(),
                "actor exited with an open mailbox"
            );
        }
    }
}

fn run_actor_loop<A: Actor>(kind: &'static str, mut actor: A, mailbox: &Channel<A::Message>) -> A {
    let _close = CloseOnExit { kind, mailbox };
    actor.on_start();

    let mut handled: u64 = 0;
    loop {
        match mailbox.recv() {
            Ok(msg) => {
                actor.handle(msg);
                handled += 1;
            }
            Err(RecvError::Closed) => break,
            Err(RecvError::Empty | RecvError::Timeout) => {
                unreachable!("blocking recv without deadline returned early")
            }
        }
    }

    actor.on_stop();
    tracing::debug!(kind, handled, "actor stopped");
    actor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_test_logging;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    /// Simple counter actor for testing.
    struct Counter {
        count: u64,
        started: bool,
        stopped: Arc<AtomicBool>,
    }

    enum CounterMsg {
        Add(u64),
        Get(Reply<u64>),
        Forget(Reply<u64>),
    }

    impl Actor for Counter {
        type Message = CounterMsg;

        fn on_start(&mut self) {
            self.started = true;
        }

        fn handle(&mut self, msg: CounterMsg) {
            match msg {
                CounterMsg::Add(n) => self.count += n,
                CounterMsg::Get(reply) => reply.send(self.count),
                CounterMsg::Forget(_reply) => {}
            }
        }

        fn on_stop(&mut self) {
            self.stopped.store(true, Ordering::SeqCst);
        }
    }

    fn counter() -> (Counter, Arc<AtomicBool>) {
        let stopped = Arc::new(AtomicBool::new(false));
        (
            Counter {
                count: 0,
                started: false,
                stopped: Arc::clone(&stopped),
            },
            stopped,
        )
    }

    #[test]
    fn actor_processes_messages_in_order() {
        init_test("actor_processes_messages_in_order");
        let (actor, _) = counter();
        let handle = spawn("counter", actor, &SyncConfig::default()).expect("spawn");

        handle.send(CounterMsg::Add(1));
        handle.send(CounterMsg::Add(2));
        let total = handle.call(CounterMsg::Get);
        crate::assert_with_log!(total == 3, "running total", 3u64, total);

        let state = handle.join().expect("join");
        crate::assert_with_log!(state.started, "on_start ran", true, state.started);
        crate::assert_with_log!(state.count == 3, "final state", 3u64, state.count);
        crate::test_complete!("actor_processes_messages_in_order");
    }

    #[test]
    fn dropping_handle_stops_actor() {
        init_test("dropping_handle_stops_actor");
        let (actor, stopped) = counter();
        let handle = spawn("counter", actor, &SyncConfig::default()).expect("spawn");
        handle.send(CounterMsg::Add(1));
        drop(handle);

        crate::test_utils::wait_until("on_stop ran", || stopped.load(Ordering::SeqCst));
        crate::test_complete!("dropping_handle_stops_actor");
    }

    #[test]
    fn actor_thread_is_named() {
        init_test("actor_thread_is_named");
        struct Namer;
        impl Actor for Namer {
            type Message = Reply<Option<String>>;
            fn handle(&mut self, reply: Self::Message) {
                reply.send(thread::current().name().map(str::to_owned));
            }
        }

        let config = SyncConfig::default().with_thread_name_prefix("unit");
        let handle = spawn("namer", Namer, &config).expect("spawn");
        let name = handle.call(|reply| reply);
        crate::assert_with_log!(
            name.as_deref() == Some("unit-namer"),
            "thread name",
            Some("unit-namer"),
            name
        );
        crate::test_complete!("actor_thread_is_named");
    }

    #[test]
    fn panicking_handler_closes_mailbox() {
        init_test("panicking_handler_closes_mailbox");
        struct Fragile;
        enum FragileMsg {
            Explode,
            Ping(Reply<()>),
        }
        impl Actor for Fragile {
            type Message = FragileMsg;
            fn handle(&mut self, msg: FragileMsg) {
                match msg {
                    FragileMsg::Explode => panic!("fragile actor exploded"),
                    FragileMsg::Ping(reply) => reply.send(()),
                }
            }
        }

        let handle = spawn("fragile", Fragile, &SyncConfig::default()).expect("spawn");
        handle.call(FragileMsg::Ping);
        handle.send(FragileMsg::Explode);
        crate::test_utils::wait_until("mailbox closed", || handle.is_stopped());

        // A later request fails fast instead of parking on a dead mailbox.
        let later = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            handle.call(FragileMsg::Ping);
        }));
        let message = later
            .expect_err("call on a dead actor must panic")
            .downcast::<String>()
            .map(|msg| *msg)
            .unwrap_or_default();
        crate::assert_with_log!(
            message.contains("send on a closed rendezvous channel"),
            "closed-mailbox panic",
            "send on a closed rendezvous channel",
            message
        );
        crate::test_complete!("panicking_handler_closes_mailbox");
    }

    #[test]
    #[should_panic(expected = "counter actor stopped before replying")]
    fn unanswered_call_panics() {
        let (actor, _) = counter();
        let handle = spawn("counter", actor, &SyncConfig::default()).expect("spawn");
        let _ = handle.call(CounterMsg::Forget);
    }
}
