//! Counting semaphore over a fixed pool of interchangeable units.
//!
//! The available count lives in an [`AtomicCell`]; every change is a
//! compare-and-write so concurrent acquirers and releasers never lose an
//! update. An [`Event`] serves purely as a wake-up broadcast: releasers
//! publish to it, and blocked acquirers subscribe with a short timeout so a
//! release that lands between their check and their subscription costs at
//! most one poll interval.
//!
//! # Example
//!
//! ```
//! use tokensync::sync::Semaphore;
//!
//! let sem = Semaphore::new(5, 5);
//! sem.acquire(3);
//! assert_eq!(sem.available(), 2);
//! assert!(!sem.try_acquire(3));
//! sem.release(3);
//! assert_eq!(sem.available(), 5);
//! ```

use std::fmt;
use std::time::Duration;

use crate::config::SyncConfig;
use crate::sync::{AtomicCell, Event};

/// A counting semaphore with a fixed maximum size.
pub struct Semaphore {
    size: usize,
    count: AtomicCell<usize>,
    event: Event,
    poll_interval: Duration,
}

impl Semaphore {
    /// Creates a semaphore of `size` units, `start` of which are available.
    ///
    /// # Panics
    ///
    /// Panics if `start > size`, or if an actor thread cannot be spawned.
    #[must_use]
    pub fn new(size: usize, start: usize) -> Self {
        Self::with_config(size, start, &SyncConfig::default())
    }

    /// Like [`new`](Self::new), with explicit polling and thread settings.
    ///
    /// # Panics
    ///
    /// Panics if `start > size`, or if an actor thread cannot be spawned.
    #[must_use]
    pub fn with_config(size: usize, start: usize, config: &SyncConfig) -> Self {
        assert!(
            start <= size,
            "semaphore start count {start} exceeds size {size}"
        );
        Self {
            size,
            count: AtomicCell::with_config(start, config),
            event: Event::with_config(config),
            poll_interval: config.semaphore_poll_interval,
        }
    }

    /// Blocks until `n` units are available and takes them. Taking zero
    /// units returns immediately.
    ///
    /// # Panics
    ///
    /// Panics if `n` exceeds the semaphore size; such a request could never
    /// be satisfied.
    pub fn acquire(&self, n: usize) {
        assert!(
            n <= self.size,
            "cannot acquire {n} units from a semaphore of size {}",
            self.size
        );
        if n == 0 {
            return;
        }
        loop {
            let available = self.count.read();
            if n > available {
                let _ = self.event.try_subscribe(self.poll_interval);
                continue;
            }
            if self.count.write(available, available - n) {
                tracing::trace!(n, remaining = available - n, "semaphore acquired");
                return;
            }
            tracing::trace!(n, "semaphore acquire lost a race, retrying");
        }
    }

    /// Makes one attempt to take `n` units. Returns false if fewer than `n`
    /// are available (including any `n` above the semaphore size) or another
    /// caller changed the count first. Taking zero units always succeeds.
    #[must_use = "a failed acquisition must be handled"]
    pub fn try_acquire(&self, n: usize) -> bool {
        if n == 0 {
            return true;
        }
        let available = self.count.read();
        n <= available && self.count.write(available, available - n)
    }

    /// Returns `n` units to the pool and wakes every blocked acquirer.
    ///
    /// Returning more than was taken saturates the count at the semaphore
    /// size.
    pub fn release(&self, n: usize) {
        loop {
            let available = self.count.read();
            let next = available.saturating_add(n).min(self.size);
            if self.count.write(available, next) {
                self.event.publish_all();
                return;
            }
            tracing::trace!(n, "semaphore release lost a race, retrying");
        }
    }

    /// Number of units currently available.
    #[must_use]
    pub fn available(&self) -> usize {
        self.count.read()
    }

    /// Maximum number of units.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }
}

impl fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Semaphore")
            .field("size", &self.size)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{init_test_logging, wait_until};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn acquire_then_release_restores_count() {
        init_test("acquire_then_release_restores_count");
        let sem = Semaphore::new(5, 5);
        sem.acquire(3);
        crate::assert_with_log!(sem.available() == 2, "after acquire", 2usize, sem.available());
        sem.release(3);
        crate::assert_with_log!(sem.available() == 5, "after release", 5usize, sem.available());
        crate::test_complete!("acquire_then_release_restores_count");
    }

    #[test]
    fn try_acquire_never_goes_negative() {
        init_test("try_acquire_never_goes_negative");
        let sem = Semaphore::new(4, 2);
        let too_many = sem.try_acquire(3);
        crate::assert_with_log!(!too_many, "refused", false, too_many);
        crate::assert_with_log!(sem.available() == 2, "unchanged", 2usize, sem.available());

        let ok = sem.try_acquire(2);
        crate::assert_with_log!(ok, "exact fit", true, ok);
        crate::assert_with_log!(sem.available() == 0, "drained", 0usize, sem.available());
        crate::test_complete!("try_acquire_never_goes_negative");
    }

    #[test]
    fn release_saturates_at_size() {
        init_test("release_saturates_at_size");
        let sem = Semaphore::new(3, 2);
        sem.release(10);
        crate::assert_with_log!(sem.available() == 3, "clamped", 3usize, sem.available());
        sem.release(usize::MAX);
        crate::assert_with_log!(sem.available() == 3, "no overflow", 3usize, sem.available());
        crate::test_complete!("release_saturates_at_size");
    }

    #[test]
    fn blocked_acquire_wakes_on_release() {
        init_test("blocked_acquire_wakes_on_release");
        let sem = Arc::new(Semaphore::new(2, 0));
        let acquired = Arc::new(AtomicBool::new(false));
        let waiter = {
            let sem = Arc::clone(&sem);
            let acquired = Arc::clone(&acquired);
            thread::spawn(move || {
                sem.acquire(2);
                acquired.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(10));
        let early = acquired.load(Ordering::SeqCst);
        crate::assert_with_log!(!early, "still blocked", false, early);

        sem.release(1);
        thread::sleep(Duration::from_millis(10));
        let partial = acquired.load(Ordering::SeqCst);
        crate::assert_with_log!(!partial, "one unit is not enough", false, partial);

        sem.release(1);
        waiter.join().expect("acquirer panicked");
        crate::assert_with_log!(sem.available() == 0, "both taken", 0usize, sem.available());
        crate::test_complete!("blocked_acquire_wakes_on_release");
    }

    #[test]
    fn holders_never_exceed_size() {
        init_test("holders_never_exceed_size");
        let sem = Arc::new(Semaphore::new(3, 3));
        let holding = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (0..6)
            .map(|_| {
                let sem = Arc::clone(&sem);
                let holding = Arc::clone(&holding);
                let peak = Arc::clone(&peak);
                thread::spawn(move || {
                    for _ in 0..10 {
                        sem.acquire(1);
                        let now = holding.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        holding.fetch_sub(1, Ordering::SeqCst);
                        sem.release(1);
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().expect("worker panicked");
        }

        let peak = peak.load(Ordering::SeqCst);
        crate::assert_with_log!(peak <= 3, "bounded holders", "<= 3", peak);
        wait_until("count restored", || sem.available() == 3);
        crate::test_complete!("holders_never_exceed_size");
    }

    #[test]
    fn out_of_range_try_acquire_is_refused_not_thrown() {
        init_test("out_of_range_try_acquire_is_refused_not_thrown");
        let sem = Semaphore::new(3, 3);
        let oversized = sem.try_acquire(4);
        crate::assert_with_log!(!oversized, "more than size refused", false, oversized);
        let huge = sem.try_acquire(usize::MAX);
        crate::assert_with_log!(!huge, "usize::MAX refused", false, huge);
        crate::assert_with_log!(sem.available() == 3, "count untouched", 3usize, sem.available());
        crate::test_complete!("out_of_range_try_acquire_is_refused_not_thrown");
    }

    #[test]
    fn zero_unit_requests_succeed_without_effect() {
        init_test("zero_unit_requests_succeed_without_effect");
        let sem = Semaphore::new(2, 0);
        let zero = sem.try_acquire(0);
        crate::assert_with_log!(zero, "try_acquire(0) succeeds", true, zero);
        // Returns at once even though nothing is available.
        sem.acquire(0);
        crate::assert_with_log!(sem.available() == 0, "count untouched", 0usize, sem.available());
        crate::test_complete!("zero_unit_requests_succeed_without_effect");
    }

    #[test]
    #[should_panic(expected = "cannot acquire 4 units from a semaphore of size 3")]
    fn oversized_request_panics() {
        let sem = Semaphore::new(3, 3);
        sem.acquire(4);
    }
}
