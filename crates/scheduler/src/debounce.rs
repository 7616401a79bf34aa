//! Per-callback debouncing
//!
//! Collapses repeated requests for the same callback into one pending
//! timer. A request only moves the timer when it asks for a later fire
//! time or carries different arguments.

use crate::timer::{TimerDriver, TokioTimers};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Fire time used when `now + delay` does not fit in an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Identity of a [`Callback`]
///
/// Two clones of one callback share an id; two callbacks built from the
/// same closure code do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(usize);

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cb-{:x}", self.0)
    }
}

/// Shared handle to a function invoked with the stored arguments
pub struct Callback<A> {
    func: Arc<dyn Fn(Vec<A>) + Send + Sync>,
}

impl<A> Callback<A> {
    /// Wrap a function as a schedulable callback
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(Vec<A>) + Send + Sync + 'static,
    {
        Self { func: Arc::new(func) }
    }

    /// Identity used to deduplicate scheduled tasks
    pub fn id(&self) -> CallbackId {
        CallbackId(Arc::as_ptr(&self.func) as *const () as usize)
    }

    /// Invoke the callback directly
    pub fn call(&self, args: Vec<A>) {
        (self.func)(args)
    }
}

impl<A> Clone for Callback<A> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
        }
    }
}

impl<A> fmt::Debug for Callback<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callback").field(&self.id()).finish()
    }
}

/// Why a request replaced the pending timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reschedule {
    /// Nothing was pending for this callback
    New,
    /// A positive delay asked for a later fire time
    Later,
    /// Argument count changed
    ArgCount,
    /// Some positional argument changed
    ArgChanged,
}

/// A pending callback invocation
struct ScheduledTask<A, H> {
    callback: Callback<A>,
    args: Vec<A>,
    due_at: Instant,
    timer: Option<H>,
    /// Bumped on every re-arm so a superseded timer cannot fire the task
    generation: u64,
}

impl<A: PartialEq, H> ScheduledTask<A, H> {
    fn reschedule_reason(&self, delay: Duration, due_at: Instant, args: &[A]) -> Option<Reschedule> {
        if !delay.is_zero() && self.due_at < due_at {
            Some(Reschedule::Later)
        } else if self.args.len() != args.len() {
            Some(Reschedule::ArgCount)
        } else if self.args.iter().zip(args).any(|(old, new)| old != new) {
            Some(Reschedule::ArgChanged)
        } else {
            None
        }
    }
}

/// Task registry shared with armed timers
struct Registry<A, T: TimerDriver> {
    driver: T,
    tasks: DashMap<CallbackId, ScheduledTask<A, T::Handle>>,
    generation: AtomicU64,
}

impl<A, T: TimerDriver> Registry<A, T> {
    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed)
    }

    /// Disarm and drop every pending task
    fn clear(&self) {
        self.tasks.retain(|_, task| {
            if let Some(timer) = task.timer.take() {
                self.driver.cancel_timer(timer);
            }
            false
        });
    }

    /// Remove the task if `generation` is still current, then invoke it
    fn fire(&self, id: CallbackId, generation: u64) {
        let removed = self
            .tasks
            .remove_if(&id, |_, task| task.generation == generation);

        // Entry is gone before the callback runs, so the callback may
        // schedule itself again as a fresh task.
        match removed {
            Some((_, task)) => {
                debug!(callback = %id, args = task.args.len(), "firing debounced callback");
                task.callback.call(task.args);
            }
            None => trace!(callback = %id, generation, "stale timer ignored"),
        }
    }
}

/// Coalescing scheduler keyed by callback identity
///
/// At most one timer is pending per callback. Dropping the scheduler
/// cancels all pending timers.
pub struct Scheduler<A, T: TimerDriver = TokioTimers> {
    inner: Arc<Registry<A, T>>,
}

impl<A> Scheduler<A, TokioTimers>
where
    A: PartialEq + Send + Sync + 'static,
{
    /// Create a scheduler backed by tokio timers
    pub fn new() -> Self {
        Self::with_driver(TokioTimers)
    }
}

impl<A> Default for Scheduler<A, TokioTimers>
where
    A: PartialEq + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<A, T> Scheduler<A, T>
where
    A: PartialEq + Send + Sync + 'static,
    T: TimerDriver,
{
    /// Create a scheduler on a custom timer driver
    pub fn with_driver(driver: T) -> Self {
        Self {
            inner: Arc::new(Registry {
                driver,
                tasks: DashMap::new(),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Request `callback` to run with `args` after `delay`
    ///
    /// The pending timer is replaced when nothing was pending, when a
    /// positive `delay` asks for a later fire time than the pending one,
    /// or when `args` differ from the stored arguments. Otherwise the
    /// request is absorbed: the earlier fire time and arguments stand.
    /// Delays past the range of `Instant` saturate to a far-future fire time.
    pub fn schedule(&self, callback: &Callback<A>, delay: Duration, args: Vec<A>) {
        let id = callback.id();
        let now = self.inner.driver.now();
        let due_at = now.checked_add(delay).unwrap_or(now + FAR_FUTURE);

        match self.inner.tasks.entry(id) {
            Entry::Occupied(mut entry) => {
                let task = entry.get_mut();
                let Some(reason) = task.reschedule_reason(delay, due_at, &args) else {
                    trace!(callback = %id, "coalesced debounce request");
                    return;
                };

                if let Some(timer) = task.timer.take() {
                    self.inner.driver.cancel_timer(timer);
                }
                let generation = self.inner.next_generation();
                task.args = args;
                task.due_at = due_at;
                task.generation = generation;
                task.timer = Some(self.arm(id, generation, due_at));
                trace!(callback = %id, ?reason, ?delay, "rescheduled debounced callback");
            }
            Entry::Vacant(entry) => {
                let generation = self.inner.next_generation();
                let timer = self.arm(id, generation, due_at);
                entry.insert(ScheduledTask {
                    callback: callback.clone(),
                    args,
                    due_at,
                    timer: Some(timer),
                    generation,
                });
                trace!(callback = %id, reason = ?Reschedule::New, ?delay, "scheduled debounced callback");
            }
        }
    }

    /// Cancel the pending invocation of `callback`, if any
    pub fn cancel(&self, callback: &Callback<A>) {
        let id = callback.id();
        if let Some((_, mut task)) = self.inner.tasks.remove(&id) {
            if let Some(timer) = task.timer.take() {
                self.inner.driver.cancel_timer(timer);
            }
            debug!(callback = %id, "cancelled debounced callback");
        }
    }

    /// Cancel every pending invocation
    pub fn cancel_all(&self) {
        self.inner.clear();
    }

    /// Check whether `callback` has a pending invocation
    pub fn is_pending(&self, callback: &Callback<A>) -> bool {
        self.inner.tasks.contains_key(&callback.id())
    }

    /// Fire time of the pending invocation of `callback`
    pub fn due_at(&self, callback: &Callback<A>) -> Option<Instant> {
        self.inner.tasks.get(&callback.id()).map(|task| task.due_at)
    }

    /// Number of callbacks with a pending invocation
    pub fn pending_len(&self) -> usize {
        self.inner.tasks.len()
    }

    fn arm(&self, id: CallbackId, generation: u64, due_at: Instant) -> T::Handle {
        let registry: Weak<Registry<A, T>> = Arc::downgrade(&self.inner);
        self.inner.driver.set_timer(
            due_at,
            Box::new(move || {
                if let Some(registry) = registry.upgrade() {
                    registry.fire(id, generation);
                }
            }),
        )
    }
}

impl<A, T: TimerDriver> Drop for Scheduler<A, T> {
    fn drop(&mut self) {
        self.inner.clear();
    }
}
