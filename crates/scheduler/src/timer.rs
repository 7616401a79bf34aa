//! Timer drivers backing the debounce scheduler

use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Clock and one-shot timer primitive
///
/// `set_timer` must not run the callback before it returns; the scheduler
/// arms timers while holding its registry entry.
pub trait TimerDriver: Send + Sync + 'static {
    /// Ownership token for an armed timer
    type Handle: Send + Sync + 'static;

    /// Current monotonic time
    fn now(&self) -> Instant;

    /// Arm a timer that runs `callback` at `fire_at`
    fn set_timer(&self, fire_at: Instant, callback: Box<dyn FnOnce() + Send>) -> Self::Handle;

    /// Disarm a timer; a timer that already fired is unaffected
    fn cancel_timer(&self, handle: Self::Handle);
}

/// Timer driver running each timer as a tokio task
///
/// Must be used from within a tokio runtime. Honors paused time, so tests
/// can drive it with `tokio::time::pause` / `start_paused`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimers;

impl TimerDriver for TokioTimers {
    type Handle = JoinHandle<()>;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn set_timer(&self, fire_at: Instant, callback: Box<dyn FnOnce() + Send>) -> Self::Handle {
        tokio::spawn(async move {
            tokio::time::sleep_until(fire_at).await;
            callback();
        })
    }

    fn cancel_timer(&self, handle: Self::Handle) {
        handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_at_deadline() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let driver = TokioTimers;

        let at = driver.now() + Duration::from_millis(30);
        let _handle = driver.set_timer(at, Box::new(move || flag.store(true, Ordering::SeqCst)));

        tokio::time::sleep(Duration::from_millis(29)).await;
        assert!(!fired.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let driver = TokioTimers;

        let handle = driver.set_timer(
            driver.now() + Duration::from_millis(10),
            Box::new(move || flag.store(true, Ordering::SeqCst)),
        );
        driver.cancel_timer(handle);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }
}
