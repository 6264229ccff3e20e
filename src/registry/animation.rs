//! Animation callbacks and the fixed-period clock that drives them.
//!
//! The clock does not own a thread. The host polls it from its frame loop and
//! runs a tick when a period has elapsed, so ticks never overlap and all
//! callbacks run on the UI thread.

use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

/// Handle returned when a callback is registered, used to remove it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

/// A callback run once per tick with mutable access to the context `C`.
pub type AnimationCallback<C> = Box<dyn FnMut(&mut C) -> anyhow::Result<()>>;

/// Outcome of one tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Callbacks invoked, including failed ones.
    pub invoked: usize,
    /// Callbacks that returned an error or panicked.
    pub failed: Vec<CallbackId>,
}

/// Ordered list of animation callbacks.
pub struct Animator<C> {
    callbacks: Vec<(CallbackId, AnimationCallback<C>)>,
    next_id: u64,
}

impl<C> Animator<C> {
    pub fn new() -> Self {
        Self {
            callbacks: Vec::new(),
            next_id: 0,
        }
    }

    /// Appends a callback; it runs after every callback already registered.
    pub fn add<F>(&mut self, callback: F) -> CallbackId
    where
        F: FnMut(&mut C) -> anyhow::Result<()> + 'static,
    {
        let id = CallbackId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, Box::new(callback)));
        id
    }

    /// Removes the callback registered under `id`. Unknown ids are ignored.
    pub fn remove(&mut self, id: CallbackId) -> bool {
        match self.callbacks.iter().position(|(cb_id, _)| *cb_id == id) {
            Some(index) => {
                drop(self.callbacks.remove(index));
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: CallbackId) -> bool {
        self.callbacks.iter().any(|(cb_id, _)| *cb_id == id)
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    pub fn clear(&mut self) {
        self.callbacks.clear();
    }

    /// Runs every callback once, in registration order.
    ///
    /// A callback that errors or panics is logged and recorded in the report;
    /// the callbacks after it still run.
    pub fn tick(&mut self, ctx: &mut C) -> TickReport {
        let mut report = TickReport::default();
        for (id, callback) in self.callbacks.iter_mut() {
            report.invoked += 1;
            match panic::catch_unwind(AssertUnwindSafe(|| callback(ctx))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::warn!(callback = ?id, error = %err, "animation callback failed");
                    report.failed.push(*id);
                }
                Err(_) => {
                    tracing::warn!(callback = ?id, "animation callback panicked");
                    report.failed.push(*id);
                }
            }
        }
        report
    }
}

impl<C> Default for Animator<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-period tick schedule.
#[derive(Clone, Debug)]
pub struct AnimationClock {
    period: Duration,
    next_due: Option<Instant>,
}

impl AnimationClock {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Changes the period; a pending deadline is kept.
    pub fn set_period(&mut self, period: Duration) {
        self.period = period;
    }

    /// Schedules the first tick one period after `now`. No-op when running.
    pub fn start(&mut self, now: Instant) {
        if self.next_due.is_none() {
            self.next_due = Some(now + self.period);
        }
    }

    /// Clears the pending deadline.
    pub fn stop(&mut self) {
        self.next_due = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// True when a tick is due at `now`; schedules the next one.
    ///
    /// Missed periods collapse into a single tick.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.period);
                true
            }
            _ => false,
        }
    }

    /// Time left until the next tick, `None` when stopped.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.next_due.map(|due| due.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_runs_in_registration_order() {
        let mut animator: Animator<Vec<&'static str>> = Animator::new();
        animator.add(|log| {
            log.push("first");
            Ok(())
        });
        animator.add(|log| {
            log.push("second");
            Ok(())
        });
        animator.add(|log| {
            log.push("third");
            Ok(())
        });

        let mut log = Vec::new();
        let report = animator.tick(&mut log);
        assert_eq!(log, vec!["first", "second", "third"]);
        assert_eq!(report.invoked, 3);
        assert!(report.failed.is_empty());

        animator.tick(&mut log);
        assert_eq!(log.len(), 6);
    }

    #[test]
    fn test_failing_callback_does_not_stop_the_rest() {
        let mut animator: Animator<Vec<u32>> = Animator::new();
        let bad = animator.add(|_| anyhow::bail!("broken widget"));
        animator.add(|log| {
            log.push(2);
            Ok(())
        });
        animator.add(|log| {
            log.push(3);
            Ok(())
        });

        let mut log = Vec::new();
        let report = animator.tick(&mut log);
        assert_eq!(log, vec![2, 3]);
        assert_eq!(report.failed, vec![bad]);
    }

    #[test]
    fn test_panicking_callback_is_isolated() {
        let mut animator: Animator<u32> = Animator::new();
        let bad = animator.add(|_| panic!("boom"));
        animator.add(|count| {
            *count += 1;
            Ok(())
        });

        let mut count = 0;
        let report = animator.tick(&mut count);
        assert_eq!(count, 1);
        assert_eq!(report.invoked, 2);
        assert_eq!(report.failed, vec![bad]);
    }

    #[test]
    fn test_remove_by_id() {
        let mut animator: Animator<u32> = Animator::new();
        let a = animator.add(|c| {
            *c += 1;
            Ok(())
        });
        let b = animator.add(|c| {
            *c += 10;
            Ok(())
        });

        assert!(animator.remove(a));
        assert!(!animator.remove(a));
        assert!(!animator.contains(a));
        assert!(animator.contains(b));

        let mut count = 0;
        animator.tick(&mut count);
        assert_eq!(count, 10);
    }

    #[test]
    fn test_clock_poll() {
        let start = Instant::now();
        let mut clock = AnimationClock::new(Duration::from_millis(30));
        assert!(!clock.poll(start + Duration::from_secs(1)));

        clock.start(start);
        assert!(clock.is_running());
        assert!(!clock.poll(start + Duration::from_millis(10)));
        assert!(clock.poll(start + Duration::from_millis(30)));
        // next tick is a full period after the one that fired
        assert!(!clock.poll(start + Duration::from_millis(45)));
        assert!(clock.poll(start + Duration::from_millis(60)));
    }

    #[test]
    fn test_clock_collapses_missed_periods() {
        let start = Instant::now();
        let mut clock = AnimationClock::new(Duration::from_millis(30));
        clock.start(start);
        let late = start + Duration::from_millis(500);
        assert!(clock.poll(late));
        assert!(!clock.poll(late));
        assert_eq!(clock.time_until_due(late), Some(Duration::from_millis(30)));
    }

    #[test]
    fn test_clock_stop_clears_deadline() {
        let start = Instant::now();
        let mut clock = AnimationClock::new(Duration::from_millis(30));
        clock.start(start);
        clock.stop();
        assert!(!clock.is_running());
        assert_eq!(clock.time_until_due(start), None);
        assert!(!clock.poll(start + Duration::from_secs(1)));
    }
}
