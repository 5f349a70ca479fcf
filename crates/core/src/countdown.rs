use chrono::{DateTime, Duration, Utc};

/// Suggested polling cadence for hosts driving countdowns, in milliseconds.
///
/// Remaining time is recomputed from the reference instant on every query,
/// so the cadence only bounds display latency, never accuracy.
pub const SUGGESTED_TICK_MILLIS: u64 = 100;

//
// ─── COUNTDOWN ─────────────────────────────────────────────────────────────────
//

/// A countdown anchored to a wall-clock reference instant.
///
/// Remaining time is `duration - (now - reference)`. A host that misses
/// ticks (throttled tab, paused runtime) still reads the correct value on
/// its next query. `apply_penalty` shifts the reference backward, removing
/// exactly that many seconds on top of normal decay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    reference: DateTime<Utc>,
    duration: Duration,
}

impl Countdown {
    #[must_use]
    pub fn new(reference: DateTime<Utc>, duration_secs: u32) -> Self {
        Self {
            reference,
            duration: Duration::seconds(i64::from(duration_secs)),
        }
    }

    /// Seconds left, clamped at zero.
    #[must_use]
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u32 {
        let left = (self.duration - (now - self.reference)).num_seconds();
        u32::try_from(left.max(0)).unwrap_or(u32::MAX)
    }

    /// Seconds since the reference instant, clamped at zero.
    #[must_use]
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> u32 {
        let secs = (now - self.reference).num_seconds().max(0);
        u32::try_from(secs).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn is_elapsed(&self, now: DateTime<Utc>) -> bool {
        now - self.reference >= self.duration
    }

    /// Shorten the remaining time by exactly `secs` by moving the
    /// reference instant backward.
    pub fn apply_penalty(&mut self, secs: u32) {
        self.reference -= Duration::seconds(i64::from(secs));
    }
}

//
// ─── SCHEDULER ─────────────────────────────────────────────────────────────────
//

/// At most one deferred action: yield `A` once its delay has elapsed,
/// unless cancelled or replaced first.
///
/// Each concern that defers work (lesson auto-advance, the post-lockout
/// redirect) owns its own instance; they never share one.
#[derive(Debug, Clone)]
pub struct CountdownScheduler<A> {
    pending: Option<(Countdown, A)>,
}

impl<A> Default for CountdownScheduler<A> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<A> CountdownScheduler<A> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `action` to fire `delay_secs` after `now`, replacing any
    /// pending action.
    pub fn schedule(&mut self, now: DateTime<Utc>, delay_secs: u32, action: A) {
        self.pending = Some((Countdown::new(now, delay_secs), action));
    }

    /// Drop the pending action. Safe to call when nothing is pending.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Cancel the pending action and hand it back immediately, elapsed or
    /// not. This is the "skip the wait" path.
    pub fn take_now(&mut self) -> Option<A> {
        self.pending.take().map(|(_, action)| action)
    }

    /// Yield the pending action if its delay has elapsed. Fires at most
    /// once per scheduled action.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<A> {
        if self
            .pending
            .as_ref()
            .is_some_and(|(countdown, _)| countdown.is_elapsed(now))
        {
            return self.pending.take().map(|(_, action)| action);
        }
        None
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Seconds until the pending action fires, if one is scheduled.
    #[must_use]
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> Option<u32> {
        self.pending
            .as_ref()
            .map(|(countdown, _)| countdown.remaining_secs(now))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn remaining_is_independent_of_query_cadence() {
        let start = fixed_now();
        let countdown = Countdown::new(start, 120);

        // Whether or not anything polled in between, t+30 reads 90.
        assert_eq!(countdown.remaining_secs(start + Duration::seconds(30)), 90);
        assert_eq!(countdown.remaining_secs(start + Duration::seconds(119)), 1);
        assert_eq!(countdown.remaining_secs(start + Duration::seconds(121)), 0);
    }

    #[test]
    fn penalty_removes_exactly_its_seconds() {
        let start = fixed_now();
        let mut countdown = Countdown::new(start, 120);
        let at = start + Duration::seconds(30);

        let before = countdown.remaining_secs(at);
        countdown.apply_penalty(60);
        let after = countdown.remaining_secs(at);

        assert_eq!(before - after, 60);
        assert_eq!(after, 30);
    }

    #[test]
    fn is_elapsed_at_exact_boundary() {
        let start = fixed_now();
        let countdown = Countdown::new(start, 60);

        assert!(!countdown.is_elapsed(start + Duration::seconds(59)));
        assert!(countdown.is_elapsed(start + Duration::seconds(60)));
    }

    #[test]
    fn elapsed_secs_ignores_penalty_free_reference() {
        let start = fixed_now();
        let countdown = Countdown::new(start, 120);
        assert_eq!(countdown.elapsed_secs(start + Duration::seconds(90)), 90);
    }

    #[test]
    fn scheduler_fires_once_after_delay() {
        let start = fixed_now();
        let mut scheduler = CountdownScheduler::new();
        scheduler.schedule(start, 5, "advance");

        assert_eq!(scheduler.poll(start + Duration::seconds(4)), None);
        assert_eq!(
            scheduler.poll(start + Duration::seconds(5)),
            Some("advance")
        );
        assert_eq!(scheduler.poll(start + Duration::seconds(6)), None);
        assert!(!scheduler.is_pending());
    }

    #[test]
    fn cancel_is_a_noop_when_idle() {
        let mut scheduler: CountdownScheduler<&str> = CountdownScheduler::new();
        scheduler.cancel();
        assert!(!scheduler.is_pending());
    }

    #[test]
    fn schedule_replaces_pending_action() {
        let start = fixed_now();
        let mut scheduler = CountdownScheduler::new();
        scheduler.schedule(start, 5, "first");
        scheduler.schedule(start, 5, "second");

        assert_eq!(
            scheduler.poll(start + Duration::seconds(5)),
            Some("second")
        );
    }

    #[test]
    fn take_now_skips_the_wait() {
        let start = fixed_now();
        let mut scheduler = CountdownScheduler::new();
        scheduler.schedule(start, 5, "advance");

        assert_eq!(scheduler.take_now(), Some("advance"));
        assert_eq!(scheduler.poll(start + Duration::seconds(10)), None);
    }

    #[test]
    fn scheduler_reports_remaining() {
        let start = fixed_now();
        let mut scheduler = CountdownScheduler::new();
        assert_eq!(scheduler.remaining_secs(start), None);

        scheduler.schedule(start, 5, ());
        assert_eq!(
            scheduler.remaining_secs(start + Duration::seconds(2)),
            Some(3)
        );
    }
}
