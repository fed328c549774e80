//! Virtual-time timer queue.
//!
//! Debounce windows, settle delays, unmute retries and the scroll-animation
//! lock are all expressed as tasks scheduled on a [`Scheduler`]. The clock only
//! moves when the owner advances it, so the UI loop drives it from real time
//! while tests step it deterministically.
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Handle returned by [`Scheduler::after`], used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// Ordered queue of delayed tasks keyed by (deadline, insertion order).
///
/// Tasks with equal deadlines fire in the order they were scheduled.
#[derive(Debug)]
pub struct Scheduler<T> {
    now: Duration,
    next_id: u64,
    queue: BTreeMap<(Duration, u64), T>,
    deadlines: HashMap<u64, Duration>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            queue: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedule `task` to fire `delay` after the current virtual time.
    pub fn after(&mut self, delay: Duration, task: T) -> TimerId {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        let deadline = self.now.saturating_add(delay);
        self.queue.insert((deadline, id), task);
        self.deadlines.insert(id, deadline);
        TimerId(id)
    }

    /// Cancel a pending task. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.deadlines.remove(&id.0) {
            Some(deadline) => self.queue.remove(&(deadline, id.0)).is_some(),
            None => false,
        }
    }

    /// Pop the earliest task due at or before `until`.
    ///
    /// The clock moves to that task's deadline, so tasks scheduled while
    /// handling it are measured from the moment it fired.
    pub fn pop_due(&mut self, until: Duration) -> Option<T> {
        let (&(deadline, id), _) = self.queue.first_key_value()?;
        if deadline > until {
            return None;
        }
        let task = self.queue.remove(&(deadline, id))?;
        self.deadlines.remove(&id);
        if deadline > self.now {
            self.now = deadline;
        }
        Some(task)
    }

    /// Move the clock forward to `now` without firing anything.
    ///
    /// The clock never moves backwards.
    pub fn advance_to(&mut self, now: Duration) {
        if now > self.now {
            self.now = now;
        }
    }

    /// Number of pending tasks.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Deadline of the next pending task.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Drop every pending task.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.deadlines.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn drain(s: &mut Scheduler<&'static str>, until: Duration) -> Vec<&'static str> {
        let mut fired = Vec::new();
        while let Some(task) = s.pop_due(until) {
            fired.push(task);
        }
        s.advance_to(until);
        fired
    }

    #[test]
    fn test_tasks_fire_in_deadline_order() {
        let mut s = Scheduler::new();
        s.after(ms(300), "late");
        s.after(ms(100), "early");
        s.after(ms(200), "middle");

        assert_eq!(drain(&mut s, ms(250)), vec!["early", "middle"]);
        assert_eq!(s.now(), ms(250));
        assert_eq!(drain(&mut s, ms(300)), vec!["late"]);
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn test_equal_deadlines_keep_insertion_order() {
        let mut s = Scheduler::new();
        s.after(ms(50), "a");
        s.after(ms(50), "b");
        assert_eq!(drain(&mut s, ms(50)), vec!["a", "b"]);
    }

    #[test]
    fn test_cancel_removes_task() {
        let mut s = Scheduler::new();
        let id = s.after(ms(100), "debounced");
        assert!(s.cancel(id));
        assert!(!s.cancel(id));
        assert!(drain(&mut s, ms(500)).is_empty());
    }

    #[test]
    fn test_pop_due_moves_clock_to_deadline() {
        let mut s = Scheduler::new();
        s.after(ms(100), "first");
        assert_eq!(s.pop_due(ms(1000)), Some("first"));
        assert_eq!(s.now(), ms(100));

        // A follow-up scheduled from inside the handler is relative to 100ms
        s.after(ms(100), "follow-up");
        assert_eq!(s.next_deadline(), Some(ms(200)));
        assert_eq!(s.pop_due(ms(1000)), Some("follow-up"));
    }

    #[test]
    fn test_clock_never_moves_backwards() {
        let mut s: Scheduler<()> = Scheduler::new();
        s.advance_to(ms(500));
        s.advance_to(ms(100));
        assert_eq!(s.now(), ms(500));
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut s = Scheduler::new();
        let id = s.after(ms(10), "x");
        s.after(ms(20), "y");
        s.clear();
        assert_eq!(s.pending(), 0);
        assert!(!s.cancel(id));
    }
}
