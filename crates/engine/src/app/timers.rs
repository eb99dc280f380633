use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Simulation clock advanced explicitly by the loop driver.
///
/// Nothing reads wall time; a session only ever sees `now()` move forward by
/// the amounts it is fed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimClock {
    now: Duration,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn advance(&mut self, dt: Duration) -> Duration {
        self.now = self.now.saturating_add(dt);
        self.now
    }

    pub fn reset(&mut self) {
        self.now = Duration::ZERO;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// One-shot timers keyed by due time. Ties fire in scheduling order.
#[derive(Debug)]
pub struct TimerQueue<T> {
    next_id: u64,
    queue: BTreeMap<(Duration, TimerId), T>,
    due_by_id: HashMap<TimerId, Duration>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            queue: BTreeMap::new(),
            due_by_id: HashMap::new(),
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Duration, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.queue.insert((due, id), payload);
        self.due_by_id.insert(id, due);
        id
    }

    /// Returns the payload if the timer was still pending.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let due = self.due_by_id.remove(&id)?;
        self.queue.remove(&(due, id))
    }

    pub fn pop_due(&mut self, now: Duration) -> Vec<(TimerId, T)> {
        let mut fired = Vec::new();
        while let Some(entry) = self.queue.first_entry() {
            let (due, id) = *entry.key();
            if due > now {
                break;
            }
            let payload = entry.remove();
            self.due_by_id.remove(&id);
            fired.push((id, payload));
        }
        fired
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.due_by_id.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn clock_only_moves_when_advanced() {
        let mut clock = SimClock::new();
        assert_eq!(clock.now(), Duration::ZERO);
        clock.advance(ms(16));
        clock.advance(ms(16));
        assert_eq!(clock.now(), ms(32));
    }

    #[test]
    fn timers_fire_in_due_order_then_schedule_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(ms(200), "late");
        timers.schedule(ms(100), "first");
        timers.schedule(ms(100), "second");

        let fired: Vec<_> = timers
            .pop_due(ms(150))
            .into_iter()
            .map(|(_, payload)| payload)
            .collect();
        assert_eq!(fired, vec!["first", "second"]);
        assert_eq!(timers.len(), 1);

        let fired = timers.pop_due(ms(200));
        assert_eq!(fired.len(), 1);
        assert!(timers.is_empty());
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut timers = TimerQueue::new();
        let hide = timers.schedule(ms(2000), "hide_caption");
        assert_eq!(timers.len(), 1);

        assert_eq!(timers.cancel(hide), Some("hide_caption"));
        assert!(timers.is_empty());
        assert_eq!(timers.cancel(hide), None);
        assert!(timers.pop_due(ms(5000)).is_empty());
    }
}
