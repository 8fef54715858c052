//! Discrete-event scheduler replacing engine timer callbacks.

use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap},
    time::Duration,
};

/// Handle used to cancel a scheduled action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Min-heap of actions keyed by their firing time.
///
/// Actions scheduled for the same instant fire in scheduling order.
#[derive(Debug)]
pub struct Scheduler<A> {
    queue: BinaryHeap<Reverse<(Duration, TimerId)>>,
    pending: HashMap<TimerId, A>,
    next_id: u64,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self {
            queue: BinaryHeap::new(),
            pending: HashMap::new(),
            next_id: 0,
        }
    }
}

impl<A> Scheduler<A> {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `action` to fire once the clock reaches `fire_at`.
    pub fn schedule(&mut self, fire_at: Duration, action: A) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.queue.push(Reverse((fire_at, id)));
        let _ = self.pending.insert(id, action);
        id
    }

    /// Cancels a pending action, returning it if it had not fired yet.
    pub fn cancel(&mut self, id: TimerId) -> Option<A> {
        self.pending.remove(&id)
    }

    /// Reports whether the timer is still pending.
    #[must_use]
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.contains_key(&id)
    }

    /// Number of pending actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Reports whether no actions are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Removes and returns every action due at or before `now`, earliest first.
    pub fn drain_due(&mut self, now: Duration) -> Vec<A> {
        let mut due = Vec::new();
        while let Some(Reverse((fire_at, id))) = self.queue.peek().copied() {
            if fire_at > now {
                break;
            }
            let _ = self.queue.pop();
            if let Some(action) = self.pending.remove(&id) {
                due.push(action);
            }
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn drains_in_time_then_insertion_order() {
        let mut scheduler = Scheduler::new();
        let _ = scheduler.schedule(ms(30), "late");
        let _ = scheduler.schedule(ms(10), "first");
        let _ = scheduler.schedule(ms(10), "second");

        assert_eq!(scheduler.drain_due(ms(9)), Vec::<&str>::new());
        assert_eq!(scheduler.drain_due(ms(10)), vec!["first", "second"]);
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.drain_due(ms(100)), vec!["late"]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn cancelled_actions_never_fire() {
        let mut scheduler = Scheduler::new();
        let spawn = scheduler.schedule(ms(5), "spawn");
        let _ = scheduler.schedule(ms(5), "reveal");

        assert_eq!(scheduler.cancel(spawn), Some("spawn"));
        assert!(!scheduler.is_pending(spawn));
        assert_eq!(scheduler.cancel(spawn), None);
        assert_eq!(scheduler.drain_due(ms(5)), vec!["reveal"]);
    }

    proptest! {
        #[test]
        fn drained_actions_are_ordered_by_fire_time(
            delays in proptest::collection::vec(0u64..1_000, 1..40),
            cancel_mask in proptest::collection::vec(any::<bool>(), 40),
        ) {
            let mut scheduler = Scheduler::new();
            let mut expected = Vec::new();
            for (index, delay) in delays.iter().enumerate() {
                let id = scheduler.schedule(ms(*delay), (*delay, index));
                if cancel_mask[index] {
                    let _ = scheduler.cancel(id);
                } else {
                    expected.push((*delay, index));
                }
            }
            expected.sort();

            prop_assert_eq!(scheduler.drain_due(ms(1_000)), expected);
            prop_assert!(scheduler.is_empty());
        }
    }
}
