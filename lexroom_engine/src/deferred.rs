use std::time::Duration;

/// Time-keyed task queue drained by the frame loop. Entries sharing a due
/// time come out in insertion order.
#[derive(Debug, Clone)]
pub struct DeferredQueue<T> {
    pending: Vec<Deferred<T>>,
    next_seq: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Deferred<T> {
    pub due: Duration,
    pub task: T,
    seq: u64,
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DeferredQueue<T> {
    pub fn new() -> Self {
        DeferredQueue {
            pending: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn schedule(&mut self, due: Duration, task: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        let entry = Deferred { due, task, seq };
        let index = self
            .pending
            .partition_point(|existing| (existing.due, existing.seq) <= (due, seq));
        self.pending.insert(index, entry);
    }

    /// Removes and returns the earliest task whose due time is at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<Deferred<T>> {
        if self.pending.first()?.due <= now {
            Some(self.pending.remove(0))
        } else {
            None
        }
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.pending.first().map(|entry| entry.due)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn pending(&self) -> impl ExactSizeIterator<Item = &Deferred<T>> {
        self.pending.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::DeferredQueue;
    use std::time::Duration;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn pops_in_due_order() {
        let mut queue = DeferredQueue::new();
        queue.schedule(ms(300), "c");
        queue.schedule(ms(100), "a");
        queue.schedule(ms(200), "b");
        assert_eq!(queue.next_due(), Some(ms(100)));

        let drained: Vec<_> = std::iter::from_fn(|| queue.pop_due(ms(1_000)))
            .map(|entry| entry.task)
            .collect();
        assert_eq!(drained, vec!["a", "b", "c"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn equal_due_times_keep_insertion_order() {
        let mut queue = DeferredQueue::new();
        queue.schedule(ms(50), 1);
        queue.schedule(ms(50), 2);
        queue.schedule(ms(50), 3);
        let drained: Vec<_> = std::iter::from_fn(|| queue.pop_due(ms(50)))
            .map(|entry| entry.task)
            .collect();
        assert_eq!(drained, vec![1, 2, 3]);
    }

    #[test]
    fn future_tasks_stay_pending() {
        let mut queue = DeferredQueue::new();
        queue.schedule(ms(500), ());
        assert!(queue.pop_due(ms(499)).is_none());
        assert_eq!(queue.len(), 1);
        assert!(queue.pop_due(ms(500)).is_some());
    }

    #[test]
    fn clear_drops_everything() {
        let mut queue = DeferredQueue::new();
        queue.schedule(ms(10), 'x');
        queue.schedule(ms(20), 'y');
        queue.clear();
        assert!(queue.pop_due(ms(1_000)).is_none());
        assert_eq!(queue.pending().len(), 0);
    }
}
