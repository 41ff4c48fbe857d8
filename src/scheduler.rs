//! Deferred work on the simulation clock.
//!
//! Tasks fire in `(fire_at, insertion order)` order so two tasks scheduled
//! for the same millisecond run in the order they were queued.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

#[derive(Debug)]
struct Entry<T> {
    fire_at: u64,
    seq: u64,
    task: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.fire_at, self.seq).cmp(&(other.fire_at, other.seq))
    }
}

#[derive(Debug)]
pub struct TickScheduler<T> {
    heap: BinaryHeap<Reverse<Entry<T>>>,
    next_seq: u64,
}

impl<T> Default for TickScheduler<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<T> TickScheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, fire_at: u64, task: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Entry { fire_at, seq, task }));
    }

    /// Pops every task with `fire_at <= now`, earliest first.
    pub fn drain_due(&mut self, now: u64) -> Vec<T> {
        let mut due = Vec::new();
        while self
            .heap
            .peek()
            .is_some_and(|Reverse(entry)| entry.fire_at <= now)
        {
            if let Some(Reverse(entry)) = self.heap.pop() {
                due.push(entry.task);
            }
        }
        due
    }

    pub fn next_fire_at(&self) -> Option<u64> {
        self.heap.peek().map(|Reverse(entry)| entry.fire_at)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
