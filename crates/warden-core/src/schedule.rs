//! Explicit time-ordered event queue.
//!
//! Deferred work ("stop the burst in 3 seconds", "retry the move in half a second") is pushed
//! here instead of being captured in callbacks. The owner drains due events once per tick; an
//! event scheduled while draining is never delivered in the same drain, so handlers cannot
//! re-enter the queue.

use core::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone)]
struct Entry<E> {
    due: f32,
    seq: u64,
    event: E,
}

impl<E> Entry<E> {
    fn key(&self) -> (f32, u64) {
        (self.due, self.seq)
    }
}

impl<E> PartialEq for Entry<E> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<E> Eq for Entry<E> {}

impl<E> PartialOrd for Entry<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Entry<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap behave like a min-heap; ties fire in insertion
        // order.
        other
            .due
            .total_cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug, Clone)]
pub struct EventQueue<E> {
    heap: BinaryHeap<Entry<E>>,
    next_seq: u64,
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    pub fn schedule_at(&mut self, due: f32, event: E) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry { due, seq, event });
    }

    pub fn schedule_after(&mut self, now: f32, delay: f32, event: E) {
        self.schedule_at(now + delay.max(0.0), event);
    }

    /// Time of the earliest pending event.
    pub fn next_due(&self) -> Option<f32> {
        self.heap.peek().map(|e| e.due)
    }

    /// Pop the earliest event if it is due at `now`.
    pub fn pop_due(&mut self, now: f32) -> Option<E> {
        if self.heap.peek()?.due > now {
            return None;
        }
        self.heap.pop().map(|e| e.event)
    }

    /// Remove and return every event due at `now`, earliest first.
    pub fn drain_due(&mut self, now: f32) -> Vec<E> {
        let mut out = Vec::new();
        while let Some(event) = self.pop_due(now) {
            out.push(event);
        }
        out
    }

    /// Drop pending events that do not satisfy `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&E) -> bool) {
        self.heap.retain(|e| keep(&e.event));
    }

    pub fn contains(&self, mut pred: impl FnMut(&E) -> bool) -> bool {
        self.heap.iter().any(|e| pred(&e.event))
    }
}
