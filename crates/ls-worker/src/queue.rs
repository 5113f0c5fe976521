//! `EventQueue`: a worker's pending events in time order.
//!
//! # Ordering
//!
//! Events pop in ascending `time`.  Events with the same `time` pop in the
//! order they were pushed (first-scheduled-first-served), so a worker fed the
//! same pushes in the same order always processes them identically.
//!
//! `BTreeMap` gives O(log T) push and pop, where T is the number of distinct
//! pending timestamps.  Bucketing equal timestamps in a `VecDeque` gives the
//! FIFO tie-break without carrying a sequence number per event.

use std::collections::{BTreeMap, VecDeque};

use ls_core::{SimEvent, SimTime};

/// Time-ordered, FIFO-on-ties queue of pending events.
#[derive(Default, Debug)]
pub struct EventQueue {
    inner: BTreeMap<SimTime, VecDeque<SimEvent>>,
    /// Cached total event count for O(1) `len()`.
    total: usize,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue `event` behind every already-queued event with the same time.
    pub fn push(&mut self, event: SimEvent) {
        self.inner.entry(event.time).or_default().push_back(event);
        self.total += 1;
    }

    /// Remove and return the earliest event if its time is `<= till`.
    pub fn pop_due(&mut self, till: SimTime) -> Option<SimEvent> {
        let mut bucket = self.inner.first_entry()?;
        if *bucket.key() > till {
            return None;
        }
        let event = bucket.get_mut().pop_front();
        if bucket.get().is_empty() {
            bucket.remove();
        }
        if event.is_some() {
            self.total -= 1;
        }
        event
    }

    /// The earliest pending time, or [`SimTime::INFINITY`] if empty.
    pub fn next_time(&self) -> SimTime {
        self.inner.keys().next().copied().unwrap_or(SimTime::INFINITY)
    }

    /// Total number of pending events.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Number of distinct pending timestamps.
    pub fn time_count(&self) -> usize {
        self.inner.len()
    }

    /// Pending events in pop order, without removing them.
    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> {
        self.inner.values().flatten()
    }
}
