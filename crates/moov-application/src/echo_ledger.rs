//! Remembers what this instance sent so host echoes of it can be dropped.

use std::collections::VecDeque;

pub const DEFAULT_CAPACITY: usize = 32;

/// Bounded FIFO of recently sent texts.
///
/// When full, recording a new entry evicts the oldest one.
#[derive(Debug)]
pub struct EchoLedger {
    entries: VecDeque<String>,
    capacity: usize,
}

impl Default for EchoLedger {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EchoLedger {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, text: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(text.into());
    }

    /// Removes one entry equal to `text`. True if there was one.
    pub fn consume(&mut self, text: &str) -> bool {
        match self.entries.iter().position(|e| e == text) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
