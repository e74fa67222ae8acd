//! Uniform planning: earliest sending window first.

use crate::domain::Message;

/// Single-cap strategy for templates without a preferred time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformStrategy {
    max: usize,
}

impl UniformStrategy {
    pub fn new(max: usize) -> Self {
        Self { max }
    }

    pub fn max(&self) -> usize {
        self.max
    }

    /// Keep at most `max` messages, preferring earlier `(start_time, end_time)`.
    ///
    /// Below the cap the input is returned untouched.
    pub fn plan(&self, mut messages: Vec<Message>) -> Vec<Message> {
        if messages.len() <= self.max {
            return messages;
        }

        messages.sort_by_key(Message::window_key);
        messages.truncate(self.max);
        messages
    }
}
