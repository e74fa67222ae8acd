//! Prioritized planning: favor messages received inside the template's window.
//!
//! Two caps drive the selection:
//! - `non_priority_max` is the floor of slots filled whenever demand allows,
//!   borrowing non-priority messages only while priority supply is short of it.
//! - `priority_max` bounds priority messages once they exceed the floor; at that
//!   point non-priority messages are excluded entirely.

use chrono::NaiveDateTime;
use std::sync::Arc;

use crate::domain::{Distribution, Message};
use crate::planning::checker::PriorityMessageChecker;
use crate::planning::receive_time::ReceiveTimeCalculator;

/// Message decorated with its precomputed receive time.
type Timed = (NaiveDateTime, Message);

#[derive(Debug, Clone)]
pub struct PrioritizedStrategy {
    priority_max: usize,
    non_priority_max: usize,
    distribution: Distribution,
    checker: Arc<dyn PriorityMessageChecker>,
    calculator: Arc<dyn ReceiveTimeCalculator>,
}

impl PrioritizedStrategy {
    pub fn new(
        priority_max: usize,
        non_priority_max: usize,
        distribution: Distribution,
        checker: Arc<dyn PriorityMessageChecker>,
        calculator: Arc<dyn ReceiveTimeCalculator>,
    ) -> Self {
        Self {
            priority_max,
            non_priority_max,
            distribution,
            checker,
            calculator,
        }
    }

    pub fn priority_max(&self) -> usize {
        self.priority_max
    }

    pub fn non_priority_max(&self) -> usize {
        self.non_priority_max
    }

    pub fn distribution(&self) -> Distribution {
        self.distribution
    }

    pub fn checker(&self) -> &dyn PriorityMessageChecker {
        self.checker.as_ref()
    }

    pub fn plan(&self, messages: Vec<Message>) -> Vec<Message> {
        if messages.len() <= self.non_priority_max {
            return messages;
        }

        let mut prioritized: Vec<Timed> = Vec::new();
        let mut non_prioritized: Vec<Timed> = Vec::new();
        for message in messages {
            let receive_time = self.calculator.calculate_receive_time(&message);
            if self.checker.is_prioritized(&message) {
                prioritized.push((receive_time, message));
            } else {
                non_prioritized.push((receive_time, message));
            }
        }

        if prioritized.is_empty() {
            return earliest(non_prioritized, self.non_priority_max);
        }

        if prioritized.len() <= self.non_priority_max {
            // Fill up to the floor; at exactly the floor nothing is borrowed.
            let left = self.non_priority_max - prioritized.len();
            let mut result = undecorate(prioritized);
            result.extend(earliest(non_prioritized, left));
            return result;
        }

        if prioritized.len() <= self.priority_max {
            return undecorate(prioritized);
        }

        earliest(prioritized, self.priority_max)
    }
}

fn earliest(mut timed: Vec<Timed>, take: usize) -> Vec<Message> {
    timed.sort_by_key(|(receive_time, _)| *receive_time);
    timed.truncate(take);
    undecorate(timed)
}

fn undecorate(timed: Vec<Timed>) -> Vec<Message> {
    timed.into_iter().map(|(_, message)| message).collect()
}
