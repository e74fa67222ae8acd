//! Per-template admission strategies.
//!
//! Every template is bound to exactly one [`PlanningStrategy`] when it is
//! built. A strategy only ever sees the messages of its own template.
//!
//! - **Uniform**: single cap, earliest sending window first.
//! - **Prioritized**: prefers messages whose local receive time falls into the
//!   template's time-of-day window, with a guaranteed floor of slots.

mod checker;
mod prioritized;
mod receive_time;
mod uniform;

pub use checker::{IntervalPriorityMessageChecker, PriorityMessageChecker};
pub use prioritized::PrioritizedStrategy;
pub use receive_time::{LocalTimeReceiveTimeCalculator, ReceiveTimeCalculator};
pub use uniform::UniformStrategy;

use crate::domain::{Distribution, Message};

/// Admission algorithm bound to a template.
#[derive(Debug, Clone)]
pub enum PlanningStrategy {
    Uniform(UniformStrategy),
    Prioritized(PrioritizedStrategy),
}

impl PlanningStrategy {
    /// Select the messages of one template that fit this cycle.
    pub fn plan(&self, messages: Vec<Message>) -> Vec<Message> {
        match self {
            PlanningStrategy::Uniform(s) => s.plan(messages),
            PlanningStrategy::Prioritized(s) => s.plan(messages),
        }
    }

    pub fn distribution(&self) -> Distribution {
        match self {
            PlanningStrategy::Uniform(_) => Distribution::Uniform,
            PlanningStrategy::Prioritized(s) => s.distribution(),
        }
    }

    /// Largest number of messages the strategy can ever admit.
    pub fn cap(&self) -> usize {
        match self {
            PlanningStrategy::Uniform(s) => s.max(),
            PlanningStrategy::Prioritized(s) => s.priority_max().max(s.non_priority_max()),
        }
    }

    pub fn as_prioritized(&self) -> Option<&PrioritizedStrategy> {
        match self {
            PlanningStrategy::Prioritized(s) => Some(s),
            PlanningStrategy::Uniform(_) => None,
        }
    }
}
