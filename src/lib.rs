//! Mailing Scheduler - admission control for outbound message batches
//!
//! Each cycle, the scheduler picks the subset of pending messages that fits the
//! global send budget, honoring per-template rate limits and four priority
//! tiers. Templates with a time-of-day distribution prefer recipients whose
//! local time falls inside the template's window.

pub mod dataset;
pub mod domain;
pub mod error;
pub mod factory;
pub mod generator;
pub mod planning;
pub mod scheduler;
pub mod statistics;

pub use error::{Result, SchedulerError};
