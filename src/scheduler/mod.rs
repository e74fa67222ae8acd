//! Scheduler for one send cycle.
//!
//! This module provides:
//! - **Grouping**: messages bucketed by tier, then by template.
//! - **Worker pool**: per-template strategies of a tier planned in parallel on
//!   a tokio blocking pool.
//! - **Scheduler**: tiers emitted in precedence order until the budget is spent.
//!
//! # Architecture
//!
//! 1. Every message's template is resolved up front; an unknown code aborts
//!    the cycle before anything is admitted.
//! 2. Tiers are planned lazily, Realtime first, as the caller pulls messages.
//! 3. Inside a tier each template group is planned independently, then the
//!    results are merged and sorted by `(start_time, end_time)`.
//! 4. Emission stops as soon as `max_to_send` messages were yielded. The tier
//!    being emitted has already been planned in full.
//!
//! # Example
//!
//! ```ignore
//! let scheduler = Scheduler::new(templates, 45_000);
//! let admitted: Vec<Message> = scheduler.schedule(messages)?.collect();
//! ```

mod groups;
mod pool;

pub use groups::{TemplateGroup, TierBucket, build_tiers};
pub use pool::{PlanningPool, PoolConfig};

use std::collections::HashMap;
use std::vec;

use crate::domain::{Message, Priority, Template};
use crate::error::{Result, SchedulerError};

/// Selects the messages admitted in one cycle.
#[derive(Debug)]
pub struct Scheduler {
    templates: Vec<Template>,
    max_to_send: usize,
    pool: PoolConfig,
}

impl Scheduler {
    /// Create a scheduler over `templates` admitting at most `max_to_send`
    /// messages per cycle.
    pub fn new(templates: Vec<Template>, max_to_send: usize) -> Self {
        Self {
            templates,
            max_to_send,
            pool: PoolConfig::default(),
        }
    }

    /// Use a custom worker pool configuration.
    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    pub fn max_to_send(&self) -> usize {
        self.max_to_send
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    /// Start a cycle over `messages`.
    ///
    /// Resolves all templates eagerly and returns an iterator that plans tiers
    /// on demand. Fails with [`SchedulerError::UnknownTemplate`],
    /// [`SchedulerError::DuplicateTemplate`] or [`SchedulerError::EmptyTemplateCode`]
    /// before any message is admitted.
    ///
    /// Planning runs on a blocking pool owned by the returned iterator; call
    /// this from synchronous code.
    pub fn schedule<I>(&self, messages: I) -> Result<AdmittedMessages<'_>>
    where
        I: IntoIterator<Item = Message>,
    {
        let mut index: HashMap<&str, &Template> = HashMap::with_capacity(self.templates.len());
        for template in &self.templates {
            if template.template_code.is_empty() {
                return Err(SchedulerError::EmptyTemplateCode);
            }
            if index.insert(template.template_code.as_str(), template).is_some() {
                return Err(SchedulerError::DuplicateTemplate(template.template_code.clone()));
            }
        }

        let tiers = build_tiers(messages, &index)?;
        tracing::info!(
            realtime = tiers[Priority::Realtime.index()].message_count(),
            high = tiers[Priority::High.index()].message_count(),
            normal = tiers[Priority::Normal.index()].message_count(),
            low = tiers[Priority::Low.index()].message_count(),
            max_to_send = self.max_to_send,
            "Cycle started"
        );

        Ok(AdmittedMessages {
            tiers: tiers.into_iter(),
            current: Vec::new().into_iter(),
            remaining: self.max_to_send,
            pool: PlanningPool::new(self.pool)?,
        })
    }
}

/// Lazily produced admitted messages of one cycle.
///
/// Yields at most `max_to_send` messages: every message of a higher tier that
/// survived planning comes before any message of a lower tier.
#[derive(Debug)]
pub struct AdmittedMessages<'a> {
    tiers: vec::IntoIter<TierBucket<'a>>,
    current: vec::IntoIter<Message>,
    remaining: usize,
    pool: PlanningPool,
}

impl AdmittedMessages<'_> {
    /// Budget left for this cycle.
    pub fn remaining_budget(&self) -> usize {
        self.remaining
    }

    /// Plan a whole tier, merge the per-template results and sort them.
    fn plan_tier(&self, tier: TierBucket<'_>) -> Vec<Message> {
        let priority = tier.priority;
        let groups = tier.groups.len();
        let candidates = tier.message_count();

        let mut planned: Vec<Message> = self.pool.plan_groups(tier.groups).into_iter().flatten().collect();
        planned.sort_by_key(Message::window_key);

        tracing::debug!(
            %priority,
            groups,
            candidates,
            planned = planned.len(),
            remaining = self.remaining,
            "Tier planned"
        );
        planned
    }
}

impl Iterator for AdmittedMessages<'_> {
    type Item = Message;

    fn next(&mut self) -> Option<Message> {
        if self.remaining == 0 {
            return None;
        }

        loop {
            if let Some(message) = self.current.next() {
                self.remaining -= 1;
                return Some(message);
            }

            let tier = self.tiers.next()?;
            if tier.is_empty() {
                continue;
            }
            self.current = self.plan_tier(tier).into_iter();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let buffered = self.current.len().min(self.remaining);
        let upper = if self.tiers.len() == 0 { buffered } else { self.remaining };
        (buffered, Some(upper))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::{PlanningStrategy, UniformStrategy};
    use chrono::{NaiveDate, NaiveDateTime};
    use uuid::Uuid;

    fn at(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(minute / 60, minute % 60, 0)
            .unwrap()
    }

    fn uniform(code: &str, priority: Priority, cap: usize) -> Template {
        Template::new(code, priority, PlanningStrategy::Uniform(UniformStrategy::new(cap)))
    }

    fn message(n: u128, code: &str, start: u32) -> Message {
        Message::with_offset_hours(Uuid::from_u128(n), code, at(start), at(start + 60), 0)
    }

    fn ids(messages: &[Message]) -> Vec<u128> {
        messages.iter().map(|m| m.id.as_u128()).collect()
    }

    #[test]
    fn test_empty_input() {
        let scheduler = Scheduler::new(vec![uniform("a", Priority::High, 5)], 10);
        assert_eq!(scheduler.schedule(Vec::new()).unwrap().count(), 0);
    }

    #[test]
    fn test_zero_budget_admits_nothing() {
        let scheduler = Scheduler::new(vec![uniform("a", Priority::High, 5)], 0);
        let admitted = scheduler.schedule(vec![message(1, "a", 0)]).unwrap();
        assert_eq!(admitted.count(), 0);
    }

    #[test]
    fn test_tier_order_then_window_order() {
        let templates = vec![
            uniform("low", Priority::Low, 10),
            uniform("rt", Priority::Realtime, 10),
            uniform("normal", Priority::Normal, 10),
        ];
        let scheduler = Scheduler::new(templates, 100);
        let messages = vec![
            message(1, "low", 0),
            message(2, "normal", 5),
            message(3, "rt", 30),
            message(4, "rt", 10),
            message(5, "normal", 1),
        ];
        let admitted: Vec<Message> = scheduler.schedule(messages).unwrap().collect();
        assert_eq!(ids(&admitted), vec![4, 3, 5, 2, 1]);
    }

    #[test]
    fn test_tier_merge_sorted_across_templates() {
        let templates = vec![uniform("a", Priority::High, 10), uniform("b", Priority::High, 10)];
        let scheduler = Scheduler::new(templates, 100).with_pool(PoolConfig::new(2));
        let messages = vec![
            message(1, "a", 40),
            message(2, "b", 10),
            message(3, "a", 20),
            message(4, "b", 30),
        ];
        let admitted: Vec<Message> = scheduler.schedule(messages).unwrap().collect();
        assert_eq!(ids(&admitted), vec![2, 3, 4, 1]);
    }

    #[test]
    fn test_per_template_caps_applied() {
        let templates = vec![uniform("a", Priority::High, 2), uniform("b", Priority::High, 1)];
        let scheduler = Scheduler::new(templates, 100);
        let messages = vec![
            message(1, "a", 40),
            message(2, "a", 10),
            message(3, "a", 20),
            message(4, "b", 50),
            message(5, "b", 5),
        ];
        let admitted: Vec<Message> = scheduler.schedule(messages).unwrap().collect();
        assert_eq!(ids(&admitted), vec![5, 2, 3]);
    }

    #[test]
    fn test_budget_stops_mid_tier() {
        let scheduler = Scheduler::new(
            vec![uniform("rt", Priority::Realtime, 100), uniform("low", Priority::Low, 100)],
            3,
        );
        let messages: Vec<Message> = (0..6)
            .map(|n| message(n, "rt", 60 - n as u32))
            .chain([message(100, "low", 0)])
            .collect();
        let admitted: Vec<Message> = scheduler.schedule(messages).unwrap().collect();
        assert_eq!(ids(&admitted), vec![5, 4, 3]);
    }

    #[test]
    fn test_lower_tier_fills_remaining_budget() {
        let scheduler = Scheduler::new(
            vec![uniform("rt", Priority::Realtime, 2), uniform("low", Priority::Low, 10)],
            4,
        );
        let messages = vec![
            message(1, "rt", 0),
            message(2, "rt", 1),
            message(3, "rt", 2),
            message(4, "low", 0),
            message(5, "low", 1),
            message(6, "low", 2),
        ];
        let admitted: Vec<Message> = scheduler.schedule(messages).unwrap().collect();
        // rt is capped at 2 by its template, the rest of the budget goes to low
        assert_eq!(ids(&admitted), vec![1, 2, 4, 5]);
    }

    #[test]
    fn test_unknown_template_aborts_cycle() {
        let scheduler = Scheduler::new(vec![uniform("a", Priority::High, 5)], 10);
        let err = scheduler
            .schedule(vec![message(1, "a", 0), message(2, "missing", 0)])
            .unwrap_err();
        assert!(matches!(err, SchedulerError::UnknownTemplate(code) if code == "missing"));
    }

    #[test]
    fn test_duplicate_template_codes_rejected() {
        let scheduler = Scheduler::new(
            vec![uniform("a", Priority::High, 5), uniform("a", Priority::Low, 5)],
            10,
        );
        let err = scheduler.schedule(Vec::new()).unwrap_err();
        assert!(matches!(err, SchedulerError::DuplicateTemplate(code) if code == "a"));
    }

    #[test]
    fn test_empty_template_code_rejected() {
        let scheduler = Scheduler::new(vec![uniform("", Priority::High, 5)], 10);
        let err = scheduler.schedule(vec![message(1, "", 0)]).unwrap_err();
        assert!(matches!(err, SchedulerError::EmptyTemplateCode));
    }

    #[test]
    fn test_message_with_empty_code_is_unknown() {
        let scheduler = Scheduler::new(vec![uniform("a", Priority::High, 5)], 10);
        let err = scheduler.schedule(vec![message(1, "", 0)]).unwrap_err();
        assert!(matches!(err, SchedulerError::UnknownTemplate(code) if code.is_empty()));
    }

    #[test]
    fn test_remaining_budget_decrements() {
        let scheduler = Scheduler::new(vec![uniform("a", Priority::High, 5)], 3);
        let mut admitted = scheduler
            .schedule(vec![message(1, "a", 0), message(2, "a", 1)])
            .unwrap();
        assert_eq!(admitted.remaining_budget(), 3);
        admitted.next();
        assert_eq!(admitted.remaining_budget(), 2);
        admitted.next();
        assert!(admitted.next().is_none());
        assert_eq!(admitted.remaining_budget(), 1);
    }

    #[test]
    fn test_size_hint_upper_bound_is_budget() {
        let scheduler = Scheduler::new(vec![uniform("a", Priority::High, 5)], 3);
        let admitted = scheduler.schedule(vec![message(1, "a", 0)]).unwrap();
        let (_, upper) = admitted.size_hint();
        assert_eq!(upper, Some(3));
    }
}
