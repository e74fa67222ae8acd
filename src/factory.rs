//! Capacity allocation: turns global fractions into per-template caps.
//!
//! The global budget for a cycle is `max_send_speed * interval_minutes`. Each
//! strategy kind gets a fraction of it, and each template's cap is further
//! clamped by the template's own rate limit and floored at one so no template
//! is starved permanently.

use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::{Distribution, Template, TemplateInfo};
use crate::error::{Result, SchedulerError};
use crate::planning::{
    IntervalPriorityMessageChecker, PlanningStrategy, PrioritizedStrategy, ReceiveTimeCalculator, UniformStrategy,
};

/// Builds templates with strategies sized for one cycle.
#[derive(Debug, Clone)]
pub struct TemplateFactory {
    /// Non-priority cap before the template's own speed is applied
    non_priority_max: u64,
    /// Priority cap before the template's own speed is applied
    priority_max: u64,
    /// Uniform cap before the template's own speed is applied
    uniform_max: u64,
    interval_minutes: u32,
    morning: Arc<IntervalPriorityMessageChecker>,
    daytime: Arc<IntervalPriorityMessageChecker>,
    evening: Arc<IntervalPriorityMessageChecker>,
    calculator: Arc<dyn ReceiveTimeCalculator>,
}

impl TemplateFactory {
    /// Create a factory for `template_count` distinct templates.
    ///
    /// Every fraction is raised to at least `1 / template_count` so that a small
    /// number of templates still receives a usable share of the budget.
    pub fn create(
        template_count: usize,
        priority_fraction: f64,
        non_priority_fraction: f64,
        uniform_fraction: f64,
        max_send_speed_per_minute: u32,
        interval_minutes: u32,
        calculator: Arc<dyn ReceiveTimeCalculator>,
    ) -> Self {
        let adjusted_fraction = 1.0 / template_count.max(1) as f64;
        let non_priority_fraction = non_priority_fraction.max(adjusted_fraction);
        let priority_fraction = priority_fraction.max(adjusted_fraction);
        let uniform_fraction = uniform_fraction.max(adjusted_fraction);

        let global_budget = global_budget(max_send_speed_per_minute, interval_minutes) as f64;

        let factory = Self {
            non_priority_max: (non_priority_fraction * global_budget).floor() as u64,
            priority_max: (priority_fraction * global_budget).floor() as u64,
            uniform_max: (uniform_fraction * global_budget).floor() as u64,
            interval_minutes,
            morning: Arc::new(IntervalPriorityMessageChecker::morning(calculator.clone())),
            daytime: Arc::new(IntervalPriorityMessageChecker::daytime(calculator.clone())),
            evening: Arc::new(IntervalPriorityMessageChecker::evening(calculator.clone())),
            calculator,
        };

        tracing::debug!(
            template_count,
            priority_max = factory.priority_max,
            non_priority_max = factory.non_priority_max,
            uniform_max = factory.uniform_max,
            "Template factory created"
        );

        factory
    }

    pub fn priority_max(&self) -> u64 {
        self.priority_max
    }

    pub fn non_priority_max(&self) -> u64 {
        self.non_priority_max
    }

    pub fn uniform_max(&self) -> u64 {
        self.uniform_max
    }

    /// Bind a template to the strategy matching its distribution.
    pub fn create_template(&self, info: &TemplateInfo) -> Result<Template> {
        let strategy = match info.distribution {
            Distribution::Uniform => PlanningStrategy::Uniform(self.create_uniform_strategy(info)),
            _ => PlanningStrategy::Prioritized(self.create_prioritized_strategy(info)?),
        };
        Ok(Template::new(info.template_code.clone(), info.priority, strategy))
    }

    /// Build templates for every info, rejecting empty and duplicate codes.
    pub fn map_to_templates(&self, infos: &[TemplateInfo]) -> Result<Vec<Template>> {
        let mut seen = HashSet::new();
        infos
            .iter()
            .map(|info| {
                if info.template_code.is_empty() {
                    return Err(SchedulerError::EmptyTemplateCode);
                }
                if !seen.insert(info.template_code.as_str()) {
                    return Err(SchedulerError::DuplicateTemplate(info.template_code.clone()));
                }
                self.create_template(info)
            })
            .collect()
    }

    pub fn create_uniform_strategy(&self, info: &TemplateInfo) -> UniformStrategy {
        UniformStrategy::new(self.clamp(info, self.uniform_max))
    }

    pub fn create_prioritized_strategy(&self, info: &TemplateInfo) -> Result<PrioritizedStrategy> {
        let checker = match info.distribution {
            Distribution::Morning => self.morning.clone(),
            Distribution::Daytime => self.daytime.clone(),
            Distribution::Evening => self.evening.clone(),
            Distribution::Uniform => return Err(SchedulerError::NoPriorityWindow(info.template_code.clone())),
        };

        Ok(PrioritizedStrategy::new(
            self.clamp(info, self.priority_max),
            self.clamp(info, self.non_priority_max),
            info.distribution,
            checker,
            self.calculator.clone(),
        ))
    }

    /// `max(min(template_cap, raw), 1)`
    fn clamp(&self, info: &TemplateInfo, raw: u64) -> usize {
        let template_max = info.max_messages_for_interval(self.interval_minutes);
        let cap = template_max.min(raw);
        if cap == 0 {
            tracing::warn!(template = %info.template_code, "Computed cap is zero, raising to 1");
        }
        usize::try_from(cap.max(1)).unwrap_or(usize::MAX)
    }
}

/// Messages the whole system may send over one interval.
pub fn global_budget(max_send_speed_per_minute: u32, interval_minutes: u32) -> u64 {
    u64::from(max_send_speed_per_minute) * u64::from(interval_minutes)
}
