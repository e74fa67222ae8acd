//! Per-template and per-tier summaries of a scheduled cycle.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::domain::{Distribution, Message, Priority, Template};
use crate::planning::PriorityMessageChecker;

/// Candidates versus admitted messages of one template.
///
/// Window counts are `None` for uniform templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateGroupSummary {
    pub template_code: String,
    pub priority: Priority,
    pub distribution: Distribution,
    pub candidate_messages: usize,
    pub total_messages: usize,
    pub candidate_priority_messages: Option<usize>,
    /// Admitted messages inside the template's window
    pub priority_messages: Option<usize>,
    pub candidate_non_priority_messages: Option<usize>,
    pub non_priority_messages: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleStatistics {
    /// Messages offered to the cycle
    pub candidate_messages: usize,
    /// Messages admitted by the cycle
    pub total_messages: usize,
    /// Templates with at least one candidate
    pub candidate_templates: usize,
    /// Templates with at least one admitted message
    pub different_templates: usize,
    /// Candidate messages per tier
    pub candidate_per_priority: BTreeMap<Priority, usize>,
    /// Admitted messages per tier
    pub per_priority: BTreeMap<Priority, usize>,
    /// Every template with candidates, sorted by tier, then template code
    pub templates: Vec<TemplateGroupSummary>,
    pub schedule_time_ms: u128,
}

pub struct StatisticsCalculator<'a> {
    templates: HashMap<&'a str, &'a Template>,
}

/// Message counts of one template, split by window when it has one.
#[derive(Debug, Clone, Copy, Default)]
struct Counts {
    total: usize,
    inside: usize,
}

impl<'a> StatisticsCalculator<'a> {
    pub fn new(templates: &'a [Template]) -> Self {
        Self {
            templates: templates.iter().map(|t| (t.template_code.as_str(), t)).collect(),
        }
    }

    /// Compare the messages offered to a cycle with the ones it admitted.
    ///
    /// Messages whose template is unknown are skipped; the scheduler never
    /// admits such messages.
    pub fn calculate(
        &self,
        candidates: &[Message],
        admitted: &[Message],
        schedule_time: Duration,
    ) -> ScheduleStatistics {
        let offered = self.count(candidates);
        let taken = self.count(admitted);

        let mut templates: Vec<TemplateGroupSummary> = offered
            .iter()
            .chain(taken.iter().filter(|(code, _)| !offered.contains_key(*code)))
            .filter_map(|(code, _)| {
                let template = self.templates.get(code)?;
                let offered = offered.get(code).copied().unwrap_or_default();
                let taken = taken.get(code).copied().unwrap_or_default();
                Some(summarize(template, offered, taken))
            })
            .collect();
        templates.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.template_code.cmp(&b.template_code))
        });

        let mut candidate_per_priority: BTreeMap<Priority, usize> = Priority::ALL.iter().map(|&p| (p, 0)).collect();
        let mut per_priority = candidate_per_priority.clone();
        for summary in &templates {
            *candidate_per_priority.entry(summary.priority).or_insert(0) += summary.candidate_messages;
            *per_priority.entry(summary.priority).or_insert(0) += summary.total_messages;
        }

        ScheduleStatistics {
            candidate_messages: templates.iter().map(|t| t.candidate_messages).sum(),
            total_messages: templates.iter().map(|t| t.total_messages).sum(),
            candidate_templates: templates.iter().filter(|t| t.candidate_messages > 0).count(),
            different_templates: templates.iter().filter(|t| t.total_messages > 0).count(),
            candidate_per_priority,
            per_priority,
            templates,
            schedule_time_ms: schedule_time.as_millis(),
        }
    }

    fn count(&self, messages: &[Message]) -> HashMap<&'a str, Counts> {
        let mut counts: HashMap<&'a str, Counts> = HashMap::new();
        for message in messages {
            let Some(&template) = self.templates.get(message.template_code.as_str()) else {
                continue;
            };
            let entry = counts.entry(template.template_code.as_str()).or_default();
            entry.total += 1;
            if let Some(strategy) = template.strategy().as_prioritized()
                && strategy.checker().is_prioritized(message)
            {
                entry.inside += 1;
            }
        }
        counts
    }
}

fn summarize(template: &Template, offered: Counts, taken: Counts) -> TemplateGroupSummary {
    let strategy = template.strategy();
    let windowed = strategy.as_prioritized().is_some();
    let inside = |c: Counts| windowed.then_some(c.inside);
    let outside = |c: Counts| windowed.then_some(c.total - c.inside);

    TemplateGroupSummary {
        template_code: template.template_code.clone(),
        priority: template.priority,
        distribution: strategy.distribution(),
        candidate_messages: offered.total,
        total_messages: taken.total,
        candidate_priority_messages: inside(offered),
        priority_messages: inside(taken),
        candidate_non_priority_messages: outside(offered),
        non_priority_messages: outside(taken),
    }
}
