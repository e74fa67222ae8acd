//! Templates, priority tiers and distribution kinds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::planning::PlanningStrategy;

/// Priority tier of a template.
///
/// Declaration order is precedence order: `Realtime` is served first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Realtime,
    High,
    Normal,
    Low,
}

impl Priority {
    /// All tiers in processing order.
    pub const ALL: [Priority; 4] = [Priority::Realtime, Priority::High, Priority::Normal, Priority::Low];

    /// Position of the tier in processing order.
    pub fn index(self) -> usize {
        match self {
            Priority::Realtime => 0,
            Priority::High => 1,
            Priority::Normal => 2,
            Priority::Low => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Realtime => "realtime",
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time-of-day shape of a template's sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distribution {
    /// No preferred window
    Uniform,
    /// Until noon
    Morning,
    /// Noon to 17:00
    Daytime,
    /// 17:00 to midnight
    Evening,
}

impl Distribution {
    pub const ALL: [Distribution; 4] = [
        Distribution::Uniform,
        Distribution::Morning,
        Distribution::Daytime,
        Distribution::Evening,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Distribution::Uniform => "uniform",
            Distribution::Morning => "morning",
            Distribution::Daytime => "daytime",
            Distribution::Evening => "evening",
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Template description as delivered by the data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateInfo {
    pub template_code: String,
    pub priority: Priority,
    pub distribution: Distribution,
    /// Template's own rate limit, messages per minute
    pub max_send_speed: u32,
}

impl TemplateInfo {
    pub fn new(
        template_code: impl Into<String>,
        priority: Priority,
        distribution: Distribution,
        max_send_speed: u32,
    ) -> Self {
        Self {
            template_code: template_code.into(),
            priority,
            distribution,
            max_send_speed,
        }
    }

    /// How many messages the template itself allows over `interval_minutes`.
    pub fn max_messages_for_interval(&self, interval_minutes: u32) -> u64 {
        u64::from(self.max_send_speed) * u64::from(interval_minutes)
    }
}

/// A template bound to its planning strategy for one cycle.
///
/// Two templates are equal when their codes are equal; the tier and the
/// strategy do not take part in comparison or hashing.
#[derive(Debug, Clone)]
pub struct Template {
    pub template_code: String,
    pub priority: Priority,
    strategy: Arc<PlanningStrategy>,
}

impl Template {
    pub fn new(template_code: impl Into<String>, priority: Priority, strategy: PlanningStrategy) -> Self {
        Self {
            template_code: template_code.into(),
            priority,
            strategy: Arc::new(strategy),
        }
    }

    pub fn strategy(&self) -> &PlanningStrategy {
        &self.strategy
    }
}

impl PartialEq for Template {
    fn eq(&self, other: &Self) -> bool {
        self.template_code == other.template_code
    }
}

impl Eq for Template {}

impl Hash for Template {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.template_code.hash(state);
    }
}
