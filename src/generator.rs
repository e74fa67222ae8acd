//! Random test data for exercising the scheduler.
//!
//! All randomness flows through an explicit RNG so a seed reproduces a
//! dataset exactly, message ids included.

use chrono::{NaiveDateTime, TimeDelta};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::dataset::Dataset;
use crate::domain::{Distribution, Message, Priority, TemplateInfo};
use crate::planning::{IntervalPriorityMessageChecker, LocalTimeReceiveTimeCalculator, ReceiveTimeCalculator};

/// Timezone offsets, in hours, the generator draws from.
pub const OFFSET_HOURS: RangeInclusive<i64> = -12..=14;

/// Template speeds are picked from these values, messages per minute.
pub const TEMPLATE_SPEEDS: [u32; 3] = [1000, 2000, 3000];

/// How much data to generate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorOptions {
    pub templates_count: usize,
    pub messages_per_template: usize,
    /// Share of a prioritized template's messages placed inside its window
    pub priority_share: f64,
    pub seed: Option<u64>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            templates_count: 20,
            messages_per_template: 5000,
            priority_share: 0.3,
            seed: None,
        }
    }
}

/// How many messages to generate for one template.
#[derive(Debug, Clone)]
pub struct GeneratePlan {
    pub template: TemplateInfo,
    pub total_messages: usize,
    /// Messages received inside the template's window; ignored for uniform templates
    pub priority_messages: usize,
}

/// Random templates with codes `"0"`, `"1"`, ...
pub fn generate_template_infos<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<TemplateInfo> {
    (0..count)
        .map(|i| {
            TemplateInfo::new(
                i.to_string(),
                Priority::ALL[rng.random_range(0..Priority::ALL.len())],
                Distribution::ALL[rng.random_range(0..Distribution::ALL.len())],
                TEMPLATE_SPEEDS[rng.random_range(0..TEMPLATE_SPEEDS.len())],
            )
        })
        .collect()
}

/// Offsets split by whether they land inside a window at the reference time.
#[derive(Debug, Clone, Default)]
struct OffsetPools {
    priority: Vec<i64>,
    non_priority: Vec<i64>,
}

impl OffsetPools {
    fn for_window(checker: &IntervalPriorityMessageChecker, calculator: &dyn ReceiveTimeCalculator) -> Self {
        let mut pools = Self::default();
        for hours in OFFSET_HOURS {
            let sample = Message::new(
                uuid::Uuid::nil(),
                "",
                NaiveDateTime::MIN,
                NaiveDateTime::MIN,
                TimeDelta::hours(hours),
            );
            if checker.contains(calculator.calculate_receive_time(&sample).time()) {
                pools.priority.push(hours);
            } else {
                pools.non_priority.push(hours);
            }
        }
        pools
    }
}

/// Generates messages around a fixed reference time.
#[derive(Debug)]
pub struct MessageGenerator {
    reference_time: NaiveDateTime,
    morning: OffsetPools,
    daytime: OffsetPools,
    evening: OffsetPools,
}

impl MessageGenerator {
    pub fn new(reference_time: NaiveDateTime) -> Self {
        let calculator: Arc<dyn ReceiveTimeCalculator> = Arc::new(LocalTimeReceiveTimeCalculator::new(reference_time));
        let pools = |checker: IntervalPriorityMessageChecker| OffsetPools::for_window(&checker, calculator.as_ref());
        Self {
            reference_time,
            morning: pools(IntervalPriorityMessageChecker::morning(calculator.clone())),
            daytime: pools(IntervalPriorityMessageChecker::daytime(calculator.clone())),
            evening: pools(IntervalPriorityMessageChecker::evening(calculator.clone())),
        }
    }

    fn pools(&self, distribution: Distribution) -> Option<&OffsetPools> {
        match distribution {
            Distribution::Morning => Some(&self.morning),
            Distribution::Daytime => Some(&self.daytime),
            Distribution::Evening => Some(&self.evening),
            Distribution::Uniform => None,
        }
    }

    /// Generate every plan's messages, template by template.
    pub fn generate<R: Rng + ?Sized>(&self, plans: &[GeneratePlan], rng: &mut R) -> Vec<Message> {
        let mut messages = Vec::with_capacity(plans.iter().map(|p| p.total_messages).sum());
        for plan in plans {
            let code = plan.template.template_code.as_str();
            match self.pools(plan.template.distribution) {
                None => {
                    for _ in 0..plan.total_messages {
                        let hours = rng.random_range(OFFSET_HOURS);
                        messages.push(self.message(code, hours, rng));
                    }
                }
                Some(pools) => {
                    let priority_count = plan.priority_messages.min(plan.total_messages);
                    for i in 0..plan.total_messages {
                        let pool = if i < priority_count {
                            &pools.priority
                        } else {
                            &pools.non_priority
                        };
                        let hours = pick(pool, rng).unwrap_or_else(|| rng.random_range(OFFSET_HOURS));
                        messages.push(self.message(code, hours, rng));
                    }
                }
            }
        }
        messages
    }

    /// Sending window `[reference - 1 day, reference + 1 day]`, start jittered
    /// by up to an hour.
    fn message<R: Rng + ?Sized>(&self, code: &str, offset_hours: i64, rng: &mut R) -> Message {
        let id = uuid::Builder::from_random_bytes(rng.random::<u128>().to_le_bytes()).into_uuid();
        let start = self.reference_time - TimeDelta::days(1) + TimeDelta::minutes(rng.random_range(0..60));
        let end = self.reference_time + TimeDelta::days(1);
        Message::with_offset_hours(id, code, start, end, offset_hours)
    }
}

fn pick<R: Rng + ?Sized>(pool: &[i64], rng: &mut R) -> Option<i64> {
    if pool.is_empty() {
        None
    } else {
        Some(pool[rng.random_range(0..pool.len())])
    }
}

/// Generate a full dataset: random templates and their messages.
pub fn generate_dataset<R: Rng + ?Sized>(
    options: &GeneratorOptions,
    reference_time: NaiveDateTime,
    rng: &mut R,
) -> Dataset {
    let templates = generate_template_infos(options.templates_count, rng);
    let share = options.priority_share.clamp(0.0, 1.0);
    let plans: Vec<GeneratePlan> = templates
        .iter()
        .map(|template| GeneratePlan {
            template: template.clone(),
            total_messages: options.messages_per_template,
            priority_messages: (options.messages_per_template as f64 * share).round() as usize,
        })
        .collect();

    let messages = MessageGenerator::new(reference_time).generate(&plans, rng);
    tracing::info!(
        templates = templates.len(),
        messages = messages.len(),
        "Dataset generated"
    );
    Dataset::new(templates, messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::PriorityMessageChecker;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn reference() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(14, 20, 0).unwrap()
    }

    fn plan(distribution: Distribution, total: usize, priority: usize) -> GeneratePlan {
        GeneratePlan {
            template: TemplateInfo::new("t", Priority::Normal, distribution, 1000),
            total_messages: total,
            priority_messages: priority,
        }
    }

    #[test]
    fn test_template_infos() {
        let mut rng = StdRng::seed_from_u64(7);
        let infos = generate_template_infos(50, &mut rng);
        assert_eq!(infos.len(), 50);
        assert_eq!(infos[0].template_code, "0");
        assert_eq!(infos[49].template_code, "49");
        assert!(infos.iter().all(|t| TEMPLATE_SPEEDS.contains(&t.max_send_speed)));
    }

    #[test]
    fn test_same_seed_same_dataset() {
        let options = GeneratorOptions {
            templates_count: 4,
            messages_per_template: 25,
            priority_share: 0.5,
            seed: Some(42),
        };
        let a = generate_dataset(&options, reference(), &mut StdRng::seed_from_u64(42));
        let b = generate_dataset(&options, reference(), &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
        assert_eq!(a.messages.len(), 100);
    }

    #[test]
    fn test_priority_messages_land_in_window() {
        let calculator: Arc<dyn ReceiveTimeCalculator> = Arc::new(LocalTimeReceiveTimeCalculator::new(reference()));
        let generator = MessageGenerator::new(reference());
        let mut rng = StdRng::seed_from_u64(1);

        for (distribution, checker) in [
            (Distribution::Morning, IntervalPriorityMessageChecker::morning(calculator.clone())),
            (Distribution::Daytime, IntervalPriorityMessageChecker::daytime(calculator.clone())),
            (Distribution::Evening, IntervalPriorityMessageChecker::evening(calculator.clone())),
        ] {
            let messages = generator.generate(&[plan(distribution, 40, 15)], &mut rng);
            let prioritized = messages.iter().filter(|m| checker.is_prioritized(m)).count();
            assert_eq!(prioritized, 15, "{distribution}");
        }
    }

    #[test]
    fn test_uniform_offsets_in_range() {
        let generator = MessageGenerator::new(reference());
        let mut rng = StdRng::seed_from_u64(3);
        let messages = generator.generate(&[plan(Distribution::Uniform, 30, 30)], &mut rng);
        assert_eq!(messages.len(), 30);
        assert!(
            messages
                .iter()
                .all(|m| OFFSET_HOURS.contains(&m.client_timezone_offset.num_hours()))
        );
    }

    #[test]
    fn test_sending_window_around_reference() {
        let generator = MessageGenerator::new(reference());
        let mut rng = StdRng::seed_from_u64(9);
        for message in generator.generate(&[plan(Distribution::Evening, 10, 2)], &mut rng) {
            assert!(message.start_time < reference());
            assert!(message.end_time > reference());
            assert!(message.start_time < message.end_time);
        }
    }
}
