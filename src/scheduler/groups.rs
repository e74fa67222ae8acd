//! Tier and template grouping.
//!
//! Messages are bucketed by their template's tier (Realtime, High, Normal,
//! Low) and, inside a tier, by template code. Template groups keep the order
//! in which their first message appeared so that the tier merge is
//! reproducible.

use std::collections::HashMap;

use crate::domain::{Message, Priority, Template};
use crate::error::{Result, SchedulerError};

/// Messages of one template within a tier.
#[derive(Debug)]
pub struct TemplateGroup<'a> {
    pub template: &'a Template,
    pub messages: Vec<Message>,
}

impl TemplateGroup<'_> {
    /// Run the template's strategy on exactly this group's messages.
    pub fn plan(self) -> Vec<Message> {
        let before = self.messages.len();
        let planned = self.template.strategy().plan(self.messages);
        tracing::trace!(
            template = %self.template.template_code,
            candidates = before,
            admitted = planned.len(),
            "Template group planned"
        );
        planned
    }
}

/// All messages of one tier, grouped by template.
#[derive(Debug)]
pub struct TierBucket<'a> {
    pub priority: Priority,
    pub groups: Vec<TemplateGroup<'a>>,
}

impl TierBucket<'_> {
    pub fn message_count(&self) -> usize {
        self.groups.iter().map(|g| g.messages.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Resolve every message's template and split the messages into the four
/// tiers, Realtime first.
///
/// Fails on the first message whose template code is unknown; in that case
/// nothing is returned.
pub fn build_tiers<'a, I>(messages: I, templates: &HashMap<&'a str, &'a Template>) -> Result<Vec<TierBucket<'a>>>
where
    I: IntoIterator<Item = Message>,
{
    let mut tiers: Vec<TierBucket<'a>> = Priority::ALL
        .iter()
        .map(|&priority| TierBucket {
            priority,
            groups: Vec::new(),
        })
        .collect();
    // Per tier: template code -> index into that tier's groups
    let mut positions: Vec<HashMap<&'a str, usize>> = vec![HashMap::new(); Priority::ALL.len()];

    for message in messages {
        let template = *templates
            .get(message.template_code.as_str())
            .ok_or_else(|| SchedulerError::UnknownTemplate(message.template_code.clone()))?;

        let tier = template.priority.index();
        let code = template.template_code.as_str();
        match positions[tier].get(code) {
            Some(&idx) => tiers[tier].groups[idx].messages.push(message),
            None => {
                positions[tier].insert(code, tiers[tier].groups.len());
                tiers[tier].groups.push(TemplateGroup {
                    template,
                    messages: vec![message],
                });
            }
        }
    }

    Ok(tiers)
}
