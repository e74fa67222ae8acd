//! Dataset files: templates and pending messages for one cycle.
//!
//! Stored as pretty JSON. This is the data source the binary reads from.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::domain::{Message, TemplateInfo};
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub templates: Vec<TemplateInfo>,
    pub messages: Vec<Message>,
}

impl Dataset {
    pub fn new(templates: Vec<TemplateInfo>, messages: Vec<Message>) -> Self {
        Self { templates, messages }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let dataset: Self = serde_json::from_str(&content)?;
        tracing::info!(
            templates = dataset.templates.len(),
            messages = dataset.messages.len(),
            path = %path.display(),
            "Dataset loaded"
        );
        Ok(dataset)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Keep the first `max_to_fetch` messages and only the templates they
    /// reference.
    pub fn take_messages(mut self, max_to_fetch: usize) -> Self {
        self.messages.truncate(max_to_fetch);
        let referenced: HashSet<&str> = self.messages.iter().map(|m| m.template_code.as_str()).collect();
        self.templates
            .retain(|t| referenced.contains(t.template_code.as_str()));
        self
    }

    /// Number of distinct template codes referenced by messages.
    pub fn distinct_template_count(&self) -> usize {
        self.messages
            .iter()
            .map(|m| m.template_code.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}
