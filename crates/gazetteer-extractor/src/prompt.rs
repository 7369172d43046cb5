//! Prompt templates for hierarchy enumeration and record batches

use crate::error::ExtractorError;
use gazetteer_domain::{Group, Unit};
use serde::{Deserialize, Serialize};

const GROUPS_PROMPT: &str = "List all current major continents on Earth as a JSON array of names. \
Return only the JSON array, with no explanation or extra text.";

const UNITS_PROMPT: &str = "List all sovereign countries in the continent: {group}. \
Return only a JSON array of names, with no explanation or extra text.";

const RECORDS_PROMPT: &str = r#"You are an expert open-source intelligence cataloguer.
Generate a list of {batch_size} public information sources for {unit} ({group}), spread across these buckets: Government, National Media, Regional Media, NGO, Tech, Cyber, Community, Data Portals, Intelligence, Trackers.
Each entry must be a JSON object with:
- country
- source_name
- bucket
- trust_tier (1-3)
- access (RSS/API/Scrape)
- language
- notes
Respond strictly in valid JSON. Do not include markdown, explanation, or comments.
If you cannot find {batch_size} sources, return as many as possible, but always return a valid JSON array.
Batch: {batch}"#;

/// Prompt templates, one per level of the hierarchy
///
/// Placeholders: `{group}`, `{unit}`, `{batch_size}`, `{batch}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptTemplates {
    /// Top-level enumeration prompt (no placeholders)
    pub groups: String,
    /// Per-group enumeration prompt; must mention `{group}`
    pub units: String,
    /// Per-batch record prompt; must mention `{unit}`
    pub records: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            groups: GROUPS_PROMPT.to_string(),
            units: UNITS_PROMPT.to_string(),
            records: RECORDS_PROMPT.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Check that every template can address the entity it is rendered for
    pub fn validate(&self) -> Result<(), ExtractorError> {
        if self.groups.trim().is_empty() {
            return Err(ExtractorError::Template("groups template is empty".to_string()));
        }
        if !self.units.contains("{group}") {
            return Err(ExtractorError::Template(
                "units template must contain {group}".to_string(),
            ));
        }
        if !self.records.contains("{unit}") {
            return Err(ExtractorError::Template(
                "records template must contain {unit}".to_string(),
            ));
        }
        Ok(())
    }
}

/// Renders [`PromptTemplates`] for concrete groups, units and batches
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    templates: PromptTemplates,
    batch_size: usize,
}

impl PromptBuilder {
    /// Create a builder asking for `batch_size` records per batch
    pub fn new(templates: PromptTemplates, batch_size: usize) -> Self {
        Self {
            templates,
            batch_size,
        }
    }

    /// Prompt enumerating the top-level groups
    pub fn groups(&self) -> String {
        self.templates.groups.clone()
    }

    /// Prompt enumerating the units of `group`
    pub fn units(&self, group: &Group) -> String {
        self.templates.units.replace("{group}", group.name())
    }

    /// Prompt for batch number `batch` (1-based) of `unit`
    pub fn records(&self, unit: &Unit, batch: usize) -> String {
        self.templates
            .records
            .replace("{group}", unit.group().name())
            .replace("{unit}", unit.name())
            .replace("{batch_size}", &self.batch_size.to_string())
            .replace("{batch}", &batch.to_string())
    }
}
