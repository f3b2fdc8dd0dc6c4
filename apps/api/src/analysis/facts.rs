//! Fact model shared by every critic, the merger, the scorer and the provenance check.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactType {
    Role,
    Company,
    Date,
    Skill,
    Tool,
    Metric,
    Achievement,
    Summary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSpan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,
}

/// An atomic claim lifted from the resume. `id` only becomes meaningful after merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fact {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub fact_type: FactType,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_span: Option<SourceSpan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Fact {
    pub fn new(id: impl Into<String>, fact_type: FactType, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fact_type,
            text: text.into(),
            source_span: None,
            tags: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactBag {
    pub facts: Vec<Fact>,
}

impl FactBag {
    /// Checks the structural rules serde cannot express. Returns a human-readable reason.
    pub fn validate(&self) -> Result<(), String> {
        if self.facts.is_empty() {
            return Err("facts must contain at least one fact".to_string());
        }
        if let Some(pos) = self.facts.iter().position(|f| f.text.trim().is_empty()) {
            return Err(format!("fact at index {pos} has empty text"));
        }
        Ok(())
    }

    pub fn ids(&self) -> HashSet<&str> {
        self.facts.iter().map(|f| f.id.as_str()).collect()
    }

    /// All fact texts, lowercased and joined so phrases cannot straddle two facts.
    pub fn searchable_text(&self) -> String {
        self.facts
            .iter()
            .map(|f| f.text.to_lowercase())
            .collect::<Vec<_>>()
            .join(" \n ")
    }
}
