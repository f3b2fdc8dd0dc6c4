//! Coverage scoring: plain substring presence of requirement phrases in fact text.
//! No weights, no fuzzy matching, no model.

use serde::{Deserialize, Serialize};

use crate::analysis::facts::FactBag;
use crate::analysis::requirements::RequirementSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketCoverage {
    pub covered: usize,
    pub total: usize,
    pub items_uncovered: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    pub must_have: BucketCoverage,
    pub responsibilities: BucketCoverage,
    pub nice_to_have: BucketCoverage,
    /// Covered over total across all buckets, in `[0, 1]`; 1.0 when there are no requirements.
    pub exact_match_ratio: f64,
}

impl Coverage {
    /// Ratio as a rounded percentage, the unit the escalation threshold uses.
    pub fn percent(&self) -> u32 {
        (self.exact_match_ratio * 100.0).round() as u32
    }
}

fn score_bucket(phrases: &[String], fact_text: &str) -> BucketCoverage {
    let items_uncovered: Vec<String> = phrases
        .iter()
        .filter(|p| !fact_text.contains(&p.to_lowercase()))
        .cloned()
        .collect();

    BucketCoverage {
        covered: phrases.len() - items_uncovered.len(),
        total: phrases.len(),
        items_uncovered,
    }
}

/// Scores every requirement bucket against the fact set.
pub fn score_coverage(requirements: &RequirementSet, facts: &FactBag) -> Coverage {
    let fact_text = facts.searchable_text();

    let must_have = score_bucket(&requirements.must_have, &fact_text);
    let responsibilities = score_bucket(&requirements.responsibilities, &fact_text);
    let nice_to_have = score_bucket(&requirements.nice_to_have, &fact_text);

    let covered = must_have.covered + responsibilities.covered + nice_to_have.covered;
    let total = must_have.total + responsibilities.total + nice_to_have.total;
    // Nothing to cover counts as fully covered.
    let exact_match_ratio = if total == 0 {
        1.0
    } else {
        covered as f64 / total as f64
    };

    Coverage {
        must_have,
        responsibilities,
        nice_to_have,
        exact_match_ratio,
    }
}

/// Splits canonical phrases into (supported, unsupported) by the same substring rule.
pub fn partition_phrases(requirements: &RequirementSet, facts: &FactBag) -> (Vec<String>, Vec<String>) {
    let fact_text = facts.searchable_text();
    requirements
        .canonical_phrases
        .iter()
        .cloned()
        .partition(|p| fact_text.contains(&p.to_lowercase()))
}
