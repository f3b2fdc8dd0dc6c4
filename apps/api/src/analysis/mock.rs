//! Mock scoring: the always-available mode used when upstream credentials are missing.
//! Naive token overlap between JD and resume; makes no model calls.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub const MOCK_NOTE: &str = "Using MOCK (missing one or more API keys)";

const SAMPLE_MATCH_CAP: usize = 20;

/// Requirement cue words and filler that say nothing about the candidate.
const IGNORED_TOKENS: &[&str] = &[
    "must", "required", "require", "requires", "need", "needs", "mandatory", "preferred", "plus",
    "bonus", "nice", "have", "the", "and", "for", "with", "from", "per", "out", "our", "one",
    "are", "being", "been", "that", "this", "those", "these", "its", "into", "about", "across",
    "over", "under",
];

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[a-z0-9+\-.%]{3,}\b").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MockScore {
    pub fit_score: u32,
    pub matched_count: usize,
    #[serde(rename = "totalJDWords")]
    pub total_jd_words: usize,
    pub sample_matches: Vec<String>,
    pub note: String,
}

fn jd_terms(jd: &str) -> Vec<String> {
    let lowered = jd.to_lowercase();
    let mut seen = HashSet::new();
    TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| !IGNORED_TOKENS.contains(t))
        .filter(|t| seen.insert(*t))
        .map(str::to_string)
        .collect()
}

pub fn mock_score(resume: &str, jd: &str) -> MockScore {
    let resume = resume.to_lowercase();
    let terms = jd_terms(jd);
    let matched: Vec<String> = terms
        .iter()
        .filter(|t| resume.contains(t.as_str()))
        .cloned()
        .collect();

    let fit_score = if terms.is_empty() {
        0
    } else {
        ((matched.len() as f64 / terms.len() as f64) * 100.0).round() as u32
    };

    MockScore {
        fit_score,
        matched_count: matched.len(),
        total_jd_words: terms.len(),
        sample_matches: matched.into_iter().take(SAMPLE_MATCH_CAP).collect(),
        note: MOCK_NOTE.to_string(),
    }
}
