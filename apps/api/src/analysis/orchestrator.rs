//! Adaptive fact extraction.
//!
//! Flow: fast critic alone → coverage check → (escalate: remaining critics concurrently,
//! each settling on its own) → merge → fallback to resume tokens if nothing succeeded.
//!
//! Never returns an error. Every critic failure is recorded and routed around; retrying
//! means asking a different provider, never the same one twice.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use futures::future::join_all;
use regex::Regex;
use tracing::{info, warn};

use crate::analysis::coverage::{score_coverage, Coverage};
use crate::analysis::critics::FactExtractor;
use crate::analysis::error::PipelineError;
use crate::analysis::facts::{Fact, FactBag, FactType};
use crate::analysis::merge::merge_facts;
use crate::analysis::requirements::RequirementSet;

/// Cap on synthesized facts when every critic failed.
const TOKEN_FALLBACK_CAP: usize = 100;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z0-9]+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionPath {
    /// Fast critic met the threshold on its own.
    Fast,
    /// Escalated; at least one critic succeeded.
    Escalated,
    /// Escalated and every critic failed; facts are resume tokens.
    TokenFallback,
}

#[derive(Debug)]
pub struct CriticFailure {
    pub critic: String,
    pub error: PipelineError,
}

#[derive(Debug)]
pub struct ExtractionOutcome {
    pub facts: FactBag,
    /// Coverage of the final, merged fact set.
    pub coverage: Coverage,
    pub path: ExtractionPath,
    /// Rounded coverage of the fast critic alone; `None` when it failed.
    pub fast_coverage_pct: Option<u32>,
    /// Critics whose bags fed the merge, in merge order.
    pub contributing_critics: Vec<String>,
    pub failures: Vec<CriticFailure>,
}

/// Escalate when the fast critic failed or fell short of the threshold.
pub fn should_escalate(fast_coverage_pct: Option<u32>, threshold: u32) -> bool {
    match fast_coverage_pct {
        None => true,
        Some(pct) => pct < threshold,
    }
}

/// Minimal fact set built straight from resume tokens: lowercase alphanumeric runs of at
/// least three characters, deduplicated, capped, each typed `skill`.
pub fn token_fallback_facts(resume: &str) -> Result<FactBag, PipelineError> {
    let lowered = resume.to_lowercase();
    let mut seen = HashSet::new();
    let facts: Vec<Fact> = TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|token| token.len() >= 3)
        .filter(|token| seen.insert(*token))
        .take(TOKEN_FALLBACK_CAP)
        .enumerate()
        .map(|(i, token)| Fact::new(format!("f{}", i + 1), FactType::Skill, token))
        .collect();

    if facts.is_empty() {
        return Err(PipelineError::NoFactsAvailable);
    }
    Ok(FactBag { facts })
}

pub struct AdaptiveOrchestrator {
    fast: Arc<dyn FactExtractor>,
    escalation: Vec<Arc<dyn FactExtractor>>,
    threshold: u32,
}

impl AdaptiveOrchestrator {
    pub fn new(
        fast: Arc<dyn FactExtractor>,
        escalation: Vec<Arc<dyn FactExtractor>>,
        threshold: u32,
    ) -> Self {
        Self {
            fast,
            escalation,
            threshold,
        }
    }

    pub fn critic_names(&self) -> Vec<&str> {
        std::iter::once(self.fast.name())
            .chain(self.escalation.iter().map(|c| c.name()))
            .collect()
    }

    pub async fn run(&self, resume: &str, requirements: &RequirementSet) -> ExtractionOutcome {
        let mut bags = Vec::new();
        let mut contributing_critics = Vec::new();
        let mut failures = Vec::new();

        let fast_coverage_pct = match self.fast.extract_facts(resume).await {
            Ok(bag) => {
                let pct = score_coverage(requirements, &bag).percent();
                info!(critic = %self.fast.name(), coverage_pct = pct, "fast path coverage");
                bags.push(bag);
                contributing_critics.push(self.fast.name().to_string());
                Some(pct)
            }
            Err(error) => {
                failures.push(CriticFailure {
                    critic: self.fast.name().to_string(),
                    error,
                });
                None
            }
        };

        let escalated = should_escalate(fast_coverage_pct, self.threshold);
        if escalated {
            info!(
                threshold = self.threshold,
                fast_coverage_pct = ?fast_coverage_pct,
                critics = self.escalation.len(),
                "escalating to remaining critics"
            );

            // join_all settles every critic; one failure never cancels the others.
            let settled = join_all(self.escalation.iter().map(|critic| async move {
                (critic.name().to_string(), critic.extract_facts(resume).await)
            }))
            .await;

            for (critic, result) in settled {
                match result {
                    Ok(bag) => {
                        bags.push(bag);
                        contributing_critics.push(critic);
                    }
                    Err(error) => failures.push(CriticFailure { critic, error }),
                }
            }
        }

        let (facts, path) = if bags.is_empty() {
            warn!(
                failures = failures.len(),
                "every critic failed, synthesizing facts from resume tokens"
            );
            let facts = token_fallback_facts(resume).unwrap_or_else(|error| {
                warn!("token fallback produced nothing: {error}");
                FactBag { facts: Vec::new() }
            });
            (facts, ExtractionPath::TokenFallback)
        } else {
            let merged = merge_facts(&bags);
            info!(
                bags = bags.len(),
                facts = merged.facts.len(),
                "merged critic facts"
            );
            let path = if escalated {
                ExtractionPath::Escalated
            } else {
                ExtractionPath::Fast
            };
            (merged, path)
        };

        let coverage = score_coverage(requirements, &facts);

        ExtractionOutcome {
            facts,
            coverage,
            path,
            fast_coverage_pct,
            contributing_critics,
            failures,
        }
    }
}
