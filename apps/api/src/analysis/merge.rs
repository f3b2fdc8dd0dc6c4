//! Fact merging: union of several critics' bags into one canonical bag.
//!
//! Dedup is textual: key = (type, trimmed lowercase text). Tags and source spans are
//! ignored, and near-duplicates with different wording are kept apart on purpose.

use std::collections::HashSet;

use crate::analysis::facts::{FactBag, FactType};

/// Merges bags in order. First occurrence wins; survivors are renumbered `f1..fn`
/// in first-seen order, so the bag order is the tie-break.
pub fn merge_facts(bags: &[FactBag]) -> FactBag {
    let mut seen: HashSet<(FactType, String)> = HashSet::new();
    let mut facts = Vec::new();

    for fact in bags.iter().flat_map(|b| b.facts.iter()) {
        let key = (fact.fact_type, fact.text.trim().to_lowercase());
        if !seen.insert(key) {
            continue;
        }
        let mut kept = fact.clone();
        kept.id = format!("f{}", facts.len() + 1);
        facts.push(kept);
    }

    FactBag { facts }
}
