//! Provenance check: the last filter between the editor and the caller.
//! Drops every bullet that cites nothing, or cites an id the merged fact set does not hold.

use tracing::warn;

use crate::analysis::editor::EditorOutput;
use crate::analysis::facts::FactBag;

/// Keeps only bullets whose `source_ids` are non-empty and all known. Never adds bullets.
pub fn validate_provenance(output: EditorOutput, facts: &FactBag) -> EditorOutput {
    let known = facts.ids();
    let before = output.aligned_resume.len();

    let aligned_resume: Vec<_> = output
        .aligned_resume
        .into_iter()
        .filter(|b| {
            !b.source_ids.is_empty() && b.source_ids.iter().all(|id| known.contains(id.as_str()))
        })
        .collect();

    let dropped = before - aligned_resume.len();
    if dropped > 0 {
        warn!(dropped, kept = aligned_resume.len(), "dropped bullets citing unknown facts");
    }

    EditorOutput {
        aligned_resume,
        ..output
    }
}
