// Resume/JD analysis engine.
// Implements: requirement extraction, adaptive fact extraction, merging, coverage,
// constrained rewrite and provenance filtering. Model calls go through llm_client only.

pub mod coverage;
pub mod critics;
pub mod editor;
pub mod error;
pub mod facts;
pub mod handlers;
pub mod merge;
pub mod mock;
pub mod orchestrator;
pub mod pipeline;
pub mod prompts;
pub mod provenance;
pub mod requirements;
