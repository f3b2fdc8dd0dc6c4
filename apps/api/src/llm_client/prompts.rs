// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting fragments only.

/// Appended to every system prompt that expects a structured reply.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    Respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Fabrication guard shared by the critics and the editor.
pub const NO_FABRICATION_INSTRUCTION: &str = "\
    CRITICAL: Use ONLY information present in the material you are given. \
    No new companies, roles, tools, certifications, metrics, or dates. \
    If the material does not support a claim, omit it entirely.";
