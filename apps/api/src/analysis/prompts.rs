// LLM prompt constants for the analysis pipeline.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for the fact-extraction critics.
/// Replace `{no_fabrication}` and `{json_only}` before sending.
pub const FACT_SYSTEM_TEMPLATE: &str = r#"Extract atomic FACTS from the RESUME only. DO NOT invent.
{no_fabrication}

Return a JSON object with this EXACT shape:
{"facts":[
  {"id":"f1","type":"role|company|date|skill|tool|metric|achievement|summary","text":"...","sourceSpan":{"startLine":1,"endLine":2},"tags":["optional","tags"]},
  {"id":"f2","type":"skill","text":"TypeScript"}
]}

Rules:
- Facts MUST come from the resume content only.
- Preserve metrics exactly as written (e.g., "increased CTR by 18%").
- Use short, faithful text. Avoid generic claims.
- Generate ids f1, f2, f3...

{json_only}"#;

/// User prompt for the critics. Replace `{resume}`.
pub const FACT_USER_TEMPLATE: &str = "RESUME:\n{resume}";

/// System prompt for the constrained editor.
pub const EDITOR_SYSTEM_TEMPLATE: &str = r#"You are the single editor. You may ONLY use information from facts_json and supported_keywords to rewrite the resume.
{no_fabrication}
- Rephrase and reorder only.
- Every bullet MUST include source_ids taken from facts_json.
- Place unsupported requirements into key_gaps or missing_keywords; do NOT insert them into aligned_resume.

Return a JSON object with this EXACT shape:
{"fitScore":0-100,"missing_keywords":["..."],"key_gaps":["..."],
 "aligned_resume":[{"bullet":"...","source_ids":["f1","f3"]}],
 "rationale":"..."}

{json_only}"#;

/// Editor user prompt. Replace: {facts_json}, {supported_json}, {unsupported_json}, {resume}
pub const EDITOR_USER_TEMPLATE: &str = r#"facts_json:
{facts_json}

supported_keywords:
{supported_json}

unsupported_requirements (gaps, never claims):
{unsupported_json}

resume (original, for style only):
{resume}"#;
