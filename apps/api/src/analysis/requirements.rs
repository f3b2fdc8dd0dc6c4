//! Requirement extraction: turns a raw job description into requirement buckets.
//!
//! Rule-based on purpose: no model call, no semantic parsing. Every phrase can be traced
//! back to a cue word and a split rule, so the output is deterministic and auditable.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Small English stopword set, plus a few noisy JD words.
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "for", "to", "of", "in", "on", "with", "by", "from", "at", "as",
    "per", "out", "our", "one", "is", "are", "be", "being", "been", "that", "this", "those",
    "these", "it", "its", "into", "about", "across", "over", "under", "early", "form", "act",
];

/// Common tech synonyms, applied to whole phrases.
const ALIASES: &[(&str, &str)] = &[
    ("llm", "large language model"),
    ("k8s", "kubernetes"),
    ("js", "javascript"),
    ("ts", "typescript"),
    ("csat", "customer satisfaction"),
];

/// Fallback only runs when the buckets hold fewer phrases than this.
const MIN_BUCKET_PHRASES: usize = 6;
const FALLBACK_MAX_WORDS: usize = 6;
const FALLBACK_CAP: usize = 20;
/// A `label:` prefix longer than this is treated as content, not a heading.
const MAX_LABEL_WORDS: usize = 4;

static MUST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"must|required|need|mandatory").unwrap());

static NICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"nice to have|preferred|plus|bonus").unwrap());

static RESP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"responsibilit|own|lead|deliver|manage|design|build|implement|ship|execute")
        .unwrap()
});

/// Clause boundary inside a line: sentence-ending punctuation followed by space or end.
/// A bare dot (`node.js`, `3.5`) is not a boundary.
static SENTENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?](\s+|$)").unwrap());

/// Phrase separators within a classified clause. Runs on raw text, so `and` matches any case.
static PHRASE_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[,;]|\band\b").unwrap());

/// Fallback fragment separators over the whole text.
static FALLBACK_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,;!?\r\n]|\.(\s+|$)").unwrap());

static NOISE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9+\-.% ]").unwrap());

static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Requirement buckets extracted from one job description. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementSet {
    pub must_have: Vec<String>,
    pub nice_to_have: Vec<String>,
    pub responsibilities: Vec<String>,
    /// Deduplicated union in bucket order: must, responsibilities, nice.
    pub canonical_phrases: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    Must,
    Nice,
    Responsibility,
}

/// Lowercases, drops bracket and punctuation noise, collapses whitespace,
/// and trims stray dots and dashes from the edges.
pub fn normalize_phrase(s: &str) -> String {
    let lowered = s.to_lowercase();
    let cleaned = NOISE_RE.replace_all(&lowered, " ");
    let collapsed = SPACE_RE.replace_all(&cleaned, " ");
    collapsed
        .trim()
        .trim_matches(|c: char| c == '.' || c == '-')
        .trim()
        .to_string()
}

/// Whether a normalized candidate is worth keeping as a requirement phrase.
pub fn keep_phrase(s: &str) -> bool {
    if s.is_empty() || s.chars().count() < 3 {
        return false;
    }
    if !s.chars().any(|c| c.is_ascii_alphanumeric()) {
        return false;
    }
    !STOPWORDS.contains(&s)
}

fn apply_alias(phrase: String) -> String {
    ALIASES
        .iter()
        .find(|(from, _)| *from == phrase)
        .map(|(_, to)| to.to_string())
        .unwrap_or(phrase)
}

fn classify(normalized: &str) -> Option<Bucket> {
    if MUST_RE.is_match(normalized) {
        Some(Bucket::Must)
    } else if NICE_RE.is_match(normalized) {
        Some(Bucket::Nice)
    } else if RESP_RE.is_match(normalized) {
        Some(Bucket::Responsibility)
    } else {
        None
    }
}

/// Drops a short heading such as `Must have:` so only the listed items remain.
fn strip_label(clause: &str) -> &str {
    match clause.split_once(':') {
        Some((label, rest)) if label.split_whitespace().count() <= MAX_LABEL_WORDS => rest,
        _ => clause,
    }
}

fn dedup(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

fn split_candidates(body: &str) -> Vec<String> {
    PHRASE_SPLIT_RE
        .split(body)
        .map(normalize_phrase)
        .map(apply_alias)
        .filter(|p| keep_phrase(p))
        .collect()
}

fn fallback_fragments(jd: &str) -> Vec<String> {
    FALLBACK_SPLIT_RE
        .split(jd)
        .map(|fragment| normalize_phrase(strip_label(fragment)))
        .filter(|fragment| fragment.split_whitespace().count() <= FALLBACK_MAX_WORDS)
        .map(apply_alias)
        .filter(|p| keep_phrase(p))
        .take(FALLBACK_CAP)
        .collect()
}

/// Builds the requirement buckets for a job description. Never fails; empty text
/// yields empty buckets.
pub fn extract_requirements(jd: &str) -> RequirementSet {
    let mut must = Vec::new();
    let mut nice = Vec::new();
    let mut resp = Vec::new();

    // A clause without its own cue word takes the bucket of the line it sits on.
    let clauses = jd
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .flat_map(|line| {
            let line_bucket = classify(&normalize_phrase(line));
            SENTENCE_RE
                .split(line)
                .map(str::trim)
                .filter(|clause| !clause.is_empty())
                .map(move |clause| (clause, line_bucket))
        });

    for (clause, line_bucket) in clauses {
        let Some(bucket) = classify(&normalize_phrase(clause)).or(line_bucket) else {
            continue;
        };
        let candidates = split_candidates(strip_label(clause));
        match bucket {
            Bucket::Must => must.extend(candidates),
            Bucket::Nice => nice.extend(candidates),
            Bucket::Responsibility => resp.extend(candidates),
        }
    }

    if must.len() + nice.len() + resp.len() < MIN_BUCKET_PHRASES {
        resp.extend(fallback_fragments(jd));
    }

    let must_have = dedup(must);
    let nice_to_have = dedup(nice);
    let responsibilities = dedup(resp);
    let canonical_phrases = dedup(
        must_have
            .iter()
            .chain(responsibilities.iter())
            .chain(nice_to_have.iter())
            .cloned()
            .collect(),
    );

    RequirementSet {
        must_have,
        nice_to_have,
        responsibilities,
        canonical_phrases,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLATFORM_JD: &str = r#"
        Senior Platform Engineer
        Must have: Rust, Kubernetes, distributed systems and observability.
        Required: 5+ years backend experience; SQL
        Nice to have: k8s operators, Kafka, Terraform
        You will own the deployment pipeline and lead incident reviews.
        Design, build and ship internal tooling.
        About us: a small team in Berlin.
    "#;

    #[test]
    fn test_normalize_phrase_strips_noise_and_edges() {
        assert_eq!(normalize_phrase("  (Python) / Django!! "), "python django");
        assert_eq!(normalize_phrase("Node.js"), "node.js");
        assert_eq!(normalize_phrase("Recommendation systems."), "recommendation systems");
        assert_eq!(normalize_phrase("C++ \t and  Go"), "c++ and go");
        assert_eq!(normalize_phrase("99.9% uptime"), "99.9% uptime");
    }

    #[test]
    fn test_keep_phrase_rejects_short_symbolic_and_stopwords() {
        assert!(!keep_phrase(""));
        assert!(!keep_phrase("go"));
        assert!(!keep_phrase("++-"));
        assert!(!keep_phrase("%%%%"));
        for stop in STOPWORDS.iter().filter(|s| s.len() >= 3) {
            assert!(!keep_phrase(stop), "stopword '{stop}' should be rejected");
        }
        assert!(keep_phrase("sql"));
        assert!(keep_phrase("machine learning"));
        assert!(keep_phrase("the team"));
    }

    #[test]
    fn test_aliases_apply_to_whole_phrases() {
        assert_eq!(apply_alias("k8s".to_string()), "kubernetes");
        assert_eq!(apply_alias("js".to_string()), "javascript");
        assert_eq!(apply_alias("k8s operators".to_string()), "k8s operators");
    }

    #[test]
    fn test_empty_input_yields_empty_buckets() {
        let set = extract_requirements("");
        assert_eq!(set, RequirementSet::default());

        let set = extract_requirements("   \n\n  \t ");
        assert!(set.canonical_phrases.is_empty());
    }

    #[test]
    fn test_buckets_classified_by_cue_words() {
        let set = extract_requirements(PLATFORM_JD);

        assert!(set.must_have.contains(&"rust".to_string()));
        assert!(set.must_have.contains(&"kubernetes".to_string()));
        assert!(set.must_have.contains(&"distributed systems".to_string()));
        assert!(set.must_have.contains(&"observability".to_string()));
        assert!(set.must_have.contains(&"sql".to_string()));

        assert!(set.nice_to_have.contains(&"kafka".to_string()));
        assert!(set.nice_to_have.contains(&"terraform".to_string()));

        assert!(set
            .responsibilities
            .iter()
            .any(|p| p.contains("deployment pipeline")));
        assert!(set.responsibilities.contains(&"ship internal tooling".to_string()));
    }

    #[test]
    fn test_unclassified_lines_do_not_land_in_buckets() {
        let set = extract_requirements(PLATFORM_JD);
        assert!(!set.canonical_phrases.iter().any(|p| p.contains("berlin")));
        assert!(!set
            .canonical_phrases
            .iter()
            .any(|p| p.contains("senior platform engineer")));
    }

    #[test]
    fn test_must_takes_precedence_over_nice() {
        let set = extract_requirements("Python required, Go preferred");
        assert!(set.must_have.contains(&"python required".to_string()));
        assert!(set.nice_to_have.is_empty());
    }

    #[test]
    fn test_canonical_is_dedup_union_in_bucket_order() {
        let jds = [
            PLATFORM_JD,
            "Must have: Python, machine learning. Responsibilities: build recommendation systems.",
            "Python required\nPython preferred\nBuild Python services",
            "",
            "Lead, lead, LEAD the team",
        ];

        for jd in jds {
            let set = extract_requirements(jd);

            let unique: HashSet<&String> = set.canonical_phrases.iter().collect();
            assert_eq!(unique.len(), set.canonical_phrases.len(), "duplicates for {jd:?}");

            let expected = dedup(
                set.must_have
                    .iter()
                    .chain(set.responsibilities.iter())
                    .chain(set.nice_to_have.iter())
                    .cloned()
                    .collect(),
            );
            assert_eq!(set.canonical_phrases, expected, "order for {jd:?}");
        }
    }

    #[test]
    fn test_buckets_are_deduplicated() {
        let set = extract_requirements("Must know Rust\nRust is a must\nMust have: rust, Rust");
        assert_eq!(
            set.must_have.iter().filter(|p| p.as_str() == "rust").count(),
            1
        );
    }

    #[test]
    fn test_sparse_jd_triggers_fallback_into_responsibilities() {
        let set = extract_requirements(
            "Must have: Python, machine learning. Responsibilities: build recommendation systems.",
        );
        assert_eq!(set.must_have, vec!["python", "machine learning"]);
        assert!(set
            .responsibilities
            .contains(&"build recommendation systems".to_string()));
        assert_eq!(
            set.canonical_phrases,
            vec!["python", "machine learning", "build recommendation systems"]
        );
    }

    #[test]
    fn test_fallback_skips_long_fragments_and_caps_output() {
        let long = "this fragment clearly has far more than six words in it";
        let set = extract_requirements(long);
        assert!(set.responsibilities.is_empty());

        let many: String = (0..40).map(|i| format!("skill{i:02}, ")).collect();
        let set = extract_requirements(&many);
        assert_eq!(set.responsibilities.len(), FALLBACK_CAP);
    }

    #[test]
    fn test_fallback_not_used_when_buckets_are_full() {
        let set = extract_requirements(PLATFORM_JD);
        assert!(!set.responsibilities.iter().any(|p| p.contains("berlin")));
    }

    #[test]
    fn test_connective_split_ignores_case() {
        let set = extract_requirements("MUST HAVE: PYTHON AND MACHINE LEARNING");
        assert_eq!(set.must_have, vec!["python", "machine learning"]);

        let set = extract_requirements("Must have: Rust And Kafka, SQL");
        assert_eq!(set.must_have, vec!["rust", "kafka", "sql"]);
    }

    #[test]
    fn test_clause_without_cue_inherits_line_bucket() {
        let set = extract_requirements("We need a lead. Python, SQL.");
        assert!(set.must_have.contains(&"python".to_string()));
        assert!(set.must_have.contains(&"sql".to_string()));

        let set = extract_requirements("Senior Platform Engineer
About us. Berlin, remote.");
        assert!(set.must_have.is_empty());
    }

    #[test]
    fn test_dotted_tokens_survive_clause_splitting() {
        let set = extract_requirements("Must have: Node.js, Vue.js\nExperience with k8s is a plus");
        assert!(set.must_have.contains(&"node.js".to_string()));
        assert!(set.must_have.contains(&"vue.js".to_string()));
    }
}
