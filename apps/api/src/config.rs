use anyhow::{bail, Context, Result};

/// Application configuration loaded from environment variables.
/// Upstream credentials are optional: without all three the service runs in mock mode.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Coverage percentage below which the fast path escalates to the other critics.
    pub fast_path_threshold: u32,
    pub critic_timeout_ms: u64,
    pub editor_timeout_ms: u64,
    /// Registry name of the critic used for the fast path.
    pub fast_critic: String,
    pub google_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            rust_log: "info".to_string(),
            fast_path_threshold: 88,
            critic_timeout_ms: 3500,
            editor_timeout_ms: 20_000,
            fast_critic: "gemini".to_string(),
            google_api_key: None,
            openai_api_key: None,
            anthropic_api_key: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();

        let fast_path_threshold = parse_env("FAST_PATH_THRESHOLD", defaults.fast_path_threshold)?;
        if fast_path_threshold > 100 {
            bail!("FAST_PATH_THRESHOLD must be a percentage in 0..=100, got {fast_path_threshold}");
        }

        Ok(Config {
            port: parse_env("PORT", defaults.port)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or(defaults.rust_log),
            fast_path_threshold,
            critic_timeout_ms: parse_env("CRITIC_TIMEOUT_MS", defaults.critic_timeout_ms)?,
            editor_timeout_ms: parse_env("EDITOR_TIMEOUT_MS", defaults.editor_timeout_ms)?,
            fast_critic: std::env::var("FAST_CRITIC").unwrap_or(defaults.fast_critic),
            google_api_key: optional_env("GOOGLE_API_KEY"),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
        })
    }

    /// Live mode needs every upstream credential; a partial set still means mock mode.
    pub fn has_all_credentials(&self) -> bool {
        self.google_api_key.is_some()
            && self.openai_api_key.is_some()
            && self.anthropic_api_key.is_some()
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_knobs() {
        let config = Config::default();
        assert_eq!(config.fast_path_threshold, 88);
        assert_eq!(config.critic_timeout_ms, 3500);
        assert_eq!(config.fast_critic, "gemini");
        assert!(!config.has_all_credentials());
    }

    #[test]
    fn test_partial_credentials_are_not_live() {
        let config = Config {
            google_api_key: Some("g".to_string()),
            openai_api_key: Some("o".to_string()),
            ..Config::default()
        };
        assert!(!config.has_all_credentials());

        let config = Config {
            anthropic_api_key: Some("a".to_string()),
            ..config
        };
        assert!(config.has_all_credentials());
    }

    #[test]
    fn test_parse_env_falls_back_to_default_when_unset() {
        let value: u64 = parse_env("FITCHECK_TEST_SURELY_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }
}
