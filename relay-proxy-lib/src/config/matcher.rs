use serde::Deserialize;

/// A matcher as written in configuration: a pattern plus case sensitivity.
///
/// Compiled into a [`crate::matcher::Matcher`] at load time; case-insensitive
/// matchers are compiled with an inline `(?i)` flag rather than carrying a
/// separate runtime branch.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum MatcherConfig {
    /// `pattern = "^/api"` — case-sensitive by default.
    Simple(String),
    /// `{ pattern = "^/API", case_insensitive = true }`
    Detailed {
        pattern: String,
        #[serde(default)]
        case_insensitive: bool,
    },
}

impl MatcherConfig {
    pub fn pattern(&self) -> &str {
        match self {
            MatcherConfig::Simple(p) => p,
            MatcherConfig::Detailed { pattern, .. } => pattern,
        }
    }

    pub fn case_insensitive(&self) -> bool {
        match self {
            MatcherConfig::Simple(_) => false,
            MatcherConfig::Detailed { case_insensitive, .. } => *case_insensitive,
        }
    }
}
