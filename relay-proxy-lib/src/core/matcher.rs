use regex::Regex;

use crate::config::MatcherConfig;
use crate::error::{ProxyError, Result};

/// A compiled matcher: a regex plus the case-sensitivity it was declared with.
///
/// Case-insensitive matchers fold the `(?i)` flag into the compiled pattern
/// rather than branching on a runtime flag at match time.
#[derive(Debug, Clone)]
pub struct Matcher {
    source: String,
    regex: Regex,
}

impl Matcher {
    pub fn compile(cfg: &MatcherConfig) -> Result<Self> {
        let pattern = cfg.pattern();
        let full_pattern =
            if cfg.case_insensitive() { format!("(?i){pattern}") } else { pattern.to_string() };
        let regex = Regex::new(&full_pattern)
            .map_err(|source| ProxyError::InvalidPattern { pattern: pattern.to_string(), source })?;
        Ok(Self { source: pattern.to_string(), regex })
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.regex.is_match(haystack)
    }

    /// First capture group of the first match, if any.
    pub fn capture<'h>(&self, haystack: &'h str) -> Option<&'h str> {
        self.regex.captures(haystack)?.get(1).map(|m| m.as_str())
    }

    /// Full capture set of the first match, if any (used for
    /// `RedirectMode::DynamicSubstitution`'s `$N` template expansion).
    pub fn captures<'h>(&self, haystack: &'h str) -> Option<regex::Captures<'h>> {
        self.regex.captures(haystack)
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Compile an ordered list of matcher configs, preserving declaration order.
pub fn compile_all(cfgs: &[MatcherConfig]) -> Result<Vec<Matcher>> {
    cfgs.iter().map(Matcher::compile).collect()
}
