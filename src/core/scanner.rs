//! Injection pattern scanning for the Security stage.
//!
//! The scanner is an ordered list of regex matchers. Patterns are evaluated
//! in order and the first pattern that fires reports its first match.

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Built-in patterns as (name, regex) pairs, in evaluation order
const DEFAULT_PATTERNS: &[(&str, &str)] = &[
    (
        "hostile-intent",
        r"(?i)(?:\b|\W)(?:malicious|exploit|inject|bypass|hack|attack)(?:\b|\W)",
    ),
    ("script-tag", r"(?i)<script[^>]*>([\s\S]*?)</script>"),
    (
        "browser-api",
        r"(?i)\b(?:document\.|window\.|eval\(|alert\(|fetch\(|XMLHttpRequest)",
    ),
    (
        "credential-assignment",
        r#"(?i)\b(?:password|secret|key|token)\s*[=:]\s*['"][^'"]+['"]"#,
    ),
    ("env-expansion", r"\$\{?[A-Z_]+\}?"),
];

/// A compiled matcher
#[derive(Debug, Clone)]
pub struct InjectionPattern {
    /// Stable name reported in log metadata
    pub name: String,

    regex: Regex,
}

impl InjectionPattern {
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, ScannerError> {
        let name = name.into();
        let regex = Regex::new(pattern).map_err(|e| ScannerError::InvalidPattern {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self { name, regex })
    }
}

/// First match found in scanned text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanMatch {
    /// Name of the pattern that fired
    pub pattern: String,

    /// Matched segment
    pub segment: String,

    /// Byte offsets of the segment
    pub start: usize,
    pub end: usize,
}

/// Stateless ordered predicate set
#[derive(Debug, Clone)]
pub struct PatternScanner {
    patterns: Vec<InjectionPattern>,
}

impl Default for PatternScanner {
    fn default() -> Self {
        let patterns = DEFAULT_PATTERNS
            .iter()
            .map(|(name, pattern)| InjectionPattern {
                name: name.to_string(),
                regex: Regex::new(pattern).expect("built-in injection pattern must compile"),
            })
            .collect();
        Self { patterns }
    }
}

impl PatternScanner {
    /// Scanner with the built-in injection patterns
    pub fn new() -> Self {
        Self::default()
    }

    /// Scanner with custom patterns
    pub fn with_patterns(patterns: Vec<InjectionPattern>) -> Self {
        Self { patterns }
    }

    /// Compile (name, regex) pairs into a scanner
    pub fn from_pairs<I, N, P>(pairs: I) -> Result<Self, ScannerError>
    where
        I: IntoIterator<Item = (N, P)>,
        N: Into<String>,
        P: AsRef<str>,
    {
        let patterns = pairs
            .into_iter()
            .map(|(name, pattern)| InjectionPattern::new(name, pattern.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn patterns(&self) -> &[InjectionPattern] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Evaluate patterns in order and return the first match
    pub fn scan(&self, text: &str) -> Option<ScanMatch> {
        self.patterns.iter().find_map(|pattern| {
            pattern.regex.find(text).map(|m| ScanMatch {
                pattern: pattern.name.clone(),
                segment: m.as_str().to_string(),
                start: m.start(),
                end: m.end(),
            })
        })
    }
}

/// Scanner construction errors
#[derive(Debug, Clone, Error)]
pub enum ScannerError {
    #[error("Invalid injection pattern '{name}': {reason}")]
    InvalidPattern { name: String, reason: String },
}
