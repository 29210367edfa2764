//! Core types for the resolution subsystem.

use serde::Serialize;
use std::fmt;

/// Which stage of the pipeline produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchStage {
    /// Suffix-anchored span, exact gazetteer hit.
    PatternExact,
    /// Suffix-anchored span, fuzzy hit above the span threshold.
    PatternFuzzy,
    /// Whole-word gazetteer hit in the full text.
    Exact,
    /// Fuzzy hit against the full text above the free-text threshold.
    Fuzzy,
}

impl fmt::Display for MatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PatternExact => write!(f, "pattern+exact"),
            Self::PatternFuzzy => write!(f, "pattern+fuzzy"),
            Self::Exact => write!(f, "exact"),
            Self::Fuzzy => write!(f, "fuzzy"),
        }
    }
}

/// A successful resolution: a canonical gazetteer name plus provenance.
///
/// The name is always an exact member of the gazetteer the resolver was built
/// with; "no match" is represented by the absence of a `Resolution`.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub name: String,
    pub stage: MatchStage,
    /// Similarity score 0-100. Exact stages always report 100.
    pub score: u8,
}

/// Similarity backend for the fuzzy stages, selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuzzyStrategy {
    /// Order-insensitive token-set ratio (default).
    TokenSet,
    /// Skip the fuzzy stages entirely. Degraded but correct: non-exact
    /// input resolves to no match.
    Disabled,
}

impl Default for FuzzyStrategy {
    fn default() -> Self {
        Self::TokenSet
    }
}

impl fmt::Display for FuzzyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TokenSet => write!(f, "token-set"),
            Self::Disabled => write!(f, "disabled"),
        }
    }
}

/// Words that merely contain the neighborhood-suffix marker and must never
/// trigger a match ("mahsul" is a harvest, not a mahalle).
pub const DEFAULT_BLOCKLIST: &[&str] = &[
    "mahcup", "mahkum", "mahalleli", "mahsul", "mahsus", "mahsuru",
];

/// Resolver tuning. Thresholds are inclusive (`score >= threshold` accepts).
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Fuzzy acceptance threshold for suffix-anchored candidate spans.
    /// High prior confidence, so slightly laxer than the free-text gate.
    pub span_threshold: u8,
    /// Fuzzy acceptance threshold for the full free-form text. This stage
    /// has no structural signal and runs last, so it gates hardest.
    pub text_threshold: u8,
    pub fuzzy: FuzzyStrategy,
    /// Normalized tokens that veto the whole text when present as a word.
    pub blocklist: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            span_threshold: 92,
            text_threshold: 94,
            fuzzy: FuzzyStrategy::default(),
            blocklist: DEFAULT_BLOCKLIST.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = ResolverConfig::default();
        assert_eq!(cfg.span_threshold, 92);
        assert_eq!(cfg.text_threshold, 94);
        assert_eq!(cfg.fuzzy, FuzzyStrategy::TokenSet);
        assert!(cfg.blocklist.iter().any(|b| b == "mahsul"));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(MatchStage::PatternExact.to_string(), "pattern+exact");
        assert_eq!(MatchStage::Fuzzy.to_string(), "fuzzy");
    }
}
