//! Neighborhood resolver — orchestrates the matching stages.
//!
//! Precedence:  blocklist veto → pattern span (exact, then fuzzy) →
//! exact on full text → fuzzy on full text → no match.
//!
//! Each call is stateless and pure over an immutable gazetteer snapshot, so
//! resolution can run from any number of threads without coordination.

use super::matchers;
use super::normalize::normalize;
use super::types::{FuzzyStrategy, MatchStage, Resolution, ResolverConfig};
use crate::gazetteer::Gazetteer;
use rayon::prelude::*;
use std::sync::Arc;

/// The resolver with its staged fallback pipeline.
pub struct NeighborhoodResolver {
    gazetteer: Arc<Gazetteer>,
    config: ResolverConfig,
}

impl NeighborhoodResolver {
    pub fn new(gazetteer: Arc<Gazetteer>) -> Self {
        Self {
            gazetteer,
            config: ResolverConfig::default(),
        }
    }

    pub fn with_config(gazetteer: Arc<Gazetteer>, config: ResolverConfig) -> Self {
        Self { gazetteer, config }
    }

    pub fn gazetteer(&self) -> &Gazetteer {
        &self.gazetteer
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve free text to a canonical gazetteer name, or None.
    ///
    /// Never fails: empty text, arbitrary garbage, and an empty gazetteer
    /// all resolve to None.
    pub fn resolve(&self, text: &str) -> Option<Resolution> {
        if self.gazetteer.is_empty() {
            return None;
        }
        let norm = normalize(text);
        if norm.is_empty() {
            return None;
        }

        // 1. Hard veto: a blocklisted token anywhere in the text means the
        //    suffix-like trigger is not a place reference.
        if norm
            .split(' ')
            .any(|tok| self.config.blocklist.iter().any(|b| b == tok))
        {
            return None;
        }

        // 2. Suffix-anchored span: exact first, then fuzzy at the span gate.
        if let Some(span) = matchers::match_pattern(&norm) {
            if let Some(entry) = matchers::match_span(span, &self.gazetteer) {
                return Some(Resolution {
                    name: entry.name.clone(),
                    stage: MatchStage::PatternExact,
                    score: 100,
                });
            }
            if self.config.fuzzy == FuzzyStrategy::TokenSet {
                if let Some((entry, score)) = matchers::best_fuzzy(span, &self.gazetteer) {
                    if score >= self.config.span_threshold {
                        return Some(Resolution {
                            name: entry.name.clone(),
                            stage: MatchStage::PatternFuzzy,
                            score,
                        });
                    }
                }
            }
        }

        // 3. Whole-word hit anywhere in the text, longest entry wins.
        if let Some(entry) = matchers::match_exact(&norm, &self.gazetteer) {
            return Some(Resolution {
                name: entry.name.clone(),
                stage: MatchStage::Exact,
                score: 100,
            });
        }

        // 4. Last resort: fuzzy over the whole text at the strictest gate.
        if self.config.fuzzy == FuzzyStrategy::TokenSet {
            if let Some((entry, score)) = matchers::best_fuzzy(&norm, &self.gazetteer) {
                if score >= self.config.text_threshold {
                    return Some(Resolution {
                        name: entry.name.clone(),
                        stage: MatchStage::Fuzzy,
                        score,
                    });
                }
            }
        }

        None
    }

    /// Resolve a batch in parallel. Results are keyed by input index and
    /// identical to resolving sequentially.
    pub fn resolve_batch<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Vec<Option<Resolution>> {
        texts
            .par_iter()
            .map(|t| self.resolve(t.as_ref()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::types::DEFAULT_BLOCKLIST;

    fn olur_resolver() -> NeighborhoodResolver {
        NeighborhoodResolver::new(Arc::new(Gazetteer::builtin_olur()))
    }

    #[test]
    fn test_suffix_anchored_precedence() {
        let r = olur_resolver();
        let res = r.resolve("Akbayır mah. yollar çok kötü").unwrap();
        assert_eq!(res.name, "Akbayır");
        assert_eq!(res.stage, MatchStage::PatternExact);
        assert_eq!(res.score, 100);
    }

    #[test]
    fn test_longest_match_tie_break() {
        let g = Arc::new(Gazetteer::from_names(["Merkez", "Merkez Mahallesi"]));
        let r = NeighborhoodResolver::new(g);
        let res = r.resolve("Merkez Mahallesi'nde çöp sorunu var").unwrap();
        assert_eq!(res.name, "Merkez Mahallesi");
    }

    #[test]
    fn test_exact_without_suffix() {
        let r = olur_resolver();
        let res = r.resolve("dün taşlıköy tarafında elektrikler kesildi").unwrap();
        assert_eq!(res.name, "Taşlıköy");
        assert_eq!(res.stage, MatchStage::Exact);
    }

    #[test]
    fn test_fuzzy_span_misspelling() {
        let r = olur_resolver();
        // "akbayr" is one letter short; span-gated fuzzy picks it up.
        let res = r.resolve("akbayr mah. su akmıyor").unwrap();
        assert_eq!(res.name, "Akbayır");
        assert_eq!(res.stage, MatchStage::PatternFuzzy);
        assert_eq!(res.score, 92);
    }

    #[test]
    fn test_fuzzy_full_text() {
        let r = olur_resolver();
        let res = r.resolve("soğukgöz").unwrap();
        assert_eq!(res.name, "Soğukgöze");
        assert_eq!(res.stage, MatchStage::Fuzzy);
        assert_eq!(res.score, 94);
    }

    #[test]
    fn test_threshold_boundary_inclusive() {
        // token_set_ratio("akbayr", "akbayır") == 92: accepted at exactly 92,
        // rejected one point above.
        let g = Arc::new(Gazetteer::from_names(["Akbayır"]));
        let cfg = ResolverConfig {
            span_threshold: 92,
            ..ResolverConfig::default()
        };
        let r = NeighborhoodResolver::with_config(g.clone(), cfg);
        assert!(r.resolve("akbayr mah. su akmıyor").is_some());

        let cfg = ResolverConfig {
            span_threshold: 93,
            ..ResolverConfig::default()
        };
        let r = NeighborhoodResolver::with_config(g, cfg);
        assert!(r.resolve("akbayr mah. su akmıyor").is_none());
    }

    #[test]
    fn test_blocklist_veto() {
        let r = olur_resolver();
        // "mahsul" would otherwise pattern-trigger via "mah"; the veto wins
        // even though a real entry appears in the same text.
        assert!(r.resolve("mahsul toplandı akbayır tarafında").is_none());
        for bad in DEFAULT_BLOCKLIST {
            assert!(r.resolve(&format!("bu {} bir deneme", bad)).is_none());
        }
    }

    #[test]
    fn test_no_match_defaults() {
        let r = olur_resolver();
        assert!(r.resolve("").is_none());
        assert!(r.resolve("   \t\n").is_none());
        assert!(r.resolve("!!! ???").is_none());
        assert!(r.resolve("yollar çok kötü belediye ilgilensin").is_none());

        let empty = NeighborhoodResolver::new(Arc::new(Gazetteer::from_names(Vec::<String>::new())));
        assert!(empty.resolve("Akbayır mah. yol bozuk").is_none());
    }

    #[test]
    fn test_closed_vocabulary() {
        let r = olur_resolver();
        let inputs = [
            "Akbayır mah. yollar çok kötü",
            "merkez mahallesi su kesintisi",
            "soğukgöz",
            "taşlıköy elektrik yok",
            "hiç alakasız bir cümle",
        ];
        for text in inputs {
            if let Some(res) = r.resolve(text) {
                assert!(
                    r.gazetteer().names().any(|n| n == res.name),
                    "'{}' resolved outside the gazetteer",
                    res.name
                );
            }
        }
    }

    #[test]
    fn test_idempotent() {
        let r = olur_resolver();
        let text = "Merkez mahallesi'nde çöp konteyneri taşıyor";
        let a = r.resolve(text);
        let b = r.resolve(text);
        assert_eq!(
            a.as_ref().map(|x| (&x.name, x.stage, x.score)),
            b.as_ref().map(|x| (&x.name, x.stage, x.score)),
        );
    }

    #[test]
    fn test_fuzzy_disabled_degrades() {
        let g = Arc::new(Gazetteer::builtin_olur());
        let cfg = ResolverConfig {
            fuzzy: FuzzyStrategy::Disabled,
            ..ResolverConfig::default()
        };
        let r = NeighborhoodResolver::with_config(g, cfg);
        // Exact stages still work.
        assert_eq!(
            r.resolve("Akbayır mah. yol bozuk").unwrap().stage,
            MatchStage::PatternExact
        );
        // Misspellings no longer resolve.
        assert!(r.resolve("akbayr mah. su akmıyor").is_none());
        assert!(r.resolve("soğukgöz").is_none());
    }

    #[test]
    fn test_batch_matches_sequential() {
        let r = olur_resolver();
        let texts: Vec<String> = (0..500)
            .map(|i| match i % 5 {
                0 => format!("Akbayır mah. sorun {}", i),
                1 => format!("merkez mahallesi {}", i),
                2 => format!("alakasız yorum {}", i),
                3 => "soğukgöz".to_string(),
                _ => String::new(),
            })
            .collect();

        let parallel = r.resolve_batch(&texts);
        let sequential: Vec<Option<Resolution>> =
            texts.iter().map(|t| r.resolve(t)).collect();

        assert_eq!(parallel.len(), sequential.len());
        for (p, s) in parallel.iter().zip(sequential.iter()) {
            assert_eq!(
                p.as_ref().map(|x| (&x.name, x.stage, x.score)),
                s.as_ref().map(|x| (&x.name, x.stage, x.score)),
            );
        }
    }
}
