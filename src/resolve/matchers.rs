//! Matching stages: pattern span extraction, exact containment, fuzzy scoring.
//!
//! All three operate on text already passed through
//! [`normalize`](super::normalize::normalize); the resolver guarantees that.

use crate::gazetteer::{Gazetteer, GazetteerEntry};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

// ─── Pattern matcher ────────────────────────────────────────────

/// Turkish place references are almost always suffixed ("Yeşil Mahallesi",
/// "Akbayır Köyü"); anchoring on the suffix keeps false positives down
/// compared to scanning every noun phrase. Periods are already folded to
/// spaces by normalization, so "mah." arrives here as a bare "mah" token.
fn suffix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"\b([a-zçğıöşü0-9'-]{2,}(?: [a-zçğıöşü0-9'-]{2,})*) (?:mahallesi|mahalle|mah|mh|köyü|mezrası)\b",
        )
        .expect("suffix pattern is valid")
    })
}

/// Extract the first suffix-anchored candidate span from normalized text.
/// The span is not yet validated against the gazetteer.
pub fn match_pattern(normalized: &str) -> Option<&str> {
    suffix_pattern()
        .captures(normalized)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

// ─── Exact matcher ──────────────────────────────────────────────

/// Whole-word containment. Apostrophes count as word boundaries: the Turkish
/// possessive suffix binds to names through one ("Mahallesi'nde"), and the
/// normalizer keeps the apostrophe itself.
fn word_bounded(haystack: &str, needle: &str) -> bool {
    let h = format!(" {} ", haystack.replace('\'', " "));
    let n = format!(" {} ", needle.replace('\'', " "));
    h.contains(&n)
}

fn norm_len(item: &crate::gazetteer::IndexedEntry) -> usize {
    item.norm.chars().count()
}

/// Find a gazetteer entry whose variant occurs as a whole word in the text.
/// When several entries match, the longest normalized entry name wins, so a
/// short name that is a substring of a longer one cannot shadow it.
pub fn match_exact<'a>(normalized_text: &str, gazetteer: &'a Gazetteer) -> Option<&'a GazetteerEntry> {
    let mut best: Option<&crate::gazetteer::IndexedEntry> = None;
    for item in gazetteer.items() {
        if item.variants.iter().any(|v| word_bounded(normalized_text, v)) {
            if best.map_or(true, |b| norm_len(item) > norm_len(b)) {
                best = Some(item);
            }
        }
    }
    best.map(|i| &i.entry)
}

/// Match a pattern-extracted span against the gazetteer: the span may
/// contain the entry (greedy captures drag in leading words) or be contained
/// in it (span "merkez" vs entry "Merkez Mahallesi"). Longest entry wins.
pub fn match_span<'a>(span: &str, gazetteer: &'a Gazetteer) -> Option<&'a GazetteerEntry> {
    let mut best: Option<&crate::gazetteer::IndexedEntry> = None;
    for item in gazetteer.items() {
        let hit = item
            .variants
            .iter()
            .any(|v| word_bounded(span, v) || word_bounded(v, span));
        if hit && best.map_or(true, |b| norm_len(item) > norm_len(b)) {
            best = Some(item);
        }
    }
    best.map(|i| &i.entry)
}

// ─── Fuzzy matcher ──────────────────────────────────────────────

/// Longest common subsequence length, rolling-row DP.
fn lcs_len(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (m, n) = (a.len(), b.len());

    let mut prev = vec![0usize; n + 1];
    let mut curr = vec![0usize; n + 1];

    for i in 1..=m {
        for j in 1..=n {
            curr[j] = if a[i - 1] == b[j - 1] {
                prev[j - 1] + 1
            } else {
                prev[j].max(curr[j - 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[n]
}

/// Indel similarity 0-100: insertions/deletions only, no substitution.
/// `100 * (1 - indel_distance / (|a| + |b|))`, rounded.
pub fn similarity(a: &str, b: &str) -> u8 {
    let total = a.chars().count() + b.chars().count();
    if total == 0 {
        return 100;
    }
    let lcs = lcs_len(a, b);
    ((200.0 * lcs as f64) / total as f64).round() as u8
}

/// Order-insensitive token-set ratio 0-100.
///
/// Both sides split into intersection and difference token sets; the score
/// is the best indel similarity among the three canonical comparisons
/// (intersection vs each full side, full side vs full side). A side with no
/// tokens scores 0 against everything.
pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    let ta: BTreeSet<&str> = a.split_whitespace().collect();
    let tb: BTreeSet<&str> = b.split_whitespace().collect();
    if ta.is_empty() || tb.is_empty() {
        return 0;
    }

    let inter: Vec<&str> = ta.intersection(&tb).copied().collect();
    let diff_ab: Vec<&str> = ta.difference(&tb).copied().collect();
    let diff_ba: Vec<&str> = tb.difference(&ta).copied().collect();

    let s_inter = inter.join(" ");
    let s1 = join_parts(&s_inter, &diff_ab);
    let s2 = join_parts(&s_inter, &diff_ba);

    similarity(&s_inter, &s1)
        .max(similarity(&s_inter, &s2))
        .max(similarity(&s1, &s2))
}

fn join_parts(head: &str, tail: &[&str]) -> String {
    if head.is_empty() {
        tail.join(" ")
    } else if tail.is_empty() {
        head.to_string()
    } else {
        format!("{} {}", head, tail.join(" "))
    }
}

/// Score the input against every gazetteer entry; return the single best.
/// Ties break to the longer entry name, then the earlier entry, so the
/// outcome never depends on iteration luck.
pub fn best_fuzzy<'a>(input: &str, gazetteer: &'a Gazetteer) -> Option<(&'a GazetteerEntry, u8)> {
    let mut best: Option<(&crate::gazetteer::IndexedEntry, u8)> = None;
    for item in gazetteer.items() {
        let score = token_set_ratio(input, &item.norm);
        let better = match best {
            None => true,
            Some((b, s)) => score > s || (score == s && norm_len(item) > norm_len(b)),
        };
        if better {
            best = Some((item, score));
        }
    }
    best.map(|(i, s)| (&i.entry, s))
}
