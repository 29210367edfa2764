//! Text normalization for Turkish place-name matching.
//!
//! Every matcher compares through [`normalize`], so the folding rules here
//! define what "equal" means for the whole pipeline.

use std::collections::BTreeSet;

/// Lowercase a single char with Turkish casing rules.
///
/// `char::to_lowercase` maps `İ` to `i` + combining dot and `I` to `i`,
/// losing the dotted/dotless distinction. Both are folded explicitly.
fn lower_tr(c: char) -> char {
    match c {
        'I' => 'ı',
        'İ' => 'i',
        _ => c.to_lowercase().next().unwrap_or(c),
    }
}

/// Uppercase a single char with Turkish casing rules.
fn upper_tr(c: char) -> char {
    match c {
        'i' => 'İ',
        'ı' => 'I',
        _ => c.to_uppercase().next().unwrap_or(c),
    }
}

/// Normalize free text for matching: Turkish lowercase, then every char that
/// is not a letter, digit, hyphen, or apostrophe becomes a space, then
/// whitespace runs collapse to a single space and the ends are trimmed.
///
/// Total over any input; the empty string normalizes to itself.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        let c = lower_tr(c);
        if c.is_alphabetic() || c.is_ascii_digit() || c == '-' || c == '\'' {
            out.push(c);
        } else {
            out.push(' ');
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Title-case a normalized name for display: first letter of each word
/// uppercased with Turkish rules ("yukarıçayırlı" -> "Yukarıçayırlı").
pub fn title_tr(name: &str) -> String {
    name.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => upper_tr(first).to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Suffix variants of a canonical neighborhood name.
///
/// "yeşil mahallesi" and its stripped root "yeşil" both expand to the bare
/// root plus the long and abbreviated neighborhood-suffix forms, so exact and
/// pattern matching recognize "X mahallesi", "X mah.", "X mh" as the same
/// entry without per-entry enumeration. Empty input yields an empty set.
pub fn variants(name: &str) -> BTreeSet<String> {
    let base = normalize(name);
    let mut out = BTreeSet::new();
    if base.is_empty() {
        return out;
    }

    let mut roots = vec![base.clone()];
    if let Some(root) = base.strip_suffix(" mahallesi") {
        roots.push(root.to_string());
    } else if let Some(root) = base.strip_suffix(" mahalle") {
        roots.push(root.to_string());
    }

    for root in roots {
        let root = root.trim();
        if root.is_empty() {
            continue;
        }
        out.insert(root.to_string());
        out.insert(format!("{} mahallesi", root));
        out.insert(format!("{} mahalle", root));
        out.insert(format!("{} mah", root));
        out.insert(format!("{} mah.", root));
        out.insert(format!("{} mh", root));
        out.insert(format!("{} mh.", root));
    }
    out
}
