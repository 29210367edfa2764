//! The closed set of known place names.
//!
//! Loaded once at startup and read-only afterwards. Reloading is a
//! full-replace: build a new `Gazetteer`, swap the shared reference.

use crate::resolve::normalize::{normalize, title_tr, variants};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

/// Neighborhoods of Olur (Erzurum). The default dataset when no gazetteer
/// file is supplied.
const OLUR_NEIGHBORHOODS: &[&str] = &[
    "Akbayır", "Aktepe", "Altunkaya", "Aşağıçayırlı", "Cumhuriyet",
    "Aşağıkaracasu", "Atlı", "Beğendik", "Beşkaya", "Boğazgören", "Bozdoğan",
    "Hastane", "Çataksu", "Coşkunlar", "Eğlek", "Ekinlik", "Filizli",
    "Güngöründü", "Ilıkaynak", "Kaban", "Kaledibi", "Karaköçlar", "Keçili",
    "Kekikli", "Köprübaşı", "Merkez", "Oğuzkent", "Olgun", "Olurdere",
    "Ormanağzı", "Saribaşak", "Soğukgöze", "Süngübayır", "Şalpazarı",
    "Taşgeçit", "Taşlıköy", "Ürünlü", "Uzunharman", "Yaylabaşı",
    "Yeşilbağlar", "Yıldızkaya", "Yolgözler", "Yukarıçayırlı",
    "Yukarıkızılkale",
];

/// One known place: canonical display name plus optional coordinates.
/// Coordinates are pass-through for downstream mapping; resolution never
/// reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GazetteerEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
}

impl GazetteerEntry {
    pub fn coords(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// An entry with its matching forms precomputed at load time.
pub(crate) struct IndexedEntry {
    pub entry: GazetteerEntry,
    /// Normalized name — the lookup key and tie-break length.
    pub norm: String,
    /// Suffix variants of the normalized name.
    pub variants: BTreeSet<String>,
}

/// The closed, ordered place-name set.
pub struct Gazetteer {
    items: Vec<IndexedEntry>,
}

impl Gazetteer {
    /// Build from entries. Names are canonicalized to Turkish title case;
    /// entries that collide under normalization are dropped (first wins).
    pub fn from_entries(entries: impl IntoIterator<Item = GazetteerEntry>) -> Self {
        let mut seen = HashSet::new();
        let mut items = Vec::new();
        for raw in entries {
            let norm = normalize(&raw.name);
            if norm.is_empty() || !seen.insert(norm.clone()) {
                continue;
            }
            let entry = GazetteerEntry {
                name: title_tr(&norm),
                lat: raw.lat,
                lon: raw.lon,
            };
            let variants = variants(&norm);
            items.push(IndexedEntry { entry, norm, variants });
        }
        Self { items }
    }

    /// Build from bare names, no coordinates.
    pub fn from_names<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> Self {
        Self::from_entries(names.into_iter().map(|n| GazetteerEntry {
            name: n.as_ref().to_string(),
            lat: None,
            lon: None,
        }))
    }

    /// The built-in Olur neighborhood list.
    pub fn builtin_olur() -> Self {
        Self::from_names(OLUR_NEIGHBORHOODS.iter().copied())
    }

    /// Load from a JSON file: `[{"name": "...", "lat": ..., "lon": ...}, ...]`
    /// (lat/lon optional per entry).
    pub fn from_json_file(path: &Path) -> Result<Self, GazetteerError> {
        let data = fs::read_to_string(path)
            .map_err(|e| GazetteerError::Io(path.display().to_string(), e.to_string()))?;
        let entries: Vec<GazetteerEntry> = serde_json::from_str(&data)
            .map_err(|e| GazetteerError::Parse(path.display().to_string(), e.to_string()))?;
        Ok(Self::from_entries(entries))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Canonical names in load order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|i| i.entry.name.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = &GazetteerEntry> {
        self.items.iter().map(|i| &i.entry)
    }

    /// Coordinates for a canonical name, if the entry carries any.
    pub fn coords(&self, name: &str) -> Option<(f64, f64)> {
        let norm = normalize(name);
        self.items
            .iter()
            .find(|i| i.norm == norm)
            .and_then(|i| i.entry.coords())
    }

    pub(crate) fn items(&self) -> &[IndexedEntry] {
        &self.items
    }
}

/// Gazetteer load errors.
#[derive(Debug)]
pub enum GazetteerError {
    Io(String, String),
    Parse(String, String),
}

impl fmt::Display for GazetteerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(path, msg) => write!(f, "Cannot read gazetteer '{}': {}", path, msg),
            Self::Parse(path, msg) => write!(f, "Invalid gazetteer '{}': {}", path, msg),
        }
    }
}

impl std::error::Error for GazetteerError {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_olur() {
        let g = Gazetteer::builtin_olur();
        assert_eq!(g.len(), 44);
        assert!(g.names().any(|n| n == "Akbayır"));
        assert!(g.names().any(|n| n == "Yukarıkızılkale"));
    }

    #[test]
    fn test_title_canonicalization() {
        let g = Gazetteer::from_names(["aşağıçayırlı", "ILIKAYNAK"]);
        let names: Vec<&str> = g.names().collect();
        assert_eq!(names, vec!["Aşağıçayırlı", "Ilıkaynak"]);
    }

    #[test]
    fn test_dedup_under_normalization() {
        let g = Gazetteer::from_names(["Merkez", "merkez", "MERKEZ!"]);
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn test_skips_blank_names() {
        let g = Gazetteer::from_names(["", "  ", "Atlı"]);
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn test_coords_lookup() {
        let g = Gazetteer::from_entries([
            GazetteerEntry { name: "Merkez".into(), lat: Some(40.82), lon: Some(42.13) },
            GazetteerEntry { name: "Atlı".into(), lat: None, lon: None },
        ]);
        assert_eq!(g.coords("merkez"), Some((40.82, 42.13)));
        assert_eq!(g.coords("Atlı"), None);
        assert_eq!(g.coords("yok"), None);
    }

    #[test]
    fn test_from_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mahalleler.json");
        std::fs::write(
            &path,
            r#"[{"name":"Yeni Mahalle","lat":37.0001,"lon":35.3213},{"name":"eski mahalle"}]"#,
        )
        .unwrap();

        let g = Gazetteer::from_json_file(&path).unwrap();
        assert_eq!(g.len(), 2);
        assert!(g.names().any(|n| n == "Yeni Mahalle"));
        assert_eq!(g.coords("yeni mahalle"), Some((37.0001, 35.3213)));
    }

    #[test]
    fn test_from_json_file_missing() {
        let err = Gazetteer::from_json_file(Path::new("/nonexistent/mahalleler.json"));
        assert!(matches!(err, Err(GazetteerError::Io(_, _))));
    }

    #[test]
    fn test_from_json_file_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            Gazetteer::from_json_file(&path),
            Err(GazetteerError::Parse(_, _))
        ));
    }
}
