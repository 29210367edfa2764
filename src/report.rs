//! Analyzed rows, dashboard filters, and summary tables.

use crate::classify::Classifier;
use crate::feed::records::CommentRecord;
use crate::resolve::{MatchStage, NeighborhoodResolver};
use chrono::NaiveDate;
use serde::Serialize;

/// A comment record with its resolution and classification columns.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzedComment {
    #[serde(flatten)]
    pub record: CommentRecord,
    /// Canonical gazetteer name, or empty when nothing matched.
    pub neighborhood: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<MatchStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    pub complaint: String,
    pub category: String,
}

fn run_classifier(clf: Option<&dyn Classifier>, texts: &[String]) -> Vec<String> {
    let empty = || vec![String::new(); texts.len()];
    match clf {
        None => empty(),
        Some(clf) => match clf.classify(texts) {
            Ok(labels) if labels.len() == texts.len() => labels,
            Ok(labels) => {
                eprintln!(
                    "[classify] label count mismatch ({} for {} texts), dropping labels",
                    labels.len(),
                    texts.len()
                );
                empty()
            }
            Err(e) => {
                eprintln!("[classify] {}", e);
                empty()
            }
        },
    }
}

/// One analysis cycle over a freshly flattened batch: resolve every message
/// in parallel, then attach classifier labels. Classifier failures degrade
/// to empty labels; resolution never fails.
pub fn analyze(
    records: Vec<CommentRecord>,
    resolver: &NeighborhoodResolver,
    complaint: Option<&dyn Classifier>,
    category: Option<&dyn Classifier>,
) -> Vec<AnalyzedComment> {
    let messages: Vec<String> = records.iter().map(|r| r.message.clone()).collect();
    let resolutions = resolver.resolve_batch(&messages);
    let complaints = run_classifier(complaint, &messages);
    let categories = run_classifier(category, &messages);

    records
        .into_iter()
        .zip(resolutions)
        .zip(complaints.into_iter().zip(categories))
        .map(|((record, resolution), (complaint, category))| {
            let (neighborhood, stage, score) = match resolution {
                Some(r) => (r.name, Some(r.stage), Some(r.score)),
                None => (String::new(), None, None),
            };
            AnalyzedComment {
                record,
                neighborhood,
                stage,
                score,
                complaint,
                category,
            }
        })
        .collect()
}

// ─── Filters ────────────────────────────────────────────────────

/// Dashboard row filters. All criteria are conjunctive; `None` means
/// "don't filter on this".
#[derive(Debug, Clone, Default)]
pub struct RowFilter {
    /// Case-insensitive substring of the comment message.
    pub query: Option<String>,
    /// Canonical neighborhood name.
    pub neighborhood: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl RowFilter {
    fn accepts(&self, row: &AnalyzedComment) -> bool {
        if let Some(ref q) = self.query {
            let q = crate::resolve::normalize(q);
            if !q.is_empty() && !crate::resolve::normalize(&row.record.message).contains(&q) {
                return false;
            }
        }
        if let Some(ref n) = self.neighborhood {
            if crate::resolve::normalize(&row.neighborhood) != crate::resolve::normalize(n) {
                return false;
            }
        }
        if self.from.is_some() || self.to.is_some() {
            // Date-filtered views drop rows without a timestamp.
            let date = match row.record.created_time {
                Some(t) => t.date_naive(),
                None => return false,
            };
            if let Some(from) = self.from {
                if date < from {
                    return false;
                }
            }
            if let Some(to) = self.to {
                if date > to {
                    return false;
                }
            }
        }
        true
    }
}

pub fn filter_rows<'a>(rows: &'a [AnalyzedComment], filter: &RowFilter) -> Vec<&'a AnalyzedComment> {
    rows.iter().filter(|r| filter.accepts(r)).collect()
}

// ─── Summaries ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SummaryRow {
    pub name: String,
    pub count: usize,
}

fn summarize<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<SummaryRow> {
    let mut counts: Vec<SummaryRow> = Vec::new();
    for key in keys {
        if key.is_empty() {
            continue;
        }
        match counts.iter_mut().find(|c| c.name == key) {
            Some(row) => row.count += 1,
            None => counts.push(SummaryRow { name: key.to_string(), count: 1 }),
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    counts
}

/// Complaint counts per neighborhood, highest first. Rows that resolved to
/// no neighborhood are left out.
pub fn summarize_by_neighborhood(rows: &[&AnalyzedComment]) -> Vec<SummaryRow> {
    summarize(rows.iter().map(|r| r.neighborhood.as_str()))
}

/// Complaint counts per category, highest first. Unlabeled rows are left out.
pub fn summarize_by_category(rows: &[&AnalyzedComment]) -> Vec<SummaryRow> {
    summarize(rows.iter().map(|r| r.category.as_str()))
}
