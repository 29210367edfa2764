//! Injected text-classification capability.
//!
//! The resolver never depends on this; the application layer receives
//! classifiers at construction and attaches their labels as sibling columns
//! of the resolved rows. An absent classifier degrades to empty labels.

use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Opaque `classify(texts) -> labels` collaborator. Implementations must
/// return exactly one label per input, same order.
pub trait Classifier: Send + Sync {
    fn classify(&self, texts: &[String]) -> Result<Vec<String>, ClassifyError>;
}

/// Classification errors.
#[derive(Debug)]
pub enum ClassifyError {
    Network(String),
    InvalidResponse(String),
}

impl fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Classifier network error: {}", msg),
            Self::InvalidResponse(msg) => write!(f, "Invalid classifier response: {}", msg),
        }
    }
}

impl std::error::Error for ClassifyError {}

/// Enforce the one-label-per-input contract.
fn check_labels(expected: usize, labels: Vec<String>) -> Result<Vec<String>, ClassifyError> {
    if labels.len() != expected {
        return Err(ClassifyError::InvalidResponse(format!(
            "expected {} labels, got {}",
            expected,
            labels.len()
        )));
    }
    Ok(labels)
}

// ─── HTTP inference endpoint ────────────────────────────────────

#[derive(Deserialize)]
struct LabelsBody {
    labels: Vec<String>,
}

/// A model served behind an HTTP endpoint: POST `{"texts": [...]}`,
/// read `{"labels": [...]}`.
pub struct InferenceEndpoint {
    url: String,
    agent: ureq::Agent,
}

impl InferenceEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();
        Self { url: url.into(), agent }
    }
}

impl Classifier for InferenceEndpoint {
    fn classify(&self, texts: &[String]) -> Result<Vec<String>, ClassifyError> {
        let body = self
            .agent
            .post(&self.url)
            .send_json(serde_json::json!({ "texts": texts }))
            .map_err(|e| ClassifyError::Network(e.to_string()))?;
        let parsed: LabelsBody = body
            .into_json()
            .map_err(|e| ClassifyError::InvalidResponse(e.to_string()))?;
        check_labels(texts.len(), parsed.labels)
    }
}
