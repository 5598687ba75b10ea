use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Gram length used by the k-gram index.
    pub k_gram_length: usize,
    /// Candidates must score strictly above this Jaccard similarity.
    pub jaccard_threshold: f64,
    /// Maximum number of corrections offered for one term.
    pub max_suggestions: usize,
    /// Terms found in fewer documents than this are spell-checked.
    pub min_document_frequency: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { k_gram_length: 2, jaccard_threshold: 0.5, max_suggestions: 5, min_document_frequency: 1 }
    }
}

impl SearchConfig {
    /// Parse a JSON config; missing fields fall back to defaults.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
