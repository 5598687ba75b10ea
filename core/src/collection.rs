//! Line-oriented document collection reader.
//!
//! Expects the SMART-style layout used by CISI/CACM:
//!
//! ```text
//! .I 1
//! .T
//! Title line
//! .W
//! Abstract text ...
//! .X
//! references ...
//! ```
//!
//! Only the `.W` abstract is indexed; title and abstract are kept for display.

use crate::config::SearchConfig;
use crate::error::QueryError;
use crate::index::{DocId, PositionalIndex};
use crate::merge::and_merge;
use crate::processor::{BestCandidate, CorrectionSelector, QueryOutcome, QueryProcessor};
use crate::tokenizer::tokenize;
use anyhow::{bail, Context, Result};
use lazy_static::lazy_static;
use parking_lot::RwLock;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use walkdir::WalkDir;

lazy_static! {
    static ref FIELD_MARKER: Regex = Regex::new(r"^\.([A-Z])(?:\s+(.*))?$").expect("valid regex");
}

/// Collection shared between concurrent readers (queries) and an exclusive writer (ingest).
pub type SharedCollection = Arc<RwLock<Collection>>;

#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: DocId,
    pub title: String,
    pub text: String,
    /// Number of indexed tokens.
    pub length: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Skip,
    Title,
    Abstract,
}

pub struct Collection {
    documents: BTreeMap<DocId, Document>,
    index: PositionalIndex,
    /// Collection frequency of every term.
    dictionary: HashMap<String, u64>,
    config: SearchConfig,
}

impl Collection {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            documents: BTreeMap::new(),
            index: PositionalIndex::new(config.k_gram_length),
            dictionary: HashMap::new(),
            config,
        }
    }

    /// Read a collection file, or every file below a directory in path order.
    pub fn read<P: AsRef<Path>>(path: P, config: SearchConfig) -> Result<Self> {
        let path = path.as_ref();
        let mut files = Vec::new();
        if path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
                if entry.file_type().is_file() {
                    files.push(entry.into_path());
                }
            }
        } else {
            files.push(path.to_path_buf());
        }

        let mut collection = Self::new(config);
        for file in files {
            let contents =
                fs::read_to_string(&file).with_context(|| format!("reading collection file {}", file.display()))?;
            let added = collection
                .read_str(&contents)
                .with_context(|| format!("parsing collection file {}", file.display()))?;
            info!(file = %file.display(), documents = added, "collection file read");
        }
        info!(
            documents = collection.document_count(),
            terms = collection.index.num_terms(),
            k_grams = collection.index.k_gram_index().len(),
            "collection loaded"
        );
        Ok(collection)
    }

    /// Parse collection text and index every document in it. Returns the number of documents added.
    pub fn read_str(&mut self, contents: &str) -> Result<usize> {
        let mut added = 0;
        let mut current: Option<(DocId, String, String)> = None;
        let mut section = Section::Skip;

        for (lineno, line) in contents.lines().enumerate() {
            if let Some(caps) = FIELD_MARKER.captures(line.trim_end()) {
                section = match &caps[1] {
                    "I" => {
                        if let Some((id, title, text)) = current.take() {
                            self.add_document(id, &title, &text)?;
                            added += 1;
                        }
                        let raw = caps.get(2).map_or("", |m| m.as_str());
                        let id = raw
                            .split_whitespace()
                            .last()
                            .and_then(|s| s.parse::<DocId>().ok())
                            .with_context(|| format!("line {}: invalid document id '{raw}'", lineno + 1))?;
                        current = Some((id, String::new(), String::new()));
                        Section::Skip
                    }
                    "T" => Section::Title,
                    "W" => Section::Abstract,
                    _ => Section::Skip,
                };
                continue;
            }
            if let Some((_, title, text)) = current.as_mut() {
                let target = match section {
                    Section::Title => title,
                    Section::Abstract => text,
                    Section::Skip => continue,
                };
                if !target.is_empty() {
                    target.push(if section == Section::Title { ' ' } else { '\n' });
                }
                target.push_str(line.trim());
            }
        }
        if let Some((id, title, text)) = current.take() {
            self.add_document(id, &title, &text)?;
            added += 1;
        }
        Ok(added)
    }

    /// Tokenize and index one document.
    pub fn add_document(&mut self, id: DocId, title: &str, text: &str) -> Result<()> {
        if id == 0 {
            bail!("document ids start at 1");
        }
        if self.documents.contains_key(&id) {
            bail!("document {id} is already indexed");
        }
        let tokens = tokenize(text);
        for (term, position) in &tokens {
            self.index.add_position(term, id, *position);
            *self.dictionary.entry(term.clone()).or_insert(0) += 1;
        }
        let document = Document { id, title: title.trim().to_string(), text: text.trim().to_string(), length: tokens.len() };
        self.documents.insert(id, document);
        Ok(())
    }

    pub fn document(&self, id: DocId) -> Option<&Document> {
        self.documents.get(&id)
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    pub fn index(&self) -> &PositionalIndex {
        &self.index
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Highest document id; NOT queries complement over `1..=universe_size()`.
    pub fn universe_size(&self) -> DocId {
        self.documents.keys().next_back().copied().unwrap_or(0)
    }

    /// Most frequent terms across the collection, ties broken alphabetically.
    pub fn top_terms(&self, n: usize) -> Vec<(&str, u64)> {
        let mut terms: Vec<(&str, u64)> = self.dictionary.iter().map(|(t, c)| (t.as_str(), *c)).collect();
        terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        terms.truncate(n);
        terms
    }

    pub fn processor(&self) -> QueryProcessor<'_> {
        QueryProcessor::with_config(&self.index, self.universe_size(), self.config.clone())
    }

    /// Evaluates `raw` and keeps only ids of stored documents; with gaps in the id range,
    /// NOT complements over `1..=universe_size()` would otherwise name missing documents.
    pub fn process_query_with(
        &self,
        raw: &str,
        selector: &mut dyn CorrectionSelector,
    ) -> Result<QueryOutcome, QueryError> {
        let mut outcome = self.processor().process_query_with(raw, selector)?;
        if self.document_count() < self.universe_size() as usize {
            let stored: Vec<DocId> = self.documents.keys().copied().collect();
            outcome.doc_ids = and_merge(&outcome.doc_ids, &stored);
        }
        Ok(outcome)
    }

    pub fn search(&self, raw: &str) -> Result<Vec<DocId>, QueryError> {
        Ok(self.process_query_with(raw, &mut BestCandidate)?.doc_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = ".I 1
.T
Classification of
  library materials
.A
Someone
.W
The library of Congress
classification scheme.
.X
1 5 1
.I 2
.W
Information retrieval
systems and the library.
";

    #[test]
    fn parses_sections() {
        let mut c = Collection::new(SearchConfig::default());
        assert_eq!(c.read_str(SAMPLE).unwrap(), 2);
        let doc = c.document(1).unwrap();
        assert_eq!(doc.title, "Classification of library materials");
        assert_eq!(doc.text, "The library of Congress\nclassification scheme.");
        assert_eq!(doc.length, 6);
        assert_eq!(c.index().get_document_list("library"), vec![1, 2]);
        assert!(c.index().get_document_list("someone").is_empty());
        assert_eq!(c.index().get_positions_in_document("classification", 1), &[4]);
        assert_eq!(c.universe_size(), 2);
    }

    #[test]
    fn rejects_duplicate_and_zero_ids() {
        let mut c = Collection::new(SearchConfig::default());
        c.add_document(1, "", "a b").unwrap();
        assert!(c.add_document(1, "", "c").is_err());
        assert!(c.add_document(0, "", "c").is_err());
        assert!(c.read_str(".I x\n.W\ntext\n").is_err());
    }

    #[test]
    fn top_terms_by_frequency() {
        let mut c = Collection::new(SearchConfig::default());
        c.read_str(SAMPLE).unwrap();
        let top = c.top_terms(2);
        assert_eq!(top[0], ("library", 2));
        assert_eq!(top[1], ("the", 2));
    }

    #[test]
    fn negation_skips_ids_missing_from_the_collection() {
        let mut c = Collection::new(SearchConfig::default());
        c.add_document(10, "", "alpha beta").unwrap();
        c.add_document(3, "", "gamma").unwrap();
        assert_eq!(c.universe_size(), 10);
        assert_eq!(c.search("NOT alpha").unwrap(), vec![3]);
        assert_eq!(c.search("NOT delta").unwrap(), vec![3, 10]);
        assert_eq!(c.search("gamma OR NOT beta").unwrap(), vec![3]);
        assert_eq!(c.search("alpha").unwrap(), vec![10]);
    }
}
