use crate::kgram::KGramIndex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub type DocId = u32;
pub type Position = u32;

/// One term's occurrences inside one document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Posting {
    pub positions: Vec<Position>, // strictly increasing
}

impl Posting {
    pub fn term_frequency(&self) -> usize { self.positions.len() }

    fn add(&mut self, position: Position) {
        match self.positions.last() {
            Some(&last) if position > last => self.positions.push(position),
            None => self.positions.push(position),
            Some(_) => {
                if let Err(idx) = self.positions.binary_search(&position) {
                    self.positions.insert(idx, position);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TermEntry {
    pub document_frequency: usize,
    /// Number of grams registered for this term in the k-gram index.
    pub k_gram_count: usize,
    pub postings: BTreeMap<DocId, Posting>, // keyed and iterated by doc_id
}

/// Term -> postings, with a k-gram index over the vocabulary kept in step.
#[derive(Debug, Clone)]
pub struct PositionalIndex {
    terms: HashMap<String, TermEntry>,
    k_grams: KGramIndex,
}

impl PositionalIndex {
    pub fn new(k: usize) -> Self {
        Self { terms: HashMap::new(), k_grams: KGramIndex::new(k) }
    }

    pub fn add_position(&mut self, term: &str, doc_id: DocId, position: Position) {
        if let Some(entry) = self.terms.get_mut(term) {
            let posting = entry.postings.entry(doc_id).or_default();
            posting.add(position);
            entry.document_frequency = entry.postings.len();
            return;
        }
        let k_gram_count = self.k_grams.add_term(term);
        let mut postings = BTreeMap::new();
        postings.insert(doc_id, Posting { positions: vec![position] });
        self.terms.insert(term.to_string(), TermEntry { document_frequency: 1, k_gram_count, postings });
    }

    /// Ascending doc ids containing `term`; empty for unknown terms.
    pub fn get_document_list(&self, term: &str) -> Vec<DocId> {
        self.terms.get(term).map(|e| e.postings.keys().copied().collect()).unwrap_or_default()
    }

    pub fn get_positions_in_document(&self, term: &str, doc_id: DocId) -> &[Position] {
        self.terms
            .get(term)
            .and_then(|e| e.postings.get(&doc_id))
            .map(|p| p.positions.as_slice())
            .unwrap_or(&[])
    }

    pub fn document_frequency(&self, term: &str) -> usize {
        self.terms.get(term).map(|e| e.document_frequency).unwrap_or(0)
    }

    pub fn entry(&self, term: &str) -> Option<&TermEntry> { self.terms.get(term) }

    pub fn k_gram_index(&self) -> &KGramIndex { &self.k_grams }

    pub fn terms(&self) -> impl Iterator<Item = (&str, &TermEntry)> {
        self.terms.iter().map(|(t, e)| (t.as_str(), e))
    }

    pub fn num_terms(&self) -> usize { self.terms.len() }
}
