use crate::config::SearchConfig;
use crate::index::PositionalIndex;
use crate::query::Query;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, info};

/// A vocabulary term proposed in place of an unknown query term.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub term: String,
    pub distance: usize,
    pub similarity: f64,
}

/// One corrected variant of a query: a single term replaced by a suggestion.
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    pub original: String,
    pub suggestion: Suggestion,
    pub query: Query,
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "did you mean '{}' instead of '{}'", self.suggestion.term, self.original)
    }
}

pub struct SpellingController<'a> {
    index: &'a PositionalIndex,
    config: &'a SearchConfig,
}

impl<'a> SpellingController<'a> {
    pub fn new(index: &'a PositionalIndex, config: &'a SearchConfig) -> Self {
        Self { index, config }
    }

    pub fn is_unknown(&self, term: &str) -> bool {
        self.index.document_frequency(term) < self.config.min_document_frequency
    }

    /// Vocabulary terms above the Jaccard threshold, closest edit distance first.
    pub fn suggest(&self, term: &str) -> Vec<Suggestion> {
        let k_grams = self.index.k_gram_index();
        let query_grams = k_grams.split_to_k_grams(term).len();
        if query_grams == 0 {
            return Vec::new();
        }

        let mut overlap: HashMap<&str, usize> = HashMap::new();
        for terms in k_grams.get_posting_lists(term) {
            for candidate in terms {
                *overlap.entry(candidate.as_str()).or_default() += 1;
            }
        }

        let mut suggestions: Vec<Suggestion> = overlap
            .into_iter()
            .filter(|(candidate, _)| *candidate != term)
            .filter_map(|(candidate, shared)| {
                let candidate_grams = self.index.entry(candidate).map_or(0, |e| e.k_gram_count);
                let similarity = jaccard(shared, query_grams, candidate_grams);
                (similarity > self.config.jaccard_threshold).then(|| Suggestion {
                    term: candidate.to_string(),
                    distance: levenshtein_distance(candidate, term),
                    similarity,
                })
            })
            .collect();

        suggestions.sort_by(|a, b| {
            a.distance
                .cmp(&b.distance)
                .then_with(|| b.similarity.partial_cmp(&a.similarity).unwrap_or(Ordering::Equal))
                .then_with(|| a.term.cmp(&b.term))
        });
        suggestions.truncate(self.config.max_suggestions);
        debug!(term, candidates = suggestions.len(), "spelling candidates");
        suggestions
    }

    /// Corrected variants of `query`, one per suggestion for the first unknown term that has any.
    /// Empty when nothing can be corrected.
    pub fn check_query(&self, query: &Query) -> Vec<Correction> {
        self.check_query_excluding(query, &HashSet::new())
    }

    /// Like [`check_query`](Self::check_query), leaving the terms in `keep` untouched.
    pub fn check_query_excluding(&self, query: &Query, keep: &HashSet<String>) -> Vec<Correction> {
        for (slot, term) in query.term_slots() {
            if keep.contains(term) || !self.is_unknown(term) {
                continue;
            }
            let suggestions = self.suggest(term);
            if suggestions.is_empty() {
                info!(term, "no correction found");
                continue;
            }
            return suggestions
                .into_iter()
                .map(|suggestion| {
                    let mut corrected = query.clone();
                    corrected.replace_term(slot, &suggestion.term);
                    Correction { original: term.to_string(), suggestion, query: corrected }
                })
                .collect();
        }
        Vec::new()
    }
}

/// `shared / (a + b - shared)`, zero when the union is empty.
fn jaccard(shared: usize, a: usize, b: usize) -> f64 {
    let shared = shared.min(a).min(b);
    let union = a + b - shared;
    if union == 0 {
        0.0
    } else {
        shared as f64 / union as f64
    }
}

/// Classic dynamic-programming edit distance over chars.
pub fn levenshtein_distance(word1: &str, word2: &str) -> usize {
    let a: Vec<char> = word1.chars().collect();
    let b: Vec<char> = word2.chars().collect();
    let mut matrix = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=b.len() {
        matrix[0][j] = j;
    }
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let substitution = matrix[i - 1][j - 1] + usize::from(a[i - 1] != b[j - 1]);
            matrix[i][j] = substitution.min(matrix[i - 1][j] + 1).min(matrix[i][j - 1] + 1);
        }
    }
    matrix[a.len()][b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::tokenize_query;

    fn index_of(words: &[&str]) -> PositionalIndex {
        let mut ix = PositionalIndex::new(2);
        for (pos, w) in words.iter().enumerate() {
            ix.add_position(w, 1, pos as u32);
        }
        ix
    }

    #[test]
    fn edit_distance() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("retrevial", "retrieval"), 2);
    }

    #[test]
    fn jaccard_is_total() {
        assert_eq!(jaccard(0, 0, 0), 0.0);
        assert_eq!(jaccard(6, 8, 8), 0.6);
        assert!(jaccard(5, 3, 1) <= 1.0);
    }

    #[test]
    fn proposes_closest_term_first() {
        let ix = index_of(&["retrieval", "revival", "retrieve", "evaluation", "trial"]);
        let cfg = SearchConfig::default();
        let speller = SpellingController::new(&ix, &cfg);
        let suggestions = speller.suggest("retrevial");
        assert_eq!(suggestions[0].term, "retrieval");
        assert_eq!(suggestions[0].distance, 2);
        assert!(suggestions.iter().all(|s| s.similarity > 0.5));
    }

    #[test]
    fn short_terms_have_no_grams() {
        let ix = index_of(&["a", "ab"]);
        let cfg = SearchConfig::default();
        assert!(SpellingController::new(&ix, &cfg).suggest("x").is_empty());
    }

    #[test]
    fn corrects_only_first_unknown_term() {
        let ix = index_of(&["information", "retrieval", "library"]);
        let cfg = SearchConfig::default();
        let speller = SpellingController::new(&ix, &cfg);
        let query = tokenize_query("informaton AND retreival").unwrap();
        let corrections = speller.check_query(&query);
        assert_eq!(corrections.len(), 1);
        assert_eq!(corrections[0].query.to_string(), "information AND retreival");
        assert_eq!(corrections[0].to_string(), "did you mean 'information' instead of 'informaton'");

        let keep: HashSet<String> = ["informaton".to_string()].into();
        let next = speller.check_query_excluding(&query, &keep);
        assert_eq!(next[0].query.to_string(), "informaton AND retrieval");
    }

    #[test]
    fn known_query_is_left_alone() {
        let ix = index_of(&["library"]);
        let cfg = SearchConfig::default();
        let query = tokenize_query("library AND zzzz").unwrap();
        assert!(SpellingController::new(&ix, &cfg).check_query(&query).is_empty());
    }
}
