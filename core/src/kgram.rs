use std::collections::{BTreeSet, HashMap};

/// Maps every k-length character substring to the vocabulary terms containing it.
#[derive(Debug, Clone)]
pub struct KGramIndex {
    k: usize,
    grams: HashMap<String, BTreeSet<String>>,
}

impl KGramIndex {
    pub fn new(k: usize) -> Self {
        Self { k: k.max(1), grams: HashMap::new() }
    }

    /// All `len - k + 1` grams of `term`, in order and with repeats. Empty if the term is shorter than k.
    pub fn split_to_k_grams(&self, term: &str) -> Vec<String> {
        let chars: Vec<char> = term.chars().collect();
        if chars.len() < self.k {
            return Vec::new();
        }
        chars.windows(self.k).map(|w| w.iter().collect()).collect()
    }

    /// Registers `term` under each of its grams and returns the gram count.
    pub fn add_term(&mut self, term: &str) -> usize {
        let grams = self.split_to_k_grams(term);
        for gram in &grams {
            self.grams.entry(gram.clone()).or_default().insert(term.to_string());
        }
        grams.len()
    }

    /// One term set per gram of `term` (repeated grams yield repeated sets); unknown grams are skipped.
    pub fn get_posting_lists(&self, term: &str) -> Vec<&BTreeSet<String>> {
        self.split_to_k_grams(term).iter().filter_map(|g| self.grams.get(g)).collect()
    }

    pub fn terms_with(&self, gram: &str) -> Option<&BTreeSet<String>> {
        self.grams.get(gram)
    }

    pub fn len(&self) -> usize { self.grams.len() }

    pub fn is_empty(&self) -> bool { self.grams.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_into_overlapping_grams() {
        let ix = KGramIndex::new(2);
        assert_eq!(ix.split_to_k_grams("data"), vec!["da", "at", "ta"]);
        assert!(ix.split_to_k_grams("a").is_empty());
    }

    #[test]
    fn repeated_grams_register_once() {
        let mut ix = KGramIndex::new(2);
        assert_eq!(ix.add_term("aaa"), 2);
        assert_eq!(ix.terms_with("aa").map(|s| s.len()), Some(1));
        assert_eq!(ix.get_posting_lists("aaa").len(), 2);
    }
}
