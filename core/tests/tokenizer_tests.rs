use boolsearch_core::tokenizer::{normalize_term, tokenize};

#[test]
fn it_normalizes_case_and_punctuation() {
    let toks = tokenize("Running, RUNNER's run! The café's menu.");
    let words: Vec<String> = toks.into_iter().map(|(w, _)| w).collect();
    assert_eq!(words, vec!["running", "runner's", "run", "the", "café's", "menu"]);
}

#[test]
fn it_keeps_stopwords_for_phrases() {
    let toks = tokenize("The quick brown fox and the lazy dog");
    assert_eq!(toks.len(), 8);
    assert_eq!(toks[4], ("and".to_string(), 4));
}

#[test]
fn it_applies_nfkc() {
    assert_eq!(normalize_term("ﬁle"), "file");
}
