use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref FORBIDDEN: Regex = Regex::new(r"[^\p{L}\p{N}']").expect("valid regex");
}

/// Normalize a raw token into an index term: NFKC, lowercase, strip everything but letters,
/// digits and apostrophes, then drop apostrophes at either end. May return an empty string.
pub fn normalize_term(token: &str) -> String {
    let lowered = token.nfkc().collect::<String>().to_lowercase();
    let stripped = FORBIDDEN.replace_all(&lowered, "");
    stripped.trim_matches('\'').to_string()
}

/// Tokenize text into (term, position). Positions count only the tokens that survive normalization.
pub fn tokenize(text: &str) -> Vec<(String, u32)> {
    text.split_whitespace()
        .map(normalize_term)
        .filter(|t| !t.is_empty())
        .enumerate()
        .map(|(pos, term)| (term, pos as u32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("Library of  Congress, -- catalogue!");
        let words: Vec<&str> = t.iter().map(|(w, _)| w.as_str()).collect();
        assert_eq!(words, vec!["library", "of", "congress", "catalogue"]);
        assert_eq!(t[3].1, 3);
    }

    #[test]
    fn keeps_internal_apostrophes() {
        assert_eq!(normalize_term("'Author's'"), "author's");
        assert_eq!(normalize_term("term2&-"), "term2");
        assert_eq!(normalize_term("&-"), "");
    }
}
