//! Fuzzy term expansion.
//!
//! A query token is expanded into the indexed terms it is allowed to match.
//! Each analyzed subterm of the token contributes candidates that share its
//! first `prefix_length` characters and lie within `max_edits` Levenshtein
//! edits. Subterms no longer than the prefix are matched exactly. Candidates
//! are ranked by distance then term, and only the first `max_expansions`
//! survive.
//!
//! Terms longer than [`MAX_FUZZY_TERM_CHARS`] on either side only match
//! exactly, the limit `fuzzystrmatch.levenshtein` accepts.
//!
//! The SQL emitted by [`crate::match_filter`] follows the same rules against
//! `fuzzystrmatch.levenshtein`, so both stores agree on what matches.

use std::collections::{BTreeSet, HashMap};
use std::ops::Bound;

use galleria_core::FuzzyOptions;

use crate::analysis::analyze;

/// Longest term, in characters, that takes part in edit-distance matching.
pub const MAX_FUZZY_TERM_CHARS: usize = 255;

/// Expands query tokens against a term vocabulary.
pub struct TermExpander<'a> {
    vocabulary: &'a BTreeSet<String>,
    options: FuzzyOptions,
}

impl<'a> TermExpander<'a> {
    pub fn new(vocabulary: &'a BTreeSet<String>, options: FuzzyOptions) -> Self {
        Self {
            vocabulary,
            options,
        }
    }

    /// Indexed terms accepted as variants of `token`, nearest first.
    ///
    /// A token with no alphanumeric content expands to nothing.
    pub fn expand(&self, token: &str) -> Vec<String> {
        let mut best: HashMap<&str, usize> = HashMap::new();

        for subterm in analyze(token) {
            for (term, distance) in self.candidates(&subterm) {
                best.entry(term)
                    .and_modify(|d| *d = (*d).min(distance))
                    .or_insert(distance);
            }
        }

        let mut ranked: Vec<(usize, &str)> = best.into_iter().map(|(t, d)| (d, t)).collect();
        ranked.sort_unstable();
        ranked.truncate(self.options.max_expansions);
        ranked.into_iter().map(|(_, t)| t.to_string()).collect()
    }

    fn candidates(&self, subterm: &str) -> Vec<(&'a str, usize)> {
        let prefix_length = self.options.prefix_length;
        let max_edits = usize::from(self.options.max_edits);

        let subterm_len = subterm.chars().count();

        if max_edits == 0 || subterm_len <= prefix_length || subterm_len > MAX_FUZZY_TERM_CHARS {
            return self
                .vocabulary
                .get(subterm)
                .map(|term| vec![(term.as_str(), 0)])
                .unwrap_or_default();
        }

        let prefix: String = subterm.chars().take(prefix_length).collect();

        self.vocabulary
            .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
            .take_while(|term| term.starts_with(prefix.as_str()))
            .filter(|term| {
                let term_len = term.chars().count();
                term_len <= MAX_FUZZY_TERM_CHARS && term_len.abs_diff(subterm_len) <= max_edits
            })
            .filter_map(|term| {
                let distance = strsim::levenshtein(term, subterm);
                (distance <= max_edits).then_some((term.as_str(), distance))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocabulary(terms: &[&str]) -> BTreeSet<String> {
        terms.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_exact_term_expands_to_itself() {
        let vocab = vocabulary(&["mountain", "sea"]);
        let expander = TermExpander::new(&vocab, FuzzyOptions::default());
        assert_eq!(expander.expand("mountain"), vec!["mountain"]);
    }

    #[test]
    fn test_single_edit_variant_matches() {
        let vocab = vocabulary(&["mountain", "mountains", "fountain"]);
        let expander = TermExpander::new(&vocab, FuzzyOptions::default());

        assert_eq!(expander.expand("mountai"), vec!["mountain"]);
        // a transposition costs two edits
        assert!(expander.expand("mountian").is_empty());
        assert_eq!(expander.expand("mountains"), vec!["mountains", "mountain"]);
    }

    #[test]
    fn test_prefix_must_match_exactly() {
        let vocab = vocabulary(&["sunset"]);
        let expander = TermExpander::new(&vocab, FuzzyOptions::default());
        assert!(expander.expand("aunset").is_empty());
        assert_eq!(expander.expand("sunsey"), vec!["sunset"]);
    }

    #[test]
    fn test_short_tokens_match_exactly() {
        let vocab = vocabulary(&["cat", "cats", "car"]);
        let expander = TermExpander::new(&vocab, FuzzyOptions::default());
        assert_eq!(expander.expand("cat"), vec!["cat"]);
        assert!(expander.expand("cap").is_empty());
    }

    #[test]
    fn test_token_is_case_insensitive() {
        let vocab = vocabulary(&["beach"]);
        let expander = TermExpander::new(&vocab, FuzzyOptions::default());
        assert_eq!(expander.expand("BEACH"), vec!["beach"]);
    }

    #[test]
    fn test_punctuation_only_token_expands_to_nothing() {
        let vocab = vocabulary(&["beach"]);
        let expander = TermExpander::new(&vocab, FuzzyOptions::default());
        assert!(expander.expand("!!!").is_empty());
    }

    #[test]
    fn test_compound_token_unions_subterms() {
        let vocab = vocabulary(&["snowy", "mountain"]);
        let expander = TermExpander::new(&vocab, FuzzyOptions::default());
        assert_eq!(expander.expand("snowy-mountain"), vec!["mountain", "snowy"]);
    }

    #[test]
    fn test_expansions_are_capped_nearest_first() {
        let vocab = vocabulary(&["abcd", "abce", "abcf", "abcg"]);
        let options = FuzzyOptions {
            max_expansions: 2,
            ..FuzzyOptions::default()
        };
        let expander = TermExpander::new(&vocab, options);
        assert_eq!(expander.expand("abcf"), vec!["abcf", "abcd"]);
    }

    #[test]
    fn test_zero_edits_is_exact() {
        let vocab = vocabulary(&["mountain", "mountains"]);
        let options = FuzzyOptions {
            max_edits: 0,
            ..FuzzyOptions::default()
        };
        let expander = TermExpander::new(&vocab, options);
        assert_eq!(expander.expand("mountains"), vec!["mountains"]);
    }

    #[test]
    fn test_overlong_terms_match_exactly() {
        let long_term = format!("sun{}", "y".repeat(300));
        let vocab = vocabulary(&["sunset", long_term.as_str()]);
        let expander = TermExpander::new(&vocab, FuzzyOptions::default());

        assert_eq!(expander.expand(&long_term), vec![long_term.clone()]);
        let one_off = format!("sun{}z", "y".repeat(299));
        assert!(expander.expand(&one_off).is_empty());
        assert_eq!(expander.expand("sunse"), vec!["sunset"]);
    }
}
