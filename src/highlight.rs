use std::ops::Range;

use regex::{Regex, RegexBuilder};

/// The backend matches the whole trimmed term as one case-insensitive
/// substring, so highlighting does the same.
pub fn regex_for_term(term: &str) -> Option<Regex> {
    let needle = term.trim();
    if needle.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex::escape(needle))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Byte ranges of `text` to highlight.
pub fn match_ranges(regex: Option<&Regex>, text: &str) -> Vec<Range<usize>> {
    regex
        .map(|re| re.find_iter(text).map(|m| m.range()).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_terms_highlight_nothing() {
        assert!(regex_for_term("").is_none());
        assert!(regex_for_term("  \t").is_none());
    }

    #[test]
    fn whole_term_is_matched_not_its_words() {
        let regex = regex_for_term(" team meeting ").expect("regex");
        assert_eq!(
            match_ranges(Some(&regex), "Team meeting notes: meeting moved"),
            vec![0..12]
        );
        assert!(match_ranges(Some(&regex), "meeting with the team").is_empty());
    }

    #[test]
    fn matches_case_insensitively_and_escapes_metacharacters() {
        let regex = regex_for_term("C++").expect("regex");
        assert_eq!(match_ranges(Some(&regex), "learn c++ and C++"), vec![6..9, 14..17]);
        assert!(match_ranges(None, "anything").is_empty());
    }
}
