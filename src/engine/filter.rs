use std::collections::BTreeSet;

use crate::vocab::{ListId, Word};

/// List-membership and free-text criteria for the words screen.
/// Empty criteria let every word through.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WordFilter {
    pub lists: BTreeSet<ListId>,
    pub text: String,
}

impl WordFilter {
    pub fn new(lists: impl IntoIterator<Item = ListId>, text: &str) -> Self {
        Self {
            lists: lists.into_iter().collect(),
            text: text.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty() && self.text.is_empty()
    }

    pub fn toggle_list(&mut self, list_id: &str) {
        if !self.lists.remove(list_id) {
            self.lists.insert(list_id.to_string());
        }
    }

    /// The word must belong to every selected list.
    pub fn matches_lists(&self, word: &Word) -> bool {
        if self.lists.is_empty() {
            return true;
        }
        match &word.lists {
            Some(member_of) => self
                .lists
                .iter()
                .all(|wanted| member_of.iter().any(|l| l == wanted)),
            None => false,
        }
    }

    /// Exact match of the lower-cased search text against kana, kanji,
    /// and the lower-cased translations.
    pub fn matches_text(&self, word: &Word) -> bool {
        if self.text.is_empty() {
            return true;
        }
        let needle = self.text.to_lowercase();
        needle == word.kana
            || word.kanji.as_deref() == Some(needle.as_str())
            || needle == word.traduction.to_lowercase()
            || needle
                == word
                    .secondary_traduction
                    .as_deref()
                    .map(str::to_lowercase)
                    .unwrap_or_default()
    }

    pub fn matches(&self, word: &Word) -> bool {
        self.matches_lists(word) && self.matches_text(word)
    }

    pub fn apply<'a>(&self, words: &'a [Word]) -> Vec<&'a Word> {
        words.iter().filter(|w| self.matches(w)).collect()
    }
}

pub fn filter_words<'a>(words: &'a [Word], lists: &BTreeSet<ListId>, text: &str) -> Vec<&'a Word> {
    WordFilter {
        lists: lists.clone(),
        text: text.to_string(),
    }
    .apply(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lists(ids: &[&str]) -> BTreeSet<ListId> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> Vec<Word> {
        vec![
            Word::new("1", "みず", "Water")
                .with_kanji("水")
                .with_lists(&["a", "b"]),
            Word::new("2", "ひ", "fire").with_kanji("火").with_lists(&["a"]),
            Word::new("3", "これ", "this").with_secondary("This One"),
            Word::new("4", "やま", "mountain").with_kanji("山").with_lists(&[]),
        ]
    }

    fn ids(words: &[&Word]) -> Vec<String> {
        words.iter().map(|w| w.id.clone()).collect()
    }

    #[test]
    fn test_empty_filter_is_identity() {
        let words = sample();
        let out = filter_words(&words, &BTreeSet::new(), "");
        assert_eq!(ids(&out), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_list_filter_requires_all_lists() {
        let words = sample();
        let out = filter_words(&words, &lists(&["a", "b"]), "");
        assert_eq!(ids(&out), vec!["1"]);
        let out = filter_words(&words, &lists(&["a"]), "");
        assert_eq!(ids(&out), vec!["1", "2"]);
    }

    #[test]
    fn test_word_without_lists_never_passes_list_filter() {
        let words = sample();
        let out = filter_words(&words, &lists(&["b"]), "");
        assert!(out.iter().all(|w| w.id != "3" && w.id != "4"));
    }

    #[test]
    fn test_stale_list_reference_yields_empty() {
        // no word references "gone" any more
        let words = sample();
        let out = filter_words(&words, &lists(&["gone"]), "");
        assert!(out.is_empty());
    }

    #[test]
    fn test_text_filter_exact_not_substring() {
        let words = sample();
        assert_eq!(ids(&filter_words(&words, &BTreeSet::new(), "wat")), Vec::<String>::new());
        assert_eq!(ids(&filter_words(&words, &BTreeSet::new(), "water")), vec!["1"]);
    }

    #[test]
    fn test_text_filter_lowercases_needle_and_translations() {
        let words = sample();
        assert_eq!(ids(&filter_words(&words, &BTreeSet::new(), "WATER")), vec!["1"]);
        assert_eq!(ids(&filter_words(&words, &BTreeSet::new(), "this one")), vec!["3"]);
    }

    #[test]
    fn test_text_filter_matches_kana_and_kanji() {
        let words = sample();
        assert_eq!(ids(&filter_words(&words, &BTreeSet::new(), "ひ")), vec!["2"]);
        assert_eq!(ids(&filter_words(&words, &BTreeSet::new(), "山")), vec!["4"]);
    }

    #[test]
    fn test_kanji_compared_against_lowercased_needle() {
        let words = vec![Word::new("1", "えーびーしー", "alphabet").with_kanji("ABC")];
        assert!(filter_words(&words, &BTreeSet::new(), "ABC").is_empty());
        assert!(filter_words(&words, &BTreeSet::new(), "abc").is_empty());
    }

    #[test]
    fn test_filters_are_anded() {
        let words = sample();
        let out = filter_words(&words, &lists(&["a"]), "fire");
        assert_eq!(ids(&out), vec!["2"]);
        let out = filter_words(&words, &lists(&["b"]), "fire");
        assert!(out.is_empty());
    }

    #[test]
    fn test_toggle_list() {
        let mut filter = WordFilter::default();
        assert!(filter.is_empty());
        filter.toggle_list("a");
        assert!(filter.lists.contains("a"));
        filter.toggle_list("a");
        assert!(filter.is_empty());
    }

    #[test]
    fn test_results_hold_list_subset_property() {
        let words = sample();
        let wanted = lists(&["a"]);
        for word in filter_words(&words, &wanted, "") {
            let member_of = word.lists.as_ref().unwrap();
            assert!(wanted.iter().all(|l| member_of.contains(l)));
        }
    }
}
