//! Static word-list implementation of [`BannedWordFilter`].

use domains::BannedWordFilter;

#[derive(Debug, Clone, Default)]
pub struct WordListFilter {
    words: Vec<String>,
}

impl WordListFilter {
    /// Blank entries are dropped so they never match every message.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words
                .into_iter()
                .map(Into::into)
                .filter(|w: &String| !w.trim().is_empty())
                .collect(),
        }
    }
}

impl BannedWordFilter for WordListFilter {
    fn contains_banned(&self, text: &str) -> bool {
        self.words.iter().any(|word| text.contains(word.as_str()))
    }
}
