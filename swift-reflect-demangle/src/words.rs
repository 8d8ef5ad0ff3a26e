/// A growing dictionary of previously-emitted identifier literals, used to resolve Swift-5
/// word-substitution references (§4.1).
///
/// Every literal identifier the grammar emits is recorded here, both as a whole and split on
/// camel-case word boundaries, so a later `0`-prefixed identifier can refer back to it by index
/// instead of repeating its bytes. Per spec.md §9's redesign note, the list is threaded explicitly
/// through the recursive descent rather than kept as shared mutable state; when parsing forks
/// (e.g. to try an alternate grammar rule), the caller clones it so the branches can't contaminate
/// one another.
#[derive(Debug, Clone, Default)]
pub struct WordList {
    words: Vec<String>,
}

impl WordList {
    /// Creates an empty word list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a word-substitution index (`'a'` => 0, `'b'` => 1, ...).
    pub fn resolve(&self, index: usize) -> Option<&str> {
        self.words.get(index).map(String::as_str)
    }

    /// Records a freshly parsed literal: the whole string, then each of its camel-case
    /// components. Duplicates (by exact string equality) are not re-added.
    pub fn push_literal(&mut self, literal: &str) {
        self.push_unique(literal.to_owned());
        for word in split_camel_case(literal) {
            if word != literal {
                self.push_unique(word.to_owned());
            }
        }
    }

    fn push_unique(&mut self, word: String) {
        if !self.words.iter().any(|existing| existing == &word) {
            self.words.push(word);
        }
    }
}

/// Splits an identifier into camel-case words, e.g. `"HTTPRequest"` -> `["HTTP", "Request"]`,
/// `"fooBar"` -> `["foo", "Bar"]`. A boundary starts before an uppercase letter that follows a
/// lowercase letter, or before the last uppercase letter of an acronym run that is followed by a
/// lowercase letter.
fn split_camel_case(s: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = s.char_indices().collect();
    if chars.is_empty() {
        return vec![];
    }

    let mut boundaries = vec![0usize];
    for i in 1..chars.len() {
        let (byte_idx, ch) = chars[i];
        let prev = chars[i - 1].1;
        if ch.is_uppercase() && prev.is_lowercase() {
            boundaries.push(byte_idx);
        } else if ch.is_uppercase() && prev.is_uppercase() {
            if let Some(&(next_idx, next_ch)) = chars.get(i + 1) {
                if next_ch.is_lowercase() {
                    boundaries.push(next_idx.min(byte_idx).max(byte_idx));
                }
            }
        }
    }
    boundaries.dedup();

    let mut words = Vec::with_capacity(boundaries.len());
    for window in boundaries.windows(2) {
        words.push(&s[window[0]..window[1]]);
    }
    if let Some(&last) = boundaries.last() {
        words.push(&s[last..]);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_simple_camel_case() {
        assert_eq!(split_camel_case("fooBar"), vec!["foo", "Bar"]);
    }

    #[test]
    fn splits_acronym_followed_by_word() {
        assert_eq!(split_camel_case("HTTPRequest"), vec!["HTTP", "Request"]);
    }

    #[test]
    fn single_word_has_no_boundary() {
        assert_eq!(split_camel_case("Widget"), vec!["Widget"]);
    }

    #[test]
    fn resolves_pushed_words_by_index() {
        let mut list = WordList::new();
        list.push_literal("Widget");
        list.push_literal("FooBar");
        assert_eq!(list.resolve(0), Some("Widget"));
        // "FooBar", "Foo", "Bar" pushed in order (whole first, then parts).
        assert_eq!(list.resolve(1), Some("FooBar"));
        assert_eq!(list.resolve(2), Some("Foo"));
        assert_eq!(list.resolve(3), Some("Bar"));
    }

    #[test]
    fn duplicate_words_are_not_readded() {
        let mut list = WordList::new();
        list.push_literal("Foo");
        list.push_literal("Foo");
        assert_eq!(list.resolve(1), None);
    }
}
