use std::cmp::Ordering;

use crate::alphabet::Symbol;

/// A finite word is a finite sequence of [`Symbol`]s. Words are stored as plain vectors
/// (or borrowed as slices), this trait adds the operations that are needed on top.
pub trait FiniteWord {
    /// The type of symbols making up the word.
    type Symbol: Symbol;

    /// Returns the word that is obtained by appending `symbol` to `self`.
    fn append_symbol(&self, symbol: Self::Symbol) -> Vec<Self::Symbol>;

    /// Concatenates `self` with `suffix` into a new word.
    fn concatenate(&self, suffix: &[Self::Symbol]) -> Vec<Self::Symbol>;

    /// Returns an iterator over the non-empty suffixes (tails) of the word, starting
    /// with the word itself and ending with the last symbol.
    fn tails(&self) -> Tails<'_, Self::Symbol>;

    /// Compares two words first by length and then lexicographically.
    fn length_lexicographic_ord(&self, other: &[Self::Symbol]) -> Ordering;

    /// Converts the word to a string, the empty word is shown as `ε`.
    ///
    /// # Example
    /// ```
    /// use automata::prelude::*;
    /// assert_eq!(['a', 'b'].as_string(), "ab");
    /// assert_eq!(Vec::<char>::new().as_string(), "ε");
    /// ```
    fn as_string(&self) -> String;
}

impl<S: Symbol> FiniteWord for [S] {
    type Symbol = S;

    fn append_symbol(&self, symbol: S) -> Vec<S> {
        let mut out = Vec::with_capacity(self.len() + 1);
        out.extend_from_slice(self);
        out.push(symbol);
        out
    }

    fn concatenate(&self, suffix: &[S]) -> Vec<S> {
        let mut out = Vec::with_capacity(self.len() + suffix.len());
        out.extend_from_slice(self);
        out.extend_from_slice(suffix);
        out
    }

    fn tails(&self) -> Tails<'_, S> {
        Tails {
            word: self,
            offset: 0,
        }
    }

    fn length_lexicographic_ord(&self, other: &[S]) -> Ordering {
        self.len().cmp(&other.len()).then_with(|| self.cmp(other))
    }

    fn as_string(&self) -> String {
        if self.is_empty() {
            "ε".into()
        } else {
            S::show_collection(self)
        }
    }
}

/// Iterator over the non-empty suffixes of a word, longest first. Created by
/// [`FiniteWord::tails`].
#[derive(Debug, Clone)]
pub struct Tails<'a, S> {
    word: &'a [S],
    offset: usize,
}

impl<'a, S> Iterator for Tails<'a, S> {
    type Item = &'a [S];

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.word.len() {
            return None;
        }
        let out = &self.word[self.offset..];
        self.offset += 1;
        Some(out)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.word.len().saturating_sub(self.offset);
        (remaining, Some(remaining))
    }
}

impl<S> ExactSizeIterator for Tails<'_, S> {}
