use std::{fmt::Debug, hash::Hash};

use itertools::Itertools;

use crate::Show;

/// A symbol of an alphabet, which is also the type of the symbols in a word.
pub trait Symbol: PartialEq + Eq + Debug + Copy + Ord + PartialOrd + Hash + Show {}
impl<S: PartialEq + Eq + Debug + Copy + Ord + PartialOrd + Hash + Show> Symbol for S {}

/// Helper type for getting the symbol type of an [`Alphabet`].
pub type SymbolOf<A> = <A as Alphabet>::Symbol;

/// An alphabet abstracts a fixed, finite collection of [`Symbol`]s. Once created, an alphabet
/// never changes. The order in which [`Alphabet::universe`] yields the symbols is the
/// *alphabet order*, every enumeration that depends on symbols follows it.
pub trait Alphabet: Clone + Debug {
    /// The type of symbols in this alphabet.
    type Symbol: Symbol;

    /// Type for an iterator over all symbols in the alphabet.
    type Universe<'this>: Iterator<Item = Self::Symbol>
    where
        Self: 'this;

    /// Returns an iterator over all symbols in the alphabet, in alphabet order.
    fn universe(&self) -> Self::Universe<'_>;

    /// Returns the position of the given symbol in alphabet order, if it is present.
    fn try_position(&self, symbol: Self::Symbol) -> Option<usize>;

    /// Returns the symbol at position `pos` in alphabet order, if it exists.
    fn try_nth(&self, pos: usize) -> Option<Self::Symbol>;

    /// Returns the number of symbols in the alphabet.
    fn size(&self) -> usize;

    /// Returns true if the given symbol is present in the alphabet.
    fn contains(&self, symbol: Self::Symbol) -> bool {
        self.try_position(symbol).is_some()
    }

    /// Returns true if the alphabet is empty.
    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Returns the first symbol of `word` that does not belong to the alphabet.
    fn foreign_symbol(&self, word: &[Self::Symbol]) -> Option<Self::Symbol> {
        word.iter().find(|sym| !self.contains(**sym)).copied()
    }
}

impl<A: Alphabet> Alphabet for &A {
    type Symbol = A::Symbol;
    type Universe<'this> = A::Universe<'this> where Self: 'this;

    fn universe(&self) -> Self::Universe<'_> {
        A::universe(self)
    }
    fn try_position(&self, symbol: Self::Symbol) -> Option<usize> {
        A::try_position(self, symbol)
    }
    fn try_nth(&self, pos: usize) -> Option<Self::Symbol> {
        A::try_nth(self, pos)
    }
    fn size(&self) -> usize {
        A::size(self)
    }
}

/// Represents an alphabet where a [`Symbol`] is just a single `char`.
///
/// # Example
/// ```
/// use automata::prelude::*;
/// let alphabet = CharAlphabet::new(vec!['b', 'a', 'b']);
/// assert_eq!(alphabet.size(), 2);
/// assert_eq!(alphabet.universe().collect::<Vec<_>>(), vec!['b', 'a']);
/// ```
#[derive(Clone, Hash, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub struct CharAlphabet(Vec<char>);

impl CharAlphabet {
    /// Creates a new [`CharAlphabet`] alphabet of the given size. The symbols are just the first `size` letters
    /// of the alphabet, i.e. 'a' to 'z'.
    pub fn of_size(size: usize) -> Self {
        assert!(size <= 26, "Alphabet is too large");
        Self((0..size).map(|i| (b'a' + i as u8) as char).collect())
    }

    /// Creates a new [`CharAlphabet`] from the given symbols. The declared order is kept,
    /// duplicates are dropped.
    pub fn new(symbols: Vec<char>) -> Self {
        Self(symbols.into_iter().unique().collect())
    }

    /// Gives access to the symbols in alphabet order.
    pub fn symbols(&self) -> &[char] {
        &self.0
    }
}

impl std::ops::Index<usize> for CharAlphabet {
    type Output = char;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl From<Vec<char>> for CharAlphabet {
    fn from(value: Vec<char>) -> Self {
        Self::new(value)
    }
}

impl From<&str> for CharAlphabet {
    fn from(value: &str) -> Self {
        Self::new(value.chars().collect())
    }
}

impl FromIterator<char> for CharAlphabet {
    fn from_iter<T: IntoIterator<Item = char>>(iter: T) -> Self {
        Self(iter.into_iter().unique().sorted().collect())
    }
}

impl Alphabet for CharAlphabet {
    type Symbol = char;

    type Universe<'this> = std::iter::Copied<std::slice::Iter<'this, char>>
        where
            Self: 'this;

    fn universe(&self) -> Self::Universe<'_> {
        self.0.iter().copied()
    }

    fn try_position(&self, symbol: char) -> Option<usize> {
        self.0.iter().position(|c| *c == symbol)
    }

    fn try_nth(&self, pos: usize) -> Option<char> {
        self.0.get(pos).copied()
    }

    fn size(&self) -> usize {
        self.0.len()
    }
}

/// Computes all elements of the free monoid over a set of given symbols.
/// In other words, it builds all finite words in length-lexicographic order
/// meaning words are computed in increasing length and ordered by the position
/// of their symbols in the given vec.
#[derive(Debug, Clone)]
pub struct FreeMonoid<S> {
    symbols: Vec<S>,
    current: Option<Vec<usize>>,
}

impl<S: Symbol> Iterator for FreeMonoid<S> {
    type Item = Vec<S>;
    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current.as_mut()?;
        let out = current.iter().map(|i| self.symbols[*i]).collect();

        if self.symbols.is_empty() {
            // only the empty word exists
            self.current = None;
            return Some(out);
        }

        let mut carry = true;
        let mut i = current.len();
        while carry && i > 0 {
            i -= 1;
            current[i] += 1;
            if current[i] >= self.symbols.len() {
                current[i] = 0;
            } else {
                carry = false;
            }
        }

        if carry {
            *current = vec![0; current.len() + 1];
        }

        Some(out)
    }
}

impl<S: Symbol> FreeMonoid<S> {
    /// Creates a new instance for the given vec of symbols, starting with the empty word.
    pub fn new(symbols: Vec<S>) -> Self {
        Self {
            symbols,
            current: Some(vec![]),
        }
    }

    /// Creates a new instance enumerating the free monoid over the symbols of `alphabet`.
    pub fn over<A: Alphabet<Symbol = S>>(alphabet: &A) -> Self {
        Self::new(alphabet.universe().collect())
    }

    /// Restricts the enumeration to words whose length is at most `bound`.
    pub fn up_to_length(self, bound: usize) -> impl Iterator<Item = Vec<S>> {
        self.take_while(move |word| word.len() <= bound)
    }
}
