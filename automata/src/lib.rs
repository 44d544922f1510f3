#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// An alphabet defines a finite collection of possible symbols. The order in which
/// the symbols are declared is the order in which they are enumerated everywhere.
pub mod alphabet;

/// A word is a finite sequence of symbols from some alphabet. This module provides
/// helpers for concatenating words, iterating over their suffixes and showing them.
pub mod word;

/// Defines the collection types that are used throughout, most notably insertion
/// ordered sets and maps which give stable enumeration orders.
pub mod math;

mod show;
pub use show::{show_duration, Show};

/// Deterministic finite automata over a finite alphabet, stored densely.
pub mod dfa;

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use automata::prelude::*;` should be enough to use the package.
pub mod prelude {
    pub use super::{
        alphabet::{Alphabet, CharAlphabet, FreeMonoid, Symbol, SymbolOf},
        dfa::{DFABuilder, StateIndex, DFA},
        math,
        show::{show_duration, Show},
        word::{FiniteWord, Tails},
    };
}
