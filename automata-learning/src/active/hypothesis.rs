use std::fmt::Display;

use automata::prelude::*;

use super::TableSnapshot;

/// A hypothesis is derived from a closed and consistent observation table. It carries the
/// table it was built from as well as the [`DFA`] whose states are the distinct rows of the
/// prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hypothesis<A: Alphabet> {
    snapshot: TableSnapshot<SymbolOf<A>>,
    automaton: DFA<A>,
}

impl<A: Alphabet> Hypothesis<A> {
    pub(crate) fn new(snapshot: TableSnapshot<SymbolOf<A>>, automaton: DFA<A>) -> Self {
        Self {
            snapshot,
            automaton,
        }
    }

    /// The observation table at the time the hypothesis was built.
    pub fn snapshot(&self) -> &TableSnapshot<SymbolOf<A>> {
        &self.snapshot
    }

    pub fn automaton(&self) -> &DFA<A> {
        &self.automaton
    }

    pub fn into_automaton(self) -> DFA<A> {
        self.automaton
    }

    /// Number of states of the hypothesis automaton.
    pub fn size(&self) -> usize {
        self.automaton.size()
    }

    pub fn accepts<W: AsRef<[SymbolOf<A>]>>(&self, word: W) -> bool {
        self.automaton.accepts(word)
    }
}

impl<A: Alphabet> Display for Hypothesis<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.automaton)
    }
}
