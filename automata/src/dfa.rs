use std::{collections::VecDeque, fmt::Display};

use serde::Serialize;
use tracing::trace;

use crate::{
    alphabet::{Alphabet, CharAlphabet, SymbolOf},
    math,
    word::FiniteWord,
    Show,
};

/// States of a [`DFA`] are identified by their position.
pub type StateIndex = usize;

/// A complete deterministic finite automaton. States are numbered consecutively starting
/// from `0`, and for every state there is exactly one successor per symbol of the alphabet.
/// The successors are stored densely, indexed by the position of the symbol in the alphabet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DFA<A: Alphabet = CharAlphabet> {
    alphabet: A,
    initial: StateIndex,
    accepting: Vec<bool>,
    transitions: Vec<Vec<StateIndex>>,
}

impl<A: Alphabet> DFA<A> {
    /// Creates a [`DFABuilder`] for the given alphabet.
    pub fn builder(alphabet: A) -> DFABuilder<A> {
        DFABuilder {
            alphabet,
            accepting: vec![],
            edges: vec![],
        }
    }

    /// Builds a DFA from its parts. `accepting[q]` states whether `q` is accepting and
    /// `transitions[q][i]` is the successor of `q` on the `i`-th symbol of the alphabet.
    /// Returns `None` if the parts do not describe a complete automaton.
    pub fn from_parts(
        alphabet: A,
        accepting: Vec<bool>,
        transitions: Vec<Vec<StateIndex>>,
        initial: StateIndex,
    ) -> Option<Self> {
        let size = accepting.len();
        if initial >= size || transitions.len() != size {
            return None;
        }
        if !transitions
            .iter()
            .all(|row| row.len() == alphabet.size() && row.iter().all(|q| *q < size))
        {
            return None;
        }
        Some(Self {
            alphabet,
            initial,
            accepting,
            transitions,
        })
    }

    /// Returns a reference to the alphabet.
    pub fn alphabet(&self) -> &A {
        &self.alphabet
    }

    /// The number of states.
    pub fn size(&self) -> usize {
        self.accepting.len()
    }

    /// The initial state.
    pub fn initial(&self) -> StateIndex {
        self.initial
    }

    /// Returns true if `state` exists and is accepting.
    pub fn is_accepting(&self, state: StateIndex) -> bool {
        self.accepting.get(state).copied().unwrap_or(false)
    }

    /// Returns an iterator over all states.
    pub fn states(&self) -> std::ops::Range<StateIndex> {
        0..self.size()
    }

    /// Gives the successor of `state` on `symbol`, or `None` if the state or the symbol
    /// does not exist.
    pub fn successor(&self, state: StateIndex, symbol: SymbolOf<A>) -> Option<StateIndex> {
        let pos = self.alphabet.try_position(symbol)?;
        self.transitions.get(state)?.get(pos).copied()
    }

    /// Runs `word` from `state` and returns the reached state. Fails if the word contains
    /// a symbol outside the alphabet.
    pub fn reached_state_from<W: AsRef<[SymbolOf<A>]>>(
        &self,
        state: StateIndex,
        word: W,
    ) -> Option<StateIndex> {
        word.as_ref()
            .iter()
            .try_fold(state, |q, sym| self.successor(q, *sym))
    }

    /// Runs `word` from the initial state and returns the reached state.
    pub fn reached_state<W: AsRef<[SymbolOf<A>]>>(&self, word: W) -> Option<StateIndex> {
        self.reached_state_from(self.initial, word)
    }

    /// Returns true if the run on `word` ends in an accepting state. Words containing
    /// symbols outside the alphabet are rejected.
    pub fn accepts<W: AsRef<[SymbolOf<A>]>>(&self, word: W) -> bool {
        self.reached_state(word)
            .map(|q| self.accepting[q])
            .unwrap_or(false)
    }

    /// Returns the length-lexicographically minimal word on which `self` and `other`
    /// disagree, or `None` if they accept the same language. Both automata are expected
    /// to be over the same alphabet. This is done with a breadth-first search of the
    /// product automaton.
    pub fn separating_word(&self, other: &DFA<A>) -> Option<Vec<SymbolOf<A>>> {
        let mut seen = math::Set::default();
        let mut queue = VecDeque::from([(self.initial, other.initial, vec![])]);
        seen.insert((self.initial, other.initial));

        while let Some((p, q, word)) = queue.pop_front() {
            if self.accepting[p] != other.is_accepting(q) {
                trace!("found separating word {}", word.as_string());
                return Some(word);
            }
            for sym in self.alphabet.universe() {
                let (Some(pp), Some(qq)) = (self.successor(p, sym), other.successor(q, sym))
                else {
                    continue;
                };
                if seen.insert((pp, qq)) {
                    queue.push_back((pp, qq, word.append_symbol(sym)));
                }
            }
        }
        None
    }

    /// Returns true if `self` and `other` accept the same language.
    pub fn equivalent(&self, other: &DFA<A>) -> bool {
        self.separating_word(other).is_none()
    }

    /// Produces a serializable view of the automaton.
    pub fn export(&self) -> DFAExport {
        DFAExport {
            alphabet: self.alphabet.universe().map(|sym| sym.show()).collect(),
            initial: self.initial,
            states: self
                .states()
                .map(|q| StateExport {
                    accepting: self.accepting[q],
                    successors: self.transitions[q].clone(),
                })
                .collect(),
        }
    }
}

impl<A: Alphabet> Display for DFA<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut builder = tabled::builder::Builder::default();
        builder.push_record(
            std::iter::once("State".to_string()).chain(self.alphabet.universe().map(|s| s.show())),
        );
        for q in self.states() {
            let mut name = format!("q{q}");
            if q == self.initial {
                name = format!("→ {name}");
            }
            if self.accepting[q] {
                name.push_str(" *");
            }
            builder.push_record(
                std::iter::once(name).chain(self.transitions[q].iter().map(|p| format!("q{p}"))),
            );
        }
        write!(
            f,
            "{}",
            builder.build().with(tabled::settings::Style::rounded())
        )
    }
}

/// Serializable description of a [`DFA`], symbols are shown as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DFAExport {
    /// The symbols in alphabet order.
    pub alphabet: Vec<String>,
    /// The initial state.
    pub initial: StateIndex,
    /// All states, indexed by their [`StateIndex`].
    pub states: Vec<StateExport>,
}

/// Serializable description of a single state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateExport {
    /// Whether the state is accepting.
    pub accepting: bool,
    /// Successors, in alphabet order.
    pub successors: Vec<StateIndex>,
}

/// Incrementally collects the states and edges of a [`DFA`].
///
/// # Example
/// ```
/// use automata::prelude::*;
/// let dfa = DFA::builder(CharAlphabet::of_size(1))
///     .with_states([true, false])
///     .with_edges([(0, 'a', 1), (1, 'a', 0)])
///     .into_dfa(0)
///     .unwrap();
/// assert!(dfa.accepts(['a', 'a']));
/// assert!(!dfa.accepts(['a']));
/// ```
#[derive(Debug, Clone)]
pub struct DFABuilder<A: Alphabet> {
    alphabet: A,
    accepting: Vec<bool>,
    edges: Vec<(StateIndex, SymbolOf<A>, StateIndex)>,
}

impl<A: Alphabet> DFABuilder<A> {
    /// Adds states with the given acceptance, numbered in order.
    pub fn with_states<I: IntoIterator<Item = bool>>(mut self, accepting: I) -> Self {
        self.accepting.extend(accepting);
        self
    }

    /// Adds edges given as `(source, symbol, target)`.
    pub fn with_edges<I: IntoIterator<Item = (StateIndex, SymbolOf<A>, StateIndex)>>(
        mut self,
        edges: I,
    ) -> Self {
        self.edges.extend(edges);
        self
    }

    /// Collects into a [`DFA`] with the given initial state. Returns `None` if an edge
    /// uses an unknown state or symbol, if some state has two edges for the same symbol,
    /// or if some state misses an edge.
    pub fn into_dfa(self, initial: StateIndex) -> Option<DFA<A>> {
        let mut transitions = vec![vec![None; self.alphabet.size()]; self.accepting.len()];
        for (source, sym, target) in self.edges {
            let pos = self.alphabet.try_position(sym)?;
            let slot = transitions.get_mut(source)?.get_mut(pos)?;
            if slot.replace(target).is_some() {
                return None;
            }
        }
        let transitions = transitions
            .into_iter()
            .map(|row| row.into_iter().collect::<Option<Vec<_>>>())
            .collect::<Option<Vec<_>>>()?;
        DFA::from_parts(self.alphabet, self.accepting, transitions, initial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contains_a() -> DFA {
        DFA::builder(CharAlphabet::of_size(2))
            .with_states([false, true])
            .with_edges([(0, 'a', 1), (0, 'b', 0), (1, 'a', 1), (1, 'b', 1)])
            .into_dfa(0)
            .unwrap()
    }

    fn even_length() -> DFA {
        DFA::builder(CharAlphabet::of_size(2))
            .with_states([true, false])
            .with_edges([(0, 'a', 1), (0, 'b', 1), (1, 'a', 0), (1, 'b', 0)])
            .into_dfa(0)
            .unwrap()
    }

    #[test_log::test]
    fn runs() {
        let dfa = contains_a();
        assert_eq!(dfa.size(), 2);
        assert!(dfa.accepts(['b', 'a', 'b']));
        assert!(!dfa.accepts(['b', 'b']));
        assert!(!dfa.accepts(['a', 'c']));
        assert_eq!(dfa.reached_state(['c']), None);
        assert_eq!(dfa.reached_state(Vec::<char>::new()), Some(0));
    }

    #[test_log::test]
    fn incomplete_builders_are_rejected() {
        let alphabet = CharAlphabet::of_size(2);
        assert!(DFA::builder(alphabet.clone())
            .with_states([true])
            .with_edges([(0, 'a', 0)])
            .into_dfa(0)
            .is_none());
        assert!(DFA::builder(alphabet.clone())
            .with_states([true])
            .with_edges([(0, 'a', 0), (0, 'b', 0), (0, 'a', 0)])
            .into_dfa(0)
            .is_none());
        assert!(DFA::builder(alphabet)
            .with_states([true])
            .with_edges([(0, 'a', 0), (0, 'b', 1)])
            .into_dfa(0)
            .is_none());
    }

    #[test_log::test]
    fn separating_words_are_minimal() {
        let left = contains_a();
        let right = even_length();
        // ε is accepted by `right` only
        assert_eq!(left.separating_word(&right), Some(vec![]));
        assert!(left.equivalent(&left.clone()));

        let rejecting = DFA::builder(CharAlphabet::of_size(2))
            .with_states([false])
            .with_edges([(0, 'a', 0), (0, 'b', 0)])
            .into_dfa(0)
            .unwrap();
        assert_eq!(left.separating_word(&rejecting), Some(vec!['a']));
    }

    #[test]
    fn export_and_display() {
        let dfa = contains_a();
        let export = dfa.export();
        assert_eq!(export.alphabet, vec!["a", "b"]);
        assert_eq!(export.states[0].successors, vec![1, 0]);
        assert!(export.states[1].accepting);

        let shown = dfa.to_string();
        assert!(shown.contains("→ q0"));
        assert!(shown.contains("q1 *"));
    }
}
