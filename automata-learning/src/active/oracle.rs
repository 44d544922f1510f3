use automata::prelude::*;
use tracing::trace;

use super::{Hypothesis, OracleError};

/// Answers membership queries for an unknown regular language over a fixed alphabet. This can
/// be implemented by wildly different types, for example an automaton, a function or a human
/// sitting in front of a terminal.
///
/// Implementations must answer deterministically, the learner asks every word at most once
/// and relies on the answer staying the same.
pub trait MembershipOracle {
    type Alphabet: Alphabet;

    fn alphabet(&self) -> &Self::Alphabet;

    /// Decides whether `word` belongs to the target language.
    fn output(&mut self, word: &[SymbolOf<Self::Alphabet>]) -> Result<bool, OracleError>;
}

/// The answer to an equivalence query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EquivalenceAnswer<S> {
    Equivalent,
    /// A word on which the hypothesis and the target language disagree.
    Counterexample(Vec<S>),
}

/// Decides whether a hypothesis recognizes exactly the target language.
pub trait EquivalenceOracle<A: Alphabet> {
    fn equivalence(
        &mut self,
        hypothesis: &Hypothesis<A>,
    ) -> Result<EquivalenceAnswer<SymbolOf<A>>, OracleError>;
}

impl<O: MembershipOracle + ?Sized> MembershipOracle for &mut O {
    type Alphabet = O::Alphabet;

    fn alphabet(&self) -> &Self::Alphabet {
        O::alphabet(self)
    }

    fn output(&mut self, word: &[SymbolOf<Self::Alphabet>]) -> Result<bool, OracleError> {
        O::output(self, word)
    }
}

impl<A: Alphabet, O: EquivalenceOracle<A> + ?Sized> EquivalenceOracle<A> for &mut O {
    fn equivalence(
        &mut self,
        hypothesis: &Hypothesis<A>,
    ) -> Result<EquivalenceAnswer<SymbolOf<A>>, OracleError> {
        O::equivalence(self, hypothesis)
    }
}

/// Searches all words of length at most `bound` in length-lexicographic order and returns the
/// first one on which `hypothesis` and `membership` disagree.
pub fn bounded_counterexample<A, F>(
    hypothesis: &Hypothesis<A>,
    bound: usize,
    mut membership: F,
) -> Result<Option<Vec<SymbolOf<A>>>, OracleError>
where
    A: Alphabet,
    F: FnMut(&[SymbolOf<A>]) -> Result<bool, OracleError>,
{
    for word in FreeMonoid::over(hypothesis.automaton().alphabet()).up_to_length(bound) {
        if hypothesis.accepts(&word) != membership(&word)? {
            trace!("found counterexample {}", word.as_string());
            return Ok(Some(word));
        }
    }
    Ok(None)
}

/// A minimally adequate teacher, pairing a membership oracle with an equivalence oracle so
/// both can be handed to the learner as a single value.
#[derive(Debug, Clone)]
pub struct Mat<M, E> {
    pub membership: M,
    pub equivalence: E,
}

impl<M, E> Mat<M, E> {
    pub fn new(membership: M, equivalence: E) -> Self {
        Self {
            membership,
            equivalence,
        }
    }
}

impl<M: MembershipOracle, E> MembershipOracle for Mat<M, E> {
    type Alphabet = M::Alphabet;

    fn alphabet(&self) -> &Self::Alphabet {
        self.membership.alphabet()
    }

    fn output(&mut self, word: &[SymbolOf<Self::Alphabet>]) -> Result<bool, OracleError> {
        self.membership.output(word)
    }
}

impl<A: Alphabet, M, E: EquivalenceOracle<A>> EquivalenceOracle<A> for Mat<M, E> {
    fn equivalence(
        &mut self,
        hypothesis: &Hypothesis<A>,
    ) -> Result<EquivalenceAnswer<SymbolOf<A>>, OracleError> {
        self.equivalence.equivalence(hypothesis)
    }
}

/// Answers membership queries with a function and counts how often it was asked.
#[derive(Clone)]
pub struct FnOracle<A, F> {
    alphabet: A,
    f: F,
    queries: usize,
}

impl<A: Alphabet, F: Fn(&[SymbolOf<A>]) -> bool> FnOracle<A, F> {
    pub fn new(alphabet: A, f: F) -> Self {
        Self {
            alphabet,
            f,
            queries: 0,
        }
    }

    /// The number of membership queries answered so far.
    pub fn queries(&self) -> usize {
        self.queries
    }
}

impl<A: Alphabet, F: Fn(&[SymbolOf<A>]) -> bool> MembershipOracle for FnOracle<A, F> {
    type Alphabet = A;

    fn alphabet(&self) -> &A {
        &self.alphabet
    }

    fn output(&mut self, word: &[SymbolOf<A>]) -> Result<bool, OracleError> {
        self.queries += 1;
        Ok((self.f)(word))
    }
}

/// Uses a function for membership queries and checks equivalence by comparing the hypothesis
/// with the function on all words up to a fixed length. A hypothesis that agrees on these
/// words is accepted, so the learned automaton is only as good as the bound.
#[derive(Clone)]
pub struct BoundedOracle<A, F> {
    inner: FnOracle<A, F>,
    bound: usize,
}

impl<A: Alphabet, F: Fn(&[SymbolOf<A>]) -> bool> BoundedOracle<A, F> {
    pub fn new(alphabet: A, bound: usize, f: F) -> Self {
        Self {
            inner: FnOracle::new(alphabet, f),
            bound,
        }
    }

    pub fn bound(&self) -> usize {
        self.bound
    }
}

impl<A: Alphabet, F: Fn(&[SymbolOf<A>]) -> bool> MembershipOracle for BoundedOracle<A, F> {
    type Alphabet = A;

    fn alphabet(&self) -> &A {
        self.inner.alphabet()
    }

    fn output(&mut self, word: &[SymbolOf<A>]) -> Result<bool, OracleError> {
        self.inner.output(word)
    }
}

impl<A: Alphabet, F: Fn(&[SymbolOf<A>]) -> bool> EquivalenceOracle<A> for BoundedOracle<A, F> {
    fn equivalence(
        &mut self,
        hypothesis: &Hypothesis<A>,
    ) -> Result<EquivalenceAnswer<SymbolOf<A>>, OracleError> {
        let f = &self.inner.f;
        Ok(
            match bounded_counterexample(hypothesis, self.bound, |w| Ok(f(w)))? {
                Some(cx) => EquivalenceAnswer::Counterexample(cx),
                None => EquivalenceAnswer::Equivalent,
            },
        )
    }
}

/// An oracle based on a [`DFA`]. Membership queries run the word through the automaton,
/// equivalence queries search the product of the automaton with the hypothesis for the
/// length-lexicographically least word on which the two disagree.
#[derive(Debug, Clone)]
pub struct DFAOracle<A: Alphabet> {
    automaton: DFA<A>,
}

impl<A: Alphabet> DFAOracle<A> {
    /// Creates a new instance of a [`DFAOracle`] from the given automaton.
    pub fn new(automaton: DFA<A>) -> Self {
        Self { automaton }
    }

    pub fn automaton(&self) -> &DFA<A> {
        &self.automaton
    }
}

impl<A: Alphabet> MembershipOracle for DFAOracle<A> {
    type Alphabet = A;

    fn alphabet(&self) -> &A {
        self.automaton.alphabet()
    }

    fn output(&mut self, word: &[SymbolOf<A>]) -> Result<bool, OracleError> {
        Ok(self.automaton.accepts(word))
    }
}

impl<A: Alphabet> EquivalenceOracle<A> for DFAOracle<A> {
    fn equivalence(
        &mut self,
        hypothesis: &Hypothesis<A>,
    ) -> Result<EquivalenceAnswer<SymbolOf<A>>, OracleError> {
        Ok(match self.automaton.separating_word(hypothesis.automaton()) {
            Some(cx) => EquivalenceAnswer::Counterexample(cx),
            None => EquivalenceAnswer::Equivalent,
        })
    }
}
