use std::{fmt::Debug, io::Write};

use automata::prelude::*;
use itertools::Itertools;
use tracing::warn;

use super::ObservationTable;

/// A query that was answered during a run of the learner, together with its answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LStarQuery<S> {
    Membership(Vec<S>, bool),
    /// An equivalence query for a hypothesis with `states` states, if the hypothesis was
    /// rejected the counterexample is given.
    Equivalence {
        states: usize,
        counterexample: Option<Vec<S>>,
    },
}

impl<S: Symbol> LStarQuery<S> {
    pub fn is_equivalence(&self) -> bool {
        matches!(self, LStarQuery::Equivalence { .. })
    }

    pub fn is_successful_equivalence(&self) -> bool {
        matches!(
            self,
            LStarQuery::Equivalence {
                counterexample: None,
                ..
            }
        )
    }

    /// The word that was classified by this query, if any. Counterexamples are not
    /// classified directly, their membership is taken from the membership query that was
    /// posed for them.
    pub fn example(&self) -> Option<(&[S], bool)> {
        match self {
            LStarQuery::Membership(word, output) => Some((word.as_slice(), *output)),
            LStarQuery::Equivalence { .. } => None,
        }
    }
}

/// When the table is presented to a logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// The table is closed and consistent and a hypothesis is about to be checked.
    Stable,
    /// The hypothesis of the table was accepted.
    Final,
}

/// Observes a run of the learner. Loggers never influence the run, they merely get to see
/// every answered query and the table whenever it is closed and consistent.
pub trait LStarLogger<A: Alphabet> {
    fn log(&mut self, query: LStarQuery<SymbolOf<A>>);

    fn observe(&mut self, _table: &ObservationTable<A>, _stage: Stage) {}
}

impl<A: Alphabet> LStarLogger<A> for () {
    fn log(&mut self, _query: LStarQuery<SymbolOf<A>>) {}
}

impl<A: Alphabet, L: LStarLogger<A> + ?Sized> LStarLogger<A> for &mut L {
    fn log(&mut self, query: LStarQuery<SymbolOf<A>>) {
        L::log(self, query)
    }

    fn observe(&mut self, table: &ObservationTable<A>, stage: Stage) {
        L::observe(self, table, stage)
    }
}

impl<A: Alphabet, L: LStarLogger<A>, M: LStarLogger<A>> LStarLogger<A> for (L, M) {
    fn log(&mut self, query: LStarQuery<SymbolOf<A>>) {
        self.0.log(query.clone());
        self.1.log(query);
    }

    fn observe(&mut self, table: &ObservationTable<A>, stage: Stage) {
        self.0.observe(table, stage);
        self.1.observe(table, stage);
    }
}

impl<A: Alphabet, L: LStarLogger<A>> LStarLogger<A> for Option<L> {
    fn log(&mut self, query: LStarQuery<SymbolOf<A>>) {
        if let Some(logger) = self {
            logger.log(query)
        }
    }

    fn observe(&mut self, table: &ObservationTable<A>, stage: Stage) {
        if let Some(logger) = self {
            logger.observe(table, stage)
        }
    }
}

/// Records every query in the order in which it was answered.
#[derive(Debug, Clone)]
pub struct LStarLogbook<S>(Vec<LStarQuery<S>>);

impl<S> Default for LStarLogbook<S> {
    fn default() -> Self {
        Self(vec![])
    }
}

impl<S: Symbol> LStarLogbook<S> {
    /// A logbook is sane if at most one equivalence query succeeded and, if one did, it
    /// was the last query that was posed.
    pub fn is_sane(&self) -> bool {
        match self
            .0
            .iter()
            .filter(|q| q.is_successful_equivalence())
            .count()
        {
            0 => true,
            1 => self
                .0
                .last()
                .is_some_and(LStarQuery::is_successful_equivalence),
            _ => false,
        }
    }

    pub fn queries(&self) -> &[LStarQuery<S>] {
        &self.0
    }

    pub fn membership_queries(&self) -> usize {
        self.0.iter().filter(|q| !q.is_equivalence()).count()
    }

    pub fn equivalence_queries(&self) -> usize {
        self.0.iter().filter(|q| q.is_equivalence()).count()
    }

    /// All classified words, without repetitions.
    pub fn examples(&self) -> impl Iterator<Item = (&[S], bool)> + '_ {
        self.0.iter().filter_map(LStarQuery::example).unique()
    }
}

impl<A: Alphabet> LStarLogger<A> for LStarLogbook<SymbolOf<A>> {
    fn log(&mut self, query: LStarQuery<SymbolOf<A>>) {
        debug_assert!(self.is_sane());
        self.0.push(query);
    }
}

/// Writes the rendered observation table to the given sink whenever it is presented.
pub struct TablePrinter<W> {
    out: W,
}

impl<W: Write> TablePrinter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<A: Alphabet, W: Write> LStarLogger<A> for TablePrinter<W> {
    fn log(&mut self, _query: LStarQuery<SymbolOf<A>>) {}

    fn observe(&mut self, table: &ObservationTable<A>, stage: Stage) {
        let heading = match stage {
            Stage::Stable => "closed and consistent",
            Stage::Final => "final",
        };
        if let Err(e) = writeln!(self.out, "{heading} table\n{table}") {
            warn!("could not print observation table: {e}");
        }
    }
}

impl<W> Debug for TablePrinter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TablePrinter").finish_non_exhaustive()
    }
}
