use std::{fmt::Display, ops::Deref};

use automata::prelude::*;
use itertools::Itertools;
use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};
use tracing::{debug, trace};

use super::{Hypothesis, LearningError, MembershipOracle, Query};

type Word<A> = Vec<SymbolOf<A>>;

/// The row signature of a prefix: its observed outputs in the order of the suffixes.
/// Rows are only compared for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Row(Vec<bool>);

impl Deref for Row {
    type Target = [bool];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<bool>> for Row {
    fn from(value: Vec<bool>) -> Self {
        Self(value)
    }
}

/// Witnesses that the table is not consistent: `left` and `right` have the same row, but
/// their extensions by `symbol` differ on `suffix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inconsistency<S> {
    pub left: Vec<S>,
    pub right: Vec<S>,
    pub symbol: S,
    pub suffix: Vec<S>,
}

impl<S: Symbol> Inconsistency<S> {
    /// The experiment `symbol · suffix` that tells `left` and `right` apart.
    pub fn experiment(&self) -> Vec<S> {
        [self.symbol].concatenate(&self.suffix)
    }
}

/// Serialized view of an observation table, this is what is handed out together with a
/// hypothesis. `cells` is row-major, with the rows of `prefixes` first and the rows of
/// `boundary` afterwards, and the columns in the order of `suffixes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSnapshot<S> {
    pub prefixes: Vec<Vec<S>>,
    pub boundary: Vec<Vec<S>>,
    pub suffixes: Vec<Vec<S>>,
    pub cells: Vec<Vec<bool>>,
}

/// An observation table is used to store the information that is obtained during a run of
/// an Angluin-style learner. It consists of the prefixes `S`, the suffixes (experiments) `E`
/// and for every word in `S` or the boundary `S·Σ \ S` the outputs for each experiment.
///
/// Every row word gets an id on first insertion (its position in `rows`), experiments are
/// identified by their position in `experiments`. The outputs of a row are stored densely
/// in the order of the experiments, so a row is complete once it has as many entries as
/// there are experiments. Nothing is ever removed.
#[derive(Debug, Clone)]
pub struct ObservationTable<A: Alphabet> {
    alphabet: A,
    max_depth: Option<usize>,
    rows: math::Set<Word<A>>,
    outputs: Vec<Vec<bool>>,
    base: math::Set<usize>,
    experiments: math::Set<Word<A>>,
}

impl<A: Alphabet> ObservationTable<A> {
    /// Creates a table with `S = E = {ε}` and no observations.
    pub fn new(alphabet: A) -> Self {
        Self::with_max_depth(alphabet, None)
    }

    /// Creates a table whose prefixes and suffixes may be at most `max_depth` symbols long.
    /// Longer extensions are left out of the boundary.
    pub fn with_max_depth(alphabet: A, max_depth: Option<usize>) -> Self {
        Self {
            alphabet,
            max_depth,
            rows: math::Set::from_iter([vec![]]),
            outputs: vec![vec![]],
            base: math::Set::from_iter([0]),
            experiments: math::Set::from_iter([vec![]]),
        }
    }

    pub fn alphabet(&self) -> &A {
        &self.alphabet
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Returns true if `word` respects the depth bound.
    pub fn within_depth(&self, word: &[SymbolOf<A>]) -> bool {
        self.max_depth.map_or(true, |depth| word.len() <= depth)
    }

    /// Ensures that every symbol of `word` belongs to the alphabet.
    pub fn validate(&self, word: &[SymbolOf<A>]) -> Result<(), LearningError<SymbolOf<A>>> {
        match self.alphabet.foreign_symbol(word) {
            Some(symbol) => Err(LearningError::InvalidSymbol {
                symbol,
                word: word.to_vec(),
            }),
            None => Ok(()),
        }
    }

    fn check_depth(&self, word: &[SymbolOf<A>]) -> Result<(), LearningError<SymbolOf<A>>> {
        match self.max_depth {
            Some(depth) if word.len() > depth => Err(LearningError::DepthBoundExceeded {
                word: word.to_vec(),
                depth,
            }),
            _ => Ok(()),
        }
    }

    fn intern(&mut self, word: &[SymbolOf<A>]) -> usize {
        if let Some(id) = self.rows.get_index_of(word) {
            return id;
        }
        let (id, _) = self.rows.insert_full(word.to_vec());
        self.outputs.push(vec![]);
        debug_assert_eq!(self.rows.len(), self.outputs.len());
        id
    }

    /// Inserts `word` into the prefixes. Returns whether the prefixes changed. No
    /// membership queries are posed, call [`Self::fill`] for that.
    pub fn add_prefix(&mut self, word: &[SymbolOf<A>]) -> Result<bool, LearningError<SymbolOf<A>>> {
        self.validate(word)?;
        self.check_depth(word)?;
        let id = self.intern(word);
        let added = self.base.insert(id);
        if added {
            debug!("added prefix {}", word.as_string());
        }
        Ok(added)
    }

    /// Inserts `word` into the suffixes. Returns whether the suffixes changed.
    pub fn add_suffix(&mut self, word: &[SymbolOf<A>]) -> Result<bool, LearningError<SymbolOf<A>>> {
        self.validate(word)?;
        self.check_depth(word)?;
        if self.experiments.contains(word) {
            return Ok(false);
        }
        debug!("added suffix {}", word.as_string());
        self.experiments.insert(word.to_vec());
        Ok(true)
    }

    /// Adds every non-empty tail of `counterexample` as a suffix, longest first. Tails that
    /// are already present or that exceed the depth bound are skipped. Returns the number
    /// of suffixes that were added.
    pub fn add_counterexample(
        &mut self,
        counterexample: &[SymbolOf<A>],
    ) -> Result<usize, LearningError<SymbolOf<A>>> {
        self.validate(counterexample)?;
        let mut added = 0;
        for tail in counterexample.tails() {
            if !self.within_depth(tail) {
                trace!("skipping tail {} which is too long", tail.as_string());
                continue;
            }
            if self.add_suffix(tail)? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Iterates over the prefixes in insertion order, starting with ε.
    pub fn prefixes(&self) -> impl Iterator<Item = &[SymbolOf<A>]> + '_ {
        self.base.iter().map(|id| self.rows[*id].as_slice())
    }

    /// Iterates over the suffixes in insertion order, starting with ε.
    pub fn suffixes(&self) -> impl Iterator<Item = &[SymbolOf<A>]> + '_ {
        self.experiments.iter().map(Vec::as_slice)
    }

    pub fn is_prefix(&self, word: &[SymbolOf<A>]) -> bool {
        self.rows
            .get_index_of(word)
            .is_some_and(|id| self.base.contains(&id))
    }

    /// Computes the boundary, i.e. all one-letter extensions of prefixes that are not themselves
    /// prefixes and respect the depth bound. They are ordered by their prefix first and by
    /// the appended symbol second. This is derived from the current prefixes on every call.
    pub fn boundary(&self) -> Vec<Word<A>> {
        self.prefixes()
            .flat_map(|prefix| {
                self.alphabet
                    .universe()
                    .map(move |sym| prefix.append_symbol(sym))
            })
            .filter(|ext| !self.is_prefix(ext) && self.within_depth(ext))
            .collect()
    }

    /// Poses a membership query for every combination of a row (prefix or boundary) and an
    /// experiment for which no output is known yet, and stores the answers. Rows are handled
    /// prefixes first, then boundary, each in order; within a row the experiments are filled
    /// in order. Returns the number of newly filled cells.
    ///
    /// If the oracle fails, the cells filled up to that point are kept and the error
    /// names the failing query.
    pub fn fill<O>(&mut self, oracle: &mut O) -> Result<usize, LearningError<SymbolOf<A>>>
    where
        O: MembershipOracle<Alphabet = A> + ?Sized,
    {
        let words = self
            .prefixes()
            .map(<[_]>::to_vec)
            .chain(self.boundary())
            .collect_vec();
        let experiment_count = self.experiments.len();
        let mut filled = 0;

        for word in words {
            let id = self.intern(&word);
            for i in self.outputs[id].len()..experiment_count {
                let query = word.concatenate(&self.experiments[i]);
                let output = oracle
                    .output(&query)
                    .map_err(|e| LearningError::from_oracle(Query::Membership(query.clone()), e))?;
                trace!("{} maps to {}", query.as_string(), output);
                self.outputs[id].push(output);
                filled += 1;
            }
        }

        if filled > 0 {
            debug!("filled {filled} cells");
        }
        Ok(filled)
    }

    /// Returns the row of `prefix`, provided it is known for every experiment.
    pub fn row(&self, prefix: &[SymbolOf<A>]) -> Option<Row> {
        let id = self.rows.get_index_of(prefix)?;
        let outputs = &self.outputs[id];
        (outputs.len() == self.experiments.len()).then(|| Row(outputs.clone()))
    }

    fn row_slice(&self, prefix: &[SymbolOf<A>]) -> Option<&[bool]> {
        let id = self.rows.get_index_of(prefix)?;
        let outputs = &self.outputs[id];
        (outputs.len() == self.experiments.len()).then_some(outputs.as_slice())
    }

    /// Looks up a single cell.
    pub fn output(&self, prefix: &[SymbolOf<A>], suffix: &[SymbolOf<A>]) -> Option<bool> {
        let row = self.rows.get_index_of(prefix)?;
        let column = self.experiments.get_index_of(suffix)?;
        self.outputs[row].get(column).copied()
    }

    /// Returns true if every prefix and boundary row is known for every experiment.
    pub fn is_complete(&self) -> bool {
        self.prefixes()
            .map(<[_]>::to_vec)
            .chain(self.boundary())
            .all(|word| self.row_slice(&word).is_some())
    }

    /// Returns the first boundary word whose row does not occur among the rows of the
    /// prefixes, or `None` if the table is closed.
    ///
    /// # Panics
    /// If the table has not been filled.
    pub fn unclosed_row(&self) -> Option<Word<A>> {
        let known: math::Set<&[bool]> = self
            .prefixes()
            .map(|prefix| {
                self.row_slice(prefix)
                    .unwrap_or_else(|| panic!("No complete row for {}", prefix.as_string()))
            })
            .collect();

        self.boundary().into_iter().find(|word| {
            let row = self
                .row_slice(word)
                .unwrap_or_else(|| panic!("No complete row for {}", word.as_string()));
            !known.contains(row)
        })
    }

    pub fn is_closed(&self) -> bool {
        self.unclosed_row().is_none()
    }

    /// Searches for two prefixes with equal rows whose extensions by some symbol have
    /// different rows. Pairs are considered in prefix order, symbols in alphabet order and the
    /// reported suffix is the first experiment on which the extensions differ. Extensions
    /// that are cut off by the depth bound are not considered.
    pub fn inconsistency(&self) -> Option<Inconsistency<SymbolOf<A>>> {
        let base = self.prefixes().collect_vec();
        for (i, left) in base.iter().enumerate() {
            for right in &base[(i + 1)..] {
                if self.row_slice(left) != self.row_slice(right) {
                    continue;
                }
                for symbol in self.alphabet.universe() {
                    let (Some(l), Some(r)) = (
                        self.row_slice(&left.append_symbol(symbol)),
                        self.row_slice(&right.append_symbol(symbol)),
                    ) else {
                        continue;
                    };
                    let Some(j) = l.iter().zip(r).position(|(x, y)| x != y) else {
                        continue;
                    };
                    let inconsistency = Inconsistency {
                        left: left.to_vec(),
                        right: right.to_vec(),
                        symbol,
                        suffix: self.experiments[j].clone(),
                    };
                    debug!(
                        "{} and {} are separated by {}",
                        left.as_string(),
                        right.as_string(),
                        inconsistency.experiment().as_string()
                    );
                    return Some(inconsistency);
                }
            }
        }
        None
    }

    pub fn is_consistent(&self) -> bool {
        self.inconsistency().is_none()
    }

    /// Produces the serialized form of the table. Cells that are not filled yet are
    /// left out, so rows may be shorter than the list of suffixes.
    pub fn snapshot(&self) -> TableSnapshot<SymbolOf<A>> {
        let prefixes = self.prefixes().map(<[_]>::to_vec).collect_vec();
        let boundary = self.boundary();
        let cells = prefixes
            .iter()
            .chain(&boundary)
            .map(|word| {
                self.rows
                    .get_index_of(word)
                    .map(|id| self.outputs[id].clone())
                    .unwrap_or_default()
            })
            .collect();
        TableSnapshot {
            prefixes,
            boundary,
            suffixes: self.experiments.iter().cloned().collect(),
            cells,
        }
    }

    /// Builds the hypothesis for a closed table. The states are the distinct rows of the
    /// prefixes, numbered in the order in which they first occur. The transition on `a` from
    /// the state of `s` leads to the state of `s·a`, and a state accepts if its row has
    /// a positive entry for ε.
    ///
    /// Fails with [`LearningError::DepthBoundExceeded`] if a needed extension is cut off by
    /// the depth bound.
    ///
    /// # Panics
    /// If the table is not filled and closed.
    pub fn hypothesis(&self) -> Result<Hypothesis<A>, LearningError<SymbolOf<A>>> {
        let start = std::time::Instant::now();
        let mut states: math::Map<&[bool], &[SymbolOf<A>]> = math::Map::default();
        for prefix in self.prefixes() {
            let row = self
                .row_slice(prefix)
                .expect("Can only build hypothesis from a filled table");
            states.entry(row).or_insert(prefix);
        }

        let mut accepting = Vec::with_capacity(states.len());
        let mut transitions = Vec::with_capacity(states.len());
        for (row, access) in &states {
            // ε is always the first experiment
            accepting.push(row[0]);
            let mut successors = Vec::with_capacity(self.alphabet.size());
            for sym in self.alphabet.universe() {
                let ext = access.append_symbol(sym);
                if !self.within_depth(&ext) {
                    return Err(LearningError::DepthBoundExceeded {
                        depth: self.max_depth.unwrap_or_default(),
                        word: ext,
                    });
                }
                let target = self
                    .row_slice(&ext)
                    .and_then(|r| states.get_index_of(r))
                    .expect("Can only work if table is closed!");
                successors.push(target);
            }
            transitions.push(successors);
        }

        let automaton = DFA::from_parts(self.alphabet.clone(), accepting, transitions, 0)
            .expect("rows of a closed table yield a complete automaton");
        debug!(
            "building hypothesis with {} states took {}",
            automaton.size(),
            show_duration(start.elapsed())
        );
        Ok(Hypothesis::new(self.snapshot(), automaton))
    }
}

impl<A: Alphabet> Display for ObservationTable<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut builder = Builder::default();
        builder.push_record(
            std::iter::once(String::new()).chain(self.suffixes().map(|e| e.as_string())),
        );

        let show_row = |word: &[SymbolOf<A>]| {
            self.rows
                .get_index_of(word)
                .map(|id| self.outputs[id].iter().map(Show::show).collect_vec())
                .unwrap_or_default()
        };

        for prefix in self.prefixes() {
            let name = prefix.as_string().bold().to_string();
            builder.push_record(std::iter::once(name).chain(show_row(prefix)));
        }
        let boundary = self.boundary();
        if !boundary.is_empty() {
            builder.push_record(
                std::iter::repeat("-".to_string()).take(self.experiments.len() + 1),
            );
        }
        for word in &boundary {
            builder.push_record(std::iter::once(word.as_string()).chain(show_row(word)));
        }

        let mut table = builder.build();
        table.with(Style::modern());
        write!(f, "{}", table)
    }
}

#[cfg(test)]
mod tests {
    use automata::prelude::*;

    use super::*;
    use crate::active::FnOracle;

    fn word(w: &str) -> Vec<char> {
        w.chars().collect()
    }

    type Target = fn(&[char]) -> bool;

    fn table_with(target: Target) -> (ObservationTable<CharAlphabet>, FnOracle<CharAlphabet, Target>) {
        let alphabet = CharAlphabet::of_size(2);
        (
            ObservationTable::new(alphabet.clone()),
            FnOracle::new(alphabet, target),
        )
    }

    #[test_log::test]
    fn initial_table() {
        let (mut table, mut oracle) = table_with(|w| w.contains(&'a'));
        assert_eq!(table.prefixes().collect_vec(), vec![&[] as &[char]]);
        assert_eq!(table.suffixes().count(), 1);
        assert_eq!(table.boundary(), vec![word("a"), word("b")]);
        assert!(!table.is_complete());
        assert_eq!(table.row(&[]), None);

        assert_eq!(table.fill(&mut oracle).unwrap(), 3);
        assert!(table.is_complete());
        assert_eq!(table.output(&word("a"), &[]), Some(true));
        assert_eq!(table.row(&word("b")), Some(Row::from(vec![false])));
    }

    #[test_log::test]
    fn fill_is_idempotent() {
        let (mut table, mut oracle) = table_with(|w| w.len() % 2 == 0);
        assert_eq!(table.fill(&mut oracle).unwrap(), 3);
        assert_eq!(table.fill(&mut oracle).unwrap(), 0);
        assert_eq!(oracle.queries(), 3);

        table.add_suffix(&word("a")).unwrap();
        assert_eq!(table.fill(&mut oracle).unwrap(), 3);
        assert_eq!(table.fill(&mut oracle).unwrap(), 0);
        assert_eq!(table.output(&word("b"), &word("a")), Some(true));
    }

    #[test_log::test]
    fn adding_is_idempotent() {
        let (mut table, _) = table_with(|_| true);
        assert!(table.add_prefix(&word("a")).unwrap());
        let before = table.snapshot();
        assert!(!table.add_prefix(&word("a")).unwrap());
        assert_eq!(table.snapshot(), before);

        assert!(table.add_suffix(&word("ba")).unwrap());
        let before = table.snapshot();
        assert!(!table.add_suffix(&word("ba")).unwrap());
        assert!(!table.add_suffix(&[]).unwrap());
        assert_eq!(table.snapshot(), before);
        assert_eq!(table.boundary(), vec![word("b"), word("aa"), word("ab")]);
    }

    #[test]
    fn foreign_symbols_are_rejected() {
        let (mut table, _) = table_with(|_| true);
        assert_eq!(
            table.add_prefix(&word("abc")),
            Err(LearningError::InvalidSymbol {
                symbol: 'c',
                word: word("abc")
            })
        );
        assert!(table.add_suffix(&word("d")).is_err());
        assert_eq!(table.prefixes().count(), 1);
        assert_eq!(table.suffixes().count(), 1);
    }

    #[test_log::test]
    fn closedness() {
        let (mut table, mut oracle) = table_with(|w| w.contains(&'a'));
        table.fill(&mut oracle).unwrap();
        assert_eq!(table.unclosed_row(), Some(word("a")));

        table.add_prefix(&word("a")).unwrap();
        table.fill(&mut oracle).unwrap();
        assert!(table.is_closed());

        let known = table.prefixes().map(|p| table.row(p).unwrap()).collect_vec();
        for b in table.boundary() {
            assert!(known.contains(&table.row(&b).unwrap()));
        }
    }

    #[test_log::test]
    fn inconsistency_with_empty_suffix() {
        // only "ab" is accepted
        let (mut table, mut oracle) = table_with(|w| w == ['a', 'b']);
        table.add_prefix(&word("a")).unwrap();
        table.fill(&mut oracle).unwrap();
        assert_eq!(table.row(&[]), table.row(&word("a")));

        let inconsistency = table.inconsistency().unwrap();
        assert_eq!(
            inconsistency,
            Inconsistency {
                left: vec![],
                right: word("a"),
                symbol: 'b',
                suffix: vec![],
            }
        );
        assert_eq!(inconsistency.experiment(), word("b"));
    }

    #[test_log::test]
    fn inconsistency_with_longer_suffix() {
        // only "abb" is accepted
        let (mut table, mut oracle) = table_with(|w| w == ['a', 'b', 'b']);
        table.add_suffix(&word("b")).unwrap();
        table.add_prefix(&word("a")).unwrap();
        table.fill(&mut oracle).unwrap();
        assert_eq!(table.row(&[]), table.row(&word("a")));

        let inconsistency = table.inconsistency().unwrap();
        assert_eq!(inconsistency.symbol, 'b');
        assert_eq!(inconsistency.suffix, word("b"));
        assert_eq!(inconsistency.experiment(), word("bb"));

        table.add_suffix(&inconsistency.experiment()).unwrap();
        table.fill(&mut oracle).unwrap();
        assert_ne!(table.row(&[]), table.row(&word("a")));
    }

    #[test_log::test]
    fn consistency_invariant() {
        let (mut table, mut oracle) =
            table_with(|w| w.iter().filter(|s| **s == 'a').count() % 2 == 0);
        for p in ["a", "b", "ab", "ba"] {
            table.add_prefix(&word(p)).unwrap();
        }
        table.fill(&mut oracle).unwrap();
        assert!(table.is_consistent());

        let prefixes = table.prefixes().map(<[_]>::to_vec).collect_vec();
        for s1 in &prefixes {
            for s2 in &prefixes {
                if table.row(s1) != table.row(s2) {
                    continue;
                }
                for a in ['a', 'b'] {
                    assert_eq!(
                        table.row(&s1.append_symbol(a)),
                        table.row(&s2.append_symbol(a))
                    );
                }
            }
        }
    }

    #[test]
    fn counterexample_tails_longest_first() {
        let (mut table, _) = table_with(|_| false);
        assert_eq!(table.add_counterexample(&word("aab")).unwrap(), 3);
        assert_eq!(
            table.suffixes().map(|e| e.as_string()).collect_vec(),
            vec!["ε", "aab", "ab", "b"]
        );

        let (mut table, _) = table_with(|_| false);
        table.add_suffix(&word("ab")).unwrap();
        assert_eq!(table.add_counterexample(&word("aab")).unwrap(), 2);
        assert_eq!(
            table.suffixes().map(|e| e.as_string()).collect_vec(),
            vec!["ε", "ab", "aab", "b"]
        );
    }

    #[test]
    fn depth_bound_limits_boundary_and_suffixes() {
        let mut table = ObservationTable::with_max_depth(CharAlphabet::of_size(2), Some(1));
        table.add_prefix(&word("a")).unwrap();
        assert_eq!(table.boundary(), vec![word("b")]);
        assert_eq!(table.add_counterexample(&word("ab")).unwrap(), 1);
        assert_eq!(table.suffixes().count(), 2);

        assert_eq!(
            table.add_prefix(&word("ab")),
            Err(LearningError::DepthBoundExceeded {
                word: word("ab"),
                depth: 1
            })
        );
        assert!(matches!(
            table.add_suffix(&word("ba")),
            Err(LearningError::DepthBoundExceeded { depth: 1, .. })
        ));
        assert!(!table.is_prefix(&word("ab")));
        assert_eq!(table.suffixes().count(), 2);
    }

    #[test_log::test]
    fn hypothesis_of_closed_table() {
        let (mut table, mut oracle) = table_with(|w| w.contains(&'a'));
        table.add_prefix(&word("a")).unwrap();
        table.fill(&mut oracle).unwrap();
        assert!(table.is_closed() && table.is_consistent());

        let hypothesis = table.hypothesis().unwrap();
        assert_eq!(hypothesis.size(), 2);
        assert!(hypothesis.accepts(&word("ba")));
        assert!(!hypothesis.accepts(&word("bb")));

        let snapshot = hypothesis.snapshot();
        assert_eq!(snapshot.prefixes, vec![vec![], word("a")]);
        assert_eq!(snapshot.boundary, vec![word("b"), word("aa"), word("ab")]);
        assert_eq!(
            snapshot.cells,
            vec![vec![false], vec![true], vec![false], vec![true], vec![true]]
        );
    }

    #[test]
    fn rendering() {
        let (mut table, mut oracle) = table_with(|w| w.contains(&'a'));
        table.fill(&mut oracle).unwrap();
        let shown = table.to_string();
        assert!(shown.contains('ε'));
        assert!(shown.contains('+'));
        assert!(shown.contains('-'));
    }
}
