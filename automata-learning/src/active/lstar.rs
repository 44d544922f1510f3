use std::fmt::Debug;

use automata::prelude::*;
use tracing::{debug, info, trace, warn};

use super::{
    EquivalenceAnswer, EquivalenceOracle, Hypothesis, LStarLogger, LStarQuery, LearningError,
    MembershipOracle, ObservationTable, OracleError, Query, Stage,
};

const ITERATION_THRESHOLD: usize = if cfg!(debug_assertions) { 300 } else { 200000 };

type Word<A> = Vec<SymbolOf<A>>;

/// Settings of a learner, they are fixed once the learner is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LearnerConfig {
    /// Upper bound on the length of prefixes and suffixes, `None` means unbounded.
    pub max_depth: Option<usize>,
    /// The number of refinement cycles after which [`LStar::infer`] gives up.
    pub max_iterations: usize,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            max_iterations: ITERATION_THRESHOLD,
        }
    }
}

impl LearnerConfig {
    /// Reads `MAX_ITERATIONS` and `MAX_DEPTH` from the environment, falling back to the
    /// defaults for variables that are unset or do not hold a number.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(iterations) = read_env("MAX_ITERATIONS") {
            config.max_iterations = iterations;
        }
        config.max_depth = read_env("MAX_DEPTH");
        config
    }

    pub fn with_max_depth(self, max_depth: usize) -> Self {
        Self {
            max_depth: Some(max_depth),
            ..self
        }
    }

    pub fn with_max_iterations(self, max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..self
        }
    }
}

fn read_env(key: &str) -> Option<usize> {
    let value = std::env::var(key).ok()?;
    match value.parse() {
        Ok(n) => Some(n),
        Err(e) => {
            warn!("ignoring {key}={value}: {e}");
            None
        }
    }
}

/// The phases of a learner. A refinement cycle starts in [`Phase::Filling`] and ends either
/// back there, after the table was extended, or in [`Phase::Done`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Filling,
    ClosureCheck,
    ConsistencyCheck,
    EquivalenceCheck,
    Done,
}

/// Counts what a learner did so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LStarStats {
    /// Membership queries that reached the oracle, answers from the cache are not counted.
    pub membership_queries: usize,
    pub equivalence_queries: usize,
    pub counterexamples: usize,
    pub cycles: usize,
}

/// An implementation of the L* algorithm. The learner owns its observation table and a
/// teacher which answers both membership and equivalence queries, see [`super::Mat`] for
/// combining two separate oracles.
///
/// Every membership answer is cached, so the teacher is never asked the same word twice.
pub struct LStar<A: Alphabet, T, L = ()> {
    config: LearnerConfig,
    table: ObservationTable<A>,
    teacher: T,
    logger: L,
    cache: math::Map<Word<A>, bool>,
    phase: Phase,
    stats: LStarStats,
    result: Option<DFA<A>>,
}

/// Answers membership queries from the cache of the learner and only forwards words that
/// were not asked before to the teacher.
struct Cached<'a, T: MembershipOracle, L> {
    teacher: &'a mut T,
    cache: &'a mut math::Map<Word<T::Alphabet>, bool>,
    logger: &'a mut L,
    stats: &'a mut LStarStats,
}

impl<T: MembershipOracle, L: LStarLogger<T::Alphabet>> MembershipOracle for Cached<'_, T, L> {
    type Alphabet = T::Alphabet;

    fn alphabet(&self) -> &Self::Alphabet {
        self.teacher.alphabet()
    }

    fn output(&mut self, word: &[SymbolOf<Self::Alphabet>]) -> Result<bool, OracleError> {
        if let Some(output) = self.cache.get(word) {
            return Ok(*output);
        }
        let output = self.teacher.output(word)?;
        self.stats.membership_queries += 1;
        self.cache.insert(word.to_vec(), output);
        self.logger.log(LStarQuery::Membership(word.to_vec(), output));
        Ok(output)
    }
}

impl<A, T> LStar<A, T>
where
    A: Alphabet,
    T: MembershipOracle<Alphabet = A> + EquivalenceOracle<A>,
{
    pub fn new(alphabet: A, teacher: T) -> Self {
        Self::with_config(alphabet, teacher, LearnerConfig::default())
    }

    pub fn with_config(alphabet: A, teacher: T, config: LearnerConfig) -> Self {
        Self {
            table: ObservationTable::with_max_depth(alphabet, config.max_depth),
            config,
            teacher,
            logger: (),
            cache: math::Map::default(),
            phase: Phase::Filling,
            stats: LStarStats::default(),
            result: None,
        }
    }
}

impl<A, T, L> LStar<A, T, L>
where
    A: Alphabet,
    T: MembershipOracle<Alphabet = A> + EquivalenceOracle<A>,
    L: LStarLogger<A>,
{
    /// Replaces the logger, which is told about every answered query.
    pub fn with_logger<M: LStarLogger<A>>(self, logger: M) -> LStar<A, T, M> {
        LStar {
            config: self.config,
            table: self.table,
            teacher: self.teacher,
            logger,
            cache: self.cache,
            phase: self.phase,
            stats: self.stats,
            result: self.result,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn table(&self) -> &ObservationTable<A> {
        &self.table
    }

    pub fn stats(&self) -> LStarStats {
        self.stats
    }

    pub fn config(&self) -> &LearnerConfig {
        &self.config
    }

    pub fn teacher(&self) -> &T {
        &self.teacher
    }

    pub fn logger(&self) -> &L {
        &self.logger
    }

    pub fn into_logger(self) -> L {
        self.logger
    }

    /// The learned automaton, available once the learner is [`Phase::Done`].
    pub fn result(&self) -> Option<&DFA<A>> {
        self.result.as_ref()
    }

    fn split(&mut self) -> (&mut ObservationTable<A>, Cached<'_, T, L>) {
        let Self {
            table,
            teacher,
            logger,
            cache,
            stats,
            ..
        } = self;
        (
            table,
            Cached {
                teacher,
                cache,
                logger,
                stats,
            },
        )
    }

    /// Performs a single transition and returns the phase the learner is in afterwards. If
    /// an error occurs, the phase does not change and the table keeps everything that was
    /// observed up to that point. Queries that were answered before the error are still
    /// counted in [`Self::stats`] and reported to the logger, this includes an equivalence
    /// query whose counterexample is then rejected.
    pub fn step(&mut self) -> Result<Phase, LearningError<SymbolOf<A>>> {
        let next = match self.phase {
            Phase::Filling => {
                let (table, mut membership) = self.split();
                table.fill(&mut membership)?;
                trace!("table after filling\n{}", self.table);
                Phase::ClosureCheck
            }
            Phase::ClosureCheck => match self.table.unclosed_row() {
                Some(word) => {
                    debug!("table is not closed, promoting {}", word.as_string());
                    self.table.add_prefix(&word)?;
                    Phase::Filling
                }
                None => Phase::ConsistencyCheck,
            },
            Phase::ConsistencyCheck => match self.table.inconsistency() {
                Some(inconsistency) => {
                    let experiment = inconsistency.experiment();
                    debug!("table is not consistent, adding {}", experiment.as_string());
                    self.table.add_suffix(&experiment)?;
                    Phase::Filling
                }
                None => {
                    self.logger.observe(&self.table, Stage::Stable);
                    Phase::EquivalenceCheck
                }
            },
            Phase::EquivalenceCheck => self.check_equivalence()?,
            Phase::Done => Phase::Done,
        };

        if next != self.phase {
            trace!("moving from {:?} to {:?}", self.phase, next);
        }
        self.phase = next;
        Ok(next)
    }

    fn check_equivalence(&mut self) -> Result<Phase, LearningError<SymbolOf<A>>> {
        let hypothesis = self.table.hypothesis()?;
        let answer = self
            .teacher
            .equivalence(&hypothesis)
            .map_err(|e| LearningError::from_oracle(Query::Equivalence, e))?;
        self.stats.equivalence_queries += 1;

        match answer {
            EquivalenceAnswer::Equivalent => {
                debug!("hypothesis with {} states was accepted", hypothesis.size());
                self.logger.log(LStarQuery::Equivalence {
                    states: hypothesis.size(),
                    counterexample: None,
                });
                self.logger.observe(&self.table, Stage::Final);
                self.result = Some(hypothesis.into_automaton());
                Ok(Phase::Done)
            }
            EquivalenceAnswer::Counterexample(counterexample) => {
                debug!(
                    "hypothesis with {} states was refuted by {}",
                    hypothesis.size(),
                    counterexample.as_string()
                );
                self.logger.log(LStarQuery::Equivalence {
                    states: hypothesis.size(),
                    counterexample: Some(counterexample.clone()),
                });
                self.stats.counterexamples += 1;
                self.process_counterexample(&hypothesis, counterexample)?;
                Ok(Phase::Filling)
            }
        }
    }

    /// Checks that the counterexample is genuine and adds all of its non-empty tails as
    /// suffixes. Since the suffixes are closed under taking tails and the prefixes under
    /// taking prefixes, a genuine counterexample always yields at least one new suffix
    /// unless the depth bound prevents it.
    fn process_counterexample(
        &mut self,
        hypothesis: &Hypothesis<A>,
        counterexample: Word<A>,
    ) -> Result<(), LearningError<SymbolOf<A>>> {
        self.table.validate(&counterexample)?;

        let (table, mut membership) = self.split();
        let expected = membership.output(&counterexample).map_err(|e| {
            LearningError::from_oracle(Query::Membership(counterexample.clone()), e)
        })?;
        if expected == hypothesis.accepts(&counterexample) {
            return Err(LearningError::UnsoundCounterexample {
                word: counterexample,
            });
        }

        if table.add_counterexample(&counterexample)? == 0 {
            return Err(match self.config.max_depth {
                Some(depth) => LearningError::DepthBoundExceeded {
                    word: counterexample,
                    depth,
                },
                None => LearningError::UnsoundCounterexample {
                    word: counterexample,
                },
            });
        }
        Ok(())
    }

    /// Steps until the learner is back in [`Phase::Filling`] or [`Phase::Done`]. A cycle
    /// ends as soon as the table was extended once. The table then has unfilled cells and
    /// need not be closed or consistent, but every answer so far is kept and the run can be
    /// resumed.
    pub fn cycle(&mut self) -> Result<Phase, LearningError<SymbolOf<A>>> {
        if self.phase == Phase::Done {
            return Ok(Phase::Done);
        }
        self.stats.cycles += 1;
        loop {
            match self.step()? {
                phase @ (Phase::Filling | Phase::Done) => return Ok(phase),
                _ => continue,
            }
        }
    }

    /// Runs the learner to completion and returns the learned automaton.
    pub fn infer(&mut self) -> Result<DFA<A>, LearningError<SymbolOf<A>>> {
        let start = std::time::Instant::now();

        while self.phase != Phase::Done {
            if self.stats.cycles >= self.config.max_iterations {
                warn!(
                    "giving up after {} cycles, the table is\n{}",
                    self.stats.cycles, self.table
                );
                return Err(LearningError::IterationThresholdExceeded(
                    self.config.max_iterations,
                ));
            }
            self.cycle()?;
        }

        let learned = self
            .result
            .clone()
            .expect("a finished learner always has a result");
        info!(
            "learned automaton with {} states in {}, using {} membership and {} equivalence queries",
            learned.size(),
            show_duration(start.elapsed()),
            self.stats.membership_queries,
            self.stats.equivalence_queries
        );
        Ok(learned)
    }
}

impl<A: Alphabet, T, L> Debug for LStar<A, T, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "LStar in {:?} after {:?}", self.phase, self.stats)?;
        write!(f, "{}", self.table)
    }
}
