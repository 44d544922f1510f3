mod error;
pub use error::{LearningError, OracleError, Query};

mod observationtable;
pub use observationtable::{Inconsistency, ObservationTable, Row, TableSnapshot};

pub(crate) mod oracle;
pub use oracle::*;

mod interactive;
pub use interactive::InteractiveOracle;

mod hypothesis;
pub use hypothesis::Hypothesis;

mod logging;
pub use logging::{LStarLogbook, LStarLogger, LStarQuery, Stage, TablePrinter};

mod lstar;
pub use lstar::*;

#[cfg(test)]
mod tests {
    use automata::prelude::*;

    use super::{BoundedOracle, DFAOracle, LStar, LStarLogbook};

    #[test_log::test]
    fn lstar_contains_an_a() {
        let alphabet = CharAlphabet::of_size(2);
        let oracle = BoundedOracle::new(alphabet.clone(), 3, |w: &[char]| w.contains(&'a'));
        let mut learner = LStar::new(alphabet, oracle).with_logger(LStarLogbook::default());

        let learned = learner.infer().unwrap();
        assert_eq!(learned.size(), 2);
        assert!(learned.accepts(['b', 'b', 'a']));
        assert!(!learned.accepts(['b', 'b']));
        assert_eq!(learner.stats().equivalence_queries, 1);
        assert_eq!(learner.stats().counterexamples, 0);
        assert!(learner.logger().is_sane());
    }

    #[test_log::test]
    fn lstar_modulo_three() {
        let alphabet = CharAlphabet::of_size(2);
        let target = DFA::builder(alphabet.clone())
            .with_states([true, false, false])
            .with_edges([
                (0, 'a', 1),
                (0, 'b', 0),
                (1, 'a', 2),
                (1, 'b', 1),
                (2, 'a', 0),
                (2, 'b', 2),
            ])
            .into_dfa(0)
            .unwrap();

        let mut learner = LStar::new(alphabet, DFAOracle::new(target.clone()));
        let learned = learner.infer().unwrap();
        assert_eq!(learned.size(), 3);
        assert!(learned.equivalent(&target));
    }
}
