use automata::prelude::*;
use automata_learning::active::{
    BoundedOracle, DFAOracle, FnOracle, LStar, LStarLogbook, LStarQuery, Mat, ObservationTable,
    Phase, TablePrinter,
};

fn word(w: &str) -> Vec<char> {
    w.chars().collect()
}

#[test_log::test]
fn words_containing_an_a() {
    let alphabet = CharAlphabet::of_size(2);
    let teacher = BoundedOracle::new(alphabet.clone(), 3, |w: &[char]| w.contains(&'a'));
    let mut learner = LStar::new(alphabet, teacher).with_logger(LStarLogbook::default());

    let learned = learner.infer().unwrap();
    assert_eq!(learned.size(), 2);
    for w in FreeMonoid::over(learned.alphabet()).up_to_length(4) {
        assert_eq!(learned.accepts(&w), w.contains(&'a'));
    }
    assert_eq!(learner.stats().equivalence_queries, 1);
    assert_eq!(learner.stats().counterexamples, 0);
    assert!(learner.logger().is_sane());
}

#[test_log::test]
fn only_the_empty_word() {
    let alphabet = CharAlphabet::of_size(1);
    let teacher = BoundedOracle::new(alphabet.clone(), 3, |w: &[char]| w.is_empty());
    let mut learner = LStar::new(alphabet, teacher).with_logger(LStarLogbook::default());

    let learned = learner.infer().unwrap();
    assert_eq!(learned.size(), 2);
    assert!(learned.accepts(word("")));
    assert!(!learned.accepts(['a']));
    assert_eq!(learner.stats().equivalence_queries, 1);
    assert_eq!(learner.stats().counterexamples, 0);

    let table = learner.table();
    assert_eq!(table.prefixes().count(), 2);
    assert_eq!(table.suffixes().count(), 1);
    assert!(matches!(
        learner.logger().queries().last(),
        Some(LStarQuery::Equivalence {
            states: 2,
            counterexample: None
        })
    ));
}

#[test_log::test]
fn third_symbol_from_the_end() {
    // accepts all words whose third to last symbol is an a
    let alphabet = CharAlphabet::of_size(2);
    let mut builder = DFA::builder(alphabet.clone()).with_states((0..8).map(|q| q >= 4));
    for q in 0..8usize {
        builder = builder.with_edges([
            (q, 'a', ((q << 1) & 7) | 1),
            (q, 'b', (q << 1) & 7),
        ]);
    }
    // the state remembers the last three symbols, with the oldest one in the highest bit
    let target = builder.into_dfa(0).unwrap();
    assert!(target.accepts(word("abb")));
    assert!(!target.accepts(word("bab")));

    let mut learner = LStar::new(alphabet, DFAOracle::new(target.clone()));
    let learned = learner.infer().unwrap();
    assert_eq!(learned.size(), 8);
    assert!(learned.equivalent(&target));
    assert!(learner.table().is_closed());
    assert!(learner.table().is_consistent());
    assert_eq!(learner.phase(), Phase::Done);
}

#[test_log::test]
fn counterexamples_extend_the_suffixes() {
    // only "aab" is accepted, the first hypothesis rejects everything
    let alphabet = CharAlphabet::of_size(2);
    let membership = FnOracle::new(alphabet.clone(), |w: &[char]| w == ['a', 'a', 'b']);
    let equivalence = BoundedOracle::new(alphabet.clone(), 3, |w: &[char]| w == ['a', 'a', 'b']);
    let mut learner = LStar::new(alphabet, Mat::new(membership, equivalence));

    while learner.stats().counterexamples == 0 {
        learner.cycle().unwrap();
    }
    let suffixes = learner
        .table()
        .suffixes()
        .map(|e| e.as_string())
        .collect::<Vec<_>>();
    assert_eq!(suffixes, vec!["ε", "aab", "ab", "b"]);

    let learned = learner.infer().unwrap();
    assert!(learned.accepts(word("aab")));
    assert!(!learned.accepts(word("ab")));
}

#[test_log::test]
fn final_table_is_printed() {
    let alphabet = CharAlphabet::of_size(2);
    let teacher = BoundedOracle::new(alphabet.clone(), 3, |w: &[char]| w.len() % 2 == 1);
    let mut learner = LStar::new(alphabet, teacher).with_logger(TablePrinter::new(vec![]));
    learner.infer().unwrap();

    let printed = String::from_utf8(learner.into_logger().into_inner()).unwrap();
    assert!(printed.contains("closed and consistent table"));
    assert!(printed.contains("final table"));
}

#[test_log::test]
fn snapshot_as_json() {
    let alphabet = CharAlphabet::of_size(2);
    let mut teacher = BoundedOracle::new(alphabet.clone(), 2, |w: &[char]| w.contains(&'a'));
    let mut table = ObservationTable::new(alphabet);
    table.fill(&mut teacher).unwrap();

    let json = serde_json::to_value(table.snapshot()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "prefixes": [[]],
            "boundary": [["a"], ["b"]],
            "suffixes": [[]],
            "cells": [[false], [true], [false]],
        })
    );
}
