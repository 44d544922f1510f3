//! A library for learning automata from queries.
//!
//! The [`active`] module contains an implementation of Angluin's L* algorithm, which infers
//! a minimal [`automata::dfa::DFA`] for an unknown regular language by posing membership and
//! equivalence queries to a minimally adequate teacher.
#![allow(missing_docs)]

/// Deals with active learning algorithms such as L*.
pub mod active;

pub use active::{LStar, LearnerConfig, LearningError};
