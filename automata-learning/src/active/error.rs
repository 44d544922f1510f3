use std::fmt::Display;

use automata::prelude::*;
use thiserror::Error;

/// The ways in which an oracle may fail to answer a query.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum OracleError {
    /// The oracle could not be reached or stopped working.
    #[error("oracle is unavailable: {0}")]
    Unavailable(String),
    /// The reply did not parse into the expected shape.
    #[error("malformed oracle response: {0}")]
    MalformedResponse(String),
}

/// A query posed by the learner, used to point out which query failed.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Query<S> {
    /// A membership query for the given word.
    Membership(Vec<S>),
    /// An equivalence query for the current hypothesis.
    Equivalence,
}

impl<S: Symbol> Display for Query<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Query::Membership(word) => write!(f, "membership query for {}", word.as_string()),
            Query::Equivalence => write!(f, "equivalence query"),
        }
    }
}

/// Everything that can abort a run of the learner. All of them are fatal, the observation
/// table stays in its last valid state and can be inspected afterwards.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum LearningError<S: Symbol> {
    #[error("symbol {} of word {} is not part of the alphabet", .symbol.show(), .word.as_string())]
    InvalidSymbol { symbol: S, word: Vec<S> },
    #[error("{query} failed, oracle is unavailable: {reason}")]
    OracleUnavailable { query: Query<S>, reason: String },
    #[error("{query} failed, malformed oracle response: {reason}")]
    OracleMalformedResponse { query: Query<S>, reason: String },
    #[error("counterexample {} is classified identically by hypothesis and target", .word.as_string())]
    UnsoundCounterexample { word: Vec<S> },
    #[error("{} exceeds the maximal depth of {depth}", .word.as_string())]
    DepthBoundExceeded { word: Vec<S>, depth: usize },
    #[error("iteration threshold of {0} exceeded")]
    IterationThresholdExceeded(usize),
}

impl<S: Symbol> LearningError<S> {
    /// Attaches the failing query to an [`OracleError`].
    pub fn from_oracle(query: Query<S>, error: OracleError) -> Self {
        match error {
            OracleError::Unavailable(reason) => Self::OracleUnavailable { query, reason },
            OracleError::MalformedResponse(reason) => {
                Self::OracleMalformedResponse { query, reason }
            }
        }
    }

    /// Returns the query that triggered the error, if it was caused by an oracle.
    pub fn query(&self) -> Option<&Query<S>> {
        match self {
            Self::OracleUnavailable { query, .. } | Self::OracleMalformedResponse { query, .. } => {
                Some(query)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_query() {
        let err = LearningError::from_oracle(
            Query::Membership(vec!['a', 'b']),
            OracleError::Unavailable("connection reset".into()),
        );
        assert_eq!(
            err.to_string(),
            "membership query for ab failed, oracle is unavailable: connection reset"
        );
        assert_eq!(err.query(), Some(&Query::Membership(vec!['a', 'b'])));

        let err: LearningError<char> = LearningError::from_oracle(
            Query::Equivalence,
            OracleError::MalformedResponse("expected y or n".into()),
        );
        assert!(matches!(err, LearningError::OracleMalformedResponse { .. }));

        let err: LearningError<char> = LearningError::UnsoundCounterexample { word: vec![] };
        assert_eq!(
            err.to_string(),
            "counterexample ε is classified identically by hypothesis and target"
        );
    }
}
