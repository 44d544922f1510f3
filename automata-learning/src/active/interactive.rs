use std::io::{BufRead, StdinLock, Stdout, Write};

use automata::prelude::*;
use tracing::trace;

use super::{EquivalenceAnswer, EquivalenceOracle, Hypothesis, MembershipOracle, OracleError};

/// An oracle that asks a human. Membership queries are answered with `y` or `n`, equivalence
/// queries with an empty line (the hypothesis is correct) or a counterexample, where `ε`
/// denotes the empty word.
#[derive(Debug)]
pub struct InteractiveOracle<R, W> {
    alphabet: CharAlphabet,
    input: R,
    output: W,
}

impl InteractiveOracle<StdinLock<'static>, Stdout> {
    /// Reads answers from stdin and writes questions to stdout.
    pub fn stdio(alphabet: CharAlphabet) -> Self {
        Self::new(alphabet, std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> InteractiveOracle<R, W> {
    pub fn new(alphabet: CharAlphabet, input: R, output: W) -> Self {
        Self {
            alphabet,
            input,
            output,
        }
    }

    fn ask(&mut self, question: std::fmt::Arguments<'_>) -> Result<String, OracleError> {
        self.output
            .write_fmt(question)
            .and_then(|_| self.output.flush())
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => Err(OracleError::Unavailable("input was closed".to_string())),
            Ok(_) => {
                trace!("received answer {:?}", line.trim());
                Ok(line.trim().to_string())
            }
            Err(e) => Err(OracleError::Unavailable(e.to_string())),
        }
    }

    fn parse_word(&self, answer: &str) -> Result<Vec<char>, OracleError> {
        if matches!(answer, "ε" | "eps") {
            return Ok(vec![]);
        }
        let word = answer.chars().collect::<Vec<_>>();
        match self.alphabet.foreign_symbol(&word) {
            Some(sym) => Err(OracleError::MalformedResponse(format!(
                "{sym} is not a symbol of the alphabet"
            ))),
            None => Ok(word),
        }
    }
}

impl<R: BufRead, W: Write> MembershipOracle for InteractiveOracle<R, W> {
    type Alphabet = CharAlphabet;

    fn alphabet(&self) -> &CharAlphabet {
        &self.alphabet
    }

    fn output(&mut self, word: &[char]) -> Result<bool, OracleError> {
        let answer = self.ask(format_args!("is {} accepted? [y/n] ", word.as_string()))?;
        match answer.to_lowercase().as_str() {
            "y" | "yes" | "1" | "+" => Ok(true),
            "n" | "no" | "0" | "-" => Ok(false),
            other => Err(OracleError::MalformedResponse(format!(
                "expected y or n but got {other:?}"
            ))),
        }
    }
}

impl<R: BufRead, W: Write> EquivalenceOracle<CharAlphabet> for InteractiveOracle<R, W> {
    fn equivalence(
        &mut self,
        hypothesis: &Hypothesis<CharAlphabet>,
    ) -> Result<EquivalenceAnswer<char>, OracleError> {
        let answer = self.ask(format_args!(
            "hypothesis with {} states\n{}\ncounterexample (empty if correct): ",
            hypothesis.size(),
            hypothesis
        ))?;
        if answer.is_empty() {
            return Ok(EquivalenceAnswer::Equivalent);
        }
        self.parse_word(&answer)
            .map(EquivalenceAnswer::Counterexample)
    }
}
