use automata::prelude::*;
use automata_learning::active::{
    bounded_counterexample, EquivalenceAnswer, EquivalenceOracle, Hypothesis, MembershipOracle,
    OracleError,
};
use regex::Regex;

/// Answers queries for the language of a regular expression. The pattern has to match the
/// whole word, equivalence is only checked on words up to a fixed length.
#[derive(Debug, Clone)]
pub struct RegexOracle {
    alphabet: CharAlphabet,
    regex: Regex,
    bound: usize,
}

impl RegexOracle {
    /// Creates a new `RegexOracle` for the given pattern.
    pub fn new(alphabet: CharAlphabet, pattern: &str, bound: usize) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{pattern})$"))?;
        Ok(Self {
            alphabet,
            regex,
            bound,
        })
    }

    /// Checks if the whole input matches the pattern.
    pub fn matches(&self, word: &[char]) -> bool {
        self.regex.is_match(&word.iter().collect::<String>())
    }
}

impl MembershipOracle for RegexOracle {
    type Alphabet = CharAlphabet;

    fn alphabet(&self) -> &CharAlphabet {
        &self.alphabet
    }

    fn output(&mut self, word: &[char]) -> Result<bool, OracleError> {
        Ok(self.matches(word))
    }
}

impl EquivalenceOracle<CharAlphabet> for RegexOracle {
    fn equivalence(
        &mut self,
        hypothesis: &Hypothesis<CharAlphabet>,
    ) -> Result<EquivalenceAnswer<char>, OracleError> {
        Ok(
            match bounded_counterexample(hypothesis, self.bound, |w| Ok(self.matches(w)))? {
                Some(cx) => EquivalenceAnswer::Counterexample(cx),
                None => EquivalenceAnswer::Equivalent,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use automata_learning::LStar;

    use super::*;

    #[test]
    fn patterns_are_anchored() {
        let oracle = RegexOracle::new(CharAlphabet::from("ab"), "a+b", 4).unwrap();
        assert!(oracle.matches(&['a', 'a', 'b']));
        assert!(!oracle.matches(&['a', 'a', 'b', 'b']));
        assert!(!oracle.matches(&['b', 'a', 'b']));
        assert!(!oracle.matches(&[]));
        assert!(RegexOracle::new(CharAlphabet::from("ab"), "(a", 4).is_err());
    }

    #[test_log::test]
    fn learns_a_pattern() {
        let alphabet = CharAlphabet::from("ab");
        let oracle = RegexOracle::new(alphabet.clone(), "(ab)*", 6).unwrap();
        let learned = LStar::new(alphabet, oracle).infer().unwrap();

        // accepting ε and ab, a sink and one state after reading a
        assert_eq!(learned.size(), 3);
        assert!(learned.accepts(['a', 'b', 'a', 'b']));
        assert!(!learned.accepts(['a', 'b', 'a']));
    }
}
