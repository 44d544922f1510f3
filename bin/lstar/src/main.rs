use std::path::PathBuf;

use anyhow::Context;
use automata::prelude::*;
use automata_learning::active::{
    EquivalenceOracle, InteractiveOracle, LStar, LearnerConfig, MembershipOracle, TablePrinter,
};

use tracing::{debug, error, info, trace};
use tracing_subscriber::{filter, prelude::*};

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

mod regex_oracle;
use regex_oracle::RegexOracle;

fn learner_args() -> [Arg; 4] {
    [
        Arg::new("alphabet")
            .short('a')
            .long("alphabet")
            .default_value("ab")
            .help("the symbols of the alphabet, in order"),
        Arg::new("max-depth")
            .long("max-depth")
            .value_parser(value_parser!(usize))
            .help("maximal length of prefixes and suffixes, overrides MAX_DEPTH"),
        Arg::new("export")
            .short('o')
            .long("export")
            .value_parser(value_parser!(PathBuf))
            .help("write the final table and automaton as JSON to this file"),
        Arg::new("show-steps")
            .long("show-steps")
            .action(ArgAction::SetTrue)
            .help("print the table whenever it is closed and consistent"),
    ]
}

fn cli() -> clap::Command {
    Command::new("lstar")
        .about("Learns a deterministic finite automaton with Angluin's L* algorithm")
        .subcommand_required(true)
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbosity")
                .num_args(0..=1)
                .require_equals(true)
                .value_parser(["info", "debug", "trace"])
                .default_missing_value("info"),
        )
        .subcommand(
            Command::new("regex")
                .about("learns the language of a regular expression")
                .arg(
                    Arg::new("pattern")
                        .short('p')
                        .long("pattern")
                        .required(true)
                        .help("the expression, it has to match the whole word"),
                )
                .arg(
                    Arg::new("bound")
                        .short('b')
                        .long("bound")
                        .value_parser(value_parser!(usize))
                        .default_value("8")
                        .help("equivalence is checked on all words up to this length"),
                )
                .args(learner_args()),
        )
        .subcommand(
            Command::new("interactive")
                .about("asks all queries on the terminal")
                .args(learner_args()),
        )
}

fn setup_logging(matches: &ArgMatches) {
    let level = match matches
        .try_get_one::<String>("verbosity")
        .ok()
        .flatten()
        .map(|m| m.as_str())
    {
        Some("trace") => filter::LevelFilter::TRACE,
        Some("debug") => filter::LevelFilter::DEBUG,
        Some("info") => filter::LevelFilter::INFO,
        _ => filter::LevelFilter::WARN,
    };

    let stderr_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(stderr_log.with_filter(level))
        .init();

    trace!("setup {level} logging");
}

fn alphabet(matches: &ArgMatches) -> CharAlphabet {
    matches
        .get_one::<String>("alphabet")
        .map(|symbols| CharAlphabet::from(symbols.as_str()))
        .unwrap_or_else(|| CharAlphabet::of_size(2))
}

fn run<T>(matches: &ArgMatches, alphabet: CharAlphabet, teacher: T) -> anyhow::Result<()>
where
    T: MembershipOracle<Alphabet = CharAlphabet> + EquivalenceOracle<CharAlphabet>,
{
    let mut config = LearnerConfig::from_env();
    if let Some(depth) = matches.get_one::<usize>("max-depth") {
        config = config.with_max_depth(*depth);
    }
    debug!("learning over {:?} with {:?}", alphabet.symbols(), config);

    let printer = matches
        .get_flag("show-steps")
        .then(|| TablePrinter::new(std::io::stderr()));
    let mut learner = LStar::with_config(alphabet, teacher, config).with_logger(printer);

    let learned = match learner.infer() {
        Ok(dfa) => dfa,
        Err(e) => {
            error!("learning failed, the last table was\n{}", learner.table());
            return Err(e.into());
        }
    };

    println!("{}", learner.table());
    println!("{learned}");
    let stats = learner.stats();
    println!(
        "learned {} states with {} membership and {} equivalence queries",
        learned.size(),
        stats.membership_queries,
        stats.equivalence_queries
    );

    if let Some(path) = matches.get_one::<PathBuf>("export") {
        let export = serde_json::json!({
            "table": learner.table().snapshot(),
            "automaton": learned.export(),
        });
        std::fs::write(path, serde_json::to_string_pretty(&export)?)
            .with_context(|| format!("could not write to {}", path.display()))?;
        info!("exported result to {}", path.display());
    }
    Ok(())
}

pub fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();

    setup_logging(&matches);

    match matches.subcommand() {
        Some(("regex", sub_matches)) => {
            let alphabet = alphabet(sub_matches);
            let pattern = sub_matches
                .get_one::<String>("pattern")
                .context("missing pattern")?;
            let bound = sub_matches.get_one::<usize>("bound").copied().unwrap_or(8);
            let oracle = RegexOracle::new(alphabet.clone(), pattern, bound)
                .with_context(|| format!("invalid pattern {pattern}"))?;
            run(sub_matches, alphabet, oracle)
        }
        Some(("interactive", sub_matches)) => {
            let alphabet = alphabet(sub_matches);
            run(
                sub_matches,
                alphabet.clone(),
                InteractiveOracle::stdio(alphabet),
            )
        }
        _ => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn parses_learner_args() {
        let matches = cli()
            .try_get_matches_from(["lstar", "-v=debug", "regex", "-p", "a*", "--max-depth", "4"])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "regex");
        assert_eq!(sub.get_one::<usize>("max-depth"), Some(&4));
        assert_eq!(sub.get_one::<usize>("bound"), Some(&8));
        assert_eq!(alphabet(sub).symbols(), &['a', 'b']);
    }

    #[test_log::test]
    fn run_exports_the_result() {
        let path = std::env::temp_dir().join(format!("lstar-export-{}.json", std::process::id()));
        let matches = cli()
            .try_get_matches_from([
                "lstar",
                "regex",
                "-p",
                "a*",
                "--show-steps",
                "-o",
                path.to_str().unwrap(),
            ])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let alphabet = alphabet(sub);
        let oracle = RegexOracle::new(alphabet.clone(), "a*", 4).unwrap();
        run(sub, alphabet, oracle).unwrap();

        let export: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(export.get("table").is_some());
        assert!(export.get("automaton").is_some());
    }
}
