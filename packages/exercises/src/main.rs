use std::{fs, process};

use anyhow::{Context, Result};
use chomsky::{
    grammar::{
        ChomskyNormalFormGrammar, ContextFreeGrammar, Grammar, LogReport, NormalizationConfig,
        Normalizer, Report, Stage, StageSummary,
    },
    language::EPSILON,
};
use clap::{App, Arg, ArgMatches};
use log::info;

/// Prints every intermediate grammar, or only the final one when quiet.
struct PrintReport {
    quiet: bool,
}

impl Report for PrintReport {
    fn report(&mut self, stage: Stage, grammar: &ContextFreeGrammar) {
        if !self.quiet || stage == Stage::Binarized {
            println!("{}:\n{}", stage, grammar.definition());
        }
    }
}

fn lab_grammar() -> Result<ContextFreeGrammar> {
    let grammar = ContextFreeGrammar::new(
        ["S", "A", "B", "C", "D"],
        ["a", "b"],
        "S",
        [
            ("S", vec!["AC", "bA", "B", "aA"]),
            ("A", vec![EPSILON, "aS", "ABab"]),
            ("B", vec!["a", "bS"]),
            ("C", vec!["abC"]),
            ("D", vec!["AB"]),
        ],
    )?;

    Ok(grammar)
}

fn load_grammar(matches: &ArgMatches) -> Result<ContextFreeGrammar> {
    let Some(path) = matches.value_of("grammar") else {
        info!("no grammar file given, using the lab grammar");
        return lab_grammar();
    };

    let text =
        fs::read_to_string(path).with_context(|| format!("could not read grammar file {path}"))?;
    let grammar = ContextFreeGrammar::from_text(&text, matches.value_of("start"))
        .with_context(|| format!("could not parse grammar file {path}"))?;

    Ok(grammar)
}

fn run(matches: &ArgMatches) -> Result<()> {
    let mut grammar = load_grammar(matches)?;

    let mut config = NormalizationConfig::default();
    if let Some(prefix) = matches.value_of("terminal-prefix") {
        config.terminal_prefix = prefix.to_owned();
    }
    if let Some(prefix) = matches.value_of("chain-prefix") {
        config.chain_prefix = prefix.to_owned();
    }

    let mut printer = PrintReport {
        quiet: matches.is_present("quiet"),
    };
    let mut summary = StageSummary::default();

    let normalizer = Normalizer::new(config);
    info!(
        "fresh non-terminals use the prefixes `{}` and `{}`",
        normalizer.config().terminal_prefix,
        normalizer.config().chain_prefix
    );

    normalizer.normalize(
        &mut grammar,
        &mut (&mut printer, (&mut summary, LogReport)),
    );

    let cnf = ChomskyNormalFormGrammar::try_from(&grammar)?;
    info!(
        "Chomsky normal form reached with {} productions",
        cnf.production_count()
    );

    if !printer.quiet {
        println!("{}", summary);
    }

    Ok(())
}

fn main() {
    env_logger::init();

    let matches = App::new("exercises")
        .about("Brings a context-free grammar into Chomsky normal form")
        .arg(
            Arg::with_name("grammar")
                .help("grammar file, one rule such as `S → aSb | ε` per line")
                .index(1),
        )
        .arg(
            Arg::with_name("start")
                .help("start symbol, defaults to the left-hand side of the first rule")
                .short("s")
                .long("start")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("terminal-prefix")
                .help("prefix of the non-terminals that stand in for terminals")
                .long("terminal-prefix")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("chain-prefix")
                .help("prefix of the non-terminals that split long right-hand sides")
                .long("chain-prefix")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("quiet")
                .help("only print the final grammar")
                .short("q")
                .long("quiet"),
        )
        .get_matches();

    if let Err(error) = run(&matches) {
        eprintln!("error: {error:#}");
        process::exit(1);
    }
}
