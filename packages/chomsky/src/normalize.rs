//! The normalization pipeline: ε-productions, unit productions, inaccessible
//! and non-productive symbols are removed in that order, then the grammar is
//! brought into Chomsky normal form.

use std::fmt;

use derive_more::Display;
use itertools::Itertools;
use log::{debug, info};
use tabled::{builder::Builder, settings::Style};

use crate::grammars::{
    chomsky_normal_form::FreshNames,
    context_free::ContextFreeGrammar,
    types::Grammar,
};

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    #[display("Original grammar")]
    Original,
    #[display("1. After eliminating ε-productions")]
    ErasingProductions,
    #[display("2. After eliminating unit productions")]
    UnitProductions,
    #[display("3. After eliminating inaccessible symbols")]
    InaccessibleSymbols,
    #[display("4. After eliminating non-productive symbols")]
    NonProductiveSymbols,
    #[display("5a. After replacing terminals with non-terminals")]
    TerminalsReplaced,
    #[display("5b. After breaking down into CNF")]
    Binarized,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Original,
        Stage::ErasingProductions,
        Stage::UnitProductions,
        Stage::InaccessibleSymbols,
        Stage::NonProductiveSymbols,
        Stage::TerminalsReplaced,
        Stage::Binarized,
    ];
}

/// Receives the grammar after every stage. Reports are for inspection only
/// and cannot influence the pipeline.
pub trait Report {
    fn report(&mut self, stage: Stage, grammar: &ContextFreeGrammar);
}

impl Report for () {
    fn report(&mut self, _stage: Stage, _grammar: &ContextFreeGrammar) {}
}

impl<R: Report + ?Sized> Report for &mut R {
    fn report(&mut self, stage: Stage, grammar: &ContextFreeGrammar) {
        (**self).report(stage, grammar);
    }
}

impl<A: Report, B: Report> Report for (A, B) {
    fn report(&mut self, stage: Stage, grammar: &ContextFreeGrammar) {
        self.0.report(stage, grammar);
        self.1.report(stage, grammar);
    }
}

/// Logs every intermediate grammar at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReport;

impl Report for LogReport {
    fn report(&mut self, stage: Stage, grammar: &ContextFreeGrammar) {
        info!("{}\n{}", stage, grammar.definition());
    }
}

/// Keeps the rendering of every intermediate grammar.
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    entries: Vec<(Stage, String)>,
}

impl Transcript {
    pub fn entries(&self) -> &[(Stage, String)] {
        &self.entries
    }

    pub fn get(&self, stage: Stage) -> Option<&str> {
        self.entries
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, definition)| definition.as_str())
    }
}

impl Report for Transcript {
    fn report(&mut self, stage: Stage, grammar: &ContextFreeGrammar) {
        self.entries.push((stage, grammar.definition()));
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (stage, definition) in &self.entries {
            writeln!(f, "{}\n{}", stage, definition)?;
        }

        Ok(())
    }
}

/// Counts non-terminals and productions after every stage.
#[derive(Debug, Default, Clone)]
pub struct StageSummary {
    rows: Vec<(Stage, usize, usize)>,
}

impl StageSummary {
    pub fn rows(&self) -> &[(Stage, usize, usize)] {
        &self.rows
    }
}

impl Report for StageSummary {
    fn report(&mut self, stage: Stage, grammar: &ContextFreeGrammar) {
        self.rows.push((
            stage,
            grammar.non_terminals().len(),
            grammar.production_count(),
        ));
    }
}

impl fmt::Display for StageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = Builder::default();

        builder.push_record(["Stage", "Non-terminals", "Productions"].map(String::from));
        for (stage, non_terminals, productions) in &self.rows {
            builder.push_record([
                stage.to_string(),
                non_terminals.to_string(),
                productions.to_string(),
            ]);
        }

        let mut table = builder.build();
        table.with(Style::rounded());

        write!(f, "{}", table)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizationConfig {
    /// Prefix of the non-terminals standing in for terminals, `T_` gives `T_a`.
    pub terminal_prefix: String,
    /// Prefix of the non-terminals that split long right-hand sides, `X` gives
    /// `X1`, `X2`, ...
    pub chain_prefix: String,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            terminal_prefix: "T_".to_owned(),
            chain_prefix: "X".to_owned(),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Normalizer {
    config: NormalizationConfig,
}

impl Normalizer {
    pub fn new(config: NormalizationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizationConfig {
        &self.config
    }

    /// Brings `grammar` into Chomsky normal form in place, handing it to
    /// `report` after every stage.
    pub fn normalize(&self, grammar: &mut ContextFreeGrammar, report: &mut impl Report) {
        report.report(Stage::Original, grammar);

        grammar.eliminate_erasing_productions();
        self.finish(Stage::ErasingProductions, grammar, report);

        grammar.eliminate_unit_productions();
        self.finish(Stage::UnitProductions, grammar, report);

        grammar.remove_inaccessible_symbols();
        self.finish(Stage::InaccessibleSymbols, grammar, report);

        let removed = grammar.remove_non_productive_symbols();
        if !removed.is_empty() {
            // Dropped productions may have been the only way to reach a symbol.
            let orphaned = grammar.remove_inaccessible_symbols();
            if !orphaned.is_empty() {
                debug!(
                    "orphaned by non-productive symbols: {{{}}}",
                    orphaned.iter().join(", ")
                );
            }
        }
        self.finish(Stage::NonProductiveSymbols, grammar, report);

        let mut names = FreshNames::with_prefixes(
            grammar,
            self.config.terminal_prefix.as_str(),
            self.config.chain_prefix.as_str(),
        );

        grammar.isolate_terminals(&mut names);
        self.finish(Stage::TerminalsReplaced, grammar, report);

        grammar.binarize(&mut names);
        self.finish(Stage::Binarized, grammar, report);
    }

    fn finish(&self, stage: Stage, grammar: &ContextFreeGrammar, report: &mut impl Report) {
        info!(
            "{}: {} non-terminals, {} productions",
            stage,
            grammar.non_terminals().len(),
            grammar.production_count()
        );

        report.report(stage, grammar);
    }
}
