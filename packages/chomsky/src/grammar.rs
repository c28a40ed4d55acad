pub use crate::{
    grammars::{
        chomsky_normal_form::{ChomskyNormalFormGrammar, CnfWord, FreshNames},
        context_free::ContextFreeGrammar,
        error::{GrammarError, Result},
        types::{Grammar, NonTerminal, ProductionSymbol, ProductionWord, Terminal},
    },
    language::{Symbol, Word, EPSILON},
    normalize::{
        LogReport, NormalizationConfig, Normalizer, Report, Stage, StageSummary, Transcript,
    },
};
