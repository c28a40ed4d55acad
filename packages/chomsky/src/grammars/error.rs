use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("start symbol `{0}` is not a non-terminal of the grammar")]
    InvalidStartSymbol(String),

    #[error("`{0}` is not a non-terminal, so it cannot have productions")]
    UnknownNonTerminal(String),

    #[error("production `{lhs} → {rhs}` references unknown symbol `{symbol}`")]
    UnknownSymbol {
        lhs: String,
        rhs: String,
        symbol: String,
    },

    #[error("`{0}` is declared both as a terminal and as a non-terminal")]
    OverlappingVocabularies(String),

    #[error("symbol names cannot be empty")]
    EmptySymbolName,

    #[error("`{0}` denotes the empty word and cannot name a symbol")]
    ReservedSymbolName(String),

    #[error("invalid production `{input}`:\n{message}")]
    Parse { input: String, message: String },

    #[error("production `{lhs} → {rhs}` is not in Chomsky normal form: {reason}")]
    NotInChomskyNormalForm {
        lhs: String,
        rhs: String,
        reason: String,
    },
}

pub type Result<T, E = GrammarError> = std::result::Result<T, E>;
