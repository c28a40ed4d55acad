use std::{
    borrow::{Borrow, Cow},
    fmt,
    hash::Hash,
};

use derive_more::Display;
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;

use crate::language::{Symbol, Word, EPSILON};

/// Rendered in place of the alternatives of a non-terminal that has none.
pub const EMPTY_SET: &str = "∅";

#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Terminal(pub Symbol);

#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonTerminal(pub Symbol);

impl Terminal {
    pub fn new(name: impl Into<String>) -> Self {
        Terminal(Symbol::new(name))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl NonTerminal {
    pub fn new(name: impl Into<String>) -> Self {
        NonTerminal(Symbol::new(name))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

// Hashing a newtype hashes its name, so names can be looked up by `&str`.
impl Borrow<str> for Terminal {
    fn borrow(&self) -> &str {
        self.0.as_str()
    }
}

impl Borrow<str> for NonTerminal {
    fn borrow(&self) -> &str {
        self.0.as_str()
    }
}

#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProductionSymbol {
    Terminal(Terminal),
    NonTerminal(NonTerminal),
}

impl ProductionSymbol {
    pub fn as_non_terminal(&self) -> Option<&NonTerminal> {
        match self {
            ProductionSymbol::NonTerminal(nt) => Some(nt),
            ProductionSymbol::Terminal(_) => None,
        }
    }
}

impl Word<ProductionSymbol> {
    /// The target of a unit production `A → B`, if this word is one.
    pub fn as_unit(&self) -> Option<&NonTerminal> {
        match self.0.as_slice() {
            [ProductionSymbol::NonTerminal(nt)] => Some(nt),
            _ => None,
        }
    }

    pub fn non_terminals(&self) -> impl Iterator<Item = &NonTerminal> + '_ {
        self.0.iter().filter_map(ProductionSymbol::as_non_terminal)
    }
}

pub trait ProductionWord: fmt::Display + Clone + Eq + Hash {
    fn to_word(&self) -> Word<ProductionSymbol>;
}

impl ProductionWord for Word<ProductionSymbol> {
    fn to_word(&self) -> Word<ProductionSymbol> {
        Word(self.0.clone())
    }
}

pub trait Grammar<R: ProductionWord> {
    fn start_symbol(&self) -> &NonTerminal;
    fn non_terminals(&self) -> &IndexSet<NonTerminal>;
    fn terminals(&self) -> &IndexSet<Terminal>;
    fn erasing_productions(&self) -> Cow<'_, IndexSet<NonTerminal>>;
    fn productions(&self) -> &IndexMap<NonTerminal, IndexSet<R>>;

    fn production_count(&self) -> usize {
        self.productions().values().map(IndexSet::len).sum::<usize>()
            + self
                .erasing_productions()
                .iter()
                .filter(|lhs| {
                    !self
                        .productions()
                        .get(*lhs)
                        .is_some_and(|rhs| rhs.iter().any(|word| word.to_word().is_empty()))
                })
                .count()
    }

    /// Renders the grammar as `G = (N, T, P, S)` followed by one line per
    /// non-terminal, start symbol first and the rest sorted.
    fn definition(&self) -> String {
        let start_symbol = self.start_symbol();
        let erasing_productions = self.erasing_productions();
        let productions = self.productions();

        let mut non_terminals = self.non_terminals().clone();
        non_terminals.sort_by(|a, b| {
            if a == start_symbol {
                return std::cmp::Ordering::Less;
            }
            if b == start_symbol {
                return std::cmp::Ordering::Greater;
            }
            a.cmp(b)
        });

        let mut terminals = self.terminals().clone();
        terminals.sort();

        let mut definition = format!(
            "G = ({{{}}}, {{{}}}, P, {})\n\n",
            non_terminals.iter().join(", "),
            terminals.iter().join(", "),
            start_symbol
        );

        definition += "P = {\n";

        for lhs in &non_terminals {
            let rhs = productions.get(lhs);
            let mut alternatives = Vec::new();

            let has_empty_word =
                rhs.is_some_and(|rhs| rhs.iter().any(|word| word.to_word().is_empty()));
            if erasing_productions.contains(lhs) && !has_empty_word {
                alternatives.push(EPSILON.to_owned());
            }

            alternatives.extend(rhs.into_iter().flatten().map(ToString::to_string));

            if alternatives.is_empty() {
                definition += &format!("  {} → {}\n", lhs, EMPTY_SET);
            } else {
                definition += &format!("  {} → {}\n", lhs, alternatives.join(" | "));
            }
        }

        definition += "}\n";

        definition
    }
}
