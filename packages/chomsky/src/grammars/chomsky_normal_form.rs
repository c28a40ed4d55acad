use std::{borrow::Cow, fmt};

use indexmap::{indexset, IndexMap, IndexSet};
use itertools::Itertools;
use log::debug;

use crate::{
    grammars::{
        context_free::ContextFreeGrammar,
        error::{GrammarError, Result},
        types::{Grammar, NonTerminal, ProductionSymbol, ProductionWord, Terminal},
    },
    language::Word,
    normalize::Normalizer,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CnfWord {
    Terminal(Terminal),
    NonTerminals(NonTerminal, NonTerminal),
}

impl fmt::Display for CnfWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_word())
    }
}

impl TryFrom<Word<ProductionSymbol>> for CnfWord {
    type Error = String;

    fn try_from(value: Word<ProductionSymbol>) -> std::result::Result<Self, Self::Error> {
        match value.0.as_slice() {
            [ProductionSymbol::Terminal(t)] => Ok(CnfWord::Terminal(t.clone())),
            [ProductionSymbol::NonTerminal(_)] => Err("Expected a terminal".to_string()),
            [ProductionSymbol::NonTerminal(nt1), ProductionSymbol::NonTerminal(nt2)] => {
                Ok(CnfWord::NonTerminals(nt1.clone(), nt2.clone()))
            }
            [_, _] => Err("Expected two non-terminals".to_string()),
            _ => Err(
                "CnfWord can only be created from a word with one terminal or two non-terminals"
                    .to_string(),
            ),
        }
    }
}

impl ProductionWord for CnfWord {
    fn to_word(&self) -> Word<ProductionSymbol> {
        match self {
            CnfWord::Terminal(t) => Word(vec![ProductionSymbol::Terminal(t.clone())]),
            CnfWord::NonTerminals(nt1, nt2) => Word(vec![
                ProductionSymbol::NonTerminal(nt1.clone()),
                ProductionSymbol::NonTerminal(nt2.clone()),
            ]),
        }
    }
}

/// A grammar whose productions are all `A → BC` or `A → a`, plus
/// optionally `S → ε` for the start symbol.
#[derive(Debug, Clone)]
pub struct ChomskyNormalFormGrammar {
    pub(super) start_symbol: NonTerminal,
    pub(super) is_start_symbol_erasable: bool,
    pub(super) non_terminals: IndexSet<NonTerminal>,
    pub(super) terminals: IndexSet<Terminal>,
    pub(super) productions: IndexMap<NonTerminal, IndexSet<CnfWord>>,
}

impl Grammar<CnfWord> for ChomskyNormalFormGrammar {
    fn start_symbol(&self) -> &NonTerminal {
        &self.start_symbol
    }

    fn non_terminals(&self) -> &IndexSet<NonTerminal> {
        &self.non_terminals
    }

    fn terminals(&self) -> &IndexSet<Terminal> {
        &self.terminals
    }

    fn erasing_productions(&self) -> Cow<'_, IndexSet<NonTerminal>> {
        Cow::Owned(if self.is_start_symbol_erasable {
            indexset! {self.start_symbol.clone()}
        } else {
            IndexSet::new()
        })
    }

    fn productions(&self) -> &IndexMap<NonTerminal, IndexSet<CnfWord>> {
        &self.productions
    }
}

impl TryFrom<&ContextFreeGrammar> for ChomskyNormalFormGrammar {
    type Error = GrammarError;

    fn try_from(cfg: &ContextFreeGrammar) -> Result<Self> {
        let mut is_start_symbol_erasable = false;
        let mut productions = IndexMap::with_capacity(cfg.productions.len());

        for (lhs, rhs) in &cfg.productions {
            let entry = productions.entry(lhs.clone()).or_insert_with(IndexSet::new);

            for word in rhs {
                if word.is_empty() && lhs == &cfg.start_symbol {
                    is_start_symbol_erasable = true;
                    continue;
                }

                let cnf_word = CnfWord::try_from(word.clone()).map_err(|reason| {
                    GrammarError::NotInChomskyNormalForm {
                        lhs: lhs.to_string(),
                        rhs: word.to_string(),
                        reason,
                    }
                })?;

                entry.insert(cnf_word);
            }
        }

        Ok(Self {
            start_symbol: cfg.start_symbol.clone(),
            is_start_symbol_erasable,
            non_terminals: cfg.non_terminals.clone(),
            terminals: cfg.terminals.clone(),
            productions,
        })
    }
}

impl ChomskyNormalFormGrammar {
    pub fn from_context_free_grammar(cfg: &ContextFreeGrammar) -> Result<Self> {
        let mut cfg = cfg.clone();
        Normalizer::default().normalize(&mut cfg, &mut ());

        Self::try_from(&cfg)
    }

    pub fn is_start_symbol_erasable(&self) -> bool {
        self.is_start_symbol_erasable
    }
}

/// Mints non-terminal names that clash with no symbol of a grammar, nor with
/// any name minted before.
#[derive(Debug, Clone)]
pub struct FreshNames {
    taken: IndexSet<String>,
    terminal_prefix: String,
    chain_prefix: String,
    counter: usize,
}

impl FreshNames {
    pub fn new(grammar: &ContextFreeGrammar) -> Self {
        Self::with_prefixes(grammar, "T_", "X")
    }

    pub fn with_prefixes(
        grammar: &ContextFreeGrammar,
        terminal_prefix: impl Into<String>,
        chain_prefix: impl Into<String>,
    ) -> Self {
        let taken = grammar
            .non_terminals
            .iter()
            .map(|nt| nt.as_str().to_owned())
            .chain(grammar.terminals.iter().map(|t| t.as_str().to_owned()))
            .collect();

        Self {
            taken,
            terminal_prefix: terminal_prefix.into(),
            chain_prefix: chain_prefix.into(),
            counter: 0,
        }
    }

    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(name)
    }

    /// `T_a` for the terminal `a`, or `T_a1`, `T_a2`, ... if that is taken.
    pub fn terminal_wrapper(&mut self, terminal: &Terminal) -> NonTerminal {
        let base = format!("{}{}", self.terminal_prefix, terminal);

        let mut candidate = base.clone();
        let mut suffix = 0;
        while self.taken.contains(&candidate) {
            suffix += 1;
            candidate = format!("{base}{suffix}");
        }

        self.taken.insert(candidate.clone());
        NonTerminal::new(candidate)
    }

    /// The next free name of the form `X1`, `X2`, ...
    pub fn chain_link(&mut self) -> NonTerminal {
        loop {
            self.counter += 1;

            let candidate = format!("{}{}", self.chain_prefix, self.counter);
            if self.taken.insert(candidate.clone()) {
                return NonTerminal::new(candidate);
            }
        }
    }
}

/// Rewrites `X1 X2 ... Xn` into `X1 N1`, recording `N1 → X2 N2`, ...,
/// `N(n-2) → X(n-1) Xn` in `links`.
fn chain(
    symbols: &[ProductionSymbol],
    names: &mut FreshNames,
    links: &mut IndexMap<NonTerminal, Word<ProductionSymbol>>,
) -> Word<ProductionSymbol> {
    match symbols {
        [first, rest @ ..] if rest.len() >= 2 => {
            let link = names.chain_link();
            let next_word = chain(rest, names, links);

            links.insert(link.clone(), next_word);

            Word::new([first.clone(), ProductionSymbol::NonTerminal(link)])
        }
        _ => Word::new(symbols.iter().cloned()),
    }
}

impl ContextFreeGrammar {
    /// Replaces every terminal inside a right-hand side of two or more
    /// symbols with a non-terminal whose only production is that terminal.
    /// Terminals that only ever appear alone, as in `A → a`, get no wrapper.
    /// Returns the wrapper minted for each terminal.
    pub fn isolate_terminals(
        &mut self,
        names: &mut FreshNames,
    ) -> IndexMap<Terminal, NonTerminal> {
        let mut wrappers = IndexMap::new();
        let mut next_productions = IndexMap::with_capacity(self.productions.len());

        for (lhs, rhs) in &self.productions {
            let mut next_rhs = IndexSet::with_capacity(rhs.len());

            for word in rhs {
                if word.len() < 2 {
                    next_rhs.insert(word.clone());
                    continue;
                }

                let mut symbols = Vec::with_capacity(word.len());
                for symbol in word.iter() {
                    match symbol {
                        ProductionSymbol::Terminal(t) => {
                            let wrapper = wrappers
                                .entry(t.clone())
                                .or_insert_with(|| names.terminal_wrapper(t));
                            symbols.push(ProductionSymbol::NonTerminal(wrapper.clone()));
                        }
                        ProductionSymbol::NonTerminal(_) => symbols.push(symbol.clone()),
                    }
                }

                next_rhs.insert(Word::new(symbols));
            }

            next_productions.insert(lhs.clone(), next_rhs);
        }

        for (t, wrapper) in &wrappers {
            self.non_terminals.insert(wrapper.clone());
            next_productions.insert(
                wrapper.clone(),
                indexset! { Word::new([ProductionSymbol::Terminal(t.clone())]) },
            );
        }

        debug!(
            "terminal wrappers: {{{}}}",
            wrappers
                .iter()
                .map(|(t, wrapper)| format!("{wrapper} → {t}"))
                .join(", ")
        );

        self.productions = next_productions;

        wrappers
    }

    /// Splits every right-hand side longer than two symbols into a chain of
    /// binary productions over fresh non-terminals. Returns the new
    /// non-terminals.
    pub fn binarize(&mut self, names: &mut FreshNames) -> IndexSet<NonTerminal> {
        let mut links = IndexMap::new();
        let mut next_productions = IndexMap::with_capacity(self.productions.len());

        for (lhs, rhs) in &self.productions {
            let next_rhs = rhs
                .iter()
                .map(|word| chain(&word.0, names, &mut links))
                .collect::<IndexSet<_>>();

            next_productions.insert(lhs.clone(), next_rhs);
        }

        for (link, word) in &links {
            self.non_terminals.insert(link.clone());
            next_productions.insert(link.clone(), indexset! { word.clone() });
        }

        debug!("chain non-terminals: {{{}}}", links.keys().join(", "));

        self.productions = next_productions;

        links.into_keys().collect()
    }

    pub fn is_in_chomsky_normal_form(&self) -> bool {
        ChomskyNormalFormGrammar::try_from(self).is_ok()
    }

    pub fn to_chomsky_normal_form(&self) -> Result<ChomskyNormalFormGrammar> {
        ChomskyNormalFormGrammar::from_context_free_grammar(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(symbols: &[&str]) -> Word<ProductionSymbol> {
        Word::new(symbols.iter().map(|name| {
            if name.starts_with(char::is_uppercase) {
                ProductionSymbol::NonTerminal(NonTerminal::new(*name))
            } else {
                ProductionSymbol::Terminal(Terminal::new(*name))
            }
        }))
    }

    fn rhs(grammar: &ContextFreeGrammar, lhs: &str) -> Vec<String> {
        let mut rhs = grammar.productions()[&NonTerminal::new(lhs)]
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        rhs.sort();
        rhs
    }

    #[test]
    fn cnf_words_accept_only_cnf_shapes() {
        assert_eq!(
            CnfWord::try_from(word(&["a"])),
            Ok(CnfWord::Terminal(Terminal::new("a")))
        );
        assert_eq!(
            CnfWord::try_from(word(&["A", "B"])),
            Ok(CnfWord::NonTerminals(NonTerminal::new("A"), NonTerminal::new("B")))
        );
        assert!(CnfWord::try_from(word(&["A"])).is_err());
        assert!(CnfWord::try_from(word(&["a", "B"])).is_err());
        assert!(CnfWord::try_from(word(&["A", "B", "C"])).is_err());
        assert!(CnfWord::try_from(word(&[])).is_err());
    }

    #[test]
    fn isolates_terminals_of_long_right_hand_sides() {
        let mut grammar = ContextFreeGrammar::from_productions("S", &["S → aSb | c"]).unwrap();
        let mut names = FreshNames::new(&grammar);

        let wrappers = grammar.isolate_terminals(&mut names);

        assert_eq!(wrappers.len(), 2);
        assert_eq!(rhs(&grammar, "S"), vec!["T_a S T_b", "c"]);
        assert_eq!(rhs(&grammar, "T_a"), vec!["a"]);
        assert_eq!(rhs(&grammar, "T_b"), vec!["b"]);
        assert!(!grammar.productions().contains_key(&NonTerminal::new("T_c")));
    }

    #[test]
    fn binarizes_into_a_chain() {
        let mut grammar =
            ContextFreeGrammar::from_productions("S", &["S → ABCD | AB", "A → a", "B → b"])
                .unwrap();
        grammar.productions.insert(NonTerminal::new("C"), indexset! { word(&["c"]) });
        grammar.productions.insert(NonTerminal::new("D"), indexset! { word(&["d"]) });
        let mut names = FreshNames::new(&grammar);

        let links = grammar.binarize(&mut names);

        assert_eq!(links, indexset! { NonTerminal::new("X1"), NonTerminal::new("X2") });
        assert_eq!(rhs(&grammar, "S"), vec!["A X1", "AB"]);
        assert_eq!(rhs(&grammar, "X1"), vec!["B X2"]);
        assert_eq!(rhs(&grammar, "X2"), vec!["CD"]);
        assert!(grammar.is_in_chomsky_normal_form());
    }

    #[test]
    fn fresh_names_avoid_existing_symbols() {
        let grammar = ContextFreeGrammar::new(
            ["S", "T_a", "X1"],
            ["a", "b"],
            "S",
            [("S", vec!["a"]), ("T_a", vec!["b"]), ("X1", vec!["a"])],
        )
        .unwrap();
        let mut names = FreshNames::new(&grammar);

        assert_eq!(names.terminal_wrapper(&Terminal::new("a")), NonTerminal::new("T_a1"));
        assert_eq!(names.terminal_wrapper(&Terminal::new("b")), NonTerminal::new("T_b"));
        assert_eq!(names.chain_link(), NonTerminal::new("X2"));
        assert_eq!(names.chain_link(), NonTerminal::new("X3"));
        assert!(names.is_taken("T_a1"));
    }

    #[test]
    fn fresh_names_follow_the_configured_prefixes() {
        let grammar = ContextFreeGrammar::from_productions("S", &["S → a"]).unwrap();
        let mut names = FreshNames::with_prefixes(&grammar, "W_", "N");

        assert_eq!(names.terminal_wrapper(&Terminal::new("a")), NonTerminal::new("W_a"));
        assert_eq!(names.chain_link(), NonTerminal::new("N1"));
    }

    #[test]
    fn rejects_grammars_outside_normal_form() {
        let grammar = ContextFreeGrammar::from_productions("S", &["S → aB", "B → b"]).unwrap();

        assert_eq!(
            ChomskyNormalFormGrammar::try_from(&grammar).unwrap_err(),
            GrammarError::NotInChomskyNormalForm {
                lhs: "S".to_owned(),
                rhs: "aB".to_owned(),
                reason: "Expected two non-terminals".to_owned(),
            }
        );
    }

    #[test]
    fn start_symbol_may_be_erasable() {
        let grammar =
            ContextFreeGrammar::from_productions("S", &["S → ε | AB", "A → a", "B → b"]).unwrap();

        let cnf = ChomskyNormalFormGrammar::try_from(&grammar).unwrap();

        assert!(cnf.is_start_symbol_erasable());
        assert_eq!(cnf.production_count(), 4);
        assert!(cnf.definition().contains("  S → ε | AB\n"));
    }

    #[test]
    fn converts_through_the_whole_pipeline() {
        let cfg = ContextFreeGrammar::from_productions("S", &["S → aSb | ε"]).unwrap();

        let cnf = cfg.to_chomsky_normal_form().unwrap();

        // S → ε | T_a X1 | T_a T_b, X1 → S T_b, T_a → a, T_b → b
        assert!(cnf.is_start_symbol_erasable());
        assert_eq!(cnf.production_count(), 6);
        assert!(cnf.non_terminals().contains("X1"));
        assert_eq!(
            cnf.productions()[&NonTerminal::new("X1")],
            indexset! { CnfWord::NonTerminals(NonTerminal::new("S"), NonTerminal::new("T_b")) }
        );
    }
}
