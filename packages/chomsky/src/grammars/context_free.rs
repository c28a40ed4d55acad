use std::{borrow::Cow, str::FromStr};

use indexmap::{indexmap, indexset, IndexMap, IndexSet};
use itertools::Itertools;
use log::{debug, trace, warn};

use crate::{
    grammars::{
        error::{GrammarError, Result},
        parser::{parse_rule, segment, RawRule},
        types::{Grammar, NonTerminal, ProductionSymbol, Terminal},
    },
    language::{Symbol, Word, EPSILON},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextFreeGrammar {
    pub(super) start_symbol: NonTerminal,
    pub(super) non_terminals: IndexSet<NonTerminal>,
    pub(super) terminals: IndexSet<Terminal>,
    pub(super) productions: IndexMap<NonTerminal, IndexSet<Word<ProductionSymbol>>>,
}

impl Grammar<Word<ProductionSymbol>> for ContextFreeGrammar {
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
        Cow::Owned(
            self.productions
                .iter()
                .filter(|(_, rhs)| rhs.iter().any(Word::is_empty))
                .map(|(lhs, _)| lhs.clone())
                .collect(),
        )
    }

    fn productions(&self) -> &IndexMap<NonTerminal, IndexSet<Word<ProductionSymbol>>> {
        &self.productions
    }
}

fn symbol(name: &str) -> Result<Symbol> {
    if name.is_empty() {
        Err(GrammarError::EmptySymbolName)
    } else if name == EPSILON {
        Err(GrammarError::ReservedSymbolName(name.to_owned()))
    } else {
        Ok(Symbol::new(name))
    }
}

/// Symbols whose name starts with an uppercase letter are non-terminals.
fn classify(name: &str) -> ProductionSymbol {
    if name.chars().next().is_some_and(char::is_uppercase) {
        ProductionSymbol::NonTerminal(NonTerminal::new(name))
    } else {
        ProductionSymbol::Terminal(Terminal::new(name))
    }
}

impl ContextFreeGrammar {
    /// Builds a grammar over explicit vocabularies.
    ///
    /// Each right-hand side is split into symbols of the vocabularies by
    /// longest match, so `"ABab"` and `"A B a b"` are the same word. `"ε"` and
    /// `""` are the empty word.
    pub fn new<L, A, R>(
        non_terminals: impl IntoIterator<Item = impl AsRef<str>>,
        terminals: impl IntoIterator<Item = impl AsRef<str>>,
        start_symbol: impl AsRef<str>,
        productions: impl IntoIterator<Item = (L, A)>,
    ) -> Result<Self>
    where
        L: AsRef<str>,
        A: IntoIterator<Item = R>,
        R: AsRef<str>,
    {
        let non_terminals = non_terminals
            .into_iter()
            .map(|nt| symbol(nt.as_ref()).map(NonTerminal))
            .collect::<Result<IndexSet<_>>>()?;
        let terminals = terminals
            .into_iter()
            .map(|t| symbol(t.as_ref()).map(Terminal))
            .collect::<Result<IndexSet<_>>>()?;

        if let Some(t) = terminals
            .iter()
            .find(|t| non_terminals.iter().any(|nt| nt.as_str() == t.as_str()))
        {
            return Err(GrammarError::OverlappingVocabularies(t.to_string()));
        }

        let start_symbol = NonTerminal(symbol(start_symbol.as_ref())?);
        if !non_terminals.contains(&start_symbol) {
            return Err(GrammarError::InvalidStartSymbol(start_symbol.to_string()));
        }

        let mut grammar = Self {
            start_symbol,
            productions: non_terminals
                .iter()
                .map(|nt| (nt.clone(), IndexSet::new()))
                .collect(),
            non_terminals,
            terminals,
        };

        for (lhs, alternatives) in productions {
            let lhs = lhs.as_ref();
            let lhs_nt = grammar
                .non_terminals
                .get(lhs.trim())
                .cloned()
                .ok_or_else(|| GrammarError::UnknownNonTerminal(lhs.to_owned()))?;

            for rhs in alternatives {
                let word = grammar.read_word(lhs, rhs.as_ref())?;
                grammar.productions[&lhs_nt].insert(word);
            }
        }

        Ok(grammar)
    }

    fn read_word(&self, lhs: &str, rhs: &str) -> Result<Word<ProductionSymbol>> {
        let names = segment(rhs, |name| {
            self.non_terminals.contains(name) || self.terminals.contains(name)
        })
        .map_err(|unknown| GrammarError::UnknownSymbol {
            lhs: lhs.to_owned(),
            rhs: rhs.to_owned(),
            symbol: unknown.to_owned(),
        })?;

        Ok(Word::new(names.into_iter().map(|name| {
            if self.non_terminals.contains(name) {
                ProductionSymbol::NonTerminal(NonTerminal::new(name))
            } else {
                ProductionSymbol::Terminal(Terminal::new(name))
            }
        })))
    }

    /// Builds a grammar from rules such as `"S → aS | ε"`, inferring the
    /// vocabularies: names starting with an uppercase letter are
    /// non-terminals, everything else is a terminal. The start symbol must
    /// occur in at least one rule.
    pub fn from_productions<S: AsRef<str>>(
        start_symbol: S,
        productions: &[impl AsRef<str>],
    ) -> Result<Self> {
        let start_symbol = match classify(symbol(start_symbol.as_ref())?.as_str()) {
            ProductionSymbol::NonTerminal(nt) => nt,
            ProductionSymbol::Terminal(t) => {
                return Err(GrammarError::InvalidStartSymbol(t.to_string()));
            }
        };

        let mut grammar = Self {
            non_terminals: indexset! { start_symbol.clone() },
            terminals: IndexSet::new(),
            productions: indexmap! { start_symbol.clone() => IndexSet::new() },
            start_symbol,
        };

        let mut mentions_start = false;

        for production in productions {
            let RawRule { lhs, alternatives } = parse_rule(production.as_ref())?;

            let lhs = match classify(lhs) {
                ProductionSymbol::NonTerminal(nt) => nt,
                ProductionSymbol::Terminal(t) => {
                    return Err(GrammarError::UnknownNonTerminal(t.to_string()));
                }
            };
            mentions_start |= lhs == grammar.start_symbol;
            grammar.declare(ProductionSymbol::NonTerminal(lhs.clone()));

            for alternative in alternatives {
                let word = Word::new(alternative.into_iter().map(classify));
                mentions_start |= word.non_terminals().any(|nt| *nt == grammar.start_symbol);
                for symbol in word.iter() {
                    grammar.declare(symbol.clone());
                }

                grammar.productions[&lhs].insert(word);
            }
        }

        if !mentions_start {
            return Err(GrammarError::InvalidStartSymbol(
                grammar.start_symbol.to_string(),
            ));
        }

        Ok(grammar)
    }

    /// Parses one rule per line. Blank lines and lines starting with `#` are
    /// skipped. Without an explicit start symbol, the left-hand side of the
    /// first rule is used.
    pub fn from_text(text: &str, start_symbol: Option<&str>) -> Result<Self> {
        let rules = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect::<Vec<_>>();

        let start_symbol = match (start_symbol, rules.first()) {
            (Some(start_symbol), _) => start_symbol,
            (None, Some(first)) => parse_rule(first)?.lhs,
            (None, None) => {
                return Err(GrammarError::Parse {
                    input: text.to_owned(),
                    message: "the grammar has no productions".to_owned(),
                });
            }
        };

        Self::from_productions(start_symbol, &rules)
    }

    fn declare(&mut self, symbol: ProductionSymbol) {
        match symbol {
            ProductionSymbol::NonTerminal(nt) => {
                self.productions.entry(nt.clone()).or_default();
                self.non_terminals.insert(nt);
            }
            ProductionSymbol::Terminal(t) => {
                self.terminals.insert(t);
            }
        }
    }

    /// Non-terminals that derive the empty word.
    pub fn nullable_non_terminals(&self) -> IndexSet<NonTerminal> {
        let mut nullable = IndexSet::new();

        loop {
            let mut changed = false;

            for (lhs, rhs) in &self.productions {
                if nullable.contains(lhs) {
                    continue;
                }

                let is_nullable = rhs.iter().any(|word| {
                    word.iter().all(|symbol| match symbol {
                        ProductionSymbol::NonTerminal(nt) => nullable.contains(nt),
                        ProductionSymbol::Terminal(_) => false,
                    })
                });

                if is_nullable {
                    nullable.insert(lhs.clone());
                    changed = true;
                }
            }

            if !changed {
                break;
            }
        }

        nullable
    }

    /// Removes every ε-production. Each right-hand side is replaced by all the
    /// non-empty words obtained by deleting any subset of its nullable
    /// symbols. If the start symbol is nullable, it keeps a single
    /// ε-production.
    pub fn eliminate_erasing_productions(&mut self) {
        let nullable = self.nullable_non_terminals();
        debug!("nullable non-terminals: {{{}}}", nullable.iter().join(", "));

        let mut next_productions = IndexMap::with_capacity(self.productions.len());

        for (lhs, rhs) in &self.productions {
            let mut next_rhs = IndexSet::new();

            for word in rhs {
                let words = word
                    .iter()
                    .cloned()
                    .map(|symbol| {
                        let erasable = matches!(
                            &symbol,
                            ProductionSymbol::NonTerminal(nt) if nullable.contains(nt)
                        );

                        if erasable {
                            vec![Some(symbol), None]
                        } else {
                            vec![Some(symbol)]
                        }
                    })
                    .multi_cartesian_product()
                    .filter_map(|symbols| {
                        let word = Word::new(symbols.into_iter().flatten());
                        (!word.is_empty()).then_some(word)
                    });

                next_rhs.extend(words);
            }

            trace!("{} → {}", lhs, next_rhs.iter().join(" | "));
            next_productions.insert(lhs.clone(), next_rhs);
        }

        if nullable.contains(&self.start_symbol) {
            next_productions
                .entry(self.start_symbol.clone())
                .or_insert_with(IndexSet::new)
                .insert(Word::epsilon());
        }

        self.productions = next_productions;
    }

    /// Non-terminals reachable from `non_terminal` through unit productions,
    /// including `non_terminal` itself.
    pub fn unit_closure(&self, non_terminal: &NonTerminal) -> IndexSet<NonTerminal> {
        let mut closure = indexset! { non_terminal.clone() };
        let mut stack = vec![non_terminal.clone()];

        while let Some(current) = stack.pop() {
            for word in self.productions.get(&current).into_iter().flatten() {
                if let Some(target) = word.as_unit() {
                    if closure.insert(target.clone()) {
                        stack.push(target.clone());
                    }
                }
            }
        }

        closure
    }

    /// Replaces unit productions `A → B` with the non-unit productions of
    /// every non-terminal in the unit closure of `A`.
    pub fn eliminate_unit_productions(&mut self) {
        let unit_closures = self
            .non_terminals
            .iter()
            .map(|nt| (nt.clone(), self.unit_closure(nt)))
            .collect::<IndexMap<_, _>>();

        let mut next_productions = IndexMap::with_capacity(unit_closures.len());

        for (lhs, closure) in unit_closures {
            trace!("unit closure of {}: {{{}}}", lhs, closure.iter().join(", "));

            // Only the start symbol may keep an ε-production.
            let keep_empty = lhs == self.start_symbol;

            let rhs = closure
                .iter()
                .filter_map(|nt| self.productions.get(nt))
                .flatten()
                .filter(|word| word.as_unit().is_none())
                .filter(|word| keep_empty || !word.is_empty())
                .cloned()
                .collect::<IndexSet<_>>();

            next_productions.insert(lhs, rhs);
        }

        self.productions = next_productions;
    }

    /// Non-terminals reachable from the start symbol.
    pub fn accessible_non_terminals(&self) -> IndexSet<NonTerminal> {
        let mut accessible = IndexSet::new();
        let mut stack = vec![self.start_symbol.clone()];

        while let Some(nt) = stack.pop() {
            if accessible.insert(nt.clone()) {
                for word in self.productions.get(&nt).into_iter().flatten() {
                    stack.extend(
                        word.non_terminals()
                            .filter(|next| !accessible.contains(*next))
                            .cloned(),
                    );
                }
            }
        }

        accessible
    }

    /// Drops the non-terminals that cannot be reached from the start symbol,
    /// returning them.
    pub fn remove_inaccessible_symbols(&mut self) -> IndexSet<NonTerminal> {
        let accessible = self.accessible_non_terminals();
        let removed = self.retain_non_terminals(&accessible);

        debug!("inaccessible non-terminals: {{{}}}", removed.iter().join(", "));

        removed
    }

    /// Non-terminals that derive at least one word of terminals.
    pub fn productive_non_terminals(&self) -> IndexSet<NonTerminal> {
        let mut productive = IndexSet::new();

        loop {
            let mut changed = false;

            for (lhs, rhs) in &self.productions {
                if productive.contains(lhs) {
                    continue;
                }

                if rhs
                    .iter()
                    .any(|word| word.non_terminals().all(|nt| productive.contains(nt)))
                {
                    productive.insert(lhs.clone());
                    changed = true;
                }
            }

            if !changed {
                break;
            }
        }

        productive
    }

    /// Drops the non-terminals that derive no word of terminals, together with
    /// every production that mentions them, returning them.
    ///
    /// The start symbol always stays. When it is not productive itself the
    /// grammar generates nothing, and the start symbol is left without
    /// productions.
    pub fn remove_non_productive_symbols(&mut self) -> IndexSet<NonTerminal> {
        let mut productive = self.productive_non_terminals();

        let is_start_productive = productive.contains(&self.start_symbol);
        if !is_start_productive {
            warn!(
                "start symbol {} is not productive, the language is empty",
                self.start_symbol
            );
            productive.insert(self.start_symbol.clone());
        }

        let removed = self.retain_non_terminals(&productive);

        if !is_start_productive {
            if let Some(rhs) = self.productions.get_mut(&self.start_symbol) {
                rhs.clear();
            }
        }

        debug!("non-productive non-terminals: {{{}}}", removed.iter().join(", "));

        removed
    }

    fn retain_non_terminals(&mut self, keep: &IndexSet<NonTerminal>) -> IndexSet<NonTerminal> {
        let removed = self
            .non_terminals
            .iter()
            .filter(|nt| !keep.contains(*nt))
            .cloned()
            .collect::<IndexSet<_>>();

        self.non_terminals.retain(|nt| keep.contains(nt));
        self.productions.retain(|nt, _| keep.contains(nt));

        for rhs in self.productions.values_mut() {
            rhs.retain(|word| word.non_terminals().all(|nt| keep.contains(nt)));
        }

        removed
    }
}

impl FromStr for ContextFreeGrammar {
    type Err = GrammarError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_text(s, None)
    }
}
