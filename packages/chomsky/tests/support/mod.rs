#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};

use chomsky::grammar::{ContextFreeGrammar, Grammar, NonTerminal, ProductionSymbol};

/// Every word of at most `max_len` terminals derivable from the start symbol.
pub fn language(grammar: &ContextFreeGrammar, max_len: usize) -> BTreeSet<String> {
    let mut languages: HashMap<NonTerminal, BTreeSet<Vec<String>>> = HashMap::new();

    loop {
        let mut changed = false;

        for (lhs, rhs) in grammar.productions() {
            for word in rhs {
                let mut prefixes: BTreeSet<Vec<String>> = BTreeSet::from([Vec::new()]);

                for symbol in word.iter() {
                    let options: BTreeSet<Vec<String>> = match symbol {
                        ProductionSymbol::Terminal(t) => BTreeSet::from([vec![t.to_string()]]),
                        ProductionSymbol::NonTerminal(nt) => {
                            languages.get(nt).cloned().unwrap_or_default()
                        }
                    };

                    prefixes = prefixes
                        .iter()
                        .flat_map(|prefix| {
                            options.iter().map(move |option| {
                                prefix.iter().chain(option).cloned().collect::<Vec<_>>()
                            })
                        })
                        .filter(|candidate| candidate.len() <= max_len)
                        .collect();
                }

                let derived = languages.entry(lhs.clone()).or_default();
                for prefix in prefixes {
                    changed |= derived.insert(prefix);
                }
            }
        }

        if !changed {
            break;
        }
    }

    languages
        .remove(grammar.start_symbol())
        .unwrap_or_default()
        .into_iter()
        .map(|word| word.concat())
        .collect()
}

#[track_caller]
pub fn assert_reduced(grammar: &ContextFreeGrammar) {
    assert_eq!(
        grammar.accessible_non_terminals().len(),
        grammar.non_terminals().len(),
        "inaccessible non-terminals in\n{}",
        grammar.definition()
    );

    let productive = grammar.productive_non_terminals();
    for nt in grammar.non_terminals() {
        assert!(
            productive.contains(nt) || nt == grammar.start_symbol(),
            "{nt} is not productive in\n{}",
            grammar.definition()
        );
    }
}

#[track_caller]
pub fn assert_chomsky_normal_form(grammar: &ContextFreeGrammar) {
    for (lhs, rhs) in grammar.productions() {
        for word in rhs {
            let symbols = word.iter().collect::<Vec<_>>();
            let valid = match symbols.as_slice() {
                [] => lhs == grammar.start_symbol(),
                [ProductionSymbol::Terminal(_)] => true,
                [ProductionSymbol::NonTerminal(_), ProductionSymbol::NonTerminal(_)] => true,
                _ => false,
            };

            assert!(valid, "{lhs} → {word} is not in Chomsky normal form");
        }
    }
}
