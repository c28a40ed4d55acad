//! Text format for productions.
//!
//! A rule is a left-hand side, an arrow (`→`, `->` or `::=`) and alternatives
//! separated by `|`:
//!
//! ```text
//! S → AC | bA | B | aA
//! A → ε | aS | ABab
//! ```
//!
//! Symbols need no separators. A symbol is one character followed by any
//! number of digits, primes and `_x` suffixes, so `T_aX1` reads as `T_a X1`.
//! `ε` stands for the empty word.

use winnow::{
    ascii::space0,
    combinator::{alt, delimited, repeat, separated},
    token::{any, one_of},
    ModalResult, Parser,
};

use crate::{
    grammars::error::{GrammarError, Result},
    language::EPSILON,
};

/// A rule as written, before symbols are classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRule<'s> {
    pub lhs: &'s str,
    pub alternatives: Vec<Vec<&'s str>>,
}

fn is_symbol_char(c: char) -> bool {
    !c.is_whitespace() && c != '|' && c != '→'
}

fn symbol<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    (
        any.verify(|c: &char| is_symbol_char(*c)),
        repeat::<_, _, (), _, _>(
            0..,
            alt((
                one_of(|c: char| c.is_ascii_digit() || c == '\'').void(),
                ('_', any.verify(|c: &char| is_symbol_char(*c))).void(),
            )),
        ),
    )
        .take()
        .parse_next(input)
}

fn arrow(input: &mut &str) -> ModalResult<()> {
    alt(("→", "->", "::=")).void().parse_next(input)
}

fn alternative<'s>(input: &mut &'s str) -> ModalResult<Vec<&'s str>> {
    let symbols: Vec<&str> = repeat(1.., delimited(space0, symbol, space0)).parse_next(input)?;

    Ok(symbols.into_iter().filter(|s| *s != EPSILON).collect())
}

fn rule<'s>(input: &mut &'s str) -> ModalResult<RawRule<'s>> {
    let lhs = delimited(space0, symbol, space0).parse_next(input)?;
    arrow.parse_next(input)?;
    let alternatives = separated(1.., alternative, '|').parse_next(input)?;

    Ok(RawRule { lhs, alternatives })
}

pub fn parse_rule(input: &str) -> Result<RawRule<'_>> {
    rule.parse(input.trim()).map_err(|error| GrammarError::Parse {
        input: input.to_owned(),
        message: error.to_string(),
    })
}

/// Splits `rhs` into known symbol names. Whitespace always separates
/// symbols and `ε` is skipped wherever it occurs. Inside a chunk the longest
/// known name is tried first, falling back to shorter ones when the rest of
/// the chunk cannot be split. On failure, returns the part of the input that
/// no known name matches.
pub(crate) fn segment<'s>(
    rhs: &'s str,
    is_known: impl Fn(&str) -> bool,
) -> std::result::Result<Vec<&'s str>, &'s str> {
    let mut symbols = Vec::new();

    for chunk in rhs.split_whitespace() {
        symbols.extend(segment_chunk(chunk, &is_known)?);
    }

    Ok(symbols)
}

fn segment_chunk<'s>(
    chunk: &'s str,
    is_known: &dyn Fn(&str) -> bool,
) -> std::result::Result<Vec<&'s str>, &'s str> {
    if chunk.is_empty() {
        return Ok(Vec::new());
    }
    if let Some(rest) = chunk.strip_prefix(EPSILON) {
        return segment_chunk(rest, is_known);
    }

    let mut first_error = None;

    let ends = chunk
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .rev()
        .filter(|&end| is_known(&chunk[..end]));
    for end in ends {
        match segment_chunk(&chunk[end..], is_known) {
            Ok(mut symbols) => {
                symbols.insert(0, &chunk[..end]);
                return Ok(symbols);
            }
            Err(unknown) => {
                first_error.get_or_insert(unknown);
            }
        }
    }

    Err(first_error.unwrap_or(chunk))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_character_symbols() {
        let rule = parse_rule("S → AC | bA | B | aA").unwrap();

        assert_eq!(rule.lhs, "S");
        assert_eq!(
            rule.alternatives,
            vec![vec!["A", "C"], vec!["b", "A"], vec!["B"], vec!["a", "A"]]
        );
    }

    #[test]
    fn epsilon_is_the_empty_alternative() {
        let rule = parse_rule("A → ε | aS").unwrap();

        assert_eq!(rule.alternatives, vec![vec![], vec!["a", "S"]]);
    }

    #[test]
    fn accepts_ascii_arrows() {
        assert_eq!(parse_rule("S -> a").unwrap().alternatives, vec![vec!["a"]]);
        assert_eq!(parse_rule("S ::= a").unwrap().alternatives, vec![vec!["a"]]);
        assert_eq!(parse_rule("S→a|b").unwrap().alternatives, vec![vec!["a"], vec!["b"]]);
    }

    #[test]
    fn reads_suffixed_symbols() {
        let rule = parse_rule("X1 → T_aX2 | S' b").unwrap();

        assert_eq!(rule.lhs, "X1");
        assert_eq!(rule.alternatives, vec![vec!["T_a", "X2"], vec!["S'", "b"]]);
    }

    #[test]
    fn rejects_malformed_rules() {
        assert!(matches!(parse_rule("S AC"), Err(GrammarError::Parse { .. })));
        assert!(matches!(parse_rule("S → "), Err(GrammarError::Parse { .. })));
        assert!(matches!(parse_rule("S → a ||"), Err(GrammarError::Parse { .. })));
        assert!(matches!(parse_rule("→ a"), Err(GrammarError::Parse { .. })));
    }

    #[test]
    fn segments_by_longest_known_name() {
        let known = ["A", "T", "T_a", "a"];
        let is_known = |s: &str| known.contains(&s);

        assert_eq!(segment("AT_aa", is_known), Ok(vec!["A", "T_a", "a"]));
        assert_eq!(segment("A T a", is_known), Ok(vec!["A", "T", "a"]));
        assert_eq!(segment("ε", is_known), Ok(vec![]));
        assert_eq!(segment("Ab", is_known), Err("b"));
    }

    #[test]
    fn falls_back_to_shorter_names() {
        let known = ["S", "A", "Ab", "bc"];
        let is_known = |s: &str| known.contains(&s);

        assert_eq!(segment("Abc", is_known), Ok(vec!["A", "bc"]));
        assert_eq!(segment("AbS", is_known), Ok(vec!["Ab", "S"]));
        assert_eq!(segment("Abd", is_known), Err("d"));
    }

    #[test]
    fn skips_epsilon_inside_words() {
        let known = ["S", "a"];
        let is_known = |s: &str| known.contains(&s);

        assert_eq!(segment("aε", is_known), Ok(vec!["a"]));
        assert_eq!(segment("εSε a", is_known), Ok(vec!["S", "a"]));
    }
}
