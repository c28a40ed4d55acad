//! Normalization of context-free grammars into Chomsky normal form.
//!
//! ```
//! use chomsky::grammar::{ContextFreeGrammar, Grammar};
//!
//! let cfg = ContextFreeGrammar::from_productions("S", &["S → aSb | ε"]).unwrap();
//! let cnf = cfg.to_chomsky_normal_form().unwrap();
//!
//! assert!(cnf.is_start_symbol_erasable());
//! println!("{}", cnf.definition());
//! ```

pub mod grammar;
pub mod grammars;
pub mod language;
pub mod normalize;
