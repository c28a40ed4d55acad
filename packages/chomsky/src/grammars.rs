pub mod chomsky_normal_form;
pub mod context_free;
pub mod error;
pub mod parser;
pub mod types;
