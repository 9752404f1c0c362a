//! Tree-sitter query patterns for structural extraction.
//!
//! Patterns live in three layers. The base layer applies to every language
//! (syntax errors), family layers give related grammars a shared baseline
//! (the ECMAScript languages share function and import shapes), and the
//! language layer overrides per category. [`PatternRegistry`] merges them
//! and accepts additions at runtime, from TOML, or from `.scm` files shipped
//! next to dynamically loaded grammars.

mod builtin;
mod category;
mod error;
mod registry;

pub use category::PatternCategory;
pub use error::PatternError;
pub use registry::{PatternLayer, PatternOverrides, PatternRegistry, PatternSet};
