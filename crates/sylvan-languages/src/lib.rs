//! Language support for sylvan.
//!
//! This crate answers three questions about a source file:
//!
//! - which language is it ([`language_for_path`], [`detect_language`]),
//! - what do we know about that language ([`descriptor`], [`LanguageFeatures`]),
//! - how do we parse it ([`LanguageService`], backed by bundled grammars and
//!   a dynamic [`GrammarLoader`]).
//!
//! # Example
//!
//! ```no_run
//! use sylvan_languages::{LanguageId, language_service};
//! use std::path::Path;
//!
//! let service = language_service();
//! let id = service.get_language_for_file(Path::new("src/app.py"));
//! assert_eq!(id, LanguageId::Python);
//! let mut parser = service.get_parser(id).unwrap();
//! let tree = parser.parse("def hello(): pass", None).unwrap();
//! assert_eq!(tree.root_node().kind(), "module");
//! ```

mod bundled;
mod descriptor;
mod error;
pub mod grammar_loader;
mod id;
mod resolve;
mod service;

pub use bundled::{bundled_grammar, bundled_languages};
pub use descriptor::{
    LanguageDescriptor, LanguageFamily, LanguageFeatures, descriptor, descriptors,
};
pub use error::LanguageError;
pub use grammar_loader::{GRAMMAR_PATH_ENV, GrammarLoader};
pub use id::LanguageId;
pub use resolve::{detect_language, has_path_hint, language_for_extension, language_for_path};
pub use service::{GrammarBinding, GrammarOrigin, LanguageService, language_service};
