//! Grammars compiled into the binary via the official `tree-sitter-*` crates.

use crate::LanguageId;
use tree_sitter::Language;

/// The statically linked grammar for `id`, if its `lang-*` feature is on.
pub fn bundled_grammar(id: LanguageId) -> Option<Language> {
    match id {
        #[cfg(feature = "lang-python")]
        LanguageId::Python => Some(tree_sitter_python::LANGUAGE.into()),
        #[cfg(feature = "lang-javascript")]
        LanguageId::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
        #[cfg(feature = "lang-typescript")]
        LanguageId::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
        #[cfg(feature = "lang-typescript")]
        LanguageId::Tsx => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
        #[cfg(feature = "lang-rust")]
        LanguageId::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
        #[cfg(feature = "lang-go")]
        LanguageId::Go => Some(tree_sitter_go::LANGUAGE.into()),
        #[cfg(feature = "lang-java")]
        LanguageId::Java => Some(tree_sitter_java::LANGUAGE.into()),
        #[cfg(feature = "lang-c")]
        LanguageId::C => Some(tree_sitter_c::LANGUAGE.into()),
        #[cfg(feature = "lang-cpp")]
        LanguageId::Cpp => Some(tree_sitter_cpp::LANGUAGE.into()),
        #[cfg(feature = "lang-csharp")]
        LanguageId::CSharp => Some(tree_sitter_c_sharp::LANGUAGE.into()),
        #[cfg(feature = "lang-ruby")]
        LanguageId::Ruby => Some(tree_sitter_ruby::LANGUAGE.into()),
        #[cfg(feature = "lang-bash")]
        LanguageId::Bash => Some(tree_sitter_bash::LANGUAGE.into()),
        #[cfg(feature = "lang-json")]
        LanguageId::Json => Some(tree_sitter_json::LANGUAGE.into()),
        _ => None,
    }
}

/// Languages with a grammar compiled into this build.
pub fn bundled_languages() -> Vec<LanguageId> {
    LanguageId::ALL
        .iter()
        .copied()
        .filter(|id| bundled_grammar(*id).is_some())
        .collect()
}
