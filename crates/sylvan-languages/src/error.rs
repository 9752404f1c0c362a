use crate::LanguageId;

/// Errors raised while resolving a language or binding its grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LanguageError {
    /// A language name that is not in the closed set. This is a
    /// configuration mistake and retrying will not help.
    #[error("unknown language '{0}'")]
    UnknownLanguage(String),
    /// The fallback id, or a language without any grammar.
    #[error("language '{0}' has no grammar")]
    Unsupported(LanguageId),
    #[error("grammar '{grammar}' for {language} not found in bundled grammars or search paths")]
    GrammarNotFound {
        language: LanguageId,
        grammar: &'static str,
    },
    /// The grammar loaded but tree-sitter refused it (usually an ABI mismatch).
    #[error("grammar for {language} is incompatible: {message}")]
    Incompatible {
        language: LanguageId,
        message: String,
    },
}
