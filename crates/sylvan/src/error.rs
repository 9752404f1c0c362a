use std::path::PathBuf;
use sylvan_languages::LanguageError;
use sylvan_patterns::PatternError;
use sylvan_syntax::{ParseError, QueryError};

/// Everything that can go wrong in the facade.
///
/// Syntax errors in the analyzed source are not here: they are data on the
/// [`ParseResult`](crate::ParseResult).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Language(#[from] LanguageError),
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
}
