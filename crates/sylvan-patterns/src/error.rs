use sylvan_languages::LanguageError;

#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("invalid pattern file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Language(#[from] LanguageError),
    #[error("unknown language family '{0}'")]
    UnknownFamily(String),
}
