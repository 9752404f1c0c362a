use crate::assembler::Unparsed;
use crate::{AnalyzerConfig, Error, ParseResult};
use rayon::prelude::*;
use std::path::Path;
use std::sync::Arc;
use sylvan_languages::{
    GrammarLoader, LanguageId, LanguageService, has_path_hint, language_service,
};
use sylvan_patterns::PatternRegistry;
use sylvan_syntax::{ParseError, QueryHandler};

/// Entry point: parse content or files into [`ParseResult`]s.
///
/// Cheap to share across threads; every call parses an independent tree.
pub struct Analyzer {
    languages: Arc<LanguageService>,
    handler: QueryHandler,
    strict: bool,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    /// Built-in patterns and the process-wide language service.
    pub fn new() -> Self {
        let languages = language_service();
        let registry = Arc::new(PatternRegistry::with_builtin());
        Self {
            handler: QueryHandler::new(Arc::clone(&languages), registry),
            languages,
            strict: false,
        }
    }

    pub fn from_config(config: &AnalyzerConfig) -> Result<Self, Error> {
        let languages = if config.grammars.search_paths.is_empty() {
            language_service()
        } else {
            let mut paths = config.grammars.search_paths.clone();
            paths.extend(GrammarLoader::new().search_paths().iter().cloned());
            Arc::new(LanguageService::with_loader(GrammarLoader::with_paths(paths)))
        };

        let registry = PatternRegistry::with_builtin();
        let external = registry.load_external(languages.loader(), LanguageId::ALL.iter().copied());
        let overrides = registry.apply_overrides(&config.patterns)?;
        tracing::debug!(external, overrides, strict = config.strict_patterns, "analyzer configured");

        Ok(Self {
            handler: QueryHandler::new(Arc::clone(&languages), Arc::new(registry))
                .with_settings(config.query),
            languages,
            strict: config.strict_patterns,
        })
    }

    pub fn language_service(&self) -> &Arc<LanguageService> {
        &self.languages
    }

    /// The registry behind this analyzer. Patterns registered here apply to
    /// the next parse.
    pub fn registry(&self) -> &Arc<PatternRegistry> {
        self.handler.registry()
    }

    pub fn query_handler(&self) -> &QueryHandler {
        &self.handler
    }

    /// Parse `content` as `language`.
    ///
    /// A language without a usable grammar yields an unsupported result, not
    /// an error. Errors are reserved for broken patterns in strict mode.
    pub fn parse_content(&self, content: &[u8], language: LanguageId) -> Result<ParseResult, Error> {
        let parsed = match Unparsed::new(language, content).parse(&self.languages) {
            Ok(parsed) => parsed,
            Err(ParseError::Language(e)) => {
                tracing::debug!(language = %language, error = %e, "not parsed");
                return Ok(ParseResult::unparsed(language, e.to_string()));
            }
            Err(e @ ParseError::NoTree(_)) => {
                tracing::warn!(language = %language, "parser produced no tree");
                return Ok(ParseResult::unparsed(language, e.to_string()));
            }
        };
        Ok(parsed.analyze(&self.handler, self.strict)?)
    }

    /// Parse `content` as the language named `language` (`"python"`, `"ts"`, ...).
    pub fn parse_named(&self, content: &[u8], language: &str) -> Result<ParseResult, Error> {
        let id: LanguageId = language.parse()?;
        self.parse_content(content, id)
    }

    /// Read and parse a file.
    ///
    /// The language comes from the path; the content is only inspected
    /// (shebang, heuristics) when the path has no extension or known name.
    pub fn parse_file(&self, path: &Path) -> Result<ParseResult, Error> {
        let content = std::fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut language = self.languages.get_language_for_file(path);
        if language.is_unsupported() && !has_path_hint(path) {
            language = self.languages.detect_language(&String::from_utf8_lossy(&content));
        }
        tracing::trace!(path = %path.display(), language = %language, "resolved language");
        self.parse_content(&content, language).inspect_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "analysis failed");
        })
    }

    /// Parse many files in parallel. Results are in input order; one
    /// file's failure does not affect the others.
    pub fn parse_batch<P>(&self, paths: &[P]) -> Vec<Result<ParseResult, Error>>
    where
        P: AsRef<Path> + Sync,
    {
        paths
            .par_iter()
            .map(|path| self.parse_file(path.as_ref()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_named_rejects_unknown_language() {
        let analyzer = Analyzer::new();
        let err = analyzer.parse_named(b"x", "klingon").unwrap_err();
        assert!(matches!(
            err,
            Error::Language(sylvan_languages::LanguageError::UnknownLanguage(_))
        ));
        assert!(analyzer.parse_named(b"x = 1\n", "py").unwrap().is_supported);
    }

    #[test]
    fn test_parse_file_detects_shebang_without_extension() {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("deploy");
        std::fs::write(&script, "#!/usr/bin/env python3\ndef main():\n    pass\n").unwrap();
        let result = Analyzer::new().parse_file(&script).unwrap();
        assert_eq!(result.language, LanguageId::Python);
        assert_eq!(result.metadata.function_names, ["main"]);
    }

    #[test]
    fn test_parse_file_missing_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = Analyzer::new().parse_file(&dir.path().join("gone.py")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_config_overrides_reach_queries() {
        let config = AnalyzerConfig::from_toml_str(
            "[patterns.languages.python]\ndecorator = \"(decorator (identifier) @decorator.name) @decorator.def\"\n",
        )
        .unwrap();
        let analyzer = Analyzer::from_config(&config).unwrap();
        let result = analyzer.parse_content(b"@cached\ndef f():\n    pass\n", LanguageId::Python).unwrap();
        let tree = result.tree.as_ref().unwrap();
        let decorators = analyzer
            .query_handler()
            .find_category(tree, tree.root(), sylvan_patterns::PatternCategory::Decorator)
            .unwrap();
        assert_eq!(decorators.groups.len(), 1);
        assert!(decorators.groups[0].is_named());
    }

    #[test]
    fn test_bad_override_key_fails_construction() {
        let config = AnalyzerConfig::from_toml_str("[patterns.languages.klingon]\nfunction = \"(x) @function.def\"\n").unwrap();
        assert!(matches!(Analyzer::from_config(&config), Err(Error::Pattern(_))));
    }
}
