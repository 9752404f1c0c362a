//! Language service: path resolution plus cached grammar and parser handles.
//!
//! The process-wide [`language_service()`] singleton lives in a `'static
//! OnceLock`, so libraries behind dynamically loaded grammars are never
//! unloaded while trees built from them exist.

use crate::bundled::bundled_grammar;
use crate::{GrammarLoader, LanguageDescriptor, LanguageError, LanguageFeatures, LanguageId};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tree_sitter::{Language, Parser};

static LANGUAGE_SERVICE: OnceLock<Arc<LanguageService>> = OnceLock::new();

/// Get the process-wide language service.
pub fn language_service() -> Arc<LanguageService> {
    LANGUAGE_SERVICE
        .get_or_init(|| Arc::new(LanguageService::new()))
        .clone()
}

/// Where a grammar came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "lowercase")]
pub enum GrammarOrigin {
    Bundled,
    External(PathBuf),
}

/// Metadata about a bound grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrammarBinding {
    pub language: LanguageId,
    pub grammar: &'static str,
    pub abi_version: usize,
    pub node_kind_count: usize,
    pub field_count: usize,
    pub origin: GrammarOrigin,
}

type GrammarSlot = OnceLock<Result<(Language, GrammarOrigin), LanguageError>>;

/// Resolves languages and hands out grammar and parser handles.
///
/// Each language's grammar is loaded at most once; concurrent first callers
/// block on the single load. Failed loads are remembered too, so a missing
/// grammar costs one directory search per process.
pub struct LanguageService {
    loader: GrammarLoader,
    slots: HashMap<LanguageId, GrammarSlot>,
}

impl LanguageService {
    /// Service backed by a loader with the default search paths.
    pub fn new() -> Self {
        Self::with_loader(GrammarLoader::new())
    }

    pub fn with_loader(loader: GrammarLoader) -> Self {
        let slots = LanguageId::ALL
            .iter()
            .map(|id| (*id, OnceLock::new()))
            .collect();
        Self { loader, slots }
    }

    pub fn loader(&self) -> &GrammarLoader {
        &self.loader
    }

    pub fn descriptor(&self, id: LanguageId) -> &'static LanguageDescriptor {
        crate::descriptor(id)
    }

    pub fn language_features(&self, id: LanguageId) -> LanguageFeatures {
        crate::descriptor(id).features
    }

    /// Resolve a file path; see [`crate::language_for_path`].
    pub fn get_language_for_file(&self, path: &Path) -> LanguageId {
        crate::language_for_path(path)
    }

    /// Guess a language from content; see [`crate::detect_language`].
    pub fn detect_language(&self, content: &str) -> LanguageId {
        crate::detect_language(content)
    }

    /// The grammar handle for `id`, loading it on first use.
    pub fn get_language_object(&self, id: LanguageId) -> Result<Language, LanguageError> {
        self.slot(id).map(|(language, _)| language.clone())
    }

    /// A fresh parser bound to the grammar for `id`.
    ///
    /// Parsers carry per-parse state, so each caller gets its own; the
    /// grammar behind it is shared.
    pub fn get_parser(&self, id: LanguageId) -> Result<Parser, LanguageError> {
        let language = self.get_language_object(id)?;
        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| LanguageError::Incompatible {
                language: id,
                message: e.to_string(),
            })?;
        Ok(parser)
    }

    /// Metadata for the grammar bound to `id`.
    pub fn get_binding(&self, id: LanguageId) -> Result<GrammarBinding, LanguageError> {
        let (language, origin) = self.slot(id)?;
        Ok(GrammarBinding {
            language: id,
            grammar: crate::descriptor(id).grammar.unwrap_or(id.as_str()),
            abi_version: language.abi_version(),
            node_kind_count: language.node_kind_count(),
            field_count: language.field_count(),
            origin: origin.clone(),
        })
    }

    /// Whether a grammar for `id` can be loaded.
    pub fn is_language_supported(&self, id: LanguageId) -> bool {
        self.slot(id).is_ok()
    }

    /// Every language with a loadable grammar, in [`LanguageId::ALL`] order.
    pub fn supported_languages(&self) -> Vec<LanguageId> {
        LanguageId::ALL
            .iter()
            .copied()
            .filter(|id| self.is_language_supported(*id))
            .collect()
    }

    fn slot(&self, id: LanguageId) -> Result<&(Language, GrammarOrigin), LanguageError> {
        let Some(slot) = self.slots.get(&id) else {
            return Err(LanguageError::Unsupported(id));
        };
        slot.get_or_init(|| self.load(id)).as_ref().map_err(Clone::clone)
    }

    fn load(&self, id: LanguageId) -> Result<(Language, GrammarOrigin), LanguageError> {
        let Some(grammar) = crate::descriptor(id).grammar else {
            return Err(LanguageError::Unsupported(id));
        };

        if let Some(language) = bundled_grammar(id) {
            tracing::trace!(language = %id, "using bundled grammar");
            return Ok((language, GrammarOrigin::Bundled));
        }

        match self.loader.get(grammar) {
            Some(language) => {
                let path = self.loader.loaded_path(grammar).unwrap_or_default();
                Ok((language, GrammarOrigin::External(path)))
            }
            None => {
                tracing::debug!(language = %id, grammar, "grammar not available");
                Err(LanguageError::GrammarNotFound { language: id, grammar })
            }
        }
    }
}

impl Default for LanguageService {
    fn default() -> Self {
        Self::new()
    }
}
