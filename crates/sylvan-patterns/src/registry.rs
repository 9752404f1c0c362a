//! Layered pattern registry: base, family, then language.

use crate::{PatternCategory, PatternError, builtin};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use sylvan_languages::{GrammarLoader, LanguageFamily, LanguageId, descriptor};

/// Patterns for one scope, keyed by category.
pub type PatternSet = BTreeMap<PatternCategory, Arc<str>>;

/// Which layer a lookup reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternLayer {
    /// Patterns shared by every language.
    Base,
    /// The language's family baseline.
    Family,
    /// Patterns registered for the language itself.
    Language,
    /// Language, falling back to family, then base.
    Effective,
}

#[derive(Default)]
struct Layers {
    base: PatternSet,
    families: HashMap<LanguageFamily, PatternSet>,
    languages: HashMap<LanguageId, PatternSet>,
}

/// Per-language query patterns with family defaults and runtime overrides.
///
/// Construct one with [`PatternRegistry::with_builtin`] and share it by
/// `Arc`. Registration is additive: an entry can be replaced but never
/// removed. Writes are serialized; a read holds the lock only long enough
/// to clone an `Arc<str>`.
///
/// Readers never wait on each other, and queries run without the lock. A
/// read can still wait behind a registration in progress; writers hold the
/// lock for a single map insert.
#[derive(Default)]
pub struct PatternRegistry {
    layers: RwLock<Layers>,
}

/// Extra patterns in TOML form.
///
/// ```toml
/// [languages.python]
/// decorator = "(decorator) @decorator.def"
///
/// [families.ecmascript]
/// comment = "(comment) @comment.def"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatternOverrides {
    pub languages: BTreeMap<String, BTreeMap<String, String>>,
    pub families: BTreeMap<String, BTreeMap<String, String>>,
}

impl PatternOverrides {
    pub fn is_empty(&self) -> bool {
        self.languages.is_empty() && self.families.is_empty()
    }
}

impl PatternRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in patterns for every known language.
    pub fn with_builtin() -> Self {
        let mut layers = Layers::default();
        for (category, text) in builtin::base() {
            layers.base.insert(category.clone(), Arc::from(*text));
        }
        for family in LanguageFamily::ALL {
            let set = layers.families.entry(*family).or_default();
            for (category, text) in builtin::family(*family) {
                set.insert(category.clone(), Arc::from(*text));
            }
        }
        for id in LanguageId::ALL {
            let table = builtin::language(*id);
            if table.is_empty() {
                continue;
            }
            let set = layers.languages.entry(*id).or_default();
            for (category, text) in table {
                set.insert(category.clone(), Arc::from(*text));
            }
        }
        Self {
            layers: RwLock::new(layers),
        }
    }

    /// Look up one pattern.
    ///
    /// Absence is not an error: it means the category does not apply to
    /// the language at that layer.
    pub fn get_pattern(
        &self,
        layer: PatternLayer,
        category: &PatternCategory,
        language: LanguageId,
    ) -> Option<Arc<str>> {
        let layers = self.read();
        let family = descriptor(language).family;
        let from_language = || layers.languages.get(&language)?.get(category).cloned();
        let from_family = || layers.families.get(&family?)?.get(category).cloned();
        let from_base = || layers.base.get(category).cloned();
        match layer {
            PatternLayer::Base => from_base(),
            PatternLayer::Family => from_family(),
            PatternLayer::Language => from_language(),
            PatternLayer::Effective => from_language().or_else(from_family).or_else(from_base),
        }
    }

    /// The effective pattern for a category.
    pub fn pattern_for(&self, category: &PatternCategory, language: LanguageId) -> Option<Arc<str>> {
        self.get_pattern(PatternLayer::Effective, category, language)
    }

    /// Whether any layer has a pattern for `category` in `language`.
    pub fn supports(&self, category: &PatternCategory, language: LanguageId) -> bool {
        self.pattern_for(category, language).is_some()
    }

    /// Every effective pattern for a language: base, then family, then
    /// language entries, later layers winning on collision.
    pub fn get_language_patterns(&self, language: LanguageId) -> PatternSet {
        let layers = self.read();
        let mut merged = layers.base.clone();
        if let Some(family) = descriptor(language).family
            && let Some(set) = layers.families.get(&family)
        {
            merged.extend(set.iter().map(|(k, v)| (k.clone(), Arc::clone(v))));
        }
        if let Some(set) = layers.languages.get(&language) {
            merged.extend(set.iter().map(|(k, v)| (k.clone(), Arc::clone(v))));
        }
        merged
    }

    /// Register a pattern for one language. Visible to the next lookup.
    pub fn register_language_pattern(
        &self,
        language: LanguageId,
        category: PatternCategory,
        pattern: impl Into<Arc<str>>,
    ) {
        let pattern = pattern.into();
        let previous = self
            .write()
            .languages
            .entry(language)
            .or_default()
            .insert(category.clone(), pattern);
        tracing::debug!(
            language = %language,
            category = %category,
            replaced = previous.is_some(),
            "registered language pattern"
        );
    }

    /// Register a pattern shared by a whole family.
    pub fn register_family_pattern(
        &self,
        family: LanguageFamily,
        category: PatternCategory,
        pattern: impl Into<Arc<str>>,
    ) {
        let pattern = pattern.into();
        let previous = self
            .write()
            .families
            .entry(family)
            .or_default()
            .insert(category.clone(), pattern);
        tracing::debug!(
            family = %family,
            category = %category,
            replaced = previous.is_some(),
            "registered family pattern"
        );
    }

    /// Register every pattern in `overrides`. Returns how many were added.
    ///
    /// Keys are validated before anything is registered, so a bad key
    /// leaves the registry untouched.
    pub fn apply_overrides(&self, overrides: &PatternOverrides) -> Result<usize, PatternError> {
        let mut languages = Vec::new();
        for (name, patterns) in &overrides.languages {
            let id: LanguageId = name.parse()?;
            for (category, text) in patterns {
                languages.push((id, PatternCategory::from_name(category), text.as_str()));
            }
        }
        let mut families = Vec::new();
        for (name, patterns) in &overrides.families {
            let family: LanguageFamily = name
                .parse()
                .map_err(|_| PatternError::UnknownFamily(name.clone()))?;
            for (category, text) in patterns {
                families.push((family, PatternCategory::from_name(category), text.as_str()));
            }
        }

        let count = languages.len() + families.len();
        for (family, category, text) in families {
            self.register_family_pattern(family, category, text);
        }
        for (id, category, text) in languages {
            self.register_language_pattern(id, category, text);
        }
        Ok(count)
    }

    /// Parse TOML pattern overrides and register them.
    pub fn load_toml(&self, text: &str) -> Result<usize, PatternError> {
        let overrides: PatternOverrides = toml::from_str(text)?;
        self.apply_overrides(&overrides)
    }

    /// Register `{grammar}.{category}.scm` query files found next to the
    /// grammars in `loader`'s search paths. Returns how many were found.
    pub fn load_external(
        &self,
        loader: &GrammarLoader,
        languages: impl IntoIterator<Item = LanguageId>,
    ) -> usize {
        let mut count = 0;
        for id in languages {
            let Some(grammar) = descriptor(id).grammar else {
                continue;
            };
            for category in PatternCategory::BUILTIN {
                if let Some(text) = loader.get_query(grammar, category.as_str()) {
                    self.register_language_pattern(id, category.clone(), text.as_str());
                    count += 1;
                }
            }
        }
        count
    }

    // The layers only hold plain data, so a writer that panicked cannot
    // leave them half-updated in a way readers care about.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, Layers> {
        self.layers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Layers> {
        self.layers.write().unwrap_or_else(PoisonError::into_inner)
    }
}
