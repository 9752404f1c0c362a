//! Dynamic grammar loading for tree-sitter.
//!
//! Loads tree-sitter grammars from shared libraries (.so/.dylib/.dll) for
//! languages that are not bundled, and serves query files (`.scm`) that sit
//! next to them so extra patterns can ship with a grammar.
//!
//! # ABI Compatibility
//!
//! Tree-sitter 0.26 loads grammars built for ABI 13-15. A grammar built
//! against an older or newer runtime binds with
//! [`LanguageError::Incompatible`](crate::LanguageError::Incompatible) when
//! a parser is created for it.
//!
//! # Lifetime Requirements
//!
//! The `GrammarLoader` must outlive any `Language` or `Tree` obtained from it.
//! The loader holds the shared library that contains the grammar's code; if
//! the loader is dropped the library is unloaded and every `Language`/`Tree`
//! built from it dangles. Use the process-wide
//! [`language_service()`](crate::language_service) unless you keep your own
//! loader alive for as long as its trees.

use libloading::{Library, Symbol};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tree_sitter::Language;
use tree_sitter_language::LanguageFn;

/// Environment variable holding extra grammar directories (colon-separated).
pub const GRAMMAR_PATH_ENV: &str = "SYLVAN_GRAMMAR_PATH";

/// Loaded grammar with its backing library.
struct LoadedGrammar {
    /// Backing shared library - must outlive any use of `language`.
    _library: Library,
    language: Language,
    path: PathBuf,
}

/// Dynamic grammar loader with caching.
pub struct GrammarLoader {
    search_paths: Vec<PathBuf>,
    cache: RwLock<HashMap<String, Arc<LoadedGrammar>>>,
    /// Query files keyed by (grammar, kind).
    query_cache: RwLock<HashMap<(String, String), Arc<String>>>,
}

impl GrammarLoader {
    /// Create a loader with the default search paths.
    ///
    /// Search order:
    /// 1. `SYLVAN_GRAMMAR_PATH` environment variable (colon-separated)
    /// 2. `~/.config/sylvan/grammars/`
    pub fn new() -> Self {
        let mut paths = Vec::new();

        if let Ok(env_path) = std::env::var(GRAMMAR_PATH_ENV) {
            for p in env_path.split(':') {
                if !p.is_empty() {
                    paths.push(PathBuf::from(p));
                }
            }
        }

        if let Some(config) = dirs::config_dir() {
            paths.push(config.join("sylvan/grammars"));
        }

        Self::with_paths(paths)
    }

    /// Create a loader with custom search paths only.
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            search_paths: paths,
            cache: RwLock::new(HashMap::new()),
            query_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Add a search path. Earlier paths win.
    pub fn add_path(&mut self, path: PathBuf) {
        self.search_paths.push(path);
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Get a grammar by name.
    ///
    /// Returns None if the grammar is not found in the search paths or its
    /// library does not export `tree_sitter_{name}`.
    pub fn get(&self, name: &str) -> Option<Language> {
        if let Some(loaded) = self.cache.read().ok()?.get(name) {
            return Some(loaded.language.clone());
        }

        self.load_external(name)
    }

    /// Path of the library a grammar was loaded from, if it is loaded.
    pub fn loaded_path(&self, name: &str) -> Option<PathBuf> {
        self.cache.read().ok()?.get(name).map(|g| g.path.clone())
    }

    /// Get a query file for a grammar.
    ///
    /// Query files are `{name}.{kind}.scm` in the grammar search paths, e.g.
    /// `python.function.scm`.
    pub fn get_query(&self, name: &str, kind: &str) -> Option<Arc<String>> {
        let key = (name.to_string(), kind.to_string());
        if let Some(query) = self.query_cache.read().ok()?.get(&key) {
            return Some(Arc::clone(query));
        }

        let scm_name = format!("{name}.{kind}.scm");
        for search_path in &self.search_paths {
            let scm_path = search_path.join(&scm_name);
            if scm_path.exists()
                && let Ok(content) = std::fs::read_to_string(&scm_path)
            {
                let query = Arc::new(content);
                if let Ok(mut c) = self.query_cache.write() {
                    c.insert(key, Arc::clone(&query));
                }
                tracing::debug!(grammar = name, kind, path = %scm_path.display(), "loaded query file");
                return Some(query);
            }
        }

        None
    }

    fn load_external(&self, name: &str) -> Option<Language> {
        let lib_name = grammar_lib_name(name);

        for search_path in &self.search_paths {
            let lib_path = search_path.join(&lib_name);
            if lib_path.exists()
                && let Some(lang) = self.load_from_path(name, &lib_path)
            {
                return Some(lang);
            }
        }

        None
    }

    fn load_from_path(&self, name: &str, path: &Path) -> Option<Language> {
        // SAFETY: loading a shared library runs its initialisers. Grammars
        // only come from the configured search paths.
        let library = match unsafe { Library::new(path) } {
            Ok(lib) => lib,
            Err(e) => {
                tracing::warn!(grammar = name, path = %path.display(), error = %e, "failed to open grammar library");
                return None;
            }
        };

        let symbol_name = grammar_symbol_name(name);
        // SAFETY: `tree_sitter_{name}` is the tree-sitter C ABI entry point
        // returning a `TSLanguage` pointer valid for the life of the library,
        // which we keep alongside the language.
        let language = unsafe {
            let func: Symbol<unsafe extern "C" fn() -> *const ()> =
                match library.get(symbol_name.as_bytes()) {
                    Ok(f) => f,
                    Err(e) => {
                        tracing::warn!(grammar = name, symbol = %symbol_name, error = %e, "grammar symbol missing");
                        return None;
                    }
                };
            let lang_fn = LanguageFn::from_raw(*func);
            Language::new(lang_fn)
        };

        let loaded = Arc::new(LoadedGrammar {
            _library: library,
            language: language.clone(),
            path: path.to_path_buf(),
        });

        if let Ok(mut cache) = self.cache.write() {
            cache.insert(name.to_string(), loaded);
        }
        tracing::debug!(grammar = name, path = %path.display(), "loaded external grammar");

        Some(language)
    }

    /// List grammars available in search paths.
    pub fn available_external(&self) -> Vec<String> {
        let mut grammars = Vec::new();
        let ext = grammar_extension();

        for path in &self.search_paths {
            if let Ok(entries) = std::fs::read_dir(path) {
                for entry in entries.flatten() {
                    let name = entry.file_name();
                    let name_str = name.to_string_lossy();
                    if let Some(grammar_name) = name_str.strip_suffix(ext)
                        && !grammars.iter().any(|g| g == grammar_name)
                    {
                        grammars.push(grammar_name.to_string());
                    }
                }
            }
        }

        grammars.sort();
        grammars
    }
}

impl Default for GrammarLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Library file name for a grammar.
fn grammar_lib_name(name: &str) -> String {
    let ext = grammar_extension();
    format!("{name}{ext}")
}

/// Exported entry point for a grammar; hyphens become underscores.
fn grammar_symbol_name(name: &str) -> String {
    let normalized = name.replace('-', "_");
    format!("tree_sitter_{normalized}")
}

/// Shared library extension for the current platform.
fn grammar_extension() -> &'static str {
    if cfg!(target_os = "macos") {
        ".dylib"
    } else if cfg!(target_os = "windows") {
        ".dll"
    } else {
        ".so"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grammar_lib_name() {
        let name = grammar_lib_name("python");
        assert!(name.starts_with("python."));
    }

    #[test]
    fn test_grammar_symbol_name() {
        assert_eq!(grammar_symbol_name("python"), "tree_sitter_python");
        assert_eq!(grammar_symbol_name("c_sharp"), "tree_sitter_c_sharp");
        assert_eq!(grammar_symbol_name("ssh-config"), "tree_sitter_ssh_config");
    }

    #[test]
    fn test_missing_grammar_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loader = GrammarLoader::with_paths(vec![dir.path().to_path_buf()]);
        assert!(loader.get("kotlin").is_none());
        assert!(loader.loaded_path("kotlin").is_none());
    }

    #[test]
    fn test_garbage_library_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(grammar_lib_name("lua")), b"not a library").unwrap();
        let loader = GrammarLoader::with_paths(vec![dir.path().to_path_buf()]);
        assert!(loader.get("lua").is_none());
        assert_eq!(loader.available_external(), vec!["lua".to_string()]);
    }

    #[test]
    fn test_query_files_are_read_and_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lua.function.scm");
        std::fs::write(&path, "(function_declaration) @function.def").unwrap();
        let loader = GrammarLoader::with_paths(vec![dir.path().to_path_buf()]);

        let first = loader.get_query("lua", "function").unwrap();
        assert_eq!(first.as_str(), "(function_declaration) @function.def");

        // Served from the cache after the file is gone.
        std::fs::remove_file(&path).unwrap();
        let second = loader.get_query("lua", "function").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(loader.get_query("lua", "class").is_none());
    }
}
