//! Language resolution from file paths and from content.

use crate::{LanguageId, descriptors};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

/// Cached extension → language lookup table.
static EXTENSION_MAP: OnceLock<HashMap<&'static str, LanguageId>> = OnceLock::new();

/// Cached lowercase filename → language lookup table.
static FILENAME_MAP: OnceLock<HashMap<&'static str, LanguageId>> = OnceLock::new();

/// Filename globs and the language each glob index maps to.
static FILENAME_GLOBS: OnceLock<(GlobSet, Vec<LanguageId>)> = OnceLock::new();

fn extension_map() -> &'static HashMap<&'static str, LanguageId> {
    EXTENSION_MAP.get_or_init(|| {
        let mut map = HashMap::new();
        for d in descriptors() {
            for ext in d.extensions {
                map.insert(*ext, d.id);
            }
        }
        map
    })
}

fn filename_map() -> &'static HashMap<&'static str, LanguageId> {
    FILENAME_MAP.get_or_init(|| {
        let mut map = HashMap::new();
        for d in descriptors() {
            for name in d.filenames {
                map.insert(*name, d.id);
            }
        }
        map
    })
}

fn filename_globs() -> &'static (GlobSet, Vec<LanguageId>) {
    FILENAME_GLOBS.get_or_init(|| {
        let mut builder = GlobSetBuilder::new();
        let mut ids = Vec::new();
        for d in descriptors() {
            for pattern in d.filename_globs {
                match GlobBuilder::new(pattern).case_insensitive(true).build() {
                    Ok(glob) => {
                        builder.add(glob);
                        ids.push(d.id);
                    }
                    Err(e) => tracing::warn!(pattern, error = %e, "invalid filename glob"),
                }
            }
        }
        let set = builder.build().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to build filename glob set");
            GlobSet::empty()
        });
        (set, ids)
    })
}

/// Resolve the language for a file path.
///
/// Special filenames win over extensions (`Jenkinsfile` is Groovy,
/// `Dockerfile.prod` is a Dockerfile). Unknown paths resolve to
/// [`LanguageId::Unsupported`]; this never fails.
pub fn language_for_path(path: &Path) -> LanguageId {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return LanguageId::Unsupported;
    };

    let lower = file_name.to_ascii_lowercase();
    if let Some(id) = filename_map().get(lower.as_str()) {
        return *id;
    }

    let (globs, ids) = filename_globs();
    if let Some(index) = globs.matches(file_name).into_iter().min() {
        return ids[index];
    }

    path.extension()
        .and_then(|e| e.to_str())
        .and_then(language_for_extension)
        .unwrap_or(LanguageId::Unsupported)
}

/// Resolve a bare extension (with or without the leading dot).
pub fn language_for_extension(ext: &str) -> Option<LanguageId> {
    let ext = ext.trim_start_matches('.').to_ascii_lowercase();
    extension_map().get(ext.as_str()).copied()
}

/// Whether the path has something resolution can key on: a special file
/// name or an extension. Content detection is for the remaining cases.
pub fn has_path_hint(path: &Path) -> bool {
    if path.extension().is_some() {
        return true;
    }
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| filename_map().contains_key(n.to_ascii_lowercase().as_str()))
}

/// Interpreter names recognised on a `#!` line.
const SHEBANGS: &[(&str, LanguageId)] = &[
    ("python", LanguageId::Python),
    ("node", LanguageId::JavaScript),
    ("deno", LanguageId::TypeScript),
    ("ruby", LanguageId::Ruby),
    ("perl", LanguageId::Perl),
    ("php", LanguageId::Php),
    ("lua", LanguageId::Lua),
    ("fish", LanguageId::Fish),
    ("bash", LanguageId::Bash),
    ("zsh", LanguageId::Bash),
    ("sh", LanguageId::Bash),
    ("elixir", LanguageId::Elixir),
    ("julia", LanguageId::Julia),
    ("Rscript", LanguageId::R),
];

fn shebang_language(first_line: &str) -> Option<LanguageId> {
    let rest = first_line.strip_prefix("#!")?;
    let mut words = rest.split_whitespace();
    let mut program = words.next()?.rsplit('/').next()?;
    if program == "env" {
        // `#!/usr/bin/env -S python3 -u`
        program = words.find(|w| !w.starts_with('-'))?;
    }
    SHEBANGS
        .iter()
        .find(|(name, _)| {
            program == *name
                || program
                    .strip_prefix(name)
                    .is_some_and(|v| v.chars().all(|c| c.is_ascii_digit() || c == '.'))
        })
        .map(|(_, id)| *id)
}

/// Ordered content markers; the first matching rule wins.
fn content_rules() -> &'static [(Regex, LanguageId)] {
    static RULES: OnceLock<Vec<(Regex, LanguageId)>> = OnceLock::new();
    RULES.get_or_init(|| {
        let rules: &[(&str, LanguageId)] = &[
            (r"^\s*<\?php", LanguageId::Php),
            (r"(?i)^\s*<!doctype html|^\s*<html", LanguageId::Html),
            (r"(?m)^\s*package\s+main\b|^func\s+\w+\(", LanguageId::Go),
            (r"(?m)^\s*(pub\s+)?fn\s+\w+.*\{|^\s*use\s+\w+(::\w+)+;", LanguageId::Rust),
            (r"(?m)^\s*using\s+System(\.\w+)*;", LanguageId::CSharp),
            (r"(?m)^\s*import\s+java\.|^\s*public\s+(final\s+)?class\s+\w+", LanguageId::Java),
            (r"(?m)^\s*#include\s*<(iostream|vector|string|memory|map)>|\bstd::|^\s*namespace\s+\w+", LanguageId::Cpp),
            (r"(?m)^\s*#include\s*[<\x22]", LanguageId::C),
            (r"(?m)^\s*(async\s+)?def\s+\w+\s*\(.*\)\s*(->.*)?:|^\s*from\s+[\w.]+\s+import\s", LanguageId::Python),
            (r"(?m)^\s*(export\s+)?(interface|type)\s+\w+.*[={]|:\s*(string|number|boolean)\b", LanguageId::TypeScript),
            (r"(?m)^\s*(const|let|var)\s+\w+\s*=|^\s*function\s+\w+\s*\(|=>\s*\{|require\(", LanguageId::JavaScript),
            (r"(?m)^\s*def\s+\w+|^\s*require\s+['\x22]|^\s*end\s*$", LanguageId::Ruby),
            (r"^\s*[\[{]", LanguageId::Json),
        ];
        rules
            .iter()
            .filter_map(|(pattern, id)| match Regex::new(pattern) {
                Ok(re) => Some((re, *id)),
                Err(e) => {
                    tracing::warn!(pattern, error = %e, "invalid content detection rule");
                    None
                }
            })
            .collect()
    })
}

/// Guess the language of a snippet from its content alone.
///
/// Checks a shebang line first, then a fixed, ordered list of markers.
/// Returns [`LanguageId::Unsupported`] when nothing is recognised.
pub fn detect_language(content: &str) -> LanguageId {
    let first_line = content.lines().next().unwrap_or_default();
    if let Some(id) = shebang_language(first_line.trim()) {
        return id;
    }
    content_rules()
        .iter()
        .find(|(re, _)| re.is_match(content))
        .map(|(_, id)| *id)
        .unwrap_or(LanguageId::Unsupported)
}
