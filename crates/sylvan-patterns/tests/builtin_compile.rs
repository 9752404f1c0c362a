//! Every built-in pattern must compile against the grammar it targets.
//!
//! A compile failure here is a broken pattern table, caught at build time
//! rather than as silently empty results in a batch run.

use sylvan_languages::{LanguageId, bundled_grammar, bundled_languages};
use sylvan_patterns::{PatternCategory, PatternLayer, PatternRegistry};
use tree_sitter::Query;

fn has_language_table(registry: &PatternRegistry, id: LanguageId) -> bool {
    PatternCategory::BUILTIN
        .iter()
        .any(|category| registry.get_pattern(PatternLayer::Language, category, id).is_some())
}

#[test]
fn builtin_patterns_compile_for_bundled_grammars() {
    let registry = PatternRegistry::with_builtin();
    let mut failures = Vec::new();

    for id in bundled_languages() {
        let Some(language) = bundled_grammar(id) else {
            continue;
        };
        for (category, text) in registry.get_language_patterns(id) {
            if let Err(e) = Query::new(&language, &text) {
                failures.push(format!("{id}/{category}: {e}"));
            }
        }
    }

    assert!(failures.is_empty(), "patterns failed to compile:\n{}", failures.join("\n"));
}

#[test]
fn languages_with_builtin_tables_are_bundled() {
    let registry = PatternRegistry::with_builtin();
    let unbundled: Vec<_> = LanguageId::ALL
        .iter()
        .copied()
        .filter(|id| has_language_table(&registry, *id) && bundled_grammar(*id).is_none())
        .collect();
    assert!(unbundled.is_empty(), "built-in tables without a bundled grammar: {unbundled:?}");

    for id in [LanguageId::Php, LanguageId::Kotlin, LanguageId::Lua] {
        assert!(!has_language_table(&registry, id), "{id}");
    }
}

#[test]
fn capture_names_follow_role_convention() {
    let registry = PatternRegistry::with_builtin();
    for id in bundled_languages() {
        let Some(language) = bundled_grammar(id) else {
            continue;
        };
        for (category, text) in registry.get_language_patterns(id) {
            let Ok(query) = Query::new(&language, &text) else {
                continue;
            };
            let prefix = format!("{}.", category.as_str());
            for name in query.capture_names() {
                assert!(
                    name.starts_with('_') || name.starts_with(&prefix),
                    "{id}/{category}: capture @{name} outside the category"
                );
            }
            assert!(
                query.capture_names().iter().any(|n| *n == format!("{prefix}def")),
                "{id}/{category}: no @{prefix}def capture"
            );
        }
    }
}

#[test]
fn core_categories_cover_programming_languages() {
    let registry = PatternRegistry::with_builtin();
    for id in [
        LanguageId::Python,
        LanguageId::JavaScript,
        LanguageId::TypeScript,
        LanguageId::Tsx,
        LanguageId::Rust,
        LanguageId::Go,
        LanguageId::Java,
        LanguageId::C,
        LanguageId::Cpp,
        LanguageId::CSharp,
        LanguageId::Ruby,
    ] {
        for category in [PatternCategory::Function, PatternCategory::Class, PatternCategory::Import] {
            assert!(registry.supports(&category, id), "{id} lacks {category}");
        }
    }
}
