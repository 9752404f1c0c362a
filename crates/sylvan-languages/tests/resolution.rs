//! Resolution and grammar binding across the whole language table.

use std::path::{Path, PathBuf};
use sylvan_languages::{
    GrammarLoader, GrammarOrigin, LanguageError, LanguageId, LanguageService, descriptors,
    language_for_path,
};

#[test]
fn every_extension_resolves_to_its_descriptor() {
    for d in descriptors() {
        for ext in d.extensions {
            let path = PathBuf::from(format!("dir/file.{ext}"));
            assert_eq!(language_for_path(&path), d.id, "{}", path.display());
        }
    }
}

#[test]
fn every_special_filename_resolves() {
    for d in descriptors() {
        for name in d.filenames {
            assert_eq!(language_for_path(Path::new(name)), d.id, "{name}");
        }
    }
}

#[test]
fn unrecognized_extension_falls_back_without_error() {
    let service = LanguageService::with_loader(GrammarLoader::with_paths(Vec::new()));
    let id = service.get_language_for_file(Path::new("notes.xyz"));
    assert_eq!(id, LanguageId::Unsupported);
    assert!(!service.is_language_supported(id));
    assert_eq!(service.descriptor(id).name, "Unsupported");
}

#[test]
fn bundled_parsers_parse_trivial_input() {
    let service = LanguageService::with_loader(GrammarLoader::with_paths(Vec::new()));
    for id in sylvan_languages::bundled_languages() {
        let mut parser = service.get_parser(id).unwrap();
        let tree = parser.parse("", None).unwrap();
        assert!(!tree.root_node().kind().is_empty(), "{id}");
    }
}

#[test]
fn external_grammars_from_env() {
    let Ok(dir) = std::env::var(sylvan_languages::GRAMMAR_PATH_ENV) else {
        eprintln!("Skipping: set SYLVAN_GRAMMAR_PATH to a directory of compiled grammars");
        return;
    };

    let loader = GrammarLoader::with_paths(vec![PathBuf::from(&dir)]);
    let available = loader.available_external();
    let service = LanguageService::with_loader(loader);
    for d in descriptors() {
        let Some(grammar) = d.grammar else { continue };
        if sylvan_languages::bundled_grammar(d.id).is_some() || !available.iter().any(|g| g == grammar) {
            continue;
        }
        match service.get_parser(d.id) {
            Ok(_) => {
                let binding = service.get_binding(d.id).unwrap();
                assert!(matches!(binding.origin, GrammarOrigin::External(_)));
            }
            Err(LanguageError::Incompatible { message, .. }) => {
                eprintln!("{grammar}: incompatible ABI ({message})");
            }
            Err(e) => eprintln!("{grammar}: {e}"),
        }
    }
}
