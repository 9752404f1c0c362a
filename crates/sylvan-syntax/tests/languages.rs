//! Built-in extraction patterns run against small programs in each bundled
//! language.

use std::sync::Arc;
use sylvan_languages::{LanguageId, language_service};
use sylvan_patterns::{PatternCategory, PatternRegistry};
use sylvan_syntax::{CategoryMatches, QueryError, QueryHandler, SyntaxTree, TraversalEngine};

struct Extracted {
    functions: Vec<String>,
    anonymous: usize,
    classes: Vec<String>,
    imports: Vec<String>,
    unsupported: Vec<PatternCategory>,
}

fn names(tree: &SyntaxTree, matches: &CategoryMatches) -> Vec<String> {
    matches
        .groups
        .iter()
        .filter_map(|g| g.name)
        .map(|h| tree.node(h).unwrap().text().into_owned())
        .collect()
}

fn extract(language: LanguageId, source: &str) -> Extracted {
    let service = language_service();
    let tree = SyntaxTree::parse(&service, language, source).unwrap();
    assert!(!tree.has_error(), "{language} sample has syntax errors");
    let handler = QueryHandler::new(service, Arc::new(PatternRegistry::with_builtin()));
    let mut unsupported = Vec::new();
    let mut run = |category: PatternCategory| match handler.find_category(&tree, tree.root(), category.clone()) {
        Ok(matches) => Some(matches),
        Err(QueryError::Unsupported { .. }) => {
            unsupported.push(category);
            None
        }
        Err(e) => panic!("{language}/{category}: {e}"),
    };
    let functions = run(PatternCategory::Function);
    let classes = run(PatternCategory::Class);
    let imports = run(PatternCategory::Import);
    let named = |m: &Option<CategoryMatches>| m.as_ref().map(|m| names(&tree, m)).unwrap_or_default();
    Extracted {
        anonymous: functions
            .iter()
            .flat_map(|m| &m.groups)
            .filter(|g| !g.is_named())
            .count(),
        functions: named(&functions),
        classes: named(&classes),
        imports: named(&imports),
        unsupported,
    }
}

#[test]
fn python() {
    let e = extract(
        LanguageId::Python,
        "import os\nfrom typing import List\n\nclass Store:\n    def get(self, key):\n        return key\n\nsquare = lambda x: x * x\n",
    );
    assert_eq!(e.functions, ["get"]);
    assert_eq!(e.anonymous, 1);
    assert_eq!(e.classes, ["Store"]);
    assert_eq!(e.imports, ["os", "typing"]);
    assert!(e.unsupported.is_empty());
}

#[test]
fn javascript() {
    let e = extract(
        LanguageId::JavaScript,
        "import fs from 'fs';\n\nclass Reader {\n  read(path) { return fs.readFileSync(path); }\n}\n\nconst twice = (n) => n * 2;\n",
    );
    assert_eq!(e.functions, ["read"]);
    assert_eq!(e.anonymous, 1);
    assert_eq!(e.classes, ["Reader"]);
    assert_eq!(e.imports, ["'fs'"]);
}

#[test]
fn typescript() {
    let e = extract(
        LanguageId::TypeScript,
        "interface Shape { area(): number }\nabstract class Base {}\nclass Circle extends Base implements Shape {\n  area(): number { return 1; }\n}\n",
    );
    assert_eq!(e.classes, ["Shape", "Base", "Circle"]);
    assert_eq!(e.functions, ["area"]);
}

#[test]
fn rust() {
    let e = extract(
        LanguageId::Rust,
        "use std::collections::HashMap;\n\nstruct Point { x: i32 }\n\ntrait Shape { fn area(&self) -> f64; }\n\nfn main() { let add = |a: i32, b: i32| a + b; }\n",
    );
    assert_eq!(e.functions, ["main"]);
    assert_eq!(e.anonymous, 1);
    assert_eq!(e.classes, ["Point", "Shape"]);
    assert_eq!(e.imports, ["std::collections::HashMap"]);
}

#[test]
fn go() {
    let e = extract(
        LanguageId::Go,
        "package main\n\nimport (\n\t\"fmt\"\n\t\"os\"\n)\n\ntype Server struct {\n\taddr string\n}\n\nfunc (s *Server) Start() error {\n\treturn nil\n}\n\nfunc main() {}\n",
    );
    assert_eq!(e.functions, ["Start", "main"]);
    assert_eq!(e.classes, ["Server"]);
    assert_eq!(e.imports, ["\"fmt\"", "\"os\""]);
}

#[test]
fn java() {
    let e = extract(
        LanguageId::Java,
        "import java.util.List;\n\npublic class App {\n    public App() {}\n    void run(int x) {}\n}\n",
    );
    assert_eq!(e.functions, ["App", "run"]);
    assert_eq!(e.classes, ["App"]);
    assert_eq!(e.imports, ["java.util.List"]);
}

#[test]
fn c() {
    let e = extract(
        LanguageId::C,
        "#include <stdio.h>\n#include \"local.h\"\n\nstruct point { int x; };\n\nint *make(void) { return 0; }\nint main(int argc, char **argv) { return 0; }\n",
    );
    assert_eq!(e.functions, ["make", "main"]);
    assert_eq!(e.classes, ["point"]);
    assert_eq!(e.imports, ["<stdio.h>", "\"local.h\""]);
}

#[test]
fn bash() {
    let e = extract(LanguageId::Bash, "source ./lib.sh\n\ngreet() {\n  echo hi\n}\n");
    assert_eq!(e.functions, ["greet"]);
    assert!(e.classes.is_empty());
    assert_eq!(e.imports, ["./lib.sh"]);
    assert_eq!(e.unsupported, [PatternCategory::Class]);
}

#[test]
fn nested_definitions_have_class_ancestors() {
    let service = language_service();
    let source = "class Outer:\n    class Inner:\n        def method(self):\n            pass\n";
    let tree = SyntaxTree::parse(&service, LanguageId::Python, source).unwrap();
    let handler = QueryHandler::new(service, Arc::new(PatternRegistry::with_builtin()));
    let engine = TraversalEngine::new();

    let functions = handler.find_functions(&tree, tree.root()).unwrap();
    let method = functions.groups[0].definition;
    let class = engine
        .find_parent_of_type(&tree, method, "class_definition")
        .unwrap()
        .unwrap();
    let class_name = tree
        .node(class)
        .unwrap()
        .children()
        .find(|c| c.kind() == "identifier")
        .unwrap();
    assert_eq!(class_name.text(), "Inner");
}

#[test]
fn node_path_snapshot() {
    let service = language_service();
    let tree = SyntaxTree::parse(&service, LanguageId::Python, "def f():\n    return 1\n").unwrap();
    let engine = TraversalEngine::new();
    let integer = engine.find_nodes_by_type(&tree, tree.root(), "integer").unwrap()[0];
    let path = engine.node_path(&tree, integer).unwrap();
    insta::assert_snapshot!(path.join(" > "), @"module > function_definition > block > return_statement > integer");
}
