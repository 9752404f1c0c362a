//! Built-in query patterns.
//!
//! Captures follow the `<category>.<role>` convention: `def` marks the whole
//! definition, `name`/`params`/`body` its parts, `module` the imported path.
//! Captures starting with `_` only feed predicates.

use crate::PatternCategory;
use sylvan_languages::{LanguageFamily, LanguageId};

type Table = &'static [(PatternCategory, &'static str)];

/// Shared by every language.
static BASE: Table = &[(PatternCategory::Error, "(ERROR) @error.def")];

static ECMASCRIPT: Table = &[
    (
        PatternCategory::Function,
        r#"
(function_declaration
  name: (identifier) @function.name
  parameters: (formal_parameters) @function.params
  body: (statement_block) @function.body) @function.def

(generator_function_declaration
  name: (identifier) @function.name
  parameters: (formal_parameters) @function.params
  body: (statement_block) @function.body) @function.def

(method_definition
  name: (_) @function.name
  parameters: (formal_parameters) @function.params
  body: (statement_block) @function.body) @function.def

(function_expression
  name: (identifier) @function.name
  parameters: (formal_parameters) @function.params
  body: (statement_block) @function.body) @function.def

(function_expression
  parameters: (formal_parameters) @function.params
  body: (statement_block) @function.body) @function.def

(arrow_function
  body: (_) @function.body) @function.def
"#,
    ),
    (
        PatternCategory::Class,
        r#"
(class_declaration
  name: (_) @class.name
  body: (class_body) @class.body) @class.def
"#,
    ),
    (
        PatternCategory::Import,
        r#"
(import_statement
  source: (string) @import.module) @import.def
"#,
    ),
    (PatternCategory::Comment, "(comment) @comment.def"),
    (PatternCategory::Decorator, "(decorator) @decorator.def"),
    (
        PatternCategory::Variable,
        r#"
(variable_declarator
  name: (identifier) @variable.name) @variable.def
"#,
    ),
];

static CFAMILY: Table = &[
    (
        PatternCategory::Function,
        r#"
(function_definition
  declarator: (function_declarator
    declarator: (_) @function.name
    parameters: (parameter_list) @function.params)
  body: (compound_statement) @function.body) @function.def

(function_definition
  declarator: (pointer_declarator
    declarator: (function_declarator
      declarator: (_) @function.name
      parameters: (parameter_list) @function.params))
  body: (compound_statement) @function.body) @function.def
"#,
    ),
    (
        PatternCategory::Class,
        r#"
(struct_specifier
  name: (type_identifier) @class.name
  body: (field_declaration_list) @class.body) @class.def

(union_specifier
  name: (type_identifier) @class.name
  body: (field_declaration_list) @class.body) @class.def

(enum_specifier
  name: (type_identifier) @class.name
  body: (enumerator_list) @class.body) @class.def
"#,
    ),
    (
        PatternCategory::Import,
        r#"
(preproc_include
  path: (_) @import.module) @import.def
"#,
    ),
    (PatternCategory::Comment, "(comment) @comment.def"),
];

static SHELL: Table = &[(PatternCategory::Comment, "(comment) @comment.def")];

static PYTHON: Table = &[
    (
        PatternCategory::Function,
        r#"
(function_definition
  name: (identifier) @function.name
  parameters: (parameters) @function.params
  body: (block) @function.body) @function.def

(lambda
  body: (_) @function.body) @function.def
"#,
    ),
    (
        PatternCategory::Class,
        r#"
(class_definition
  name: (identifier) @class.name
  body: (block) @class.body) @class.def
"#,
    ),
    (
        PatternCategory::Import,
        r#"
(import_statement
  name: (dotted_name) @import.module) @import.def

(import_statement
  name: (aliased_import
    name: (dotted_name) @import.module)) @import.def

(import_from_statement
  module_name: (dotted_name) @import.module) @import.def

(import_from_statement
  module_name: (relative_import) @import.module) @import.def
"#,
    ),
    (PatternCategory::Comment, "(comment) @comment.def"),
    (PatternCategory::Decorator, "(decorator) @decorator.def"),
    (
        PatternCategory::Variable,
        r#"
(assignment
  left: (identifier) @variable.name) @variable.def
"#,
    ),
];

/// TypeScript adds abstract classes and interfaces, which JavaScript's
/// grammar does not know about.
static TYPESCRIPT: Table = &[(
    PatternCategory::Class,
    r#"
(class_declaration
  name: (_) @class.name
  body: (class_body) @class.body) @class.def

(abstract_class_declaration
  name: (_) @class.name
  body: (class_body) @class.body) @class.def

(interface_declaration
  name: (_) @class.name
  body: (_) @class.body) @class.def
"#,
)];

static RUST: Table = &[
    (
        PatternCategory::Function,
        r#"
(function_item
  name: (identifier) @function.name
  parameters: (parameters) @function.params
  body: (block) @function.body) @function.def

(closure_expression
  parameters: (closure_parameters) @function.params
  body: (_) @function.body) @function.def
"#,
    ),
    (
        PatternCategory::Class,
        r#"
(struct_item
  name: (type_identifier) @class.name) @class.def

(enum_item
  name: (type_identifier) @class.name
  body: (enum_variant_list) @class.body) @class.def

(trait_item
  name: (type_identifier) @class.name
  body: (declaration_list) @class.body) @class.def
"#,
    ),
    (
        PatternCategory::Import,
        r#"
(use_declaration
  argument: (_) @import.module) @import.def

(extern_crate_declaration
  name: (identifier) @import.module) @import.def
"#,
    ),
    (
        PatternCategory::Comment,
        "[(line_comment) (block_comment)] @comment.def",
    ),
    (PatternCategory::Decorator, "(attribute_item) @decorator.def"),
    (
        PatternCategory::Variable,
        r#"
(let_declaration
  pattern: (identifier) @variable.name) @variable.def
"#,
    ),
];

static GO: Table = &[
    (
        PatternCategory::Function,
        r#"
(function_declaration
  name: (identifier) @function.name
  parameters: (parameter_list) @function.params) @function.def

(method_declaration
  name: (field_identifier) @function.name
  parameters: (parameter_list) @function.params) @function.def

(func_literal
  parameters: (parameter_list) @function.params
  body: (block) @function.body) @function.def
"#,
    ),
    (
        PatternCategory::Class,
        r#"
(type_spec
  name: (type_identifier) @class.name
  type: (struct_type) @class.body) @class.def

(type_spec
  name: (type_identifier) @class.name
  type: (interface_type) @class.body) @class.def
"#,
    ),
    (
        PatternCategory::Import,
        r#"
(import_spec
  path: (_) @import.module) @import.def
"#,
    ),
    (PatternCategory::Comment, "(comment) @comment.def"),
];

static JAVA: Table = &[
    (
        PatternCategory::Function,
        r#"
(method_declaration
  name: (identifier) @function.name
  parameters: (formal_parameters) @function.params) @function.def

(constructor_declaration
  name: (identifier) @function.name
  parameters: (formal_parameters) @function.params
  body: (constructor_body) @function.body) @function.def

(lambda_expression
  body: (_) @function.body) @function.def
"#,
    ),
    (
        PatternCategory::Class,
        r#"
(class_declaration
  name: (identifier) @class.name
  body: (class_body) @class.body) @class.def

(interface_declaration
  name: (identifier) @class.name
  body: (interface_body) @class.body) @class.def

(enum_declaration
  name: (identifier) @class.name
  body: (enum_body) @class.body) @class.def
"#,
    ),
    (
        PatternCategory::Import,
        r#"
(import_declaration
  (scoped_identifier) @import.module) @import.def

(import_declaration
  (identifier) @import.module) @import.def
"#,
    ),
    (
        PatternCategory::Comment,
        "[(line_comment) (block_comment)] @comment.def",
    ),
    (
        PatternCategory::Decorator,
        "[(annotation) (marker_annotation)] @decorator.def",
    ),
];

/// C++ keeps the C function shapes and adds classes and lambdas.
static CPP: Table = &[(
    PatternCategory::Class,
    r#"
(class_specifier
  name: (_) @class.name
  body: (field_declaration_list) @class.body) @class.def

(struct_specifier
  name: (_) @class.name
  body: (field_declaration_list) @class.body) @class.def

(union_specifier
  name: (_) @class.name
  body: (field_declaration_list) @class.body) @class.def

(enum_specifier
  name: (_) @class.name
  body: (enumerator_list) @class.body) @class.def
"#,
)];

static CSHARP: Table = &[
    (
        PatternCategory::Function,
        r#"
(method_declaration
  name: (identifier) @function.name
  parameters: (parameter_list) @function.params) @function.def

(constructor_declaration
  name: (identifier) @function.name
  parameters: (parameter_list) @function.params) @function.def

(local_function_statement
  name: (identifier) @function.name
  parameters: (parameter_list) @function.params) @function.def

(lambda_expression) @function.def
"#,
    ),
    (
        PatternCategory::Class,
        r#"
(class_declaration
  name: (identifier) @class.name) @class.def

(interface_declaration
  name: (identifier) @class.name) @class.def

(struct_declaration
  name: (identifier) @class.name) @class.def

(enum_declaration
  name: (identifier) @class.name) @class.def
"#,
    ),
    (
        PatternCategory::Import,
        r#"
(using_directive
  (qualified_name) @import.module) @import.def

(using_directive
  (identifier) @import.module) @import.def
"#,
    ),
    (PatternCategory::Comment, "(comment) @comment.def"),
    (PatternCategory::Decorator, "(attribute) @decorator.def"),
];

static RUBY: Table = &[
    (
        PatternCategory::Function,
        r#"
(method
  name: (_) @function.name) @function.def

(singleton_method
  name: (_) @function.name) @function.def

(lambda) @function.def
"#,
    ),
    (
        PatternCategory::Class,
        r#"
(class
  name: (_) @class.name) @class.def

(module
  name: (_) @class.name) @class.def
"#,
    ),
    (
        PatternCategory::Import,
        r#"
((call
  method: (identifier) @_method
  arguments: (argument_list (string) @import.module)) @import.def
  (#any-of? @_method "require" "require_relative" "load"))
"#,
    ),
    (PatternCategory::Comment, "(comment) @comment.def"),
];

static BASH: Table = &[
    (
        PatternCategory::Function,
        r#"
(function_definition
  name: (word) @function.name
  body: (_) @function.body) @function.def
"#,
    ),
    (
        PatternCategory::Import,
        r#"
((command
  name: (command_name) @_cmd
  argument: (_) @import.module) @import.def
  (#any-of? @_cmd "source" "."))
"#,
    ),
];

/// The shared base layer.
pub(crate) fn base() -> Table {
    BASE
}

/// Baseline patterns for a language family.
pub(crate) fn family(family: LanguageFamily) -> Table {
    match family {
        LanguageFamily::EcmaScript => ECMASCRIPT,
        LanguageFamily::CFamily => CFAMILY,
        LanguageFamily::Shell => SHELL,
    }
}

/// Per-language patterns layered over the family baseline.
pub(crate) fn language(id: LanguageId) -> Table {
    match id {
        LanguageId::Python => PYTHON,
        LanguageId::TypeScript | LanguageId::Tsx => TYPESCRIPT,
        LanguageId::Rust => RUST,
        LanguageId::Go => GO,
        LanguageId::Java => JAVA,
        LanguageId::Cpp => CPP,
        LanguageId::CSharp => CSHARP,
        LanguageId::Ruby => RUBY,
        LanguageId::Bash => BASH,
        _ => &[],
    }
}
