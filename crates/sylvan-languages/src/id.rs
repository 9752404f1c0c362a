//! The closed set of language identifiers.

use crate::LanguageError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier for every language the analyzer knows about.
///
/// `Unsupported` is the fallback returned by resolution when nothing matches;
/// it has a descriptor of its own but no grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageId {
    Python,
    JavaScript,
    TypeScript,
    Tsx,
    Rust,
    Go,
    Java,
    C,
    Cpp,
    CSharp,
    Ruby,
    Bash,
    Json,
    Php,
    Kotlin,
    Swift,
    Scala,
    Lua,
    Haskell,
    Elixir,
    Erlang,
    OCaml,
    Zig,
    Dart,
    Julia,
    R,
    Perl,
    Groovy,
    Fish,
    Yaml,
    Toml,
    Html,
    Css,
    Markdown,
    Sql,
    Dockerfile,
    Make,
    CMake,
    Unsupported,
}

impl LanguageId {
    /// Every identifier, fallback last.
    pub const ALL: &'static [LanguageId] = &[
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
        LanguageId::Bash,
        LanguageId::Json,
        LanguageId::Php,
        LanguageId::Kotlin,
        LanguageId::Swift,
        LanguageId::Scala,
        LanguageId::Lua,
        LanguageId::Haskell,
        LanguageId::Elixir,
        LanguageId::Erlang,
        LanguageId::OCaml,
        LanguageId::Zig,
        LanguageId::Dart,
        LanguageId::Julia,
        LanguageId::R,
        LanguageId::Perl,
        LanguageId::Groovy,
        LanguageId::Fish,
        LanguageId::Yaml,
        LanguageId::Toml,
        LanguageId::Html,
        LanguageId::Css,
        LanguageId::Markdown,
        LanguageId::Sql,
        LanguageId::Dockerfile,
        LanguageId::Make,
        LanguageId::CMake,
        LanguageId::Unsupported,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageId::Python => "python",
            LanguageId::JavaScript => "javascript",
            LanguageId::TypeScript => "typescript",
            LanguageId::Tsx => "tsx",
            LanguageId::Rust => "rust",
            LanguageId::Go => "go",
            LanguageId::Java => "java",
            LanguageId::C => "c",
            LanguageId::Cpp => "cpp",
            LanguageId::CSharp => "csharp",
            LanguageId::Ruby => "ruby",
            LanguageId::Bash => "bash",
            LanguageId::Json => "json",
            LanguageId::Php => "php",
            LanguageId::Kotlin => "kotlin",
            LanguageId::Swift => "swift",
            LanguageId::Scala => "scala",
            LanguageId::Lua => "lua",
            LanguageId::Haskell => "haskell",
            LanguageId::Elixir => "elixir",
            LanguageId::Erlang => "erlang",
            LanguageId::OCaml => "ocaml",
            LanguageId::Zig => "zig",
            LanguageId::Dart => "dart",
            LanguageId::Julia => "julia",
            LanguageId::R => "r",
            LanguageId::Perl => "perl",
            LanguageId::Groovy => "groovy",
            LanguageId::Fish => "fish",
            LanguageId::Yaml => "yaml",
            LanguageId::Toml => "toml",
            LanguageId::Html => "html",
            LanguageId::Css => "css",
            LanguageId::Markdown => "markdown",
            LanguageId::Sql => "sql",
            LanguageId::Dockerfile => "dockerfile",
            LanguageId::Make => "make",
            LanguageId::CMake => "cmake",
            LanguageId::Unsupported => "unsupported",
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, LanguageId::Unsupported)
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageId {
    type Err = LanguageError;

    /// Parse a language id. Accepts the canonical ids plus a few common
    /// aliases (`js`, `ts`, `c++`, `c#`, `sh`, ...). Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let alias = match lower.as_str() {
            "py" | "python3" => Some(LanguageId::Python),
            "js" | "node" | "jsx" => Some(LanguageId::JavaScript),
            "ts" => Some(LanguageId::TypeScript),
            "rs" => Some(LanguageId::Rust),
            "golang" => Some(LanguageId::Go),
            "c++" | "cxx" => Some(LanguageId::Cpp),
            "c#" | "cs" | "c_sharp" | "c-sharp" => Some(LanguageId::CSharp),
            "rb" => Some(LanguageId::Ruby),
            "sh" | "shell" | "zsh" => Some(LanguageId::Bash),
            "kt" => Some(LanguageId::Kotlin),
            "yml" => Some(LanguageId::Yaml),
            "md" => Some(LanguageId::Markdown),
            "makefile" => Some(LanguageId::Make),
            _ => None,
        };
        if let Some(id) = alias {
            return Ok(id);
        }
        LanguageId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == lower)
            .ok_or_else(|| LanguageError::UnknownLanguage(s.to_string()))
    }
}
