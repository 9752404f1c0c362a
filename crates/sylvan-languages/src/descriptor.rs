//! Static per-language metadata: file associations, family, feature flags.

use crate::LanguageId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Feature flags describing which constructs a language has.
///
/// Consumers use these to decide whether an empty query result means
/// "nothing there" or "not applicable".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LanguageFeatures {
    pub has_types: bool,
    pub has_classes: bool,
    pub has_functions: bool,
    pub has_modules: bool,
    pub has_decorators: bool,
    pub has_docstrings: bool,
    pub has_interfaces: bool,
    pub has_generics: bool,
    pub has_async: bool,
    pub has_exceptions: bool,
}

impl LanguageFeatures {
    /// Every feature enabled.
    pub const fn all() -> Self {
        Self {
            has_types: true,
            has_classes: true,
            has_functions: true,
            has_modules: true,
            has_decorators: true,
            has_docstrings: true,
            has_interfaces: true,
            has_generics: true,
            has_async: true,
            has_exceptions: true,
        }
    }

    pub const fn none() -> Self {
        Self {
            has_types: false,
            has_classes: false,
            has_functions: false,
            has_modules: false,
            has_decorators: false,
            has_docstrings: false,
            has_interfaces: false,
            has_generics: false,
            has_async: false,
            has_exceptions: false,
        }
    }

    /// Statically typed language with classes, modules and generics, but no
    /// decorators or docstrings.
    pub const fn typed() -> Self {
        Self {
            has_types: true,
            has_classes: true,
            has_functions: true,
            has_modules: true,
            has_decorators: false,
            has_docstrings: false,
            has_interfaces: true,
            has_generics: true,
            has_async: false,
            has_exceptions: true,
        }
    }

    /// Dynamically typed scripting language.
    pub const fn scripting() -> Self {
        Self {
            has_types: false,
            has_classes: true,
            has_functions: true,
            has_modules: true,
            has_decorators: false,
            has_docstrings: false,
            has_interfaces: false,
            has_generics: false,
            has_async: false,
            has_exceptions: true,
        }
    }

    /// Shell-like: functions and sourcing, nothing else.
    pub const fn shell() -> Self {
        Self {
            has_functions: true,
            has_modules: true,
            ..Self::none()
        }
    }

    /// Data, markup and build formats.
    pub const fn data_format() -> Self {
        Self::none()
    }
}

/// A group of languages sharing a baseline pattern set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageFamily {
    /// JavaScript, TypeScript, TSX.
    EcmaScript,
    /// C and C++.
    CFamily,
    /// Bash and fish.
    Shell,
}

impl LanguageFamily {
    pub const ALL: &'static [LanguageFamily] = &[
        LanguageFamily::EcmaScript,
        LanguageFamily::CFamily,
        LanguageFamily::Shell,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageFamily::EcmaScript => "ecmascript",
            LanguageFamily::CFamily => "cfamily",
            LanguageFamily::Shell => "shell",
        }
    }
}

impl fmt::Display for LanguageFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LanguageFamily::ALL
            .iter()
            .copied()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown language family '{s}'"))
    }
}

/// Everything known about a language without loading its grammar.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LanguageDescriptor {
    pub id: LanguageId,
    /// Human-readable name.
    pub name: &'static str,
    /// Grammar name used for dynamic loading (`{grammar}.so`,
    /// `tree_sitter_{grammar}`). `None` only for the fallback.
    pub grammar: Option<&'static str>,
    /// Lowercase extensions without the leading dot.
    pub extensions: &'static [&'static str],
    /// Exact file names (matched case-insensitively).
    pub filenames: &'static [&'static str],
    /// Glob patterns matched against the file name.
    pub filename_globs: &'static [&'static str],
    pub family: Option<LanguageFamily>,
    pub features: LanguageFeatures,
}

const NO_NAMES: &[&str] = &[];

macro_rules! descriptor {
    ($id:ident, $name:literal, $grammar:expr, [$($ext:literal),*], [$($file:literal),*], [$($glob:literal),*], $family:expr, $features:expr) => {
        LanguageDescriptor {
            id: LanguageId::$id,
            name: $name,
            grammar: $grammar,
            extensions: &[$($ext),*],
            filenames: &[$($file),*],
            filename_globs: &[$($glob),*],
            family: $family,
            features: $features,
        }
    };
    ($id:ident, $name:literal, $grammar:expr, [$($ext:literal),*], $features:expr) => {
        descriptor!($id, $name, $grammar, [$($ext),*], [], [], None, $features)
    };
}

/// Indexed by `LanguageId as usize`; order must follow the enum.
static DESCRIPTORS: &[LanguageDescriptor] = &[
    descriptor!(Python, "Python", Some("python"), ["py", "pyi", "pyw"], [], [], None, LanguageFeatures {
        has_interfaces: false,
        ..LanguageFeatures::all()
    }),
    descriptor!(JavaScript, "JavaScript", Some("javascript"), ["js", "mjs", "cjs", "jsx"], [], [], Some(LanguageFamily::EcmaScript), LanguageFeatures {
        has_types: false,
        has_interfaces: false,
        has_generics: false,
        has_docstrings: false,
        ..LanguageFeatures::all()
    }),
    descriptor!(TypeScript, "TypeScript", Some("typescript"), ["ts", "mts", "cts"], [], [], Some(LanguageFamily::EcmaScript), LanguageFeatures {
        has_docstrings: false,
        ..LanguageFeatures::all()
    }),
    descriptor!(Tsx, "TSX", Some("tsx"), ["tsx"], [], [], Some(LanguageFamily::EcmaScript), LanguageFeatures {
        has_docstrings: false,
        ..LanguageFeatures::all()
    }),
    descriptor!(Rust, "Rust", Some("rust"), ["rs"], [], [], None, LanguageFeatures {
        has_classes: false,
        has_exceptions: false,
        has_async: true,
        has_decorators: true,
        has_docstrings: true,
        ..LanguageFeatures::typed()
    }),
    descriptor!(Go, "Go", Some("go"), ["go"], [], [], None, LanguageFeatures {
        has_classes: false,
        has_exceptions: false,
        ..LanguageFeatures::typed()
    }),
    descriptor!(Java, "Java", Some("java"), ["java"], [], [], None, LanguageFeatures {
        has_decorators: true,
        has_docstrings: true,
        ..LanguageFeatures::typed()
    }),
    descriptor!(C, "C", Some("c"), ["c", "h"], [], [], Some(LanguageFamily::CFamily), LanguageFeatures {
        has_types: true,
        has_functions: true,
        has_modules: true,
        ..LanguageFeatures::none()
    }),
    descriptor!(Cpp, "C++", Some("cpp"), ["cpp", "cc", "cxx", "c++", "hpp", "hh", "hxx", "h++"], [], [], Some(LanguageFamily::CFamily), LanguageFeatures::typed()),
    descriptor!(CSharp, "C#", Some("c_sharp"), ["cs"], [], [], None, LanguageFeatures {
        has_decorators: true,
        has_async: true,
        ..LanguageFeatures::typed()
    }),
    descriptor!(Ruby, "Ruby", Some("ruby"), ["rb", "rake", "gemspec"], ["rakefile", "gemfile", "guardfile", "vagrantfile", "podfile"], [], None, LanguageFeatures::scripting()),
    descriptor!(Bash, "Bash", Some("bash"), ["sh", "bash", "zsh"], [".bashrc", ".bash_profile", ".zshrc", ".profile", "pkgbuild"], [], Some(LanguageFamily::Shell), LanguageFeatures::shell()),
    descriptor!(Json, "JSON", Some("json"), ["json"], [".babelrc", ".eslintrc"], [], None, LanguageFeatures::data_format()),
    descriptor!(Php, "PHP", Some("php"), ["php", "phtml"], LanguageFeatures {
        has_interfaces: true,
        has_decorators: true,
        ..LanguageFeatures::scripting()
    }),
    descriptor!(Kotlin, "Kotlin", Some("kotlin"), ["kt", "kts"], LanguageFeatures {
        has_decorators: true,
        has_async: true,
        ..LanguageFeatures::typed()
    }),
    descriptor!(Swift, "Swift", Some("swift"), ["swift"], LanguageFeatures {
        has_decorators: true,
        has_async: true,
        ..LanguageFeatures::typed()
    }),
    descriptor!(Scala, "Scala", Some("scala"), ["scala", "sc"], LanguageFeatures {
        has_decorators: true,
        ..LanguageFeatures::typed()
    }),
    descriptor!(Lua, "Lua", Some("lua"), ["lua"], LanguageFeatures {
        has_classes: false,
        has_exceptions: false,
        ..LanguageFeatures::scripting()
    }),
    descriptor!(Haskell, "Haskell", Some("haskell"), ["hs", "lhs"], LanguageFeatures {
        has_exceptions: false,
        ..LanguageFeatures::typed()
    }),
    descriptor!(Elixir, "Elixir", Some("elixir"), ["ex", "exs"], LanguageFeatures {
        has_classes: false,
        has_docstrings: true,
        ..LanguageFeatures::scripting()
    }),
    descriptor!(Erlang, "Erlang", Some("erlang"), ["erl", "hrl"], LanguageFeatures {
        has_classes: false,
        ..LanguageFeatures::scripting()
    }),
    descriptor!(OCaml, "OCaml", Some("ocaml"), ["ml", "mli"], LanguageFeatures::typed()),
    descriptor!(Zig, "Zig", Some("zig"), ["zig"], LanguageFeatures {
        has_classes: false,
        has_interfaces: false,
        ..LanguageFeatures::typed()
    }),
    descriptor!(Dart, "Dart", Some("dart"), ["dart"], LanguageFeatures {
        has_async: true,
        has_decorators: true,
        ..LanguageFeatures::typed()
    }),
    descriptor!(Julia, "Julia", Some("julia"), ["jl"], LanguageFeatures {
        has_types: true,
        has_docstrings: true,
        ..LanguageFeatures::scripting()
    }),
    descriptor!(R, "R", Some("r"), ["r"], LanguageFeatures {
        has_classes: false,
        ..LanguageFeatures::scripting()
    }),
    descriptor!(Perl, "Perl", Some("perl"), ["pl", "pm"], LanguageFeatures::scripting()),
    descriptor!(Groovy, "Groovy", Some("groovy"), ["groovy", "gradle"], ["jenkinsfile"], [], None, LanguageFeatures {
        has_decorators: true,
        ..LanguageFeatures::scripting()
    }),
    descriptor!(Fish, "Fish", Some("fish"), ["fish"], [], [], Some(LanguageFamily::Shell), LanguageFeatures::shell()),
    descriptor!(Yaml, "YAML", Some("yaml"), ["yaml", "yml"], LanguageFeatures::data_format()),
    descriptor!(Toml, "TOML", Some("toml"), ["toml"], ["pipfile"], [], None, LanguageFeatures::data_format()),
    descriptor!(Html, "HTML", Some("html"), ["html", "htm"], LanguageFeatures::data_format()),
    descriptor!(Css, "CSS", Some("css"), ["css"], LanguageFeatures::data_format()),
    descriptor!(Markdown, "Markdown", Some("markdown"), ["md", "markdown"], LanguageFeatures::data_format()),
    descriptor!(Sql, "SQL", Some("sql"), ["sql"], LanguageFeatures {
        has_functions: true,
        ..LanguageFeatures::data_format()
    }),
    descriptor!(Dockerfile, "Dockerfile", Some("dockerfile"), ["dockerfile"], ["dockerfile", "containerfile"], ["Dockerfile.*", "Containerfile.*"], None, LanguageFeatures::data_format()),
    descriptor!(Make, "Make", Some("make"), ["mk", "mak"], ["makefile", "gnumakefile"], ["Makefile.*"], None, LanguageFeatures::data_format()),
    descriptor!(CMake, "CMake", Some("cmake"), ["cmake"], ["cmakelists.txt"], [], None, LanguageFeatures {
        has_functions: true,
        ..LanguageFeatures::data_format()
    }),
    LanguageDescriptor {
        id: LanguageId::Unsupported,
        name: "Unsupported",
        grammar: None,
        extensions: NO_NAMES,
        filenames: NO_NAMES,
        filename_globs: NO_NAMES,
        family: None,
        features: LanguageFeatures::none(),
    },
];

/// Look up the descriptor for a language. Total over [`LanguageId`].
pub fn descriptor(id: LanguageId) -> &'static LanguageDescriptor {
    &DESCRIPTORS[id as usize]
}

/// All descriptors, in [`LanguageId::ALL`] order.
pub fn descriptors() -> &'static [LanguageDescriptor] {
    DESCRIPTORS
}
