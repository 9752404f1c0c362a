use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// What a pattern extracts.
///
/// Capture names inside a pattern are prefixed with the category id:
/// `function.def`, `function.name`, `import.module`, and so on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PatternCategory {
    Function,
    Class,
    Import,
    /// Nodes the grammar could not fit (`ERROR`).
    Error,
    Comment,
    Decorator,
    Variable,
    /// Anything registered at runtime under a name outside the closed set.
    Custom(String),
}

impl PatternCategory {
    /// Built-in categories, in reporting order.
    pub const BUILTIN: &'static [PatternCategory] = &[
        PatternCategory::Function,
        PatternCategory::Class,
        PatternCategory::Import,
        PatternCategory::Error,
        PatternCategory::Comment,
        PatternCategory::Decorator,
        PatternCategory::Variable,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            PatternCategory::Function => "function",
            PatternCategory::Class => "class",
            PatternCategory::Import => "import",
            PatternCategory::Error => "error",
            PatternCategory::Comment => "comment",
            PatternCategory::Decorator => "decorator",
            PatternCategory::Variable => "variable",
            PatternCategory::Custom(name) => name,
        }
    }

    /// Known names (and their plurals) map to built-in categories; anything
    /// else becomes [`PatternCategory::Custom`].
    pub fn from_name(name: &str) -> Self {
        let name = name.trim().to_ascii_lowercase();
        match name.as_str() {
            "function" | "functions" => PatternCategory::Function,
            "class" | "classes" => PatternCategory::Class,
            "import" | "imports" => PatternCategory::Import,
            "error" | "errors" => PatternCategory::Error,
            "comment" | "comments" => PatternCategory::Comment,
            "decorator" | "decorators" => PatternCategory::Decorator,
            "variable" | "variables" => PatternCategory::Variable,
            _ => PatternCategory::Custom(name),
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, PatternCategory::Custom(_))
    }
}

impl fmt::Display for PatternCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatternCategory {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(PatternCategory::from_name(s))
    }
}

impl Serialize for PatternCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PatternCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(PatternCategory::from_name(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names_and_plurals() {
        assert_eq!(PatternCategory::from_name("Functions"), PatternCategory::Function);
        assert_eq!(PatternCategory::from_name("import"), PatternCategory::Import);
    }

    #[test]
    fn test_unknown_names_become_custom() {
        let cat = PatternCategory::from_name("Route");
        assert_eq!(cat, PatternCategory::Custom("route".into()));
        assert_eq!(cat.as_str(), "route");
    }

    #[test]
    fn test_builtin_names_roundtrip() {
        for cat in PatternCategory::BUILTIN {
            assert_eq!(&PatternCategory::from_name(cat.as_str()), cat);
        }
    }
}
