//! Transform kinds used to suppress false positives.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A named transform applied to an extracted selection before comparison.
///
/// Names are matched case-insensitively. Anything unrecognized becomes
/// [`Transform::Unknown`]: configuration validation rejects it, and the
/// pipeline skips it if one slips through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Transform {
    /// Remove every numeric character from text nodes
    Numbers,
    /// Remove every attribute from every element
    Attrs,
    /// Remove script elements with their content
    Scripts,
    /// Flatten the tree to its text, one trimmed text node per line
    Html,
    /// Unrecognized name, kept verbatim
    Unknown(String),
}

impl Transform {
    /// Names accepted by configuration.
    pub const NAMES: &'static [&'static str] = &["numbers", "attrs", "scripts", "html"];

    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "numbers" => Self::Numbers,
            "attrs" => Self::Attrs,
            "scripts" => Self::Scripts,
            "html" => Self::Html,
            _ => Self::Unknown(name.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Numbers => "numbers",
            Self::Attrs => "attrs",
            Self::Scripts => "scripts",
            Self::Html => "html",
            Self::Unknown(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl From<String> for Transform {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<Transform> for String {
    fn from(transform: Transform) -> Self {
        transform.name().to_string()
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_is_case_insensitive() {
        assert_eq!(Transform::from_name("HTML"), Transform::Html);
        assert_eq!(Transform::from_name(" numbers "), Transform::Numbers);
        assert_eq!(Transform::from_name("Attrs"), Transform::Attrs);
    }

    #[test]
    fn test_unknown_name_is_preserved() {
        let transform = Transform::from_name("emoji");
        assert_eq!(transform, Transform::Unknown("emoji".to_string()));
        assert!(!transform.is_known());
        assert_eq!(transform.name(), "emoji");
    }

    #[test]
    fn test_known_names_round_trip() {
        for name in Transform::NAMES {
            let transform = Transform::from_name(name);
            assert!(transform.is_known());
            assert_eq!(transform.name(), *name);
        }
    }
}
