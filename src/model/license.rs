//! License records attached to dependencies.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Origin of a license statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseKind {
    /// As stated by the package's own metadata.
    #[default]
    Declared,
    /// As determined by downstream license-text analysis.
    Effective,
}

impl fmt::Display for LicenseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declared => write!(f, "declared"),
            Self::Effective => write!(f, "effective"),
        }
    }
}

/// A license attached to a dependency.
///
/// `name` is an SPDX license id or a free-text expression symbol; nothing here
/// validates it at construction time. Export paths that need well-formed SPDX
/// expressions check with [`License::is_valid_spdx`] and recover per-field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default)]
    pub kind: LicenseKind,
}

impl License {
    pub fn declared(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: String::new(),
            kind: LicenseKind::Declared,
        }
    }

    pub fn effective(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: String::new(),
            kind: LicenseKind::Effective,
        }
    }

    /// Check whether `name` parses as an SPDX expression.
    ///
    /// Lax parsing mode accepts common non-standard spellings ("Apache2",
    /// "/" for OR) that real package metadata is full of.
    #[must_use]
    pub fn is_valid_spdx(&self) -> bool {
        if self.name.is_empty() || self.name.contains("NOASSERTION") || self.name.contains("NONE")
        {
            return false;
        }
        spdx::Expression::parse_mode(&self.name, spdx::ParseMode::LAX).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_is_default_kind() {
        let lic = License::declared("MIT");
        assert_eq!(lic.kind, LicenseKind::Declared);
        assert!(lic.is_valid_spdx());
    }

    #[test]
    fn lax_mode_accepts_common_spellings() {
        assert!(License::declared("Apache-2.0 OR MIT").is_valid_spdx());
        assert!(License::declared("apache-2.0").is_valid_spdx());
    }

    #[test]
    fn noassertion_is_not_valid() {
        assert!(!License::declared("NOASSERTION").is_valid_spdx());
        assert!(!License::declared("").is_valid_spdx());
    }

    #[test]
    fn kind_serializes_lowercase() {
        let json = serde_json::to_string(&License::effective("MIT")).unwrap();
        assert!(json.contains("\"effective\""));
    }
}
