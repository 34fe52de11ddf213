//! Shared parser/writer types: errors, formats, and detection confidence.

use thiserror::Error;

/// Errors raised while decoding a document into scans.
///
/// Decode failures are fatal for the whole document; recoverable per-edge and
/// per-field problems inside a successfully decoded document are logged and
/// skipped instead (see the adapter modules).
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("JSON parse error: {0}")]
    Json(String),

    #[error("YAML parse error: {0}")]
    Yaml(String),

    #[error("XML parse error: {0}")]
    Xml(String),

    #[error("tag-value parse error: {0}")]
    TagValue(String),

    #[error("indentation error at line {line}: {reason}")]
    Indentation { line: usize, reason: String },

    #[error("unknown document format: {0}")]
    UnknownFormat(String),
}

impl From<std::io::Error> for ParseError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Errors raised while encoding scans into a document.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("JSON serialization error: {0}")]
    Json(String),

    #[error("YAML serialization error: {0}")]
    Yaml(String),

    #[error("XML serialization error: {0}")]
    Xml(String),

    #[error("nothing to export: empty scan list")]
    EmptyInput,
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// A document format handled by the conversion boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ScanFormat {
    /// Internal JSON document: an array of scans.
    Ts,
    #[value(name = "spdx-json")]
    SpdxJson,
    #[value(name = "spdx-yaml")]
    SpdxYaml,
    #[value(name = "spdx-tag")]
    SpdxTag,
    #[value(name = "spdx-xml")]
    SpdxXml,
    #[value(name = "cyclonedx-json")]
    CycloneDxJson,
    #[value(name = "cyclonedx-xml")]
    CycloneDxXml,
}

impl ScanFormat {
    /// Human-readable name, as printed in logs and errors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ts => "ts",
            Self::SpdxJson => "spdx-json",
            Self::SpdxYaml => "spdx-yaml",
            Self::SpdxTag => "spdx-tag",
            Self::SpdxXml => "spdx-xml",
            Self::CycloneDxJson => "cyclonedx-json",
            Self::CycloneDxXml => "cyclonedx-xml",
        }
    }
}

impl std::fmt::Display for ScanFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Confidence level for format detection.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct FormatConfidence(f32);

impl FormatConfidence {
    pub const NONE: Self = Self(0.0);
    pub const LOW: Self = Self(0.25);
    pub const MEDIUM: Self = Self(0.5);
    pub const HIGH: Self = Self(0.75);
    pub const CERTAIN: Self = Self(1.0);

    #[must_use]
    pub const fn value(&self) -> f32 {
        self.0
    }

    /// Whether the detection is confident enough to attempt a parse.
    #[must_use]
    pub fn can_parse(&self) -> bool {
        self.0 >= Self::LOW.0
    }
}

impl Default for FormatConfidence {
    fn default() -> Self {
        Self::NONE
    }
}

/// Result of sniffing document content.
#[derive(Debug, Clone)]
pub struct FormatDetection {
    pub format: Option<ScanFormat>,
    pub confidence: FormatConfidence,
}

impl FormatDetection {
    #[must_use]
    pub const fn no_match() -> Self {
        Self {
            format: None,
            confidence: FormatConfidence::NONE,
        }
    }

    #[must_use]
    pub const fn of(format: ScanFormat, confidence: FormatConfidence) -> Self {
        Self {
            format: Some(format),
            confidence,
        }
    }
}
