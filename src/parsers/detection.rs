//! Content-based format detection.
//!
//! Sniffs document content for format markers without fully parsing it, so
//! the conversion entry points can dispatch when the caller did not name a
//! format. Detection failure is a hard error for the document — guessing a
//! parser and surfacing its decode error would only mislead.

use super::traits::{FormatConfidence, FormatDetection, ScanFormat};

/// Detector across all supported document formats.
#[derive(Debug, Default)]
pub struct FormatDetector;

impl FormatDetector {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Detect the format of `content`.
    #[must_use]
    pub fn detect(&self, content: &str) -> FormatDetection {
        let detection = self.detect_impl(content);
        match detection.format {
            Some(format) => tracing::debug!(
                format = format.name(),
                confidence = detection.confidence.value(),
                "format detected"
            ),
            None => tracing::debug!("no format detected"),
        }
        detection
    }

    fn detect_impl(&self, content: &str) -> FormatDetection {
        let trimmed = content.trim_start();

        // Internal document: a JSON array of scans.
        if trimmed.starts_with('[') {
            if content.contains("\"moduleId\"") {
                return FormatDetection::of(ScanFormat::Ts, FormatConfidence::CERTAIN);
            }
            if trimmed.trim_end() == "[]" {
                return FormatDetection::of(ScanFormat::Ts, FormatConfidence::LOW);
            }
            return FormatDetection::no_match();
        }

        if trimmed.starts_with('{') {
            if content.contains("\"bomFormat\"") {
                return FormatDetection::of(ScanFormat::CycloneDxJson, FormatConfidence::CERTAIN);
            }
            if content.contains("\"spdxVersion\"") {
                let confidence = if content.contains("\"SPDXID\"") {
                    FormatConfidence::CERTAIN
                } else {
                    FormatConfidence::HIGH
                };
                return FormatDetection::of(ScanFormat::SpdxJson, confidence);
            }
            if content.contains("\"specVersion\"") && content.contains("\"components\"") {
                return FormatDetection::of(ScanFormat::CycloneDxJson, FormatConfidence::HIGH);
            }
            if content.contains("\"moduleId\"") {
                return FormatDetection::of(ScanFormat::Ts, FormatConfidence::HIGH);
            }
            return FormatDetection::no_match();
        }

        if trimmed.starts_with('<') {
            if content.contains("cyclonedx.org/schema/bom") || content.contains("<bom") {
                return FormatDetection::of(ScanFormat::CycloneDxXml, FormatConfidence::CERTAIN);
            }
            if content.contains("spdxVersion") || content.contains("SPDX-") {
                return FormatDetection::of(ScanFormat::SpdxXml, FormatConfidence::HIGH);
            }
            return FormatDetection::no_match();
        }

        if trimmed.starts_with("SPDXVersion:") || content.contains("\nSPDXVersion:") {
            return FormatDetection::of(ScanFormat::SpdxTag, FormatConfidence::CERTAIN);
        }

        // YAML SPDX: key at the start of a line, no JSON braces anywhere.
        if content
            .lines()
            .any(|line| line.starts_with("spdxVersion:"))
        {
            return FormatDetection::of(ScanFormat::SpdxYaml, FormatConfidence::HIGH);
        }

        FormatDetection::no_match()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(content: &str) -> FormatDetection {
        FormatDetector::new().detect(content)
    }

    #[test]
    fn detects_cyclonedx_json() {
        let detection = detect(r#"{"bomFormat": "CycloneDX", "specVersion": "1.6"}"#);
        assert_eq!(detection.format, Some(ScanFormat::CycloneDxJson));
        assert!(detection.confidence.can_parse());
    }

    #[test]
    fn detects_spdx_json() {
        let detection = detect(r#"{"spdxVersion": "SPDX-2.3", "SPDXID": "SPDXRef-DOCUMENT"}"#);
        assert_eq!(detection.format, Some(ScanFormat::SpdxJson));
        assert_eq!(detection.confidence.value(), FormatConfidence::CERTAIN.value());
    }

    #[test]
    fn detects_spdx_tag_value() {
        let detection = detect("SPDXVersion: SPDX-2.3\nDataLicense: CC0-1.0\n");
        assert_eq!(detection.format, Some(ScanFormat::SpdxTag));
    }

    #[test]
    fn detects_spdx_yaml() {
        let detection = detect("spdxVersion: SPDX-2.3\nname: demo\n");
        assert_eq!(detection.format, Some(ScanFormat::SpdxYaml));
    }

    #[test]
    fn detects_internal_array() {
        let detection = detect(r#"[{"module": "m", "moduleId": "mvn:m"}]"#);
        assert_eq!(detection.format, Some(ScanFormat::Ts));
    }

    #[test]
    fn detects_cyclonedx_xml() {
        let detection = detect(r#"<bom xmlns="http://cyclonedx.org/schema/bom/1.6"></bom>"#);
        assert_eq!(detection.format, Some(ScanFormat::CycloneDxXml));
    }

    #[test]
    fn unknown_content_has_no_match() {
        let detection = detect(r#"{"some": "random", "json": "content"}"#);
        assert_eq!(detection.format, None);
        assert!(!detection.confidence.can_parse());
    }
}
