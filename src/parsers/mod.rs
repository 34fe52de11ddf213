//! Document parsers and writers.
//!
//! Each adapter module maps one format family onto the graph model; the
//! conversion entry points here dispatch by [`ScanFormat`], with
//! content-based detection when the caller does not name one.
//!
//! ```no_run
//! use sbom_graph::parsers::{load_scans, dump_scans, ScanFormat};
//! use std::path::Path;
//!
//! let scans = load_scans(Path::new("bom.cdx.json"), None).unwrap();
//! let spdx = dump_scans(&scans, ScanFormat::SpdxTag).unwrap();
//! ```

pub mod cyclonedx;
pub mod detection;
pub mod spdx;
pub mod traits;
pub mod tree;
pub mod ts;

pub use detection::FormatDetector;
pub use traits::{ExportError, FormatConfidence, FormatDetection, ParseError, ScanFormat};
pub use tree::{IndentTreeParser, TreeNode};

use crate::model::DependencyScan;
use std::path::Path;

/// Maximum document size (512 MB). Guards against accidentally loading huge
/// artifacts through the string-based parsers.
const MAX_DOCUMENT_SIZE: u64 = 512 * 1024 * 1024;

/// Load scans from a file, detecting the format when `format` is `None`.
pub fn load_scans(path: &Path, format: Option<ScanFormat>) -> Result<Vec<DependencyScan>, ParseError> {
    let metadata = std::fs::metadata(path).map_err(|e| ParseError::Io(e.to_string()))?;
    if metadata.len() > MAX_DOCUMENT_SIZE {
        return Err(ParseError::Io(format!(
            "document is {} MB, exceeding the {} MB limit",
            metadata.len() / (1024 * 1024),
            MAX_DOCUMENT_SIZE / (1024 * 1024),
        )));
    }
    let content = std::fs::read_to_string(path).map_err(|e| ParseError::Io(e.to_string()))?;
    load_scans_str(&content, format)
}

/// Load scans from document content.
pub fn load_scans_str(
    content: &str,
    format: Option<ScanFormat>,
) -> Result<Vec<DependencyScan>, ParseError> {
    let format = match format {
        Some(format) => format,
        None => {
            let detection = FormatDetector::new().detect(content);
            match detection.format.filter(|_| detection.confidence.can_parse()) {
                Some(format) => format,
                None => {
                    return Err(ParseError::UnknownFormat(
                        "expected an internal scan document, SPDX, or CycloneDX".to_string(),
                    ))
                }
            }
        }
    };

    match format {
        ScanFormat::Ts => ts::import(content),
        ScanFormat::SpdxJson => spdx::import_json(content).map(|scan| vec![scan]),
        ScanFormat::SpdxYaml => spdx::import_yaml(content).map(|scan| vec![scan]),
        ScanFormat::SpdxTag => spdx::import_tag_value(content).map(|scan| vec![scan]),
        ScanFormat::SpdxXml => spdx::import_xml(content).map(|scan| vec![scan]),
        ScanFormat::CycloneDxJson => cyclonedx::import_json(content).map(|scan| vec![scan]),
        ScanFormat::CycloneDxXml => cyclonedx::import_xml(content).map(|scan| vec![scan]),
    }
}

/// Serialize scans into the named format.
///
/// The internal format encodes every scan; the SBOM formats encode a single
/// document, so only the first scan is written and the rest are reported.
pub fn dump_scans(scans: &[DependencyScan], format: ScanFormat) -> Result<String, ExportError> {
    if let ScanFormat::Ts = format {
        return ts::export(scans);
    }

    let Some(scan) = scans.first() else {
        return Err(ExportError::EmptyInput);
    };
    if scans.len() > 1 {
        tracing::warn!(
            format = format.name(),
            skipped = scans.len() - 1,
            "format encodes a single scan; exporting the first"
        );
    }

    match format {
        ScanFormat::Ts => unreachable!("handled above"),
        ScanFormat::SpdxJson => spdx::export_json(scan),
        ScanFormat::SpdxYaml => spdx::export_yaml(scan),
        ScanFormat::SpdxTag => spdx::export_tag_value(scan),
        ScanFormat::SpdxXml => spdx::export_xml(scan),
        ScanFormat::CycloneDxJson => cyclonedx::export_json(scan),
        ScanFormat::CycloneDxXml => cyclonedx::export_xml(scan),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dependency;

    fn sample() -> Vec<DependencyScan> {
        let root = Dependency::new("maven", "org.example", "app").with_version("1.0");
        vec![DependencyScan::from_root(root)]
    }

    #[test]
    fn dispatch_by_detection() {
        let json = dump_scans(&sample(), ScanFormat::CycloneDxJson).unwrap();
        let scans = load_scans_str(&json, None).unwrap();
        assert_eq!(scans.len(), 1);
        assert_eq!(scans[0].module, "app");
    }

    #[test]
    fn unknown_content_is_a_hard_error() {
        let err = load_scans_str("just some text", None).unwrap_err();
        assert!(matches!(err, ParseError::UnknownFormat(_)));
    }

    #[test]
    fn empty_scan_list_cannot_be_exported_as_sbom() {
        let err = dump_scans(&[], ScanFormat::SpdxJson).unwrap_err();
        assert!(matches!(err, ExportError::EmptyInput));
    }

    #[test]
    fn ts_format_keeps_every_scan() {
        let mut scans = sample();
        scans.push(DependencyScan::new("second", "mvn:second"));
        let json = dump_scans(&scans, ScanFormat::Ts).unwrap();
        let back = load_scans_str(&json, Some(ScanFormat::Ts)).unwrap();
        assert_eq!(back.len(), 2);
    }
}
