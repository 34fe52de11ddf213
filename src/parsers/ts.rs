//! Internal JSON scan document: an array of [`DependencyScan`].
//!
//! This is the lossless interchange format; every model field round-trips.
//! A single scan object is accepted on input for convenience, an array is
//! always written on output.

use crate::model::DependencyScan;
use crate::parsers::traits::{ExportError, ParseError};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum TsDocument {
    Many(Vec<DependencyScan>),
    One(DependencyScan),
}

/// Parse an internal JSON document.
pub fn import(content: &str) -> Result<Vec<DependencyScan>, ParseError> {
    let doc: TsDocument = serde_json::from_str(content)?;
    Ok(match doc {
        TsDocument::Many(scans) => scans,
        TsDocument::One(scan) => vec![scan],
    })
}

/// Serialize scans as an internal JSON document.
pub fn export(scans: &[DependencyScan]) -> Result<String, ExportError> {
    serde_json::to_string_pretty(scans).map_err(|e| ExportError::Json(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Dependency, License};

    fn sample_scan() -> DependencyScan {
        let mut root = Dependency::new("maven", "org.example", "app").with_version("1.0");
        root.licenses.push(License::declared("MIT"));
        root.checksum = "abc123".to_string();
        root.meta.insert(
            "sources".to_string(),
            serde_json::json!({"url": "https://repo/app-sources.jar"}),
        );
        root.dependencies
            .push(Dependency::new("maven", "org.example", "lib").with_version("2.0"));

        let mut scan = DependencyScan::from_root(root);
        scan.branch = Some("main".to_string());
        scan
    }

    #[test]
    fn round_trip_is_lossless() {
        let scans = vec![sample_scan()];
        let json = export(&scans).unwrap();
        let back = import(&json).unwrap();
        assert_eq!(scans, back);
    }

    #[test]
    fn single_object_is_accepted() {
        let json = serde_json::to_string(&sample_scan()).unwrap();
        let back = import(&json).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].module, "app");
    }

    #[test]
    fn camel_case_field_names_on_the_wire() {
        let json = export(&[sample_scan()]).unwrap();
        assert!(json.contains("\"moduleId\""));
        assert!(json.contains("\"type\""));
        assert!(!json.contains("\"module_id\""));
    }
}
