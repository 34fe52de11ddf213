//! SPDX format adapter.
//!
//! Maps between SPDX 2.x documents (JSON, YAML, tag-value, XML) and the
//! flat `(packages, relationships)` shape consumed by the graph importer and
//! produced by the graph exporter. The hard logic lives in [`crate::graph`];
//! this module is document plumbing.
//!
//! Import is tolerant inside a successfully decoded document: packages
//! without a parsable purl are still produced (with a warning), relationships
//! referencing unknown ids are dropped by the importer. A document that does
//! not decode at all fails the whole import.

use crate::graph::{build_forest, flatten_forest, FlatGraph};
use crate::model::{Dependency, DependencyScan, License, LicenseKind};
use crate::parsers::traits::{ExportError, ParseError};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

// ============================================================================
// Import
// ============================================================================

/// Parse an SPDX JSON document into a scan.
pub fn import_json(content: &str) -> Result<DependencyScan, ParseError> {
    let doc: SpdxDocument = serde_json::from_str(content)?;
    Ok(to_scan(doc))
}

/// Parse an SPDX YAML document into a scan.
pub fn import_yaml(content: &str) -> Result<DependencyScan, ParseError> {
    let doc: SpdxDocument =
        serde_yaml::from_str(content).map_err(|e| ParseError::Yaml(e.to_string()))?;
    Ok(to_scan(doc))
}

/// Parse an SPDX tag-value document into a scan.
pub fn import_tag_value(content: &str) -> Result<DependencyScan, ParseError> {
    let doc = parse_tag_value(content)?;
    Ok(to_scan(doc))
}

/// Parse an SPDX XML document into a scan.
pub fn import_xml(content: &str) -> Result<DependencyScan, ParseError> {
    let doc: SpdxDocumentXml =
        quick_xml::de::from_str(content).map_err(|e| ParseError::Xml(e.to_string()))?;
    Ok(to_scan(doc.into()))
}

/// Reconstruct the dependency forest from a decoded document.
fn to_scan(doc: SpdxDocument) -> DependencyScan {
    let mut graph = FlatGraph::new();

    for pkg in doc.packages.iter().flatten() {
        graph.add_component(pkg.spdx_id.clone(), dep_from_package(pkg));
    }
    for rel in doc.relationships.iter().flatten() {
        if rel.relationship_type == "DEPENDS_ON" {
            graph.add_edge(rel.spdx_element_id.clone(), rel.related_spdx_element.clone());
        }
    }

    let mut scan = DependencyScan::new(doc.name.clone(), format!("spdx:{}", doc.name));
    scan.dependencies = build_forest(graph);
    scan
}

/// Build a dependency from one SPDX package.
///
/// The purl external reference is authoritative for identity; without one the
/// package is kept as a `generic` component so that a sloppy SBOM still
/// yields a complete scan.
fn dep_from_package(pkg: &SpdxPackage) -> Dependency {
    let purl_ref = pkg.external_refs.iter().flatten().find(|r| {
        (r.reference_type == "purl" || r.reference_category == "PACKAGE-MANAGER")
            && r.reference_locator.starts_with("pkg:")
    });

    let versions = pkg.version_info.clone().map(|v| vec![v]);
    let mut dep = match purl_ref
        .and_then(|r| Dependency::from_purl(&r.reference_locator, versions.clone()))
    {
        Some(dep) => dep,
        None => {
            tracing::warn!(
                package = %pkg.name,
                "package has no parsable purl reference; keeping it as a generic component"
            );
            let mut dep = Dependency::new("generic", "", pkg.name.clone());
            dep.versions = versions.unwrap_or_default();
            dep
        }
    };

    if let Some(declared) = &pkg.license_declared {
        dep.licenses
            .extend(split_license_expression(declared, LicenseKind::Declared));
    }
    if let Some(concluded) = &pkg.license_concluded {
        dep.licenses
            .extend(split_license_expression(concluded, LicenseKind::Effective));
    }
    if let Some(description) = &pkg.description {
        dep.description.clone_from(description);
    }
    if let Some(checksum) = pkg.checksums.iter().flatten().next() {
        dep.checksum.clone_from(&checksum.checksum_value);
    }

    dep
}

/// Split an SPDX expression into per-symbol license records.
///
/// `MIT OR Apache-2.0` becomes two entries. Unparsable expressions are kept
/// verbatim as a single entry — the field is never fatal.
fn split_license_expression(expr: &str, kind: LicenseKind) -> Vec<License> {
    if expr.is_empty() || expr == "NOASSERTION" || expr == "NONE" {
        return Vec::new();
    }

    match spdx::Expression::parse_mode(expr, spdx::ParseMode::LAX) {
        Ok(parsed) => parsed
            .requirements()
            .map(|req| License {
                name: req.req.to_string(),
                url: String::new(),
                kind,
            })
            .collect(),
        Err(_) => vec![License {
            name: expr.to_string(),
            url: String::new(),
            kind,
        }],
    }
}

// ============================================================================
// Export
// ============================================================================

/// Serialize a scan as SPDX JSON.
pub fn export_json(scan: &DependencyScan) -> Result<String, ExportError> {
    serde_json::to_string_pretty(&to_document(scan)).map_err(|e| ExportError::Json(e.to_string()))
}

/// Serialize a scan as SPDX YAML.
pub fn export_yaml(scan: &DependencyScan) -> Result<String, ExportError> {
    serde_yaml::to_string(&to_document(scan)).map_err(|e| ExportError::Yaml(e.to_string()))
}

/// Serialize a scan as SPDX tag-value.
pub fn export_tag_value(scan: &DependencyScan) -> Result<String, ExportError> {
    Ok(write_tag_value(&to_document(scan)))
}

/// Serialize a scan as SPDX XML.
pub fn export_xml(scan: &DependencyScan) -> Result<String, ExportError> {
    let doc: SpdxDocumentXml = to_document(scan).into();
    quick_xml::se::to_string_with_root("Document", &doc)
        .map_err(|e| ExportError::Xml(e.to_string()))
}

/// Flatten a scan into an SPDX document.
fn to_document(scan: &DependencyScan) -> SpdxDocument {
    let flat = flatten_forest(&scan.dependencies);

    let packages = flat
        .packages
        .iter()
        .map(|pkg| {
            let external_refs = pkg.purl.as_ref().map(|purl| {
                vec![SpdxExternalRef {
                    reference_category: "PACKAGE-MANAGER".to_string(),
                    reference_type: "purl".to_string(),
                    reference_locator: purl.clone(),
                }]
            });
            SpdxPackage {
                spdx_id: spdx_ref(pkg.id),
                name: pkg.name.clone(),
                version_info: pkg.version.clone(),
                download_location: Some("NOASSERTION".to_string()),
                license_declared: combine_licenses(&pkg.licenses, LicenseKind::Declared),
                license_concluded: combine_licenses(&pkg.licenses, LicenseKind::Effective),
                description: if pkg.description.is_empty() {
                    None
                } else {
                    Some(pkg.description.clone())
                },
                checksums: None,
                external_refs,
            }
        })
        .collect();

    let relationships = flat
        .edges
        .iter()
        .map(|&(parent, child)| SpdxRelationship {
            spdx_element_id: spdx_ref(parent),
            relationship_type: "DEPENDS_ON".to_string(),
            related_spdx_element: spdx_ref(child),
        })
        .collect();

    SpdxDocument {
        spdx_version: "SPDX-2.3".to_string(),
        spdx_id: "SPDXRef-DOCUMENT".to_string(),
        name: scan.module.clone(),
        data_license: "CC0-1.0".to_string(),
        document_namespace: Some(format!(
            "https://spdx.org/spdxdocs/{}-{}",
            scan.module,
            uuid::Uuid::new_v4()
        )),
        creation_info: Some(SpdxCreationInfo {
            created: Some(chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()),
            creators: vec![format!("Tool: sbom-graph-{}", env!("CARGO_PKG_VERSION"))],
        }),
        packages: Some(packages),
        relationships: Some(relationships),
    }
}

fn spdx_ref(id: usize) -> String {
    format!("SPDXRef-{id}")
}

/// Combine the licenses of one kind into a single `OR` expression.
///
/// Names that do not parse as SPDX expressions are skipped with a warning;
/// one bad license must not abort the export.
fn combine_licenses(licenses: &[License], kind: LicenseKind) -> Option<String> {
    let valid: Vec<&str> = licenses
        .iter()
        .filter(|lic| lic.kind == kind)
        .filter(|lic| {
            if lic.is_valid_spdx() {
                true
            } else {
                tracing::warn!(license = %lic.name, "not a valid SPDX expression; skipped on export");
                false
            }
        })
        .map(|lic| lic.name.as_str())
        .collect();

    match kind {
        LicenseKind::Declared if valid.is_empty() => Some("NOASSERTION".to_string()),
        _ if valid.is_empty() => None,
        _ => Some(valid.join(" OR ")),
    }
}

// ============================================================================
// Tag-value
// ============================================================================

/// Parse the line-oriented tag-value format into a document.
fn parse_tag_value(content: &str) -> Result<SpdxDocument, ParseError> {
    let mut doc = SpdxDocument {
        spdx_version: String::new(),
        spdx_id: String::new(),
        name: String::new(),
        data_license: String::new(),
        document_namespace: None,
        creation_info: None,
        packages: Some(Vec::new()),
        relationships: Some(Vec::new()),
    };
    let mut creation_info = SpdxCreationInfo {
        created: None,
        creators: Vec::new(),
    };
    let mut packages: Vec<SpdxPackage> = Vec::new();
    let mut relationships: Vec<SpdxRelationship> = Vec::new();
    let mut current: Option<SpdxPackage> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());

        match key {
            "SPDXVersion" => doc.spdx_version = value.to_string(),
            "DataLicense" => doc.data_license = value.to_string(),
            "DocumentName" => doc.name = value.to_string(),
            "DocumentNamespace" => doc.document_namespace = Some(value.to_string()),
            "Creator" => creation_info.creators.push(value.to_string()),
            "Created" => creation_info.created = Some(value.to_string()),
            "SPDXID" => match current.as_mut() {
                Some(pkg) => pkg.spdx_id = value.to_string(),
                None => doc.spdx_id = value.to_string(),
            },
            "PackageName" => {
                if let Some(pkg) = current.take() {
                    packages.push(pkg);
                }
                current = Some(SpdxPackage::named(value));
            }
            "PackageVersion" => {
                if let Some(pkg) = current.as_mut() {
                    pkg.version_info = Some(value.to_string());
                }
            }
            "PackageDownloadLocation" => {
                if let Some(pkg) = current.as_mut() {
                    pkg.download_location = Some(value.to_string());
                }
            }
            "PackageLicenseDeclared" => {
                if let Some(pkg) = current.as_mut() {
                    pkg.license_declared = Some(value.to_string());
                }
            }
            "PackageLicenseConcluded" => {
                if let Some(pkg) = current.as_mut() {
                    pkg.license_concluded = Some(value.to_string());
                }
            }
            "PackageDescription" => {
                if let Some(pkg) = current.as_mut() {
                    pkg.description = Some(value.to_string());
                }
            }
            "PackageChecksum" => {
                if let Some(pkg) = current.as_mut() {
                    if let Some((algorithm, checksum)) = value.split_once(':') {
                        pkg.checksums.get_or_insert_with(Vec::new).push(SpdxChecksum {
                            algorithm: algorithm.trim().to_string(),
                            checksum_value: checksum.trim().to_string(),
                        });
                    }
                }
            }
            "ExternalRef" => {
                if let Some(pkg) = current.as_mut() {
                    let parts: Vec<&str> = value.split_whitespace().collect();
                    if parts.len() >= 3 {
                        pkg.external_refs.get_or_insert_with(Vec::new).push(SpdxExternalRef {
                            reference_category: parts[0].to_string(),
                            reference_type: parts[1].to_string(),
                            reference_locator: parts[2].to_string(),
                        });
                    }
                }
            }
            "Relationship" => {
                let parts: Vec<&str> = value.split_whitespace().collect();
                if parts.len() >= 3 {
                    relationships.push(SpdxRelationship {
                        spdx_element_id: parts[0].to_string(),
                        relationship_type: parts[1].to_string(),
                        related_spdx_element: parts[2].to_string(),
                    });
                }
            }
            _ => {}
        }
    }

    if let Some(pkg) = current.take() {
        packages.push(pkg);
    }
    if doc.spdx_version.is_empty() {
        return Err(ParseError::TagValue(
            "missing SPDXVersion header".to_string(),
        ));
    }

    doc.creation_info = Some(creation_info);
    doc.packages = Some(packages);
    doc.relationships = Some(relationships);
    Ok(doc)
}

/// Write a document in tag-value form.
fn write_tag_value(doc: &SpdxDocument) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "SPDXVersion: {}", doc.spdx_version);
    let _ = writeln!(out, "DataLicense: {}", doc.data_license);
    let _ = writeln!(out, "SPDXID: {}", doc.spdx_id);
    let _ = writeln!(out, "DocumentName: {}", doc.name);
    if let Some(namespace) = &doc.document_namespace {
        let _ = writeln!(out, "DocumentNamespace: {namespace}");
    }
    if let Some(info) = &doc.creation_info {
        for creator in &info.creators {
            let _ = writeln!(out, "Creator: {creator}");
        }
        if let Some(created) = &info.created {
            let _ = writeln!(out, "Created: {created}");
        }
    }

    for pkg in doc.packages.iter().flatten() {
        let _ = writeln!(out);
        let _ = writeln!(out, "PackageName: {}", pkg.name);
        let _ = writeln!(out, "SPDXID: {}", pkg.spdx_id);
        if let Some(version) = &pkg.version_info {
            let _ = writeln!(out, "PackageVersion: {version}");
        }
        if let Some(location) = &pkg.download_location {
            let _ = writeln!(out, "PackageDownloadLocation: {location}");
        }
        if let Some(declared) = &pkg.license_declared {
            let _ = writeln!(out, "PackageLicenseDeclared: {declared}");
        }
        if let Some(concluded) = &pkg.license_concluded {
            let _ = writeln!(out, "PackageLicenseConcluded: {concluded}");
        }
        if let Some(description) = &pkg.description {
            let _ = writeln!(out, "PackageDescription: {description}");
        }
        for reference in pkg.external_refs.iter().flatten() {
            let _ = writeln!(
                out,
                "ExternalRef: {} {} {}",
                reference.reference_category, reference.reference_type, reference.reference_locator
            );
        }
    }

    if doc.relationships.iter().flatten().next().is_some() {
        let _ = writeln!(out);
    }
    for rel in doc.relationships.iter().flatten() {
        let _ = writeln!(
            out,
            "Relationship: {} {} {}",
            rel.spdx_element_id, rel.relationship_type, rel.related_spdx_element
        );
    }
    out
}

// ============================================================================
// Document structures (JSON/YAML wire shape)
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxDocument {
    spdx_version: String,
    #[serde(rename = "SPDXID")]
    spdx_id: String,
    name: String,
    data_license: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    document_namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    creation_info: Option<SpdxCreationInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    packages: Option<Vec<SpdxPackage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    relationships: Option<Vec<SpdxRelationship>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxCreationInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    created: Option<String>,
    #[serde(default)]
    creators: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxPackage {
    #[serde(rename = "SPDXID")]
    spdx_id: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    download_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    license_declared: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    license_concluded: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    checksums: Option<Vec<SpdxChecksum>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    external_refs: Option<Vec<SpdxExternalRef>>,
}

impl SpdxPackage {
    fn named(name: &str) -> Self {
        Self {
            spdx_id: String::new(),
            name: name.to_string(),
            version_info: None,
            download_location: None,
            license_declared: None,
            license_concluded: None,
            description: None,
            checksums: None,
            external_refs: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxChecksum {
    algorithm: String,
    checksum_value: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxExternalRef {
    reference_category: String,
    reference_type: String,
    reference_locator: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxRelationship {
    spdx_element_id: String,
    relationship_type: String,
    related_spdx_element: String,
}

// ============================================================================
// XML wire shape: collections become repeated elements
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxDocumentXml {
    spdx_version: String,
    #[serde(rename = "SPDXID")]
    spdx_id: String,
    name: String,
    data_license: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    document_namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    creation_info: Option<SpdxCreationInfo>,
    #[serde(default)]
    packages: Vec<SpdxPackageXml>,
    #[serde(default)]
    relationships: Vec<SpdxRelationship>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxPackageXml {
    #[serde(rename = "SPDXID")]
    spdx_id: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    download_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    license_declared: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    license_concluded: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    checksums: Vec<SpdxChecksum>,
    #[serde(default)]
    external_refs: Vec<SpdxExternalRef>,
}

impl From<SpdxDocumentXml> for SpdxDocument {
    fn from(doc: SpdxDocumentXml) -> Self {
        Self {
            spdx_version: doc.spdx_version,
            spdx_id: doc.spdx_id,
            name: doc.name,
            data_license: doc.data_license,
            document_namespace: doc.document_namespace,
            creation_info: doc.creation_info,
            packages: Some(doc.packages.into_iter().map(Into::into).collect()),
            relationships: Some(doc.relationships),
        }
    }
}

impl From<SpdxDocument> for SpdxDocumentXml {
    fn from(doc: SpdxDocument) -> Self {
        Self {
            spdx_version: doc.spdx_version,
            spdx_id: doc.spdx_id,
            name: doc.name,
            data_license: doc.data_license,
            document_namespace: doc.document_namespace,
            creation_info: doc.creation_info,
            packages: doc
                .packages
                .unwrap_or_default()
                .into_iter()
                .map(Into::into)
                .collect(),
            relationships: doc.relationships.unwrap_or_default(),
        }
    }
}

impl From<SpdxPackageXml> for SpdxPackage {
    fn from(pkg: SpdxPackageXml) -> Self {
        Self {
            spdx_id: pkg.spdx_id,
            name: pkg.name,
            version_info: pkg.version_info,
            download_location: pkg.download_location,
            license_declared: pkg.license_declared,
            license_concluded: pkg.license_concluded,
            description: pkg.description,
            checksums: if pkg.checksums.is_empty() {
                None
            } else {
                Some(pkg.checksums)
            },
            external_refs: if pkg.external_refs.is_empty() {
                None
            } else {
                Some(pkg.external_refs)
            },
        }
    }
}

impl From<SpdxPackage> for SpdxPackageXml {
    fn from(pkg: SpdxPackage) -> Self {
        Self {
            spdx_id: pkg.spdx_id,
            name: pkg.name,
            version_info: pkg.version_info,
            download_location: pkg.download_location,
            license_declared: pkg.license_declared,
            license_concluded: pkg.license_concluded,
            description: pkg.description,
            checksums: pkg.checksums.unwrap_or_default(),
            external_refs: pkg.external_refs.unwrap_or_default(),
        }
    }
}
