//! CycloneDX format adapter.
//!
//! Maps between CycloneDX BOMs (JSON, XML) and the flat
//! `(components, dependency registrations)` shape of the graph engine.
//! `metadata.component` is the document's own subject: it is excluded from
//! the forest and its registered dependencies become the forest roots.

use crate::graph::{build_forest, flatten_forest, FlatGraph};
use crate::model::{Dependency, DependencyScan, License};
use crate::parsers::traits::{ExportError, ParseError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

const SPEC_VERSION: &str = "1.6";

// ============================================================================
// Import
// ============================================================================

/// Parse a CycloneDX JSON BOM into a scan.
pub fn import_json(content: &str) -> Result<DependencyScan, ParseError> {
    let bom: CdxBom = serde_json::from_str(content)?;
    Ok(to_scan(bom))
}

/// Parse a CycloneDX XML BOM into a scan.
pub fn import_xml(content: &str) -> Result<DependencyScan, ParseError> {
    let bom: CdxBomXml =
        quick_xml::de::from_str(content).map_err(|e| ParseError::Xml(e.to_string()))?;
    Ok(to_scan(bom.into()))
}

fn to_scan(bom: CdxBom) -> DependencyScan {
    let subject = bom.metadata.as_ref().and_then(|m| m.component.as_ref());
    let root_ref = subject.map(component_ref);

    let mut graph = FlatGraph::new();
    graph.root = root_ref;

    for comp in bom.components.iter().flatten() {
        graph.add_component(component_ref(comp), dep_from_component(comp));
    }
    for registration in bom.dependencies.iter().flatten() {
        for target in registration.depends_on.iter().flatten() {
            graph.add_edge(registration.ref_field.clone(), target.clone());
        }
    }

    let module = subject
        .map(|c| c.name.clone())
        .unwrap_or_else(|| "unknown".to_string());
    let mut scan = DependencyScan::new(module.clone(), format!("cdx:{module}"));
    scan.dependencies = build_forest(graph);
    scan
}

/// Document-local id of a component: bom-ref, falling back to purl, then name.
fn component_ref(comp: &CdxComponent) -> String {
    comp.bom_ref
        .clone()
        .or_else(|| comp.purl.clone())
        .unwrap_or_else(|| comp.name.clone())
}

fn dep_from_component(comp: &CdxComponent) -> Dependency {
    let versions = comp.version.clone().map(|v| vec![v]);
    let mut dep = match comp
        .purl
        .as_ref()
        .and_then(|purl| Dependency::from_purl(purl, versions.clone()))
    {
        Some(dep) => dep,
        None => {
            tracing::warn!(
                component = %comp.name,
                "component has no parsable purl; keeping it as a generic component"
            );
            let mut dep = Dependency::new(
                "generic",
                comp.group.clone().unwrap_or_default(),
                comp.name.clone(),
            );
            dep.versions = versions.unwrap_or_default();
            dep
        }
    };

    for choice in comp.licenses.iter().flatten() {
        if let Some(license) = &choice.license {
            if let Some(name) = license.id.clone().or_else(|| license.name.clone()) {
                dep.licenses.push(License {
                    name,
                    url: license.url.clone().unwrap_or_default(),
                    kind: Default::default(),
                });
            }
        } else if let Some(expression) = &choice.expression {
            dep.licenses.push(License::declared(expression.clone()));
        }
    }
    if let Some(description) = &comp.description {
        dep.description.clone_from(description);
    }

    dep
}

// ============================================================================
// Export
// ============================================================================

/// Serialize a scan as a CycloneDX JSON BOM.
pub fn export_json(scan: &DependencyScan) -> Result<String, ExportError> {
    serde_json::to_string_pretty(&to_bom(scan)).map_err(|e| ExportError::Json(e.to_string()))
}

/// Serialize a scan as a CycloneDX XML BOM.
pub fn export_xml(scan: &DependencyScan) -> Result<String, ExportError> {
    let bom: CdxBomXml = to_bom(scan).into();
    quick_xml::se::to_string_with_root("bom", &bom).map_err(|e| ExportError::Xml(e.to_string()))
}

fn to_bom(scan: &DependencyScan) -> CdxBom {
    let flat = flatten_forest(&scan.dependencies);

    let bom_refs: Vec<String> = flat
        .packages
        .iter()
        .map(|pkg| pkg.purl.clone().unwrap_or_else(|| format!("pkg-{}", pkg.id)))
        .collect();

    let components = flat
        .packages
        .iter()
        .map(|pkg| CdxComponent {
            component_type: "library".to_string(),
            bom_ref: Some(bom_refs[pkg.id].clone()),
            name: pkg.name.clone(),
            version: pkg.version.clone(),
            group: if pkg.namespace.is_empty() {
                None
            } else {
                Some(pkg.namespace.clone())
            },
            description: if pkg.description.is_empty() {
                None
            } else {
                Some(pkg.description.clone())
            },
            licenses: export_licenses(&pkg.licenses),
            purl: pkg.purl.clone(),
        })
        .collect();

    // One registration per parent; dependsOn is a set, so repeated edges
    // between the same pair collapse here.
    let mut children: IndexMap<usize, Vec<usize>> = IndexMap::new();
    for &(parent, child) in &flat.edges {
        let entry = children.entry(parent).or_default();
        if !entry.contains(&child) {
            entry.push(child);
        }
    }

    let root_ref = scan.module_id.clone();
    let mut dependencies = Vec::with_capacity(children.len() + 1);
    dependencies.push(CdxDependency {
        ref_field: root_ref.clone(),
        depends_on: Some(flat.roots.iter().map(|&id| bom_refs[id].clone()).collect()),
    });
    for (parent, child_ids) in children {
        dependencies.push(CdxDependency {
            ref_field: bom_refs[parent].clone(),
            depends_on: Some(child_ids.iter().map(|&id| bom_refs[id].clone()).collect()),
        });
    }

    CdxBom {
        bom_format: Some("CycloneDX".to_string()),
        spec_version: SPEC_VERSION.to_string(),
        serial_number: Some(format!("urn:uuid:{}", uuid::Uuid::new_v4())),
        version: Some(1),
        metadata: Some(CdxMetadata {
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
            tools: Some(vec![CdxTool {
                name: Some("sbom-graph".to_string()),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }]),
            component: Some(CdxComponent {
                component_type: "application".to_string(),
                bom_ref: Some(root_ref),
                name: scan.module.clone(),
                version: None,
                group: None,
                description: None,
                licenses: None,
                purl: None,
            }),
        }),
        components: Some(components),
        dependencies: Some(dependencies),
    }
}

fn export_licenses(licenses: &[License]) -> Option<Vec<CdxLicenseChoice>> {
    if licenses.is_empty() {
        return None;
    }
    let choices = licenses
        .iter()
        .map(|lic| {
            // Single valid SPDX ids go into the `id` slot, everything else is
            // a free-text name.
            let is_single_id = lic.is_valid_spdx() && !lic.name.contains(' ');
            CdxLicenseChoice {
                license: Some(CdxLicense {
                    id: is_single_id.then(|| lic.name.clone()),
                    name: (!is_single_id).then(|| lic.name.clone()),
                    url: if lic.url.is_empty() {
                        None
                    } else {
                        Some(lic.url.clone())
                    },
                }),
                expression: None,
            }
        })
        .collect();
    Some(choices)
}

// ============================================================================
// JSON wire shape
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdxBom {
    #[serde(skip_serializing_if = "Option::is_none")]
    bom_format: Option<String>,
    spec_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<CdxMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    components: Option<Vec<CdxComponent>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dependencies: Option<Vec<CdxDependency>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdxMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    /// Written on export; ignored on import (1.4 array and 1.6 object forms
    /// both occur in the wild and neither carries graph information).
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<CdxTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    component: Option<CdxComponent>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdxTool {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdxComponent {
    #[serde(rename = "type")]
    component_type: String,
    #[serde(rename = "bom-ref", skip_serializing_if = "Option::is_none")]
    bom_ref: Option<String>,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    licenses: Option<Vec<CdxLicenseChoice>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    purl: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdxLicenseChoice {
    #[serde(skip_serializing_if = "Option::is_none")]
    license: Option<CdxLicense>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expression: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdxLicense {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdxDependency {
    #[serde(rename = "ref")]
    ref_field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    depends_on: Option<Vec<String>>,
}

// ============================================================================
// XML wire shape: collections use wrapper elements, identifiers are attributes
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct CdxBomXml {
    #[serde(rename = "@xmlns", skip_serializing_if = "Option::is_none")]
    xmlns: Option<String>,
    #[serde(rename = "@serialNumber", skip_serializing_if = "Option::is_none")]
    serial_number: Option<String>,
    #[serde(rename = "@version", skip_serializing_if = "Option::is_none")]
    version: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<CdxMetadataXml>,
    #[serde(skip_serializing_if = "Option::is_none")]
    components: Option<CdxComponentsXml>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dependencies: Option<CdxDependenciesXml>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CdxMetadataXml {
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<CdxToolsXml>,
    #[serde(skip_serializing_if = "Option::is_none")]
    component: Option<CdxComponentXml>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CdxToolsXml {
    #[serde(rename = "tool", default)]
    tool: Vec<CdxTool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CdxComponentsXml {
    #[serde(rename = "component", default)]
    component: Vec<CdxComponentXml>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CdxComponentXml {
    #[serde(rename = "@type")]
    component_type: String,
    #[serde(rename = "@bom-ref", skip_serializing_if = "Option::is_none")]
    bom_ref: Option<String>,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    licenses: Option<CdxLicensesXml>,
    #[serde(skip_serializing_if = "Option::is_none")]
    purl: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CdxLicensesXml {
    #[serde(rename = "license", default)]
    license: Vec<CdxLicense>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CdxDependenciesXml {
    #[serde(rename = "dependency", default)]
    dependency: Vec<CdxDependencyXml>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CdxDependencyXml {
    #[serde(rename = "@ref")]
    ref_field: String,
    #[serde(rename = "dependency", default)]
    depends_on: Vec<CdxDependencyRefXml>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CdxDependencyRefXml {
    #[serde(rename = "@ref")]
    ref_field: String,
}

impl From<CdxBomXml> for CdxBom {
    fn from(bom: CdxBomXml) -> Self {
        // The XML namespace carries the spec version: .../schema/bom/1.6
        let spec_version = bom
            .xmlns
            .as_deref()
            .and_then(|ns| ns.rsplit('/').next())
            .unwrap_or("1.4")
            .to_string();

        Self {
            bom_format: Some("CycloneDX".to_string()),
            spec_version,
            serial_number: bom.serial_number,
            version: bom.version,
            metadata: bom.metadata.map(|m| CdxMetadata {
                timestamp: m.timestamp,
                tools: None,
                component: m.component.map(Into::into),
            }),
            components: bom
                .components
                .map(|c| c.component.into_iter().map(Into::into).collect()),
            dependencies: bom.dependencies.map(|d| {
                d.dependency
                    .into_iter()
                    .map(|dep| CdxDependency {
                        ref_field: dep.ref_field,
                        depends_on: Some(
                            dep.depends_on.into_iter().map(|r| r.ref_field).collect(),
                        ),
                    })
                    .collect()
            }),
        }
    }
}

impl From<CdxBom> for CdxBomXml {
    fn from(bom: CdxBom) -> Self {
        Self {
            xmlns: Some(format!(
                "http://cyclonedx.org/schema/bom/{}",
                bom.spec_version
            )),
            serial_number: bom.serial_number,
            version: bom.version,
            metadata: bom.metadata.map(|m| CdxMetadataXml {
                timestamp: m.timestamp,
                tools: m.tools.map(|tools| CdxToolsXml { tool: tools }),
                component: m.component.map(Into::into),
            }),
            components: bom.components.map(|components| CdxComponentsXml {
                component: components.into_iter().map(Into::into).collect(),
            }),
            dependencies: bom.dependencies.map(|dependencies| CdxDependenciesXml {
                dependency: dependencies
                    .into_iter()
                    .map(|dep| CdxDependencyXml {
                        ref_field: dep.ref_field,
                        depends_on: dep
                            .depends_on
                            .unwrap_or_default()
                            .into_iter()
                            .map(|ref_field| CdxDependencyRefXml { ref_field })
                            .collect(),
                    })
                    .collect(),
            }),
        }
    }
}

impl From<CdxComponentXml> for CdxComponent {
    fn from(comp: CdxComponentXml) -> Self {
        Self {
            component_type: comp.component_type,
            bom_ref: comp.bom_ref,
            name: comp.name,
            version: comp.version,
            group: comp.group,
            description: comp.description,
            licenses: comp.licenses.map(|l| {
                l.license
                    .into_iter()
                    .map(|license| CdxLicenseChoice {
                        license: Some(license),
                        expression: None,
                    })
                    .collect()
            }),
            purl: comp.purl,
        }
    }
}

impl From<CdxComponent> for CdxComponentXml {
    fn from(comp: CdxComponent) -> Self {
        Self {
            component_type: comp.component_type,
            bom_ref: comp.bom_ref,
            name: comp.name,
            version: comp.version,
            group: comp.group,
            description: comp.description,
            licenses: comp.licenses.map(|choices| CdxLicensesXml {
                license: choices
                    .into_iter()
                    .filter_map(|choice| {
                        choice.license.or_else(|| {
                            choice.expression.map(|expr| CdxLicense {
                                id: None,
                                name: Some(expr),
                                url: None,
                            })
                        })
                    })
                    .collect(),
            }),
            purl: comp.purl,
        }
    }
}
