//! Dependency and scan data structures.

use super::License;
use indexmap::IndexMap;
use packageurl::PackageUrl;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

/// A cryptographic algorithm observed in a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoAlgorithm {
    pub algorithm: String,
    pub strength: String,
}

/// Identity of a dependency occurrence: the component key plus its resolved
/// version.
///
/// This is the unit of deduplication used by the importer and exporter. A
/// dependency with zero or more than one reported version has no resolved
/// version and compares version-less.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionedKey {
    pub key: String,
    pub version: Option<String>,
}

/// A node in the dependency graph.
///
/// `dependencies` holds **owned** child copies. A component reachable through
/// several paths appears as several `Dependency` values with the same `key`;
/// at most one of them carries the full subtree, the rest are childless stubs.
/// Cycles back to an ancestor are therefore impossible by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    /// Stable component key, e.g. `mvn:org.apache.commons:commons-lang3`.
    pub key: String,
    pub name: String,
    /// Package ecosystem as a purl type (`maven`, `npm`, `pypi`, ...).
    #[serde(rename = "type")]
    pub ecosystem: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repo_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub homepage_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub checksum: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub private: bool,

    /// Reported versions, normally zero or one. A source that reports a
    /// range yields several entries and the node becomes version-less for
    /// identity purposes (see [`Dependency::version`]).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub versions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub licenses: Vec<License>,

    /// Opaque per-component metadata (scanner provenance, source archives,
    /// scope markers). Carried through conversions untouched.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub meta: HashMap<String, serde_json::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub package_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_file: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub crypto_algorithms: Vec<CryptoAlgorithm>,
}

impl Dependency {
    /// Create a dependency with the key derived from `(ecosystem, namespace, name)`.
    pub fn new(
        ecosystem: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let ecosystem = ecosystem.into();
        let namespace = namespace.into();
        let name = name.into();
        Self {
            key: Self::key_for(&ecosystem, &namespace, &name),
            name,
            ecosystem,
            namespace,
            repo_url: String::new(),
            homepage_url: String::new(),
            description: String::new(),
            checksum: String::new(),
            private: false,
            versions: Vec::new(),
            dependencies: Vec::new(),
            licenses: Vec::new(),
            meta: HashMap::new(),
            package_files: Vec::new(),
            license_file: None,
            crypto_algorithms: Vec::new(),
        }
    }

    /// Add a version (builder style).
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.versions.push(version.into());
        self
    }

    /// Derive the component key for an identity tuple.
    ///
    /// The key uses the backend naming scheme, which differs from purl types
    /// for Maven (`mvn`). Namespace-less components get a two-segment key.
    pub fn key_for(ecosystem: &str, namespace: &str, name: &str) -> String {
        let ty = Self::map_purl_type(ecosystem);
        if namespace.is_empty() {
            format!("{ty}:{name}")
        } else {
            format!("{ty}:{namespace}:{name}")
        }
    }

    fn map_purl_type(ty: &str) -> &str {
        match ty {
            "maven" => "mvn",
            other => other,
        }
    }

    /// The resolved version: `Some` iff exactly one version was reported.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        if self.versions.len() == 1 {
            Some(&self.versions[0])
        } else {
            None
        }
    }

    /// Identity of this occurrence, used for deduplication.
    #[must_use]
    pub fn versioned_key(&self) -> VersionedKey {
        VersionedKey {
            key: self.key.clone(),
            version: self.version().map(str::to_string),
        }
    }

    /// Derive the canonical Package URL, `pkg:<type>/<namespace>/<name>@<version>`.
    ///
    /// Pure in `(type, namespace, name, version)`: equal inputs always yield
    /// the same string. Returns `None` when the ecosystem type is not a valid
    /// purl type.
    #[must_use]
    pub fn purl(&self) -> Option<String> {
        let mut purl = PackageUrl::new(self.ecosystem.clone(), self.name.clone()).ok()?;
        if !self.namespace.is_empty() {
            purl.with_namespace(self.namespace.clone());
        }
        if let Some(version) = self.version() {
            purl.with_version(version.to_string());
        }
        Some(purl.to_string())
    }

    /// Build a dependency from a purl string.
    ///
    /// The purl version becomes the single reported version unless
    /// `versions_override` is given. Returns `None` for unparsable purls;
    /// callers decide whether that is a warning or a fallback path.
    #[must_use]
    pub fn from_purl(purl: &str, versions_override: Option<Vec<String>>) -> Option<Self> {
        let parsed = PackageUrl::from_str(purl).ok()?;
        let mut dep = Self::new(
            parsed.ty().to_string(),
            parsed.namespace().unwrap_or_default().to_string(),
            parsed.name().to_string(),
        );
        dep.versions = match versions_override {
            Some(versions) => versions,
            None => parsed.version().map(str::to_string).into_iter().collect(),
        };
        dep.meta
            .insert("purl".to_string(), serde_json::Value::String(purl.to_string()));
        Some(dep)
    }

    /// Record an observed crypto algorithm, deduplicating exact repeats.
    pub fn add_crypto_algorithm(&mut self, algorithm: impl Into<String>, strength: impl Into<String>) {
        let entry = CryptoAlgorithm {
            algorithm: algorithm.into(),
            strength: strength.into(),
        };
        if !self.crypto_algorithms.contains(&entry) {
            self.crypto_algorithms.push(entry);
        }
    }

    /// A shallow copy of this node with the child list cleared.
    ///
    /// This is the stub/placeholder shape used by the conversion algorithms:
    /// identity and metadata survive, the subtree does not.
    #[must_use]
    pub fn as_stub(&self) -> Self {
        let mut stub = self.clone();
        stub.dependencies.clear();
        stub
    }
}

/// The result of scanning one module: a forest of dependency trees plus
/// provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyScan {
    /// Display name of the scanned module.
    pub module: String,
    /// Stable module identifier, e.g. `mvn:com.example:app:1.0`.
    pub module_id: String,
    /// Direct dependencies of the scanned subject.
    #[serde(default)]
    pub dependencies: Vec<Dependency>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    /// Per-component deep-scan results keyed by component key. Attached by
    /// external analysers; opaque here.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub deepscans: HashMap<String, serde_json::Value>,
}

impl DependencyScan {
    pub fn new(module: impl Into<String>, module_id: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            module_id: module_id.into(),
            dependencies: Vec::new(),
            source: None,
            tag: None,
            branch: None,
            deepscans: HashMap::new(),
        }
    }

    /// Wrap a single dependency tree as its own scan.
    ///
    /// The module id is the component key, suffixed with the resolved version
    /// when there is one.
    #[must_use]
    pub fn from_root(root: Dependency) -> Self {
        let module_id = match root.version() {
            Some(version) => format!("{}:{version}", root.key),
            None => root.key.clone(),
        };
        Self {
            module: root.name.clone(),
            module_id,
            dependencies: vec![root],
            source: None,
            tag: None,
            branch: None,
            deepscans: HashMap::new(),
        }
    }

    /// Iterate over every dependency occurrence in pre-order, depth first.
    ///
    /// Implemented with an explicit work stack; input trees may be
    /// adversarially deep and must not overflow the call stack.
    #[must_use]
    pub fn iter_deps(&self) -> DepIter<'_> {
        DepIter {
            stack: self.dependencies.iter().rev().collect(),
        }
    }

    /// Iterate over distinct `(key, version)` identities, first occurrence wins.
    ///
    /// This is the view used wherever "the set of components in this scan" is
    /// needed: stub copies of a diamond dependency are skipped.
    #[must_use]
    pub fn iter_deps_once(&self) -> UniqueDepIter<'_> {
        UniqueDepIter {
            inner: self.iter_deps(),
            seen: HashSet::new(),
        }
    }

    /// Distinct dependencies indexed by purl, in first-occurrence order.
    ///
    /// Components whose ecosystem type is not a valid purl type are skipped.
    #[must_use]
    pub fn purl_index(&self) -> IndexMap<String, &Dependency> {
        let mut index = IndexMap::new();
        for dep in self.iter_deps_once() {
            if let Some(purl) = dep.purl() {
                index.entry(purl).or_insert(dep);
            }
        }
        index
    }
}

/// Pre-order depth-first iterator over a scan forest.
pub struct DepIter<'a> {
    stack: Vec<&'a Dependency>,
}

impl<'a> Iterator for DepIter<'a> {
    type Item = &'a Dependency;

    fn next(&mut self) -> Option<Self::Item> {
        let dep = self.stack.pop()?;
        self.stack.extend(dep.dependencies.iter().rev());
        Some(dep)
    }
}

/// Iterator yielding each `(key, version)` identity at most once.
pub struct UniqueDepIter<'a> {
    inner: DepIter<'a>,
    seen: HashSet<VersionedKey>,
}

impl<'a> Iterator for UniqueDepIter<'a> {
    type Item = &'a Dependency;

    fn next(&mut self) -> Option<Self::Item> {
        for dep in self.inner.by_ref() {
            if self.seen.insert(dep.versioned_key()) {
                return Some(dep);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dep(name: &str, version: &str) -> Dependency {
        Dependency::new("maven", "org.example", name).with_version(version)
    }

    #[test]
    fn key_uses_backend_type_mapping() {
        let d = dep("commons-lang3", "3.12.0");
        assert_eq!(d.key, "mvn:org.example:commons-lang3");

        let npm = Dependency::new("npm", "", "lodash");
        assert_eq!(npm.key, "npm:lodash");
    }

    #[test]
    fn purl_is_stable_for_equal_identity() {
        let a = dep("commons-lang3", "3.12.0");
        let b = dep("commons-lang3", "3.12.0");
        assert_eq!(a.purl(), b.purl());
        assert_eq!(
            a.purl().as_deref(),
            Some("pkg:maven/org.example/commons-lang3@3.12.0")
        );
    }

    #[test]
    fn multi_version_node_is_version_less() {
        let mut d = dep("guava", "31.0");
        d.versions.push("31.1".to_string());
        assert_eq!(d.version(), None);
        assert_eq!(d.purl().as_deref(), Some("pkg:maven/org.example/guava"));
        assert_eq!(d.versioned_key().version, None);
    }

    #[test]
    fn from_purl_round_trips_identity() {
        let d = Dependency::from_purl("pkg:maven/org.example/app@1.0", None).unwrap();
        assert_eq!(d.key, "mvn:org.example:app");
        assert_eq!(d.namespace, "org.example");
        assert_eq!(d.version(), Some("1.0"));
        assert_eq!(d.purl().as_deref(), Some("pkg:maven/org.example/app@1.0"));
    }

    #[test]
    fn from_purl_rejects_garbage() {
        assert!(Dependency::from_purl("not a purl", None).is_none());
    }

    #[test]
    fn iter_deps_is_preorder_left_to_right() {
        let mut root = dep("a", "1");
        let mut b = dep("b", "1");
        b.dependencies.push(dep("c", "1"));
        root.dependencies.push(b);
        root.dependencies.push(dep("d", "1"));

        let mut scan = DependencyScan::new("m", "mvn:m");
        scan.dependencies.push(root);
        scan.dependencies.push(dep("e", "1"));

        let names: Vec<&str> = scan.iter_deps().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn iter_deps_once_skips_stub_copies() {
        let mut root = dep("a", "1");
        root.dependencies.push(dep("z", "1"));
        let mut scan = DependencyScan::new("m", "mvn:m");
        scan.dependencies.push(root);
        // second occurrence of z, as a stub root
        scan.dependencies.push(dep("z", "1"));

        assert_eq!(scan.iter_deps().count(), 3);
        assert_eq!(scan.iter_deps_once().count(), 2);
    }

    #[test]
    fn purl_index_is_unique_and_ordered() {
        let mut root = dep("a", "1");
        root.dependencies.push(dep("z", "1"));
        root.dependencies.push(dep("z", "1"));
        let scan = DependencyScan::from_root(root);

        let index = scan.purl_index();
        let purls: Vec<&str> = index.keys().map(String::as_str).collect();
        assert_eq!(
            purls,
            [
                "pkg:maven/org.example/a@1",
                "pkg:maven/org.example/z@1"
            ]
        );
    }

    #[test]
    fn crypto_algorithms_dedup() {
        let mut d = dep("a", "1");
        d.add_crypto_algorithm("AES", "128");
        d.add_crypto_algorithm("AES", "128");
        d.add_crypto_algorithm("AES", "256");
        assert_eq!(d.crypto_algorithms.len(), 2);
    }

    #[test]
    fn scan_from_root_builds_module_id() {
        let scan = DependencyScan::from_root(dep("app", "1.0"));
        assert_eq!(scan.module, "app");
        assert_eq!(scan.module_id, "mvn:org.example:app:1.0");
    }
}
