//! Command implementations for the `sbom-graph` binary.
//!
//! Thin glue over [`crate::parsers`]: read bytes, convert, write bytes.
//! Everything interesting happens in the library.

use crate::error::{Error, Result};
use crate::model::{Dependency, DependencyScan};
use crate::parsers::{dump_scans, load_scans, IndentTreeParser, ParseError, ScanFormat};
use std::io::Write as _;
use std::path::Path;

/// Convert an SBOM document between formats.
pub fn run_convert(
    input: &Path,
    from: Option<ScanFormat>,
    to: ScanFormat,
    output: Option<&Path>,
) -> Result<()> {
    let scans = load_scans(input, from)?;
    tracing::info!(
        scans = scans.len(),
        components = scans.iter().map(|s| s.iter_deps_once().count()).sum::<usize>(),
        "loaded {}",
        input.display()
    );

    let rendered = dump_scans(&scans, to)?;
    write_output(&rendered, output)
}

/// Parse a build-tool dependency tree dump into an SBOM document.
pub fn run_tree(
    input: &Path,
    indent_width: usize,
    to: ScanFormat,
    output: Option<&Path>,
) -> Result<()> {
    let content = std::fs::read_to_string(input).map_err(|e| Error::io(input, &e))?;

    let forest = IndentTreeParser::new(indent_width).parse_dependencies(&content)?;
    if forest.is_empty() {
        return Err(ParseError::UnknownFormat(format!(
            "no dependency roots in {}",
            input.display()
        ))
        .into());
    }

    let scan = scan_from_forest(forest);
    tracing::info!(
        module = %scan.module,
        components = scan.iter_deps_once().count(),
        "parsed dependency tree"
    );

    let rendered = dump_scans(&[scan], to)?;
    write_output(&rendered, output)
}

/// Wrap a parsed forest into a scan.
///
/// A single root (the usual Maven layout: the project itself heads the tree)
/// names the module; multi-root dumps keep every root as a direct dependency.
fn scan_from_forest(mut forest: Vec<Dependency>) -> DependencyScan {
    if forest.len() == 1 {
        if let Some(root) = forest.pop() {
            return DependencyScan::from_root(root);
        }
    }
    let mut scan = DependencyScan::new("unknown", "tree:unknown");
    scan.dependencies = forest;
    scan
}

fn write_output(rendered: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, rendered).map_err(|e| Error::io(path, &e))?;
            tracing::info!("wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(rendered.as_bytes())
                .and_then(|()| {
                    if rendered.ends_with('\n') {
                        Ok(())
                    } else {
                        stdout.write_all(b"\n")
                    }
                })
                .map_err(|e| Error::io("stdout", &e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_root_forest_names_the_module() {
        let root = Dependency::new("maven", "com.example", "app").with_version("1.0");
        let scan = scan_from_forest(vec![root]);
        assert_eq!(scan.module, "app");
        assert_eq!(scan.module_id, "mvn:com.example:app:1.0");
    }

    #[test]
    fn multi_root_forest_keeps_all_roots() {
        let a = Dependency::new("maven", "com.example", "a");
        let b = Dependency::new("maven", "com.example", "b");
        let scan = scan_from_forest(vec![a, b]);
        assert_eq!(scan.module, "unknown");
        assert_eq!(scan.dependencies.len(), 2);
    }

    #[test]
    fn convert_and_tree_round_trip_on_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tree_path = dir.path().join("deps.tree");
        let bom_path = dir.path().join("bom.cdx.json");
        std::fs::write(
            &tree_path,
            "com.example:app:jar:1.0\n+- org.foo:bar:jar:2.0\n",
        )
        .expect("write tree");

        run_tree(
            &tree_path,
            IndentTreeParser::MAVEN_INDENT,
            ScanFormat::CycloneDxJson,
            Some(&bom_path),
        )
        .expect("tree");

        let ts_path = dir.path().join("scan.json");
        run_convert(&bom_path, None, ScanFormat::Ts, Some(&ts_path)).expect("convert");

        let scans = load_scans(&ts_path, Some(ScanFormat::Ts)).expect("load");
        assert_eq!(scans[0].module, "app");
        assert_eq!(scans[0].dependencies[0].dependencies[0].name, "bar");
    }
}
