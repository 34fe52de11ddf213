//! Indentation-based dependency tree parser.
//!
//! Build tools dump dependency trees as indented text; Maven's
//! `dependency:tree` output looks like
//!
//! ```text
//! com.example:app:jar:1.0
//! +- org.foo:bar:jar:2.0
//! |  \- org.baz:qux:jar:3.0
//! \- org.foo:baz:jar:1.5 -> 1.6
//! ```
//!
//! Tree depth is encoded by the leading run of non-alphanumeric glyphs: one
//! indent unit is a fixed number of characters (3 for Maven, 5 for Gradle).
//! A `declared -> resolved` marker means the build resolved the declared
//! version away; the resolved version is authoritative.
//!
//! Parsing is a single left-to-right scan over a path stack. A dedent that
//! walks past the forest root means the dump is truncated or malformed and
//! fails the whole document; callers must not emit a partially-correct tree.

use crate::model::Dependency;
use crate::parsers::traits::ParseError;
use regex::Regex;
use std::sync::OnceLock;

/// A raw parsed tree node: the coordinate label plus nested children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub label: String,
    pub children: Vec<TreeNode>,
}

/// Matches the coordinate part of a line, skipping tree-drawing glyphs.
fn label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z0-9].*").expect("literal regex"))
}

/// Line-oriented indentation parser.
#[derive(Debug, Clone, Copy)]
pub struct IndentTreeParser {
    indent_width: usize,
}

/// An open node on the path from the current root to the previous line.
struct Open {
    indent: usize,
    node: TreeNode,
}

impl IndentTreeParser {
    /// Maven draws `"+- "` / `"|  "` glyphs, three characters per level.
    pub const MAVEN_INDENT: usize = 3;
    /// Gradle draws `"+--- "` / `"|    "` glyphs, five characters per level.
    pub const GRADLE_INDENT: usize = 5;

    #[must_use]
    pub const fn new(indent_width: usize) -> Self {
        Self { indent_width }
    }

    #[must_use]
    pub const fn maven() -> Self {
        Self::new(Self::MAVEN_INDENT)
    }

    #[must_use]
    pub const fn gradle() -> Self {
        Self::new(Self::GRADLE_INDENT)
    }

    /// Parse a dump into a forest of raw tree nodes.
    ///
    /// Lines without any alphanumeric content are skipped. Every zero-indent
    /// line starts a new forest root (Maven concatenates module trees into
    /// one file). Errors are fatal for the document.
    pub fn parse(&self, text: &str) -> Result<Vec<TreeNode>, ParseError> {
        let mut roots: Vec<TreeNode> = Vec::new();
        let mut path: Vec<Open> = Vec::new();
        let mut prev_indent = 0usize;

        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            let Some(found) = label_re().find(line) else {
                continue;
            };
            let indent = line[..found.start()].chars().count() / self.indent_width;
            let node = TreeNode {
                label: found.as_str().trim().to_string(),
                children: Vec::new(),
            };

            if indent == 0 {
                while !path.is_empty() {
                    close_one(&mut path, &mut roots);
                }
                path.push(Open { indent, node });
            } else if path.is_empty() {
                return Err(ParseError::Indentation {
                    line: line_no,
                    reason: "indented line before any root".to_string(),
                });
            } else if indent > prev_indent {
                // deeper: child of the previous node
                path.push(Open { indent, node });
            } else {
                // same indent: sibling; shallower by delta: child of the
                // ancestor delta levels above the previous node's parent
                let pops = prev_indent - indent + 1;
                if pops >= path.len() {
                    return Err(ParseError::Indentation {
                        line: line_no,
                        reason: "dedent walks past the forest root".to_string(),
                    });
                }
                for _ in 0..pops {
                    close_one(&mut path, &mut roots);
                }
                path.push(Open { indent, node });
            }

            prev_indent = indent;
        }

        while !path.is_empty() {
            close_one(&mut path, &mut roots);
        }
        Ok(roots)
    }

    /// Parse a dump straight into dependency trees.
    ///
    /// Lines whose coordinate part cannot be recognized are skipped along
    /// with their subtree.
    pub fn parse_dependencies(&self, text: &str) -> Result<Vec<Dependency>, ParseError> {
        Ok(convert_forest(self.parse(text)?))
    }
}

/// Close the deepest open node, attaching it to its parent (or the forest).
fn close_one(path: &mut Vec<Open>, roots: &mut Vec<TreeNode>) {
    if let Some(open) = path.pop() {
        match path.last_mut() {
            Some(parent) => parent.node.children.push(open.node),
            None => roots.push(open.node),
        }
    }
}

/// Convert raw tree nodes into dependencies, explicit-stack, no recursion.
fn convert_forest(nodes: Vec<TreeNode>) -> Vec<Dependency> {
    struct Slot {
        parent: Option<usize>,
        dep: Option<Dependency>,
    }

    // Pre-order flatten: every child lands at a higher index than its parent.
    let mut flat: Vec<Slot> = Vec::new();
    let mut stack: Vec<(Option<usize>, TreeNode)> =
        nodes.into_iter().rev().map(|n| (None, n)).collect();

    while let Some((parent, node)) = stack.pop() {
        let Some(dep) = parse_coordinate(&node.label) else {
            tracing::warn!(label = %node.label, "unrecognized coordinate line; subtree skipped");
            continue;
        };
        let index = flat.len();
        flat.push(Slot {
            parent,
            dep: Some(dep),
        });
        stack.extend(node.children.into_iter().rev().map(|c| (Some(index), c)));
    }

    // Assemble bottom-up: by the time a slot is moved into its parent, its
    // own child list is complete (children occupy higher indices).
    let mut forest: Vec<Dependency> = Vec::new();
    for index in (0..flat.len()).rev() {
        let parent = flat[index].parent;
        let Some(mut dep) = flat[index].dep.take() else {
            continue;
        };
        dep.dependencies.reverse();
        match parent {
            Some(p) => {
                if let Some(parent_dep) = flat[p].dep.as_mut() {
                    parent_dep.dependencies.push(dep);
                }
            }
            None => forest.push(dep),
        }
    }
    forest.reverse();
    forest
}

/// Parse a Maven/Gradle coordinate label into a dependency.
///
/// Accepted shapes: `group:artifact`, `group:artifact:version`,
/// `group:artifact:packaging:version[:scope]`, each optionally followed by
/// `-> resolved`. Gradle's trailing `(*)`/`(c)`/`(n)` markers are stripped.
fn parse_coordinate(label: &str) -> Option<Dependency> {
    let mut label = label.trim();
    for marker in ["(*)", "(c)", "(n)"] {
        if let Some(stripped) = label.strip_suffix(marker) {
            label = stripped.trim_end();
        }
    }

    let (base, resolved) = match label.split_once(" -> ") {
        Some((base, resolved)) => (base.trim_end(), Some(resolved.trim())),
        None => (label, None),
    };

    let parts: Vec<&str> = base.split(':').map(str::trim).collect();
    if parts.len() < 2 || parts[0].is_empty() || parts[1].is_empty() {
        return None;
    }
    let (group, artifact) = (parts[0], parts[1]);
    let declared = match parts.len() {
        2 => None,
        3 => Some(parts[2]),
        _ => Some(parts[3]),
    }
    .filter(|v| !v.is_empty());
    let scope = parts.get(4).copied().filter(|s| !s.is_empty());

    let mut dep = Dependency::new("maven", group, artifact);
    if let Some(version) = resolved.or(declared) {
        dep.versions.push(version.to_string());
    }
    if let (Some(resolved), Some(declared)) = (resolved, declared) {
        if resolved != declared {
            dep.meta.insert(
                "declaredVersion".to_string(),
                serde_json::Value::String(declared.to_string()),
            );
        }
    }
    if let Some(scope) = scope {
        dep.meta.insert(
            "scope".to_string(),
            serde_json::Value::String(scope.to_string()),
        );
    }
    Some(dep)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAVEN_SAMPLE: &str = "\
com.example:app:jar:1.0
+- org.foo:bar:jar:2.0
|  \\- org.baz:qux:jar:3.0
\\- org.foo:baz:jar:1.5 -> 1.6
";

    #[test]
    fn maven_sample_builds_expected_tree() {
        let forest = IndentTreeParser::maven()
            .parse_dependencies(MAVEN_SAMPLE)
            .unwrap();
        assert_eq!(forest.len(), 1);

        let root = &forest[0];
        assert_eq!(root.name, "app");
        assert_eq!(root.namespace, "com.example");
        assert_eq!(root.version(), Some("1.0"));
        assert_eq!(root.dependencies.len(), 2);

        let bar = &root.dependencies[0];
        assert_eq!(bar.name, "bar");
        assert_eq!(bar.version(), Some("2.0"));
        assert_eq!(bar.dependencies.len(), 1);
        assert_eq!(bar.dependencies[0].name, "qux");
        assert_eq!(bar.dependencies[0].version(), Some("3.0"));

        let baz = &root.dependencies[1];
        assert_eq!(baz.name, "baz");
        assert_eq!(baz.version(), Some("1.6"), "resolved version wins");
        assert_eq!(
            baz.meta.get("declaredVersion").and_then(|v| v.as_str()),
            Some("1.5")
        );
    }

    #[test]
    fn sibling_and_dedent_cases() {
        let text = "\
a:root:jar:1
+- a:one:jar:1
|  +- a:two:jar:1
|  \\- a:three:jar:1
\\- a:four:jar:1
";
        let forest = IndentTreeParser::maven().parse_dependencies(text).unwrap();
        let root = &forest[0];
        assert_eq!(root.dependencies.len(), 2);
        assert_eq!(root.dependencies[0].dependencies.len(), 2);
        assert_eq!(root.dependencies[1].name, "four");
    }

    #[test]
    fn multiple_roots_form_a_forest() {
        let text = "\
a:mod1:jar:1
+- a:dep1:jar:1
a:mod2:jar:1
+- a:dep2:jar:1
";
        let forest = IndentTreeParser::maven().parse_dependencies(text).unwrap();
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].name, "mod1");
        assert_eq!(forest[1].name, "mod2");
        assert_eq!(forest[1].dependencies[0].name, "dep2");
    }

    #[test]
    fn dedent_past_root_is_fatal() {
        // indent jumps 0 -> 2, then a dedent to 1 has no ancestor at that level
        let text = "\
a:root:jar:1
|  |  +- a:deep:jar:1
+- a:bad:jar:1
";
        let err = IndentTreeParser::maven().parse(text).unwrap_err();
        assert!(matches!(err, ParseError::Indentation { line: 3, .. }));
    }

    #[test]
    fn indented_first_line_is_fatal() {
        let err = IndentTreeParser::maven()
            .parse("+- a:orphan:jar:1\n")
            .unwrap_err();
        assert!(matches!(err, ParseError::Indentation { line: 1, .. }));
    }

    #[test]
    fn blank_and_glyph_only_lines_are_skipped() {
        let text = "\
a:root:jar:1

|
+- a:dep:jar:1
";
        let forest = IndentTreeParser::maven().parse_dependencies(text).unwrap();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].dependencies.len(), 1);
    }

    #[test]
    fn gradle_notation_and_markers() {
        let text = "\
org.springframework:spring-core:5.3.0
+--- org.springframework:spring-jcl:5.3.0 (*)
\\--- com.fasterxml:classmate -> 1.5.1
";
        let forest = IndentTreeParser::gradle().parse_dependencies(text).unwrap();
        let root = &forest[0];
        assert_eq!(root.version(), Some("5.3.0"));
        assert_eq!(root.dependencies.len(), 2);
        assert_eq!(root.dependencies[0].name, "spring-jcl");
        assert_eq!(root.dependencies[1].version(), Some("1.5.1"));
    }

    #[test]
    fn scope_is_preserved_in_meta() {
        let forest = IndentTreeParser::maven()
            .parse_dependencies("org.x:svnkit:jar:1.8.7:provided\n")
            .unwrap();
        assert_eq!(
            forest[0].meta.get("scope").and_then(|v| v.as_str()),
            Some("provided")
        );
    }

    #[test]
    fn unrecognized_label_skips_subtree() {
        let text = "\
a:root:jar:1
+- not-a-coordinate
|  \\- a:child:jar:1
\\- a:kept:jar:1
";
        let forest = IndentTreeParser::maven().parse_dependencies(text).unwrap();
        let root = &forest[0];
        assert_eq!(root.dependencies.len(), 1);
        assert_eq!(root.dependencies[0].name, "kept");
    }

    #[test]
    fn key_uses_maven_backend_prefix() {
        let forest = IndentTreeParser::maven()
            .parse_dependencies("org.apache.commons:commons-lang3:jar:3.12.0\n")
            .unwrap();
        assert_eq!(forest[0].key, "mvn:org.apache.commons:commons-lang3");
    }
}
