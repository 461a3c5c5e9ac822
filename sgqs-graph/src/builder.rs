use std::path::{Path, PathBuf};

use sgqs_api::{Graph, GraphBuilder, GraphEdge, GraphNode, PropertyValue};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::frontmatter;
use crate::links::{HAS_ENTRYPOINT, HAS_INDEX, LinkPatterns};

#[derive(Debug, Clone)]
pub struct BuilderOptions {
    /// Directory names never descended into. Hidden directories are always skipped.
    pub skip_dirs: Vec<String>,
    /// Extension of document files, without the dot.
    pub extension: String,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            skip_dirs: ["node_modules", "scripts", "dist"]
                .into_iter()
                .map(String::from)
                .collect(),
            extension: "md".to_string(),
        }
    }
}

/// Builds a [`Graph`] from a skill tree: one directory per skill, each
/// holding markdown documents.
#[derive(Debug, Clone, Default)]
pub struct SkillGraphBuilder {
    options: BuilderOptions,
}

/// A document read from disk, waiting for its links to be resolved.
struct Document {
    node_id: String,
    body_offset: usize,
    content: String,
}

impl SkillGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: BuilderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    fn is_skipped(&self, name: &str) -> bool {
        name.starts_with('.') || self.options.skip_dirs.iter().any(|d| d == name)
    }

    fn skill_dirs(&self, root: &Path) -> Result<Vec<(String, PathBuf)>> {
        let mut dirs = Vec::new();
        let walker = WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if self.is_skipped(&name) {
                continue;
            }
            dirs.push((name, entry.into_path()));
        }
        Ok(dirs)
    }

    fn document_paths(&self, skill_dir: &Path) -> Vec<PathBuf> {
        let walker = WalkDir::new(skill_dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !self.is_skipped(&entry.file_name().to_string_lossy())
            });

        let mut paths = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            let is_document = entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext == self.options.extension);
            if is_document {
                paths.push(entry.into_path());
            }
        }
        paths
    }

    fn document_node(
        &self,
        patterns: &LinkPatterns,
        skill: &str,
        relative: &str,
        content: &str,
    ) -> GraphNode {
        let suffix = format!(".{}", self.options.extension);
        let id = relative.strip_suffix(&suffix).unwrap_or(relative);
        let label = infer_label(relative, &suffix);

        let mut node = GraphNode::new(id)
            .with_label(label)
            .with_skill(skill)
            .with_path(relative);
        node.properties = frontmatter::parse(content);
        node.properties.insert("skill".into(), skill.into());
        node.properties.insert("path".into(), relative.into());

        let stem = id.rsplit('/').next().unwrap_or(id);
        fill_missing(&mut node, "name", || Some(stem.into()));
        fill_missing(&mut node, "type", || Some(label.to_lowercase().into()));
        fill_missing(&mut node, "title", || patterns.title(content).map(Into::into));
        node
    }
}

/// Sets `key` unless the front matter already gave it a non-empty value.
fn fill_missing(
    node: &mut GraphNode,
    key: &str,
    value: impl FnOnce() -> Option<PropertyValue>,
) {
    let present = node
        .properties
        .get(key)
        .is_some_and(|v| !v.is_null() && v.as_str() != Some(""));
    if !present && let Some(value) = value() {
        node.properties.insert(key.to_string(), value);
    }
}

fn infer_label(relative: &str, suffix: &str) -> &'static str {
    let parts: Vec<&str> = relative.split('/').collect();
    let file = parts.last().copied().unwrap_or_default();
    if parts.len() == 2 {
        if file == format!("index{suffix}") {
            return "Index";
        }
        if file == format!("SKILL{suffix}") {
            return "Entrypoint";
        }
    }
    if parts.len() >= 3 {
        match parts[1] {
            "nodes" => return "Node",
            "references" => return "Reference",
            "assets" => return "Asset",
            _ => {}
        }
    }
    "Document"
}

impl GraphBuilder for SkillGraphBuilder {
    type Error = Error;

    fn build(&self, root: &Path) -> Result<Graph> {
        if !root.is_dir() {
            return Err(Error::RootNotFound(root.to_path_buf()));
        }
        let patterns = LinkPatterns::new()?;
        let mut graph = Graph::new();
        let mut pending: Vec<GraphEdge> = Vec::new();

        for (skill, dir) in self.skill_dirs(root)? {
            graph.add_node(
                GraphNode::new(skill.as_str())
                    .with_label("Skill")
                    .with_property("name", skill.as_str())
                    .with_skill(skill.as_str())
                    .with_path(format!("{skill}/")),
            );

            let mut documents = Vec::new();
            for path in self.document_paths(&dir) {
                let content = match std::fs::read_to_string(&path) {
                    Ok(content) => content,
                    Err(source) => {
                        let err = Error::Io { path, source };
                        warn!(error = %err, "skipping unreadable document");
                        continue;
                    }
                };
                let relative = relative_id(root, &path);
                let node = self.document_node(&patterns, &skill, &relative, &content);
                let (_, body) = frontmatter::split(&content);
                documents.push(Document {
                    node_id: node.id.clone(),
                    body_offset: content.len() - body.len(),
                    content,
                });
                graph.add_node(node);
            }

            for doc in &documents {
                if let Some(source) = graph.node(&doc.node_id) {
                    pending.extend(patterns.extract(source, &doc.content[doc.body_offset..]));
                }
            }

            for (rel_type, target) in [
                (HAS_ENTRYPOINT, format!("{skill}/SKILL")),
                (HAS_INDEX, format!("{skill}/index")),
            ] {
                if graph.node(&target).is_some() {
                    pending.push(GraphEdge::new(skill.as_str(), rel_type, target));
                }
            }
            debug!(skill = %skill, documents = documents.len(), "scanned skill");
        }

        let mut dropped = 0usize;
        for edge in pending {
            if let Err(err) = graph.add_edge(edge) {
                debug!(error = %err, "dropping dangling edge");
                dropped += 1;
            }
        }
        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            dropped,
            "graph built"
        );
        Ok(graph)
    }
}

/// Path of `path` below `root`, with `/` separators.
fn relative_id(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Builds the graph rooted at `root` with default options.
pub fn build(root: impl AsRef<Path>) -> Result<Graph> {
    SkillGraphBuilder::new().build(root.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_location() {
        assert_eq!(infer_label("a/index.md", ".md"), "Index");
        assert_eq!(infer_label("a/SKILL.md", ".md"), "Entrypoint");
        assert_eq!(infer_label("a/nodes/x.md", ".md"), "Node");
        assert_eq!(infer_label("a/references/x.md", ".md"), "Reference");
        assert_eq!(infer_label("a/assets/deep/x.md", ".md"), "Asset");
        assert_eq!(infer_label("a/nodes/index.md", ".md"), "Node");
        assert_eq!(infer_label("a/README.md", ".md"), "Document");
        assert_eq!(infer_label("a/misc/x.md", ".md"), "Document");
    }

    #[test]
    fn computed_properties_do_not_override_front_matter() {
        let builder = SkillGraphBuilder::new();
        let patterns = LinkPatterns::new().unwrap();
        let node = builder.document_node(
            &patterns,
            "alpha",
            "alpha/nodes/intro.md",
            "---\nname: Introduction\ntitle:\nskill: ignored\n---\n# Getting started\n",
        );
        assert_eq!(node.id, "alpha/nodes/intro");
        assert_eq!(node.labels, ["Node"]);
        assert_eq!(node.properties["name"], PropertyValue::from("Introduction"));
        assert_eq!(node.properties["skill"], PropertyValue::from("alpha"));
        assert_eq!(node.properties["path"], PropertyValue::from("alpha/nodes/intro.md"));
        assert_eq!(node.properties["type"], PropertyValue::from("node"));
        assert_eq!(node.properties["title"], PropertyValue::from("Getting started"));
    }
}
