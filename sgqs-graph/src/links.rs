//! Link extraction from document bodies.

use regex::Regex;
use sgqs_api::{GraphEdge, GraphNode, PropertyValue};

pub const LINKS_TO: &str = "LINKS_TO";
pub const CONTAINS: &str = "CONTAINS";
pub const DEPENDS_ON: &str = "DEPENDS_ON";
pub const REFERENCES: &str = "REFERENCES";
pub const HAS_ENTRYPOINT: &str = "HAS_ENTRYPOINT";
pub const HAS_INDEX: &str = "HAS_INDEX";

/// Sub-directories a wikilink may address relative to its own skill.
const SKILL_LOCAL_DIRS: [&str; 3] = ["nodes/", "references/", "assets/"];

/// Compiled link and heading patterns, shared across all documents of a build.
#[derive(Debug, Clone)]
pub struct LinkPatterns {
    wikilink: Regex,
    markdown: Regex,
    heading: Regex,
}

impl LinkPatterns {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            wikilink: Regex::new(r"\[\[([^\]|]+)(?:\|([^\]]+))?\]\]")?,
            markdown: Regex::new(r"\[([^\]]+)\]\((\.[^)]+\.md)\)")?,
            heading: Regex::new(r"(?m)^#[ \t]+(.+)$")?,
        })
    }

    /// Text of the first level-one heading.
    pub fn title<'c>(&self, content: &'c str) -> Option<&'c str> {
        self.heading
            .captures(content)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .filter(|t| !t.is_empty())
    }

    /// All edges `source`'s body declares, in document order, without
    /// duplicate ids.
    pub fn extract(&self, source: &GraphNode, body: &str) -> Vec<GraphEdge> {
        let mut out = EdgeSink::default();

        for caps in self.wikilink.captures_iter(body) {
            let Some(raw) = caps.get(1).map(|m| m.as_str().trim()) else {
                continue;
            };
            let label = caps
                .get(2)
                .map(|m| m.as_str().trim())
                .filter(|l| !l.is_empty());
            let target = resolve_wikilink(raw, &source.skill);

            out.push(source, LINKS_TO, &target, label);
            if source.has_label("Index") && raw.starts_with("nodes/") {
                out.push(source, CONTAINS, &target, label);
            }
            if skill_of(&target) != source.skill {
                out.push(source, DEPENDS_ON, &target, label);
            }
        }

        for caps in self.markdown.captures_iter(body) {
            let (Some(text), Some(href)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let text = text.as_str().trim();
            let Some(target) = resolve_markdown(href.as_str().trim(), source) else {
                continue;
            };

            out.push(source, REFERENCES, &target, Some(text));
            if skill_of(&target) != source.skill {
                out.push(source, DEPENDS_ON, &target, Some(text));
            }
        }

        out.edges
    }
}

#[derive(Default)]
struct EdgeSink {
    edges: Vec<GraphEdge>,
}

impl EdgeSink {
    fn push(&mut self, source: &GraphNode, rel_type: &str, target: &str, label: Option<&str>) {
        let mut edge = GraphEdge::new(source.id.as_str(), rel_type, target);
        if self.edges.iter().any(|e| e.id == edge.id) {
            return;
        }
        if let Some(label) = label {
            edge = edge.with_property("label", PropertyValue::from(label));
        }
        self.edges.push(edge);
    }
}

fn skill_of(id: &str) -> &str {
    id.split('/').next().unwrap_or(id)
}

/// Wikilinks are relative to the current skill unless they already carry
/// another skill's name as their first segment.
pub fn resolve_wikilink(target: &str, skill: &str) -> String {
    let cleaned = target.strip_suffix(".md").unwrap_or(target);
    let skill_local = SKILL_LOCAL_DIRS.iter().any(|dir| cleaned.starts_with(dir));
    if cleaned.contains('/') && !skill_local {
        cleaned.to_string()
    } else {
        format!("{skill}/{cleaned}")
    }
}

/// Markdown links resolve against the linking document's directory, or
/// against the skill root for documents at the top of a skill. A `../`
/// prefix escapes to the skill tree root.
pub fn resolve_markdown(href: &str, source: &GraphNode) -> Option<String> {
    let cleaned = href.strip_suffix(".md").unwrap_or(href);
    let cleaned = cleaned.strip_prefix("./").unwrap_or(cleaned);

    if cleaned.starts_with("../") {
        let remaining: Vec<&str> = cleaned.split('/').filter(|part| *part != "..").collect();
        return (!remaining.is_empty()).then(|| remaining.join("/"));
    }

    let source_path = source.path.replace('\\', "/");
    match source_path.rsplit_once('/') {
        Some((dir, _)) if dir.contains('/') => Some(format!("{dir}/{cleaned}")),
        _ => Some(format!("{}/{cleaned}", source.skill)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, label: &str) -> GraphNode {
        let skill = skill_of(id).to_string();
        GraphNode::new(id)
            .with_label(label)
            .with_skill(skill)
            .with_path(format!("{id}.md"))
    }

    #[test]
    fn wikilink_resolution() {
        assert_eq!(resolve_wikilink("nodes/intro", "alpha"), "alpha/nodes/intro");
        assert_eq!(resolve_wikilink("nodes/intro.md", "alpha"), "alpha/nodes/intro");
        assert_eq!(resolve_wikilink("SKILL", "alpha"), "alpha/SKILL");
        assert_eq!(resolve_wikilink("beta/nodes/x", "alpha"), "beta/nodes/x");
    }

    #[test]
    fn markdown_resolution_depends_on_source_location() {
        let top = doc("alpha/SKILL", "Entrypoint");
        let nested = doc("alpha/nodes/intro", "Node");
        assert_eq!(
            resolve_markdown("./references/api.md", &top).as_deref(),
            Some("alpha/references/api")
        );
        assert_eq!(
            resolve_markdown("./other.md", &nested).as_deref(),
            Some("alpha/nodes/other")
        );
        assert_eq!(
            resolve_markdown("../../beta/SKILL.md", &nested).as_deref(),
            Some("beta/SKILL")
        );
    }

    #[test]
    fn index_wikilinks_into_nodes_also_contain() {
        let patterns = LinkPatterns::new().unwrap();
        let index = doc("alpha/index", "Index");
        let edges = patterns.extract(&index, "See [[nodes/intro|Intro]] and [[nodes/intro]].");
        let ids: Vec<_> = edges.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(
            ids,
            [
                "alpha/index--LINKS_TO--alpha/nodes/intro",
                "alpha/index--CONTAINS--alpha/nodes/intro",
            ]
        );
        assert_eq!(edges[0].properties["label"], PropertyValue::from("Intro"));
    }

    #[test]
    fn cross_skill_links_depend_on() {
        let patterns = LinkPatterns::new().unwrap();
        let node = doc("alpha/nodes/intro", "Node");
        let edges = patterns.extract(
            &node,
            "[[beta/nodes/x]] then [the api](../../beta/references/api.md)",
        );
        let types: Vec<_> = edges.iter().map(|e| e.rel_type.as_str()).collect();
        assert_eq!(types, [LINKS_TO, DEPENDS_ON, REFERENCES, DEPENDS_ON]);
        assert_eq!(edges[2].properties["label"], PropertyValue::from("the api"));
        assert!(edges[1].properties.is_empty());
    }

    #[test]
    fn title_is_first_heading() {
        let patterns = LinkPatterns::new().unwrap();
        assert_eq!(patterns.title("intro\n## Sub\n# Main  \n# Second"), Some("Main"));
        assert_eq!(patterns.title("no heading"), None);
    }
}
