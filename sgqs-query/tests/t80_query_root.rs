//! T80: End-to-end queries over a skill tree on disk.

use std::fs;
use std::path::Path;

use sgqs_query::{Error, ErrorCode, Value, query};
use tempfile::tempdir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn skill_tree(root: &Path) {
    write(
        root,
        "system-spec-kit/SKILL.md",
        "---\nname: system-spec-kit\ndescription: Spec folders and memory\nkeywords: [spec, memory]\n---\n# Spec Kit\n\nSee [[index]].\n",
    );
    write(
        root,
        "system-spec-kit/index.md",
        "# Index\n\n- [[nodes/levels|Levels]]\n- [[nodes/memory]]\n",
    );
    write(
        root,
        "system-spec-kit/nodes/levels.md",
        "---\ntitle: Documentation levels\n---\nDetails in [the api](../../system-spec-kit/references/api.md) and [[workflows-code/SKILL]].\n",
    );
    write(root, "system-spec-kit/nodes/memory.md", "# Memory\n");
    write(root, "system-spec-kit/references/api.md", "# API\n");
    write(root, "workflows-code/SKILL.md", "# Workflows\n");
}

fn column(result: &sgqs_query::QueryResult, name: &str) -> Vec<String> {
    result
        .rows
        .iter()
        .map(|row| row.get(name).map(Value::to_string).unwrap_or_default())
        .collect()
}

#[test]
fn test_query_over_built_graph() {
    let dir = tempdir().unwrap();
    skill_tree(dir.path());

    let result = query("MATCH (s:Skill) RETURN s.name", dir.path()).unwrap();
    assert_eq!(column(&result, "s.name"), ["system-spec-kit", "workflows-code"]);

    let result = query(
        "MATCH (i:Index)-[:CONTAINS]->(n:Node) RETURN n.name ORDER",
        dir.path(),
    );
    assert!(result.is_err());

    let result = query(
        "MATCH (i:Index)-[c:CONTAINS]->(n:Node) RETURN n.name, c.label",
        dir.path(),
    )
    .unwrap();
    assert_eq!(column(&result, "n.name"), ["levels", "memory"]);
    assert_eq!(column(&result, "c.label"), ["Levels", ""]);
}

#[test]
fn test_cross_skill_dependencies() {
    let dir = tempdir().unwrap();
    skill_tree(dir.path());

    let result = query(
        "MATCH (a)-[:DEPENDS_ON]->(b) RETURN a.id, b.skill",
        dir.path(),
    )
    .unwrap();
    assert_eq!(column(&result, "a.id"), ["system-spec-kit/nodes/levels"]);
    assert_eq!(column(&result, "b.skill"), ["workflows-code"]);
}

#[test]
fn test_structural_traversal_and_keywords() {
    let dir = tempdir().unwrap();
    skill_tree(dir.path());

    let result = query(
        "MATCH (s:Skill)-[:HAS_ENTRYPOINT]->(e {keywords: \"memory\"}) RETURN s.id, e.title",
        dir.path(),
    )
    .unwrap();
    assert_eq!(column(&result, "s.id"), ["system-spec-kit"]);
    assert_eq!(column(&result, "e.title"), ["Spec Kit"]);

    let result = query(
        "MATCH (s:Skill)-[:HAS_INDEX]->(:Index)-[*1..2]->(d) WHERE d.title CONTAINS \"api\" RETURN DISTINCT d.path",
        dir.path(),
    )
    .unwrap();
    assert_eq!(column(&result, "d.path"), ["system-spec-kit/references/api.md"]);
}

#[test]
fn test_parse_errors_come_before_the_filesystem() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nowhere");

    let err = query("MATCH (n:Widget) RETURN n", &missing).unwrap_err();
    assert_eq!(err.code(), ErrorCode::E021);

    let err = query("MATCH (n) RETURN n.id", &missing).unwrap_err();
    assert!(matches!(err, Error::Graph(_)), "{err:?}");
    assert_eq!(err.code(), ErrorCode::E040);
}
