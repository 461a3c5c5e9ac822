//! T30: MATCH
//!
//! Node scans, single hops in every direction, and variable reuse across
//! patterns.

use sgqs_api::{Graph, GraphEdge, GraphNode};
use sgqs_query::{Value, query_graph};

fn node(id: &str, label: &str) -> GraphNode {
    GraphNode::new(id)
        .with_label(label)
        .with_property("name", id)
        .with_skill("foo")
        .with_path(format!("foo/{id}.md"))
}

fn two_nodes() -> Graph {
    let mut graph = Graph::new();
    graph.add_node(node("a", "Node"));
    graph.add_node(node("b", "Node"));
    graph
}

fn linked() -> Graph {
    let mut graph = two_nodes();
    graph.add_edge(GraphEdge::new("a", "LINKS_TO", "b")).unwrap();
    graph
}

fn strings(values: Vec<Option<&Value>>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.and_then(Value::as_str).unwrap_or_default().to_string())
        .collect()
}

#[test]
fn test_node_scan_in_iteration_order() {
    let result = query_graph("MATCH (n:Node) RETURN n.name", &two_nodes()).unwrap();
    assert_eq!(result.columns, ["n.name"]);
    assert_eq!(
        strings(result.rows.iter().map(|r| r.get("n.name")).collect()),
        ["a", "b"]
    );
    assert!(result.errors.is_empty());
}

#[test]
fn test_label_filter_is_case_insensitive_at_match_time() {
    let mut graph = two_nodes();
    graph.add_node(GraphNode::new("lower").with_label("node"));
    graph.add_node(node("s", "Skill"));
    let result = query_graph("MATCH (n:Node) RETURN n.id", &graph).unwrap();
    assert_eq!(
        strings(result.rows.iter().map(|r| r.get("n.id")).collect()),
        ["a", "b", "lower"]
    );
}

#[test]
fn test_single_hop_outbound() {
    let result = query_graph("MATCH (n:Node)-[:LINKS_TO]->(m) RETURN n.id, m.id", &linked()).unwrap();
    assert_eq!(result.columns, ["n.id", "m.id"]);
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0].get("n.id"), Some(&Value::from("a")));
    assert_eq!(result.rows[0].get("m.id"), Some(&Value::from("b")));
}

#[test]
fn test_single_hop_inbound_and_undirected() {
    let graph = linked();

    let inbound = query_graph("MATCH (n)<-[:LINKS_TO]-(m) RETURN n.id, m.id", &graph).unwrap();
    assert_eq!(inbound.rows.len(), 1);
    assert_eq!(inbound.rows[0].get("n.id"), Some(&Value::from("b")));
    assert_eq!(inbound.rows[0].get("m.id"), Some(&Value::from("a")));

    let undirected = query_graph("MATCH (n)-[:LINKS_TO]-(m) RETURN n.id, m.id", &graph).unwrap();
    let pairs: Vec<_> = undirected
        .rows
        .iter()
        .map(|r| (r.get("n.id").cloned(), r.get("m.id").cloned()))
        .collect();
    assert_eq!(
        pairs,
        [
            (Some(Value::from("a")), Some(Value::from("b"))),
            (Some(Value::from("b")), Some(Value::from("a"))),
        ]
    );
}

#[test]
fn test_rel_type_filter_and_edge_binding() {
    let mut graph = linked();
    graph
        .add_edge(GraphEdge::new("a", "DEPENDS_ON", "b").with_property("label", "needs"))
        .unwrap();

    let result = query_graph(
        "MATCH (a)-[r:DEPENDS_ON]->(b) RETURN r.type, r.label, r.source, r.target",
        &graph,
    )
    .unwrap();
    assert_eq!(result.rows.len(), 1);
    let row = &result.rows[0];
    assert_eq!(row.get("r.type"), Some(&Value::from("DEPENDS_ON")));
    assert_eq!(row.get("r.label"), Some(&Value::from("needs")));
    assert_eq!(row.get("r.source"), Some(&Value::from("a")));
    assert_eq!(row.get("r.target"), Some(&Value::from("b")));

    let any = query_graph("MATCH (a)-[r]->(b) RETURN r.id", &graph).unwrap();
    assert_eq!(any.rows.len(), 2);
}

#[test]
fn test_no_match_gives_no_rows() {
    let result = query_graph("MATCH (n:Skill) RETURN n.id", &linked()).unwrap();
    assert_eq!(result.columns, ["n.id"]);
    assert!(result.rows.is_empty());
}

#[test]
fn test_property_map_filters_nodes() {
    let mut graph = Graph::new();
    graph.add_node(
        node("x", "Node")
            .with_property("keywords", vec!["Graph".to_string(), "query".to_string()])
            .with_property("draft", false),
    );
    graph.add_node(node("y", "Node").with_property("draft", true));

    let by_list = query_graph("MATCH (n {keywords: \"graph\"}) RETURN n.id", &graph).unwrap();
    assert_eq!(by_list.rows.len(), 1);
    assert_eq!(by_list.rows[0].get("n.id"), Some(&Value::from("x")));

    let by_bool = query_graph("MATCH (n:Node {draft: true}) RETURN n.id", &graph).unwrap();
    assert_eq!(by_bool.rows.len(), 1);
    assert_eq!(by_bool.rows[0].get("n.id"), Some(&Value::from("y")));

    let by_name = query_graph("MATCH (n {name: \"X\"}) RETURN n.id", &graph).unwrap();
    assert_eq!(by_name.rows.len(), 1);
}

#[test]
fn test_variable_reuse_joins_patterns() {
    let mut graph = two_nodes();
    graph.add_node(node("c", "Document"));
    graph.add_edge(GraphEdge::new("a", "LINKS_TO", "b")).unwrap();
    graph.add_edge(GraphEdge::new("b", "LINKS_TO", "c")).unwrap();
    graph.add_edge(GraphEdge::new("c", "LINKS_TO", "a")).unwrap();

    let result = query_graph(
        "MATCH (x)-[:LINKS_TO]->(y), (y)-[:LINKS_TO]->(z:Document) RETURN x.id, y.id, z.id",
        &graph,
    )
    .unwrap();
    assert_eq!(result.rows.len(), 1);
    let row = &result.rows[0];
    assert_eq!(row.get("x.id"), Some(&Value::from("a")));
    assert_eq!(row.get("y.id"), Some(&Value::from("b")));
    assert_eq!(row.get("z.id"), Some(&Value::from("c")));
}

#[test]
fn test_hop_anchors_to_its_own_chain() {
    // `a` is bound first, but the second pattern's hop must start from `b`.
    let mut graph = two_nodes();
    graph.add_node(node("c", "Node"));
    graph.add_edge(GraphEdge::new("a", "LINKS_TO", "c")).unwrap();
    graph.add_edge(GraphEdge::new("b", "REFERENCES", "c")).unwrap();

    let result = query_graph(
        "MATCH (a {name: \"a\"}), (b {name: \"b\"})-[:REFERENCES]->(t) RETURN a.id, b.id, t.id",
        &graph,
    )
    .unwrap();
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0].get("t.id"), Some(&Value::from("c")));
}

#[test]
fn test_reused_target_must_be_the_same_node() {
    let mut graph = linked();
    graph.add_edge(GraphEdge::new("b", "LINKS_TO", "a")).unwrap();

    let result = query_graph("MATCH (n)-[:LINKS_TO]->(m)-[:LINKS_TO]->(n) RETURN n.id, m.id", &graph).unwrap();
    assert_eq!(result.rows.len(), 2);

    let result = query_graph("MATCH (n)-[:LINKS_TO]->(n) RETURN n.id", &graph).unwrap();
    assert!(result.rows.is_empty());
}

#[test]
fn test_cartesian_product_of_disconnected_patterns() {
    let result = query_graph("MATCH (a:Node), (b:Node) RETURN a.id, b.id", &two_nodes()).unwrap();
    assert_eq!(result.rows.len(), 4);
}
