//! T60: Variable Length Paths
//!
//! Tests for `MATCH (a)-[:TYPE*1..3]->(b)` patterns, cycle safety, and the
//! default hop cap for unbounded ranges.

use sgqs_api::{Graph, GraphEdge, GraphNode};
use sgqs_query::{ExecuteOptions, Value, execute_with, prepare, query_graph};

fn chain(ids: &[&str]) -> Graph {
    let mut graph = Graph::new();
    for id in ids {
        graph.add_node(GraphNode::new(*id).with_label("Node"));
    }
    for pair in ids.windows(2) {
        graph
            .add_edge(GraphEdge::new(pair[0], "LINKS_TO", pair[1]))
            .unwrap();
    }
    graph
}

fn pairs(source: &str, graph: &Graph) -> Vec<(String, String)> {
    let result = query_graph(source, graph).unwrap();
    result
        .rows
        .iter()
        .map(|row| {
            let get = |col: &str| {
                row.get(col)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            (get("a.id"), get("b.id"))
        })
        .collect()
}

fn pair(a: &str, b: &str) -> (String, String) {
    (a.to_string(), b.to_string())
}

#[test]
fn test_two_cycle_terminates_without_revisits() {
    let mut graph = chain(&["a", "b"]);
    graph.add_edge(GraphEdge::new("b", "LINKS_TO", "a")).unwrap();

    let result = query_graph("MATCH (n)-[*1..5]->(m) RETURN n.id, m.id", &graph).unwrap();
    let rows: Vec<_> = result
        .rows
        .iter()
        .map(|r| (r.get("n.id").cloned(), r.get("m.id").cloned()))
        .collect();
    assert_eq!(
        rows,
        [
            (Some(Value::from("a")), Some(Value::from("b"))),
            (Some(Value::from("b")), Some(Value::from("a"))),
        ]
    );
}

#[test]
fn test_unbounded_star_on_cycle_terminates() {
    let mut graph = chain(&["a", "b", "c", "d"]);
    graph.add_edge(GraphEdge::new("d", "LINKS_TO", "a")).unwrap();

    let result = query_graph("MATCH (a {id: \"a\"})-[*]->(b) RETURN a.id, b.id", &graph).unwrap();
    assert_eq!(result.rows.len(), 3);
}

#[test]
fn test_range_bounds() {
    let graph = chain(&["a", "b", "c", "d"]);

    assert_eq!(
        pairs("MATCH (a {id: \"a\"})-[:LINKS_TO*2]->(b) RETURN a.id, b.id", &graph),
        [pair("a", "c")]
    );
    assert_eq!(
        pairs("MATCH (a {id: \"a\"})-[:LINKS_TO*2..]->(b) RETURN a.id, b.id", &graph),
        [pair("a", "c"), pair("a", "d")]
    );
    assert_eq!(
        pairs("MATCH (a {id: \"a\"})-[:LINKS_TO*..2]->(b) RETURN a.id, b.id", &graph),
        [pair("a", "b"), pair("a", "c")]
    );
    assert_eq!(
        pairs("MATCH (a {id: \"a\"})-[:LINKS_TO*1..3]->(b) RETURN a.id, b.id", &graph),
        [pair("a", "b"), pair("a", "c"), pair("a", "d")]
    );
}

#[test]
fn test_source_is_never_its_own_target() {
    let graph = chain(&["a", "b"]);
    assert!(pairs("MATCH (a)-[*0..0]->(b) RETURN a.id, b.id", &graph).is_empty());
    assert_eq!(
        pairs("MATCH (a)-[*0..2]->(b) RETURN a.id, b.id", &graph),
        [pair("a", "b")]
    );

    let result = query_graph("MATCH (a)-[*]->(m) WHERE a.id = \"a\" RETURN m.id", &graph).unwrap();
    let reached: Vec<_> = result.rows.iter().filter_map(|r| r.get("m.id").cloned()).collect();
    assert_eq!(reached, [Value::from("b")]);
}

#[test]
fn test_relationship_variable_on_unbounded_range() {
    let graph = chain(&["a", "b", "c"]);
    let result = query_graph("MATCH (a)-[r*]->(b) RETURN b.id, r.source", &graph).unwrap();
    let rows: Vec<_> = result
        .rows
        .iter()
        .map(|r| (r.get("b.id").cloned(), r.get("r.source").cloned()))
        .collect();
    assert_eq!(
        rows,
        [
            (Some(Value::from("b")), Some(Value::from("a"))),
            (Some(Value::from("c")), Some(Value::from("b"))),
            (Some(Value::from("c")), Some(Value::from("b"))),
        ]
    );
}

#[test]
fn test_target_filter_applies_at_every_depth() {
    let mut graph = chain(&["a", "b", "c"]);
    graph.add_node(GraphNode::new("s").with_label("Skill"));
    graph.add_edge(GraphEdge::new("c", "HAS_INDEX", "s")).unwrap();

    assert!(pairs("MATCH (a {id: \"a\"})-[:LINKS_TO*]->(b:Skill) RETURN a.id, b.id", &graph).is_empty());
    assert_eq!(
        pairs("MATCH (a {id: \"a\"})-[*]->(b:Skill) RETURN a.id, b.id", &graph),
        [pair("a", "s")]
    );
}

#[test]
fn test_relationship_variable_binds_last_edge() {
    let graph = chain(&["a", "b", "c"]);
    let result = query_graph(
        "MATCH (a {id: \"a\"})-[r:LINKS_TO*1..2]->(b) RETURN b.id, r.source",
        &graph,
    )
    .unwrap();
    let rows: Vec<_> = result
        .rows
        .iter()
        .map(|r| (r.get("b.id").cloned(), r.get("r.source").cloned()))
        .collect();
    assert_eq!(
        rows,
        [
            (Some(Value::from("b")), Some(Value::from("a"))),
            (Some(Value::from("c")), Some(Value::from("b"))),
        ]
    );
}

#[test]
fn test_undirected_variable_length() {
    let graph = chain(&["a", "b", "c"]);
    assert_eq!(
        pairs("MATCH (a {id: \"c\"})-[*1..2]-(b) RETURN a.id, b.id", &graph),
        [pair("c", "b"), pair("c", "a")]
    );
}

#[test]
fn test_explicit_upper_bound_is_honoured() {
    let ids: Vec<String> = (0..13).map(|i| format!("n{i}")).collect();
    let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    let graph = chain(&refs);

    let far = pairs("MATCH (a {id: \"n0\"})-[*1..12]->(b) RETURN a.id, b.id", &graph);
    assert_eq!(far.len(), 12);
    assert_eq!(far.last(), Some(&pair("n0", "n12")));

    // Without an upper bound the default cap of 10 hops applies.
    let capped = pairs("MATCH (a {id: \"n0\"})-[*]->(b) RETURN a.id, b.id", &graph);
    assert_eq!(capped.len(), 10);
    assert_eq!(capped.last(), Some(&pair("n0", "n10")));
}

#[test]
fn test_large_bound_does_not_depend_on_data() {
    let graph = chain(&["a", "b"]);
    let source = "MATCH (n:Skill)-[*1..20]->(m) RETURN m.id";
    assert!(query_graph(source, &graph).unwrap().rows.is_empty());

    let mut graph = graph;
    graph.add_node(GraphNode::new("s").with_label("Skill"));
    graph.add_edge(GraphEdge::new("s", "HAS_INDEX", "a")).unwrap();
    let result = query_graph(source, &graph).unwrap();
    let reached: Vec<_> = result.rows.iter().filter_map(|r| r.get("m.id").cloned()).collect();
    assert_eq!(reached, [Value::from("a"), Value::from("b")]);
}

#[test]
fn test_custom_depth_limit() {
    let graph = chain(&["a", "b", "c", "d"]);
    let options = ExecuteOptions {
        max_traversal_depth: 2,
    };

    let query = prepare("MATCH (a {id: \"a\"})-[*]->(b) RETURN b.id").unwrap();
    let result = execute_with(&query, &graph, &options).unwrap();
    let reached: Vec<_> = result.rows.iter().filter_map(|r| r.get("b.id").cloned()).collect();
    assert_eq!(reached, [Value::from("b"), Value::from("c")]);

    let query = prepare("MATCH (a {id: \"a\"})-[*3]->(b) RETURN b.id").unwrap();
    let result = execute_with(&query, &graph, &options).unwrap();
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0].get("b.id"), Some(&Value::from("d")));
}
