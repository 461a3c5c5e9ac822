#![no_main]

use libfuzzer_sys::fuzz_target;
use sgqs_api::{Graph, GraphEdge, GraphNode};

fn cyclic_graph() -> Graph {
    let mut graph = Graph::new();
    for (id, label) in [("kit", "Skill"), ("kit/SKILL", "Entrypoint"), ("kit/index", "Index"), ("kit/nodes/a", "Node")] {
        graph.add_node(
            GraphNode::new(id)
                .with_label(label)
                .with_skill("kit")
                .with_property("name", id),
        );
    }
    let edges = [
        ("kit", "HAS_ENTRYPOINT", "kit/SKILL"),
        ("kit", "HAS_INDEX", "kit/index"),
        ("kit/index", "CONTAINS", "kit/nodes/a"),
        ("kit/nodes/a", "LINKS_TO", "kit/SKILL"),
        ("kit/SKILL", "LINKS_TO", "kit/index"),
    ];
    for (source, rel_type, target) in edges {
        let _ = graph.add_edge(GraphEdge::new(source, rel_type, target));
    }
    graph
}

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(query) = sgqs_query::prepare(input) else {
        return;
    };
    let graph = cyclic_graph();
    if let Ok(result) = sgqs_query::execute(&query, &graph) {
        for row in &result.rows {
            assert!(row.columns().len() <= result.columns.len());
        }
    }
});
