use std::path::Path;

use sgqs_api::GraphSnapshot;
use tracing::debug;

use crate::ast::Query;
use crate::error::Result;
use crate::executor::{ExecuteOptions, execute_with};
use crate::lexer::tokenize;
use crate::parser::parse;
use crate::value::QueryResult;

/// Scans, parses, and validates a query.
///
/// The returned [`Query`] can be executed any number of times against any
/// graph.
///
/// # Example
///
/// ```ignore
/// let query = prepare("MATCH (n:Skill) RETURN n.name")?;
/// assert_eq!(query.return_clause.items.len(), 1);
/// ```
pub fn prepare(source: &str) -> Result<Query> {
    let tokens = tokenize(source)?;
    debug!(tokens = tokens.len(), "scanned query");
    let query = parse(&tokens)?;
    debug!(
        patterns = query.match_clause.patterns.len(),
        filtered = query.where_clause.is_some(),
        columns = query.return_clause.items.len(),
        "parsed query"
    );
    Ok(query)
}

/// Runs `source` against an already built graph.
pub fn query_graph<S>(source: &str, graph: &S) -> Result<QueryResult>
where
    S: GraphSnapshot + ?Sized,
{
    query_graph_with(source, graph, &ExecuteOptions::default())
}

pub fn query_graph_with<S>(source: &str, graph: &S, options: &ExecuteOptions) -> Result<QueryResult>
where
    S: GraphSnapshot + ?Sized,
{
    let query = prepare(source)?;
    execute_with(&query, graph, options)
}

/// Builds the skill graph under `root` and runs `source` against it.
///
/// The query is parsed first, so a malformed query fails without touching
/// the filesystem.
///
/// # Example
///
/// ```ignore
/// let result = query("MATCH (s:Skill) RETURN s.name", Path::new(".opencode/skill"))?;
/// for row in &result.rows {
///     println!("{}", row.get("s.name").unwrap());
/// }
/// ```
pub fn query(source: &str, root: &Path) -> Result<QueryResult> {
    query_with(source, root, &ExecuteOptions::default())
}

pub fn query_with(source: &str, root: &Path, options: &ExecuteOptions) -> Result<QueryResult> {
    let query = prepare(source)?;
    let graph = sgqs_graph::build(root)?;
    debug!(
        root = %root.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "graph ready"
    );
    execute_with(&query, &graph, options)
}
