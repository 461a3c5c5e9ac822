use std::collections::{HashSet, VecDeque};

use indexmap::{IndexMap, IndexSet};
use sgqs_api::{GraphEdge, GraphNode, GraphSnapshot};
use tracing::{debug, trace};

use crate::ast::*;
use crate::error::{Error, Result};
use crate::evaluator::{
    Warnings, evaluate_condition, node_property, pattern_value_matches, resolve_property,
    resolve_variable,
};
use crate::value::{QueryResult, Row, Value};
use crate::vocabulary::MAX_TRAVERSAL_DEPTH;

/// A graph element bound to a query variable.
#[derive(Debug, Clone, Copy)]
pub enum Bound<'g> {
    Node(&'g GraphNode),
    Edge(&'g GraphEdge),
}

/// One candidate match: variable name to bound element, in binding order.
pub type Bindings<'g> = IndexMap<String, Bound<'g>>;

/// Runtime limits for [`execute_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Upper hop bound used when a variable-length relationship has none.
    /// Explicit upper bounds in the query are honoured as written.
    pub max_traversal_depth: u32,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            max_traversal_depth: MAX_TRAVERSAL_DEPTH,
        }
    }
}

/// Executes a validated query against a graph snapshot.
///
/// A type mismatch in a WHERE comparison is reported inside the returned
/// result (with no columns or rows); every other error is returned as `Err`.
///
/// # Example
///
/// ```ignore
/// let query = sgqs_query::prepare("MATCH (n:Node) RETURN n.name")?;
/// let result = sgqs_query::execute(&query, &graph)?;
/// for row in &result.rows {
///     println!("{:?}", row.get("n.name"));
/// }
/// ```
pub fn execute<S>(query: &Query, graph: &S) -> Result<QueryResult>
where
    S: GraphSnapshot + ?Sized,
{
    execute_with(query, graph, &ExecuteOptions::default())
}

pub fn execute_with<S>(query: &Query, graph: &S, options: &ExecuteOptions) -> Result<QueryResult>
where
    S: GraphSnapshot + ?Sized,
{
    let mut warnings = Warnings::default();
    let mut matcher = Matcher {
        graph,
        options,
        warnings: &mut warnings,
    };
    let matched = matcher.match_clause(&query.match_clause);
    debug!(binding_sets = matched.len(), "MATCH complete");

    let outcome = filter(query.where_clause.as_ref(), matched, &mut warnings)
        .and_then(|kept| project(&query.return_clause, &kept, &mut warnings));

    match outcome {
        Ok((columns, rows)) => {
            debug!(rows = rows.len(), "RETURN complete");
            Ok(QueryResult {
                columns,
                rows,
                errors: warnings.into_vec(),
            })
        }
        Err(err @ Error::TypeMismatch { .. }) => {
            debug!(error = %err, "query failed with a recoverable error");
            Ok(QueryResult {
                columns: Vec::new(),
                rows: Vec::new(),
                errors: vec![err.to_info()],
            })
        }
        Err(err) => Err(err),
    }
}

struct Matcher<'g, 'x, S: ?Sized> {
    graph: &'g S,
    options: &'x ExecuteOptions,
    warnings: &'x mut Warnings,
}

struct PathState<'g> {
    node: &'g GraphNode,
    depth: u32,
    visited: HashSet<&'g str>,
    last_edge: Option<&'g GraphEdge>,
}

/// A binding set under construction together with the node matched at the
/// latest position of the current pattern chain. Hops start from that node.
type Partial<'g> = (Bindings<'g>, &'g GraphNode);

impl<'g, S> Matcher<'g, '_, S>
where
    S: GraphSnapshot + ?Sized,
{
    fn match_clause(&mut self, clause: &MatchClause) -> Vec<Bindings<'g>> {
        let mut sets = vec![Bindings::new()];
        for pattern in &clause.patterns {
            let mut next = Vec::new();
            for bindings in &sets {
                next.extend(self.match_pattern(pattern, bindings));
            }
            sets = next;
            if sets.is_empty() {
                break;
            }
        }
        sets
    }

    fn match_pattern(&mut self, pattern: &Pattern, bindings: &Bindings<'g>) -> Vec<Bindings<'g>> {
        let mut partials = self.match_start(&pattern.start, bindings);
        for hop in &pattern.chain {
            let mut next = Vec::new();
            for (bindings, anchor) in &partials {
                let source = *anchor;
                match hop.relationship.range {
                    None => self.single_hop(hop, bindings, source, &mut next),
                    Some(range) => self.variable_length(hop, range, bindings, source, &mut next),
                }
            }
            partials = next;
            if partials.is_empty() {
                break;
            }
        }
        partials.into_iter().map(|(bindings, _)| bindings).collect()
    }

    fn match_start(&mut self, pattern: &NodePattern, bindings: &Bindings<'g>) -> Vec<Partial<'g>> {
        // Re-introduced variable: narrow the existing binding instead of scanning.
        if let Some(variable) = &pattern.variable
            && let Some(bound) = bindings.get(&variable.name)
        {
            return match *bound {
                Bound::Node(node) if self.node_matches(node, pattern) => {
                    vec![(bindings.clone(), node)]
                }
                _ => Vec::new(),
            };
        }

        let graph = self.graph;
        let mut out = Vec::new();
        for node in graph.nodes() {
            if self.node_matches(node, pattern) {
                out.push((bind(bindings, pattern.variable.as_ref(), Bound::Node(node)), node));
            }
        }
        out
    }

    fn single_hop(
        &mut self,
        hop: &PatternHop,
        bindings: &Bindings<'g>,
        source: &'g GraphNode,
        out: &mut Vec<Partial<'g>>,
    ) {
        let graph = self.graph;
        let rel = &hop.relationship;
        for edge in candidate_edges(graph, &source.id, rel.direction) {
            if !rel_type_matches(edge, rel) {
                continue;
            }
            let other_id = if edge.source == source.id {
                &edge.target
            } else {
                &edge.source
            };
            let Some(other) = graph.node(other_id) else {
                continue;
            };
            if !self.node_matches(other, &hop.node)
                || !consistent(bindings, hop.node.variable.as_ref(), Bound::Node(other))
                || !consistent(bindings, rel.variable.as_ref(), Bound::Edge(edge))
            {
                continue;
            }
            let extended = bind(bindings, rel.variable.as_ref(), Bound::Edge(edge));
            let extended = bind(&extended, hop.node.variable.as_ref(), Bound::Node(other));
            out.push((extended, other));
        }
    }

    /// Breadth-first expansion with a per-path visited set, so no path
    /// revisits a node even when the graph has cycles. Only nodes at least
    /// one hop away are emitted.
    fn variable_length(
        &mut self,
        hop: &PatternHop,
        range: VariableLength,
        bindings: &Bindings<'g>,
        source: &'g GraphNode,
        out: &mut Vec<Partial<'g>>,
    ) {
        let rel = &hop.relationship;
        let min = range.min.unwrap_or(0);
        let max = range.max.unwrap_or(self.options.max_traversal_depth);

        let graph = self.graph;
        let mut queue = VecDeque::from([PathState {
            node: source,
            depth: 0,
            visited: HashSet::from([source.id.as_str()]),
            last_edge: None,
        }]);

        while let Some(state) = queue.pop_front() {
            // The source is never its own match, whatever the minimum.
            if let Some(edge) = state.last_edge
                && state.depth >= min
                && self.node_matches(state.node, &hop.node)
                && consistent(bindings, hop.node.variable.as_ref(), Bound::Node(state.node))
            {
                let extended = bind(bindings, rel.variable.as_ref(), Bound::Edge(edge));
                let extended = bind(&extended, hop.node.variable.as_ref(), Bound::Node(state.node));
                out.push((extended, state.node));
            }

            if state.depth >= max {
                continue;
            }
            for edge in candidate_edges(graph, &state.node.id, rel.direction) {
                if !rel_type_matches(edge, rel) {
                    continue;
                }
                let next_id = if edge.source == state.node.id {
                    &edge.target
                } else {
                    &edge.source
                };
                if state.visited.contains(next_id.as_str()) {
                    continue;
                }
                let Some(next) = graph.node(next_id) else {
                    continue;
                };
                trace!(from = %state.node.id, to = %next.id, depth = state.depth + 1, "expand");
                let mut visited = state.visited.clone();
                visited.insert(next.id.as_str());
                queue.push_back(PathState {
                    node: next,
                    depth: state.depth + 1,
                    visited,
                    last_edge: Some(edge),
                });
            }
        }
    }

    fn node_matches(&mut self, node: &GraphNode, pattern: &NodePattern) -> bool {
        if let Some(label) = &pattern.label
            && !node
                .labels
                .iter()
                .any(|l| l.eq_ignore_ascii_case(&label.name))
        {
            return false;
        }
        if let Some(map) = &pattern.properties {
            for pair in &map.properties {
                let value = node_property(node, &pair.key, self.warnings);
                if !pattern_value_matches(&value, &pair.value) {
                    return false;
                }
            }
        }
        true
    }
}

fn candidate_edges<'g, S>(
    graph: &'g S,
    node_id: &str,
    direction: RelationshipDirection,
) -> Box<dyn Iterator<Item = &'g GraphEdge> + 'g>
where
    S: GraphSnapshot + ?Sized,
{
    match direction {
        RelationshipDirection::LeftToRight => graph.outgoing(node_id),
        RelationshipDirection::RightToLeft => graph.incoming(node_id),
        RelationshipDirection::Undirected => {
            Box::new(graph.outgoing(node_id).chain(graph.incoming(node_id)))
        }
    }
}

fn rel_type_matches(edge: &GraphEdge, rel: &RelationshipPattern) -> bool {
    rel.rel_type
        .as_ref()
        .is_none_or(|rel_type| edge.rel_type == rel_type.name)
}

/// An already-bound variable must resolve to the very same element.
fn consistent(bindings: &Bindings<'_>, variable: Option<&Ident>, candidate: Bound<'_>) -> bool {
    let Some(existing) = variable.and_then(|v| bindings.get(&v.name)) else {
        return true;
    };
    match (*existing, candidate) {
        (Bound::Node(a), Bound::Node(b)) => a.id == b.id,
        (Bound::Edge(a), Bound::Edge(b)) => a.id == b.id,
        _ => false,
    }
}

fn bind<'g>(bindings: &Bindings<'g>, variable: Option<&Ident>, bound: Bound<'g>) -> Bindings<'g> {
    let mut extended = bindings.clone();
    if let Some(variable) = variable {
        extended.insert(variable.name.clone(), bound);
    }
    extended
}

fn filter<'g>(
    where_clause: Option<&WhereClause>,
    sets: Vec<Bindings<'g>>,
    warnings: &mut Warnings,
) -> Result<Vec<Bindings<'g>>> {
    let Some(where_clause) = where_clause else {
        return Ok(sets);
    };
    let mut kept = Vec::with_capacity(sets.len());
    for bindings in sets {
        if evaluate_condition(&where_clause.condition, &bindings, warnings)? {
            kept.push(bindings);
        }
    }
    debug!(binding_sets = kept.len(), "WHERE complete");
    Ok(kept)
}

/// Output column name: the alias, else the source-like spelling of the item.
pub fn column_name(item: &ReturnItem) -> String {
    if let Some(alias) = &item.alias {
        return alias.clone();
    }
    match &item.expression {
        ReturnExpression::Property(access) => property_name(access),
        ReturnExpression::Variable(ident) => ident.name.clone(),
        ReturnExpression::Aggregate(aggregate) => {
            let function = aggregate.function.name();
            let prefix = if aggregate.distinct { "DISTINCT " } else { "" };
            match &aggregate.argument {
                AggregateArgument::Star => format!("{function}(*)"),
                AggregateArgument::Property(access) => {
                    format!("{function}({prefix}{})", property_name(access))
                }
                AggregateArgument::Variable(ident) => {
                    format!("{function}({prefix}{})", ident.name)
                }
            }
        }
    }
}

fn property_name(access: &PropertyAccess) -> String {
    format!("{}.{}", access.variable.name, access.property)
}

fn project(
    clause: &ReturnClause,
    sets: &[Bindings<'_>],
    warnings: &mut Warnings,
) -> Result<(Vec<String>, Vec<Row>)> {
    let names: Vec<String> = clause.items.iter().map(column_name).collect();

    let rows = if clause.items.iter().any(|item| item.expression.is_aggregate()) {
        aggregate(clause, &names, sets, warnings)?
    } else {
        let mut rows = Vec::with_capacity(sets.len());
        for bindings in sets {
            let mut row = Row::default();
            for (item, name) in clause.items.iter().zip(&names) {
                row = row.with(name.clone(), item_value(&item.expression, bindings, warnings)?);
            }
            rows.push(row);
        }
        rows
    };

    let rows = if clause.distinct {
        rows.into_iter().collect::<IndexSet<Row>>().into_iter().collect()
    } else {
        rows
    };

    let mut columns: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !columns.contains(&name) {
            columns.push(name);
        }
    }
    Ok((columns, rows))
}

fn item_value(
    expression: &ReturnExpression,
    bindings: &Bindings<'_>,
    warnings: &mut Warnings,
) -> Result<Value> {
    match expression {
        ReturnExpression::Property(access) => resolve_property(access, bindings, warnings),
        ReturnExpression::Variable(ident) => resolve_variable(ident, bindings),
        ReturnExpression::Aggregate(_) => Ok(Value::Null),
    }
}

/// Implicit GROUP BY over the non-aggregate items, groups kept in
/// first-seen order.
fn aggregate(
    clause: &ReturnClause,
    names: &[String],
    sets: &[Bindings<'_>],
    warnings: &mut Warnings,
) -> Result<Vec<Row>> {
    let mut groups: IndexMap<Vec<Value>, Vec<&Bindings<'_>>> = IndexMap::new();
    for bindings in sets {
        let mut key = Vec::new();
        for item in &clause.items {
            if !item.expression.is_aggregate() {
                key.push(item_value(&item.expression, bindings, warnings)?);
            }
        }
        groups.entry(key).or_default().push(bindings);
    }

    let has_keys = clause.items.iter().any(|item| !item.expression.is_aggregate());
    if groups.is_empty() && !has_keys {
        groups.insert(Vec::new(), Vec::new());
    }

    let mut rows = Vec::with_capacity(groups.len());
    for (key, members) in groups {
        let mut key_values = key.into_iter();
        let mut row = Row::default();
        for (item, name) in clause.items.iter().zip(names) {
            let value = match &item.expression {
                ReturnExpression::Aggregate(aggregate) => {
                    aggregate_value(aggregate, &members, warnings)?
                }
                _ => key_values.next().unwrap_or(Value::Null),
            };
            row = row.with(name.clone(), value);
        }
        rows.push(row);
    }
    Ok(rows)
}

fn aggregate_value(
    aggregate: &Aggregate,
    members: &[&Bindings<'_>],
    warnings: &mut Warnings,
) -> Result<Value> {
    if matches!(aggregate.argument, AggregateArgument::Star) {
        return Ok(Value::Int(members.len() as i64));
    }

    let mut values = Vec::with_capacity(members.len());
    for bindings in members {
        let value = match &aggregate.argument {
            AggregateArgument::Property(access) => resolve_property(access, bindings, warnings)?,
            AggregateArgument::Variable(ident) => resolve_variable(ident, bindings)?,
            AggregateArgument::Star => Value::Null,
        };
        values.push(value);
    }

    let values: Vec<Value> = if aggregate.distinct {
        values.into_iter().collect::<IndexSet<_>>().into_iter().collect()
    } else {
        values
    };

    Ok(match aggregate.function {
        AggregateFunction::Count => {
            Value::Int(values.iter().filter(|v| !v.is_null()).count() as i64)
        }
        AggregateFunction::Collect => Value::List(values),
    })
}
