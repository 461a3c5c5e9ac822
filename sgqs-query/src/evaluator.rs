use std::cmp::Ordering;

use indexmap::IndexSet;
use sgqs_api::{GraphEdge, GraphNode, PropertyValue};

use crate::ast::{
    ComparisonOperator, Expression, Ident, Literal, LogicalOperator, Operand, PropertyAccess,
};
use crate::error::{Error, ErrorCode, ErrorInfo, Result};
use crate::executor::{Bindings, Bound};
use crate::value::{EdgeValue, NodeValue, Value};

/// Minimum length of a word split out of a name, title, or description
/// before it counts as an alias token.
const MIN_ALIAS_TOKEN_LEN: usize = 3;

/// Non-fatal diagnostics collected while a query runs, deduplicated by
/// code and message and kept in first-seen order.
#[derive(Debug, Default)]
pub(crate) struct Warnings {
    seen: IndexSet<ErrorInfo>,
}

impl Warnings {
    fn unknown_property(&mut self, node: &GraphNode, property: &str) {
        self.seen.insert(ErrorInfo::new(
            ErrorCode::W001,
            format!(
                "Unknown property \"{property}\" on node \"{}\" (labels: {})",
                node.id,
                node.labels.join(", ")
            ),
        ));
    }

    pub(crate) fn into_vec(self) -> Vec<ErrorInfo> {
        self.seen.into_iter().collect()
    }
}

pub(crate) fn evaluate_condition(
    expression: &Expression,
    bindings: &Bindings<'_>,
    warnings: &mut Warnings,
) -> Result<bool> {
    match expression {
        Expression::Comparison(cmp) => {
            let left = resolve_property(&cmp.left, bindings, warnings)?;
            let right = match &cmp.right {
                Operand::Property(access) => resolve_property(access, bindings, warnings)?,
                Operand::Literal(literal) => literal_value(literal),
            };
            compare_values(cmp.operator, &left, &right)
        }
        Expression::Logical(logical) => {
            let left = evaluate_condition(&logical.left, bindings, warnings)?;
            match logical.operator {
                LogicalOperator::And if !left => Ok(false),
                LogicalOperator::Or if left => Ok(true),
                _ => evaluate_condition(&logical.right, bindings, warnings),
            }
        }
        Expression::Not(inner) => Ok(!evaluate_condition(inner, bindings, warnings)?),
        Expression::NullCheck(check) => {
            let is_null = resolve_property(&check.property, bindings, warnings)?.is_null();
            Ok(is_null != check.negated)
        }
    }
}

/// Applies a comparison operator. Any NULL operand makes the comparison false.
pub(crate) fn compare_values(
    operator: ComparisonOperator,
    left: &Value,
    right: &Value,
) -> Result<bool> {
    if left.is_null() || right.is_null() {
        return Ok(false);
    }

    let result = match operator {
        ComparisonOperator::Equals => values_equal(left, right),
        ComparisonOperator::NotEquals => !values_equal(left, right),
        ComparisonOperator::LessThan => order(operator, left, right)? == Ordering::Less,
        ComparisonOperator::LessEqual => order(operator, left, right)? != Ordering::Greater,
        ComparisonOperator::GreaterThan => order(operator, left, right)? == Ordering::Greater,
        ComparisonOperator::GreaterEqual => order(operator, left, right)? != Ordering::Less,
        ComparisonOperator::Contains => {
            string_predicate(left, right, |l, r| l.contains(r))
        }
        ComparisonOperator::StartsWith => {
            string_predicate(left, right, |l, r| l.starts_with(r))
        }
        ComparisonOperator::EndsWith => {
            string_predicate(left, right, |l, r| l.ends_with(r))
        }
    };
    Ok(result)
}

/// Deep equality, except that integers and floats compare numerically.
pub(crate) fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => l == r,
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            left.as_f64() == right.as_f64()
        }
        _ => left == right,
    }
}

fn order(operator: ComparisonOperator, left: &Value, right: &Value) -> Result<Ordering> {
    let ordering = match (left, right) {
        (Value::Int(l), Value::Int(r)) => Some(l.cmp(r)),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(l), Some(r)) => l.partial_cmp(&r),
            _ => None,
        },
    };
    ordering.ok_or_else(|| Error::TypeMismatch {
        operator: operator.symbol().to_string(),
        left: left.type_name(),
        right: right.type_name(),
    })
}

fn string_predicate(left: &Value, right: &Value, test: impl Fn(&str, &str) -> bool) -> bool {
    match (left, right) {
        (Value::String(l), Value::String(r)) => test(&l.to_lowercase(), &r.to_lowercase()),
        _ => false,
    }
}

pub(crate) fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::String(s) => Value::String(s.clone()),
        Literal::Integer(i) => Value::Int(*i),
        Literal::Boolean(b) => Value::Bool(*b),
        Literal::Null => Value::Null,
    }
}

fn lookup<'b, 'g>(bindings: &'b Bindings<'g>, ident: &Ident, context: &str) -> Result<&'b Bound<'g>> {
    bindings
        .get(&ident.name)
        .ok_or_else(|| Error::InvalidPropertyAccess {
            message: format!("`{}` is not bound while resolving {context}", ident.name),
            position: Some(ident.position),
        })
}

pub(crate) fn resolve_property(
    access: &PropertyAccess,
    bindings: &Bindings<'_>,
    warnings: &mut Warnings,
) -> Result<Value> {
    let context = format!("{}.{}", access.variable.name, access.property);
    match lookup(bindings, &access.variable, &context)? {
        Bound::Node(node) => Ok(node_property(node, &access.property, warnings)),
        Bound::Edge(edge) => Ok(edge_property(edge, &access.property)),
    }
}

pub(crate) fn resolve_variable(ident: &Ident, bindings: &Bindings<'_>) -> Result<Value> {
    match lookup(bindings, ident, &ident.name)? {
        Bound::Node(node) => Ok(Value::Node(NodeValue::from(*node))),
        Bound::Edge(edge) => Ok(Value::Edge(EdgeValue::from(*edge))),
    }
}

/// Resolves `property` on a node: built-in fields, derived aliases, the
/// property bag (case-insensitive), then NULL with a warning.
pub(crate) fn node_property(node: &GraphNode, property: &str, warnings: &mut Warnings) -> Value {
    let normalized = property.to_lowercase();
    match normalized.as_str() {
        "id" => return Value::String(node.id.clone()),
        "labels" => return Value::List(node.labels.iter().map(|l| Value::from(l.as_str())).collect()),
        "skill" => return Value::String(node.skill.clone()),
        "path" => return Value::String(node.path.clone()),
        _ => {}
    }

    if normalized == "aliases" {
        let tokens = alias_tokens(node);
        if !tokens.is_empty() {
            return Value::List(tokens.into_iter().map(Value::String).collect());
        }
    }

    if let Some(value) = bag_lookup(node.properties.iter(), &normalized) {
        return Value::from(value);
    }

    if normalized == "keywords" {
        let tokens = alias_tokens(node);
        if !tokens.is_empty() {
            return Value::List(tokens.into_iter().map(Value::String).collect());
        }
    }

    warnings.unknown_property(node, property);
    Value::Null
}

pub(crate) fn edge_property(edge: &GraphEdge, property: &str) -> Value {
    let normalized = property.to_lowercase();
    match normalized.as_str() {
        "id" => Value::String(edge.id.clone()),
        "type" => Value::String(edge.rel_type.clone()),
        "source" => Value::String(edge.source.clone()),
        "target" => Value::String(edge.target.clone()),
        _ => bag_lookup(edge.properties.iter(), &normalized)
            .map(Value::from)
            .unwrap_or(Value::Null),
    }
}

fn bag_lookup<'a>(
    mut properties: impl Iterator<Item = (&'a String, &'a PropertyValue)>,
    normalized: &str,
) -> Option<&'a PropertyValue> {
    properties
        .find(|(key, _)| key.to_lowercase() == normalized)
        .map(|(_, value)| value)
}

/// Search tokens derived from a node's name, title, description, aliases,
/// and keywords: each full value plus its lower-cased word parts.
fn alias_tokens(node: &GraphNode) -> Vec<String> {
    let mut sources: Vec<&PropertyValue> = ["name", "title", "description"]
        .into_iter()
        .filter_map(|key| node.properties.get(key))
        .filter(|value| matches!(value, PropertyValue::String(_)))
        .collect();
    sources.extend(bag_lookup(node.properties.iter(), "aliases"));
    sources.extend(bag_lookup(node.properties.iter(), "keywords"));

    let mut tokens = IndexSet::new();
    let mut add = |value: &str| {
        tokens.insert(value.to_string());
        let lowered = value.to_lowercase();
        for part in lowered.split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')) {
            if part.len() >= MIN_ALIAS_TOKEN_LEN {
                tokens.insert(part.to_string());
            }
        }
    };
    for source in sources {
        match source {
            PropertyValue::String(s) => add(s),
            PropertyValue::List(items) => items.iter().for_each(|item| add(item)),
            _ => {}
        }
    }
    tokens.into_iter().collect()
}

/// Property-map filter semantics: strings compare case-insensitively and a
/// list-valued property matches when it contains the literal.
pub(crate) fn pattern_value_matches(value: &Value, literal: &Literal) -> bool {
    let expected = literal_value(literal);
    match (value, &expected) {
        (Value::List(items), Value::String(wanted)) => {
            let wanted = wanted.to_lowercase();
            items
                .iter()
                .any(|item| item.as_str().is_some_and(|s| s.to_lowercase() == wanted))
        }
        (Value::List(items), _) => items.iter().any(|item| values_equal(item, &expected)),
        (Value::String(actual), Value::String(wanted)) => {
            actual.to_lowercase() == wanted.to_lowercase()
        }
        _ => values_equal(value, &expected),
    }
}
