//! Semantic checks run once over a freshly parsed query.

use std::collections::HashMap;

use crate::ast::*;
use crate::error::{Error, Result};
use crate::vocabulary::{is_valid_label, is_valid_rel_type};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BindingKind {
    Node,
    Relationship,
}

impl BindingKind {
    fn describe(self) -> &'static str {
        match self {
            BindingKind::Node => "node",
            BindingKind::Relationship => "relationship",
        }
    }
}

pub fn validate(query: &Query) -> Result<()> {
    let mut scope = Scope::default();
    for pattern in &query.match_clause.patterns {
        scope.node(&pattern.start)?;
        for hop in &pattern.chain {
            scope.relationship(&hop.relationship)?;
            scope.node(&hop.node)?;
        }
    }

    if let Some(where_clause) = &query.where_clause {
        scope.expression(&where_clause.condition)?;
    }

    for item in &query.return_clause.items {
        match &item.expression {
            ReturnExpression::Property(access) => scope.require(&access.variable)?,
            ReturnExpression::Variable(ident) => scope.require(ident)?,
            ReturnExpression::Aggregate(aggregate) => match &aggregate.argument {
                AggregateArgument::Star => {}
                AggregateArgument::Property(access) => scope.require(&access.variable)?,
                AggregateArgument::Variable(ident) => scope.require(ident)?,
            },
        }
    }
    Ok(())
}

#[derive(Default)]
struct Scope<'q> {
    bound: HashMap<&'q str, BindingKind>,
}

impl<'q> Scope<'q> {
    fn node(&mut self, node: &'q NodePattern) -> Result<()> {
        if let Some(label) = &node.label
            && !is_valid_label(&label.name)
        {
            return Err(Error::UnknownLabel {
                label: label.name.clone(),
                position: label.position,
            });
        }
        if let Some(variable) = &node.variable {
            self.bind(variable, BindingKind::Node)?;
        }
        Ok(())
    }

    fn relationship(&mut self, rel: &'q RelationshipPattern) -> Result<()> {
        if let Some(rel_type) = &rel.rel_type
            && !is_valid_rel_type(&rel_type.name)
        {
            return Err(Error::UnknownRelType {
                rel_type: rel_type.name.clone(),
                position: rel_type.position,
            });
        }
        if let Some(variable) = &rel.variable {
            self.bind(variable, BindingKind::Relationship)?;
        }
        Ok(())
    }

    /// Nodes may be re-introduced to join patterns; relationships may not.
    fn bind(&mut self, ident: &'q Ident, kind: BindingKind) -> Result<()> {
        match self.bound.get(ident.name.as_str()).copied() {
            None => {
                self.bound.insert(&ident.name, kind);
                Ok(())
            }
            Some(BindingKind::Node) if kind == BindingKind::Node => Ok(()),
            Some(existing) => Err(Error::DuplicateBinding {
                name: ident.name.clone(),
                existing: existing.describe(),
                position: ident.position,
            }),
        }
    }

    fn require(&self, ident: &Ident) -> Result<()> {
        if self.bound.contains_key(ident.name.as_str()) {
            Ok(())
        } else {
            Err(Error::UnboundVariable {
                name: ident.name.clone(),
                position: ident.position,
            })
        }
    }

    fn expression(&self, expression: &Expression) -> Result<()> {
        match expression {
            Expression::Comparison(cmp) => {
                self.require(&cmp.left.variable)?;
                if let Operand::Property(right) = &cmp.right {
                    self.require(&right.variable)?;
                }
                Ok(())
            }
            Expression::Logical(logical) => {
                self.expression(&logical.left)?;
                self.expression(&logical.right)
            }
            Expression::Not(inner) => self.expression(inner),
            Expression::NullCheck(check) => self.require(&check.property.variable),
        }
    }
}
