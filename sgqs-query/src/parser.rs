use crate::ast::*;
use crate::error::{Error, Result};
use crate::lexer::{Token, TokenType};
use crate::validate;

/// Nesting limit for `NOT` and parenthesised WHERE expressions.
const MAX_EXPRESSION_DEPTH: usize = 64;

/// Parses a token stream into a validated [`Query`].
///
/// The stream normally comes from [`crate::lexer::tokenize`]; a missing
/// trailing `Eof` token is tolerated.
pub fn parse(tokens: &[Token]) -> Result<Query> {
    let query = TokenParser::new(tokens).parse_query()?;
    validate::validate(&query)?;
    Ok(query)
}

struct TokenParser<'t> {
    tokens: &'t [Token],
    position: usize,
    eof: Token,
}

impl<'t> TokenParser<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        let end = tokens.last().map(|t| t.position).unwrap_or_default();
        Self {
            tokens,
            position: 0,
            eof: Token {
                token_type: TokenType::Eof,
                text: String::new(),
                position: end,
            },
        }
    }

    fn parse_query(&mut self) -> Result<Query> {
        if !self.match_token(TokenType::Match) {
            return Err(Error::MissingClause {
                clause: "MATCH",
                position: self.peek().position,
            });
        }
        let match_clause = self.parse_match()?;

        let where_clause = if self.match_token(TokenType::Where) {
            Some(WhereClause {
                condition: self.parse_or(0)?,
            })
        } else {
            None
        };

        if !self.match_token(TokenType::Return) {
            return Err(Error::MissingClause {
                clause: "RETURN",
                position: self.peek().position,
            });
        }
        let return_clause = self.parse_return()?;

        if !self.is_at_end() {
            return Err(self.unexpected("end of query"));
        }

        Ok(Query {
            match_clause,
            where_clause,
            return_clause,
        })
    }

    fn parse_match(&mut self) -> Result<MatchClause> {
        let mut patterns = vec![self.parse_pattern()?];
        while self.match_token(TokenType::Comma) {
            patterns.push(self.parse_pattern()?);
        }
        Ok(MatchClause { patterns })
    }

    fn parse_pattern(&mut self) -> Result<Pattern> {
        let start = self.parse_node_pattern()?;
        let mut chain = Vec::new();
        while self.check(TokenType::Dash) || self.check(TokenType::LeftArrow) {
            let relationship = self.parse_relationship_pattern()?;
            let node = self.parse_node_pattern()?;
            chain.push(PatternHop { relationship, node });
        }
        Ok(Pattern { start, chain })
    }

    fn parse_node_pattern(&mut self) -> Result<NodePattern> {
        let position = self.peek().position;
        self.consume(TokenType::LeftParen, "'('")?;

        let variable = self.optional_ident();
        let label = self.optional_label();
        let properties = if self.check(TokenType::LeftBrace) {
            Some(self.parse_property_map()?)
        } else {
            None
        };

        self.consume(TokenType::RightParen, "')'")?;
        Ok(NodePattern {
            variable,
            label,
            properties,
            position,
        })
    }

    fn parse_relationship_pattern(&mut self) -> Result<RelationshipPattern> {
        let position = self.peek().position;
        let leftward = if self.match_token(TokenType::LeftArrow) {
            true
        } else {
            self.consume(TokenType::Dash, "'-' or '<-'")?;
            false
        };

        self.consume(TokenType::LeftBracket, "'['")?;
        let variable = self.optional_ident();
        let rel_type = self.optional_label();
        let range = if self.check(TokenType::Asterisk) {
            Some(self.parse_variable_length()?)
        } else {
            None
        };
        self.consume(TokenType::RightBracket, "']'")?;

        let direction = if self.check(TokenType::RightArrow) {
            if leftward {
                return Err(self.unexpected("'-'"));
            }
            self.advance();
            RelationshipDirection::LeftToRight
        } else if self.match_token(TokenType::Dash) {
            if leftward {
                RelationshipDirection::RightToLeft
            } else if self.match_token(TokenType::GreaterThan) {
                RelationshipDirection::LeftToRight
            } else {
                RelationshipDirection::Undirected
            }
        } else {
            return Err(self.unexpected(if leftward { "'-'" } else { "'-' or '->'" }));
        };

        Ok(RelationshipPattern {
            variable,
            rel_type,
            direction,
            range,
            position,
        })
    }

    fn parse_variable_length(&mut self) -> Result<VariableLength> {
        let star = self.advance().position;

        let min = self.optional_hop_bound()?;
        if !self.match_token(TokenType::DotDot) {
            return Ok(VariableLength { min, max: min });
        }
        let max = self.optional_hop_bound()?;

        let min = match (min, max) {
            (None, Some(_)) => Some(0),
            _ => min,
        };
        if let (Some(min), Some(max)) = (min, max)
            && min > max
        {
            return Err(Error::InvalidRange {
                min,
                max,
                position: star,
            });
        }
        Ok(VariableLength { min, max })
    }

    fn optional_hop_bound(&mut self) -> Result<Option<u32>> {
        if !self.check(TokenType::Integer) {
            return Ok(None);
        }
        let token = self.advance();
        token
            .text
            .parse::<u32>()
            .map(Some)
            .map_err(|_| Error::InvalidLiteral {
                message: format!("hop bound {} is out of range", token.text),
                position: token.position,
            })
    }

    fn parse_property_map(&mut self) -> Result<PropertyMap> {
        self.consume(TokenType::LeftBrace, "'{'")?;
        let mut properties = Vec::new();
        if !self.check(TokenType::RightBrace) {
            loop {
                let key = self.parse_name("property key")?;
                self.consume(TokenType::Colon, "':'")?;
                let value = match self.try_literal()? {
                    Some(value) => value,
                    None => {
                        let token = self.peek();
                        return Err(Error::InvalidLiteral {
                            message: format!(
                                "property `{key}` must be a string, integer, boolean or null, found {}",
                                token.describe()
                            ),
                            position: token.position,
                        });
                    }
                };
                properties.push(PropertyPair { key, value });
                if !self.match_token(TokenType::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenType::RightBrace, "'}'")?;
        Ok(PropertyMap { properties })
    }

    fn try_literal(&mut self) -> Result<Option<Literal>> {
        let literal = match self.peek().token_type {
            TokenType::String => Literal::String(self.peek().text.clone()),
            TokenType::Integer => {
                let token = self.peek();
                let value = token.text.parse::<i64>().map_err(|_| Error::InvalidLiteral {
                    message: format!("integer {} is out of range", token.text),
                    position: token.position,
                })?;
                Literal::Integer(value)
            }
            TokenType::True => Literal::Boolean(true),
            TokenType::False => Literal::Boolean(false),
            TokenType::Null => Literal::Null,
            _ => return Ok(None),
        };
        self.advance();
        Ok(Some(literal))
    }

    // WHERE expressions

    fn parse_or(&mut self, depth: usize) -> Result<Expression> {
        let mut left = self.parse_and(depth)?;
        while self.match_token(TokenType::Or) {
            let right = self.parse_and(depth)?;
            left = Expression::Logical(Box::new(LogicalExpression {
                operator: LogicalOperator::Or,
                left,
                right,
            }));
        }
        Ok(left)
    }

    fn parse_and(&mut self, depth: usize) -> Result<Expression> {
        let mut left = self.parse_not(depth)?;
        while self.match_token(TokenType::And) {
            let right = self.parse_not(depth)?;
            left = Expression::Logical(Box::new(LogicalExpression {
                operator: LogicalOperator::And,
                left,
                right,
            }));
        }
        Ok(left)
    }

    fn parse_not(&mut self, depth: usize) -> Result<Expression> {
        if depth >= MAX_EXPRESSION_DEPTH {
            return Err(self.unexpected("a less deeply nested expression"));
        }
        if self.match_token(TokenType::Not) {
            return Ok(Expression::Not(Box::new(self.parse_not(depth + 1)?)));
        }
        if self.match_token(TokenType::LeftParen) {
            let inner = self.parse_or(depth + 1)?;
            self.consume(TokenType::RightParen, "')'")?;
            return Ok(inner);
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expression> {
        let left = self.parse_property_access()?;

        if self.match_token(TokenType::Is) {
            let negated = self.match_token(TokenType::Not);
            self.consume(TokenType::Null, "NULL")?;
            return Ok(Expression::NullCheck(NullCheck {
                property: left,
                negated,
            }));
        }

        let operator = match self.peek().token_type {
            TokenType::Equals => ComparisonOperator::Equals,
            TokenType::NotEquals => ComparisonOperator::NotEquals,
            TokenType::LessThan => ComparisonOperator::LessThan,
            TokenType::LessEqual => ComparisonOperator::LessEqual,
            TokenType::GreaterThan => ComparisonOperator::GreaterThan,
            TokenType::GreaterEqual => ComparisonOperator::GreaterEqual,
            TokenType::Contains => ComparisonOperator::Contains,
            TokenType::Starts => {
                self.advance();
                self.expect_with()?;
                return self.finish_comparison(left, ComparisonOperator::StartsWith);
            }
            TokenType::Ends => {
                self.advance();
                self.expect_with()?;
                return self.finish_comparison(left, ComparisonOperator::EndsWith);
            }
            _ => return Err(self.unexpected("comparison operator")),
        };
        self.advance();
        self.finish_comparison(left, operator)
    }

    fn expect_with(&mut self) -> Result<()> {
        self.consume(TokenType::With, "WITH")
    }

    fn finish_comparison(
        &mut self,
        left: PropertyAccess,
        operator: ComparisonOperator,
    ) -> Result<Expression> {
        let right = if self.check(TokenType::Identifier) && self.check_next(TokenType::Dot) {
            Operand::Property(self.parse_property_access()?)
        } else {
            match self.try_literal()? {
                Some(literal) => Operand::Literal(literal),
                None => return Err(self.unexpected("property reference or literal")),
            }
        };
        Ok(Expression::Comparison(Comparison {
            left,
            operator,
            right,
        }))
    }

    fn parse_property_access(&mut self) -> Result<PropertyAccess> {
        let variable = self.parse_ident("variable")?;
        self.consume(TokenType::Dot, "'.'")?;
        let property = self.parse_name("property name")?;
        Ok(PropertyAccess { variable, property })
    }

    // RETURN

    fn parse_return(&mut self) -> Result<ReturnClause> {
        let distinct = self.match_token(TokenType::Distinct);
        let mut items = vec![self.parse_return_item()?];
        while self.match_token(TokenType::Comma) {
            items.push(self.parse_return_item()?);
        }
        Ok(ReturnClause { distinct, items })
    }

    fn parse_return_item(&mut self) -> Result<ReturnItem> {
        let expression = match self.peek().token_type {
            TokenType::Count => {
                self.advance();
                ReturnExpression::Aggregate(self.parse_aggregate(AggregateFunction::Count)?)
            }
            TokenType::Collect => {
                self.advance();
                ReturnExpression::Aggregate(self.parse_aggregate(AggregateFunction::Collect)?)
            }
            _ => {
                let variable = self.parse_ident("property or variable")?;
                if self.match_token(TokenType::Dot) {
                    let property = self.parse_name("property name")?;
                    ReturnExpression::Property(PropertyAccess { variable, property })
                } else {
                    ReturnExpression::Variable(variable)
                }
            }
        };

        let alias = if self.match_token(TokenType::As) {
            Some(self.parse_name("alias")?)
        } else {
            None
        };
        Ok(ReturnItem { expression, alias })
    }

    fn parse_aggregate(&mut self, function: AggregateFunction) -> Result<Aggregate> {
        self.consume(TokenType::LeftParen, "'('")?;
        let distinct = self.match_token(TokenType::Distinct);

        let argument = if function == AggregateFunction::Count
            && !distinct
            && self.match_token(TokenType::Asterisk)
        {
            AggregateArgument::Star
        } else {
            let variable = self.parse_ident("property or variable")?;
            if self.match_token(TokenType::Dot) {
                let property = self.parse_name("property name")?;
                AggregateArgument::Property(PropertyAccess { variable, property })
            } else {
                AggregateArgument::Variable(variable)
            }
        };

        self.consume(TokenType::RightParen, "')'")?;
        Ok(Aggregate {
            function,
            distinct,
            argument,
        })
    }

    // Token helpers

    fn optional_ident(&mut self) -> Option<Ident> {
        if self.check(TokenType::Identifier) {
            let token = self.advance();
            Some(Ident {
                name: token.text.clone(),
                position: token.position,
            })
        } else {
            None
        }
    }

    fn optional_label(&mut self) -> Option<Ident> {
        if self.check(TokenType::Label) {
            let token = self.advance();
            Some(Ident {
                name: token.text.clone(),
                position: token.position,
            })
        } else {
            None
        }
    }

    fn parse_ident(&mut self, expected: &str) -> Result<Ident> {
        self.optional_ident().ok_or_else(|| self.unexpected(expected))
    }

    /// Property names, keys, and aliases may also spell a keyword.
    fn parse_name(&mut self, expected: &str) -> Result<String> {
        let token_type = self.peek().token_type;
        if token_type == TokenType::Identifier || token_type.is_keyword() {
            Ok(self.advance().text.clone())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        let token = self.peek();
        Error::UnexpectedToken {
            expected: expected.to_string(),
            found: token.describe(),
            position: token.position,
        }
    }

    fn match_token(&mut self, token_type: TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, token_type: TokenType) -> bool {
        self.peek().token_type == token_type
    }

    fn check_next(&self, token_type: TokenType) -> bool {
        self.tokens
            .get(self.position + 1)
            .is_some_and(|t| t.token_type == token_type)
    }

    fn consume(&mut self, token_type: TokenType, expected: &str) -> Result<()> {
        if self.check(token_type) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn is_at_end(&self) -> bool {
        self.check(TokenType::Eof)
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&self.eof)
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.tokens
            .get(self.position.saturating_sub(1))
            .unwrap_or(&self.eof)
    }
}
