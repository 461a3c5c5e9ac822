//! SGQS: a small Cypher-like query language over a read-only documentation
//! graph.
//!
//! A query goes through three phases. [`tokenize`] turns source text into
//! tokens, [`parse`] builds and validates the AST, and [`execute`] matches it
//! against any [`GraphSnapshot`](sgqs_api::GraphSnapshot). [`prepare`] runs
//! the first two; [`query`] runs everything, building the graph from disk.

pub mod ast;
pub mod error;
mod evaluator;
pub mod executor;
pub mod lexer;
pub mod parser;
mod query_api;
mod validate;
pub mod value;
pub mod vocabulary;

pub use error::{Error, ErrorCode, ErrorInfo, Phase, Result};
pub use executor::{Bindings, Bound, ExecuteOptions, column_name, execute, execute_with};
pub use lexer::{Position, Token, TokenType, tokenize};
pub use parser::parse;
pub use query_api::{prepare, query, query_graph, query_graph_with, query_with};
pub use value::{EdgeValue, NodeValue, QueryResult, Row, Value};
pub use vocabulary::{KEYWORDS, MAX_TRAVERSAL_DEPTH, VALID_LABELS, VALID_REL_TYPES};
