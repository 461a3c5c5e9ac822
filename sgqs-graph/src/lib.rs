//! Filesystem graph builder for SGQS.
//!
//! A skill tree is a directory whose children are skills. Every markdown
//! document below a skill becomes a node; wikilinks, relative markdown links,
//! and the skill's entrypoint and index become edges.
//!
//! # Example
//!
//! ```ignore
//! let graph = sgqs_graph::build(".opencode/skill")?;
//! println!("{} nodes, {} edges", graph.node_count(), graph.edge_count());
//! ```

mod builder;
mod error;
pub mod frontmatter;
pub mod links;

pub use builder::{BuilderOptions, SkillGraphBuilder, build};
pub use error::{Error, Result};
pub use sgqs_api::GraphBuilder;
