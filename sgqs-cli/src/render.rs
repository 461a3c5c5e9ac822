use std::collections::BTreeMap;
use std::io::{self, Write};

use sgqs_api::Graph;
use sgqs_query::{QueryResult, Token, TokenType};

/// Tab-separated rows under a header line. Tabs and newlines inside a cell
/// are escaped so every row stays on one line.
pub fn write_tsv(out: &mut impl Write, result: &QueryResult) -> io::Result<()> {
    if result.columns.is_empty() {
        return Ok(());
    }
    writeln!(out, "{}", result.columns.join("\t"))?;
    for row in &result.rows {
        let cells: Vec<String> = result
            .columns
            .iter()
            .map(|col| row.get(col).map(|v| escape(&v.to_string())).unwrap_or_default())
            .collect();
        writeln!(out, "{}", cells.join("\t"))?;
    }
    Ok(())
}

fn escape(cell: &str) -> String {
    cell.replace('\\', "\\\\")
        .replace('\t', "\\t")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

pub fn write_tokens(out: &mut impl Write, tokens: &[Token]) -> io::Result<()> {
    for token in tokens {
        let pos = token.position;
        if token.token_type == TokenType::Eof {
            writeln!(out, "{}:{}\t{:?}", pos.line, pos.column, token.token_type)?;
        } else {
            writeln!(
                out,
                "{}:{}\t{:?}\t{}",
                pos.line,
                pos.column,
                token.token_type,
                escape(&token.text)
            )?;
        }
    }
    Ok(())
}

pub fn write_stats(out: &mut impl Write, graph: &Graph) -> io::Result<()> {
    let mut labels: BTreeMap<&str, usize> = BTreeMap::new();
    for node in graph.nodes() {
        for label in &node.labels {
            *labels.entry(label).or_default() += 1;
        }
    }
    let mut rel_types: BTreeMap<&str, usize> = BTreeMap::new();
    for edge in graph.edges() {
        *rel_types.entry(&edge.rel_type).or_default() += 1;
    }

    writeln!(out, "nodes\t{}", graph.node_count())?;
    for (label, count) in &labels {
        writeln!(out, "  :{label}\t{count}")?;
    }
    writeln!(out, "edges\t{}", graph.edge_count())?;
    for (rel_type, count) in &rel_types {
        writeln!(out, "  {rel_type}\t{count}")?;
    }
    Ok(())
}
