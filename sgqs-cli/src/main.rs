use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use sgqs_query::{ExecuteOptions, MAX_TRAVERSAL_DEPTH, QueryResult};
use tracing::debug;

mod render;

#[derive(Parser)]
#[command(name = "sgqs", version, arg_required_else_help = true)]
struct Cli {
    /// Log pipeline phases to stderr (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a query against the skill graph under --root
    Query(QueryArgs),
    /// Show how a query is scanned and parsed without running it
    Explain(ExplainArgs),
    /// Count nodes per label and edges per relationship type
    Stats(StatsArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Tsv,
    Json,
}

#[derive(Args)]
struct Source {
    /// Query text
    #[arg(conflicts_with = "file")]
    query: Option<String>,

    /// Read the query from a file
    #[arg(long)]
    file: Option<PathBuf>,
}

impl Source {
    fn read(&self) -> Result<String> {
        if let Some(query) = &self.query {
            return Ok(query.clone());
        }
        let Some(path) = &self.file else {
            bail!("either a query argument or --file is required");
        };
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read query file {}", path.display()))
    }
}

#[derive(Args)]
struct QueryArgs {
    #[command(flatten)]
    source: Source,

    /// Skill tree root: one directory per skill
    #[arg(long, env = "SGQS_ROOT", default_value = ".")]
    root: PathBuf,

    #[arg(long, value_enum, default_value = "tsv")]
    format: OutputFormat,

    /// Hop cap for variable-length relationships written without an upper bound
    #[arg(long, env = "SGQS_MAX_DEPTH", default_value_t = MAX_TRAVERSAL_DEPTH)]
    max_depth: u32,
}

#[derive(Args)]
struct ExplainArgs {
    #[command(flatten)]
    source: Source,

    /// Print the token stream instead of the parsed query
    #[arg(long)]
    tokens: bool,
}

#[derive(Args)]
struct StatsArgs {
    #[arg(long, env = "SGQS_ROOT", default_value = ".")]
    root: PathBuf,
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run_query(args: QueryArgs) -> Result<ExitCode> {
    let source = args.source.read()?;
    let options = ExecuteOptions {
        max_traversal_depth: args.max_depth,
    };
    let result = match sgqs_query::query_with(&source, &args.root, &options) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("{}", err.to_info());
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut stdout = std::io::stdout().lock();
    match args.format {
        OutputFormat::Tsv => {
            render::write_tsv(&mut stdout, &result)?;
            for info in &result.errors {
                eprintln!("{info}");
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut stdout, &result).context("failed to encode result")?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(exit_code(&result))
}

fn exit_code(result: &QueryResult) -> ExitCode {
    if result.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run_explain(args: ExplainArgs) -> Result<ExitCode> {
    let source = args.source.read()?;
    let mut stdout = std::io::stdout().lock();

    if args.tokens {
        match sgqs_query::tokenize(&source) {
            Ok(tokens) => render::write_tokens(&mut stdout, &tokens)?,
            Err(err) => {
                eprintln!("{}", err.to_info());
                return Ok(ExitCode::FAILURE);
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    match sgqs_query::prepare(&source) {
        Ok(query) => {
            serde_json::to_writer_pretty(&mut stdout, &query).context("failed to encode query")?;
            stdout.write_all(b"\n")?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("{}", err.to_info());
            Ok(ExitCode::FAILURE)
        }
    }
}

fn run_stats(args: StatsArgs) -> Result<ExitCode> {
    let graph = build_graph(&args.root)?;
    let mut stdout = std::io::stdout().lock();
    render::write_stats(&mut stdout, &graph)?;
    Ok(ExitCode::SUCCESS)
}

fn build_graph(root: &Path) -> Result<sgqs_api::Graph> {
    let graph = sgqs_graph::build(root)
        .with_context(|| format!("failed to build graph from {}", root.display()))?;
    debug!(nodes = graph.node_count(), edges = graph.edge_count(), "graph built");
    Ok(graph)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Query(args) => run_query(args),
        Commands::Explain(args) => run_explain(args),
        Commands::Stats(args) => run_stats(args),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
