use crate::config::load_config;
use crate::document::GraphDocument;
use crate::ir::Direction;
use crate::layout::arrange;
use crate::layout_dump::write_layout_dump;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "GRAPH_ARRANGE_LOG";

#[derive(Parser, Debug)]
#[command(name = "garrange", version, about = "Auto-arrange a node graph snapshot")]
pub struct Args {
    /// Graph document (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config file (JSON or JSON5)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Flow direction: TB, LR, BT or RL
    #[arg(short = 'd', long = "direction", value_parser = parse_direction)]
    pub direction: Option<Direction>,

    #[arg(long = "node-spacing")]
    pub node_spacing: Option<f64>,

    #[arg(long = "rank-spacing")]
    pub rank_spacing: Option<f64>,

    /// Minimum gap the collision pass keeps between any two nodes
    #[arg(long = "min-gap")]
    pub min_gap: Option<f64>,

    #[arg(long = "max-iterations")]
    pub max_iterations: Option<usize>,

    /// Also write a JSON layout dump (ranks, bounds, collision stats)
    #[arg(long = "dump")]
    pub dump: Option<PathBuf>,
}

fn parse_direction(token: &str) -> Result<Direction, String> {
    Direction::from_token(token).ok_or_else(|| format!("unknown direction `{token}`"))
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(direction) = args.direction {
        config.layout.direction = direction;
    }
    if let Some(spacing) = args.node_spacing {
        config.layout.node_spacing = spacing;
    }
    if let Some(spacing) = args.rank_spacing {
        config.layout.rank_spacing = spacing;
    }
    if let Some(gap) = args.min_gap {
        config.layout.collision.min_gap = gap;
    }
    if let Some(iterations) = args.max_iterations {
        config.layout.collision.max_iterations = iterations;
    }
    config.layout.validate()?;

    let input = read_input(args.input.as_deref())?;
    let document = GraphDocument::from_json_str(&input)?;

    let mut handles = config.handles;
    handles.extend(document.handles.clone());

    let arrangement = arrange(&document.nodes, &document.edges, &config.layout, &handles);
    if !arrangement.collision.converged {
        tracing::warn!(
            remaining = arrangement.collision.remaining_overlaps,
            "layout still has overlapping nodes"
        );
    }

    if let Some(path) = args.dump.as_deref() {
        write_layout_dump(path, &arrangement, &document.edges, &config.layout)
            .with_context(|| format!("writing layout dump to {}", path.display()))?;
    }

    let output = document.with_positions(&arrangement.nodes).to_json_string()?;
    write_output(&output, args.output.as_deref())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()));
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn write_output(contents: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, contents)
                .with_context(|| format!("writing {}", path.display()))?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(contents.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}
