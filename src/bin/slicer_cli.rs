//! Slicer CLI
//!
//! Replays interactions against a recorded host update and prints the
//! resulting node list and host instructions as JSON.
//!
//! Usage:
//!   cargo run --features cli --bin slicer_cli -- \
//!     --update update.json \
//!     --settings slicer.yaml \
//!     --expand "[2018]#" \
//!     --click "[2018],[Qtr 1]#" \
//!     --search qtr
//!
//! Paths accept either identifier format (`[a],[b]#` or `a_b`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;

use hierarchy_slicer::identity;
use hierarchy_slicer::{HostUpdate, SlicerSession, SlicerSettings};

#[derive(Parser, Debug)]
#[command(name = "slicer_cli")]
#[command(about = "Replay slicer interactions against a host update")]
struct Args {
    /// Host update JSON (matrix plus persisted state)
    #[arg(long, short = 'u')]
    update: PathBuf,

    /// Settings YAML (defaults when omitted)
    #[arg(long, short = 's', env = "SLICER_SETTINGS")]
    settings: Option<PathBuf>,

    /// Node to expand (can be specified multiple times)
    #[arg(long, short = 'e')]
    expand: Vec<String>,

    /// Node to click (can be specified multiple times, applied in order)
    #[arg(long, short = 'c')]
    click: Vec<String>,

    /// Search text applied after clicks
    #[arg(long)]
    search: Option<String>,

    /// Print every node, not just visible ones
    #[arg(long)]
    all: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => SlicerSettings::from_file(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => SlicerSettings::default(),
    };

    let raw = std::fs::read_to_string(&args.update)
        .with_context(|| format!("reading {}", args.update.display()))?;
    let update: HostUpdate = serde_json::from_str(&raw).context("parsing host update")?;

    let Some(mut session) = SlicerSession::from_update(&update, settings) else {
        println!("{}", json!({ "nodes": [], "filter": null }));
        return Ok(());
    };

    for id in &args.expand {
        let path = identity::decode(id).with_context(|| format!("expand path {:?}", id))?;
        if session.toggle_expand(&path).is_none() {
            tracing::warn!(path = %path, "Cannot expand node");
        }
    }

    let mut filter = session.filter_instruction();
    for id in &args.click {
        let path = identity::decode(id).with_context(|| format!("click path {:?}", id))?;
        match session.click(&path) {
            Some(instruction) => filter = Some(instruction),
            None => tracing::warn!(path = %path, "Click produced no filter"),
        }
    }

    let search_filter = match &args.search {
        Some(text) => session.search(text),
        None => None,
    };

    let nodes: Vec<_> = if args.all {
        session.nodes().iter().collect()
    } else {
        session.visible_nodes()
    };

    let output = json!({
        "nodes": nodes,
        "filter": filter,
        "expanded": session.expanded_string(),
        "searchFilter": search_filter,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
