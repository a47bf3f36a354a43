//! # gfsim-cli::commands::merge
//!
//! Implements the `merge` subcommand: concatenates the `nodes` lists of
//! several graph-config fragments into a single YAML document. Useful for
//! composing large graphs out of reviewed pieces.

use crate::{args::MergeOpts, loader};
use anyhow::{Context, Result};
use gfsim_types::config::GraphConfig;
use std::fs;

pub fn exec(opts: MergeOpts) -> Result<()> {
    let mut merged = GraphConfig { nodes: Vec::new() };
    for path in &opts.inputs {
        let fragment = loader::load_graph_config(path)?;
        tracing::debug!(
            fragment = %path.display(),
            nodes = fragment.nodes.len(),
            "merging fragment"
        );
        merged.nodes.extend(fragment.nodes);
    }

    let rendered = serde_yaml::to_string(&merged)?;
    fs::write(&opts.output, rendered)
        .with_context(|| format!("writing {}", opts.output.display()))?;

    tracing::info!(
        nodes = merged.nodes.len(),
        output = %opts.output.display(),
        "merged graph config written"
    );
    Ok(())
}
