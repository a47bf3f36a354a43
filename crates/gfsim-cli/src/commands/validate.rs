//! # gfsim-cli::commands::validate
//!
//! Implements the `validate` subcommand: parse and validate configs without
//! running a simulation.

use crate::{args::ValidateOpts, loader};
use anyhow::Result;
use gfsim_engine::{graph::Graph, sim::Simulator};
use gfsim_types::time::SimTime;

pub fn exec(opts: ValidateOpts) -> Result<()> {
    let config = loader::load_graph_config(&opts.graph)?;
    let graph = Graph::build(config)?;
    println!(
        "graph config {} is valid: {} nodes, {} edges",
        opts.graph.display(),
        graph.len(),
        graph.edges().len()
    );

    if let Some(fault_path) = &opts.fault {
        let fault = loader::load_fault_config(fault_path)?;
        let stop_at = opts.stop.unwrap_or(SimTime::MAX);
        let (index, inject_at) = Simulator::validate_fault(&graph, &fault, stop_at)?;
        println!(
            "fault config {} is valid: targets node index {} at t={}",
            fault_path.display(),
            index,
            inject_at
        );
    }
    Ok(())
}
