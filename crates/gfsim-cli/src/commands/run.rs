//! # gfsim-cli::commands::run
//!
//! Implements the `run` subcommand: build the graph, write the edge index,
//! attach the fault (if any), run the simulation, write the fault label.

use crate::{args::RunOpts, loader};
use anyhow::{bail, Result};
use gfsim_engine::{
    graph::Graph,
    output::{self, CsvSink},
    sim::Simulator,
};

pub fn exec(opts: RunOpts) -> Result<()> {
    let graph_config = loader::load_graph_config(&opts.graph)?;
    let graph = Graph::build(graph_config)?;
    output::write_edge_index(&graph, &opts.edge_index_output)?;

    let fault = match &opts.fault {
        Some(path) => {
            let mut fault = loader::load_fault_config(path)?;
            if let Some(inject_at) = opts.inject_at {
                fault.inject_at = Some(inject_at);
            }
            Some(fault)
        }
        None => None,
    };

    // Resolve the label before the graph moves into the simulator.
    let label = match &fault {
        Some(fault) => {
            let Some(label_path) = &opts.fault_label_output else {
                bail!("--fault requires --fault-label-output");
            };
            let (index, inject_at) = Simulator::validate_fault(&graph, fault, opts.stop)?;
            Some((index, inject_at, label_path.clone()))
        }
        None => None,
    };

    let sink = Box::new(CsvSink::create(&opts.node_feature_output)?);
    let mut sim = match opts.seed {
        Some(seed) => Simulator::with_seed(graph, opts.stop, fault, sink, seed)?,
        None => Simulator::new(graph, opts.stop, fault, sink)?,
    };
    sim.run()?;

    if let Some((index, inject_at, path)) = label {
        output::write_fault_label(index, inject_at, path)?;
    }

    tracing::info!(
        stop = opts.stop,
        rows = sim.rows_emitted(),
        features = %opts.node_feature_output.display(),
        "simulation finished"
    );
    Ok(())
}
