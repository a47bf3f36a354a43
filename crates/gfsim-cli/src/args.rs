//! # gfsim-cli::args
//!
//! Defines the command-line argument structure using `clap`.

use clap::{Args, Parser, Subcommand};
use gfsim_types::time::SimTime;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one simulation and write its dataset files.
    Run(RunOpts),
    /// Run a sweep of fault injections and collect a training dataset.
    Dataset(DatasetOpts),
    /// Merge several graph-config fragments into one file.
    Merge(MergeOpts),
    /// Validate a graph config (and optionally a fault config) without running.
    Validate(ValidateOpts),
}

#[derive(Args, Debug)]
pub struct RunOpts {
    /// Path to the graph config file (YAML or TOML).
    #[arg(long)]
    pub graph: PathBuf,

    /// Path to a fault config file to inject during the run.
    #[arg(long)]
    pub fault: Option<PathBuf>,

    /// Stop the simulation once the clock reaches this time.
    #[arg(long)]
    pub stop: SimTime,

    /// Where to write the static edge-index CSV.
    #[arg(long)]
    pub edge_index_output: PathBuf,

    /// Where to write the per-step node-feature CSV.
    #[arg(long)]
    pub node_feature_output: PathBuf,

    /// Where to write the fault-label CSV. Required with --fault.
    #[arg(long)]
    pub fault_label_output: Option<PathBuf>,

    /// Override the fault config's injection time.
    #[arg(long)]
    pub inject_at: Option<SimTime>,

    /// Override the fixed dataset RNG seed.
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Debug)]
pub struct DatasetOpts {
    /// Path to the graph config file (YAML or TOML).
    #[arg(long)]
    pub graph: PathBuf,

    /// Directory to collect the dataset into. One subdirectory is created
    /// per fault config, holding an edge-index file plus feature and label
    /// files for every injection time.
    #[arg(long)]
    pub output_dir: PathBuf,

    /// Directory containing fault config files.
    #[arg(long)]
    pub fault_dir: PathBuf,

    /// Stop each run once the clock reaches this time.
    #[arg(long)]
    pub stop: SimTime,

    /// Lower bound of the injection-time sweep.
    #[arg(long)]
    pub fault_begin: SimTime,

    /// Upper bound of the injection-time sweep.
    #[arg(long)]
    pub fault_end: SimTime,

    /// Number of injection times, spread evenly across the sweep window
    /// (duplicates removed).
    #[arg(long)]
    pub max_num_sweep: u32,
}

#[derive(Args, Debug)]
pub struct MergeOpts {
    /// Graph-config fragments to merge, in order.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Where to write the merged graph config (YAML).
    #[arg(long)]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct ValidateOpts {
    /// Path to the graph config file (YAML or TOML).
    #[arg(long)]
    pub graph: PathBuf,

    /// Fault config to validate against the graph.
    #[arg(long)]
    pub fault: Option<PathBuf>,

    /// Stop time used to bound the fault's injection window.
    #[arg(long)]
    pub stop: Option<SimTime>,
}
