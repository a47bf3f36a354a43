//! # gfsim-cli::commands::dataset
//!
//! Implements the `dataset` subcommand: for every fault config in a
//! directory, run one simulation per injection time in an evenly spaced
//! sweep, collecting feature, edge-index, and label files per run.

use crate::args::{DatasetOpts, RunOpts};
use crate::commands::run;
use anyhow::{bail, Context, Result};
use gfsim_types::time::SimTime;
use std::{fs, path::PathBuf};

pub fn exec(opts: DatasetOpts) -> Result<()> {
    if opts.fault_begin >= opts.fault_end || opts.fault_end == 0 {
        bail!("fault_begin must be less than fault_end, and fault_end non-zero");
    }
    if opts.max_num_sweep < 2 {
        bail!("max_num_sweep must be at least 2");
    }
    if opts.fault_begin + SimTime::from(opts.max_num_sweep) >= opts.fault_end {
        bail!("fault_begin + max_num_sweep must be less than fault_end");
    }

    let injection_times = sweep_times(opts.fault_begin, opts.fault_end, opts.max_num_sweep);

    fs::create_dir_all(&opts.output_dir)
        .with_context(|| format!("creating {}", opts.output_dir.display()))?;
    let fault_files = fault_files(&opts.fault_dir)?;
    if fault_files.is_empty() {
        bail!("no fault config files in {}", opts.fault_dir.display());
    }

    tracing::info!(
        faults = fault_files.len(),
        times = ?injection_times,
        "starting dataset sweep"
    );

    for fault_path in fault_files {
        let stem = fault_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("fault");
        let subdir = opts.output_dir.join(stem);
        fs::create_dir_all(&subdir).with_context(|| format!("creating {}", subdir.display()))?;

        for &inject_at in &injection_times {
            run::exec(RunOpts {
                graph: opts.graph.clone(),
                fault: Some(fault_path.clone()),
                stop: opts.stop,
                edge_index_output: subdir.join("edge_index.csv"),
                node_feature_output: subdir
                    .join(format!("node_feature_inject_at_{inject_at}.csv")),
                fault_label_output: Some(
                    subdir.join(format!("fault_label_inject_at_{inject_at}.csv")),
                ),
                inject_at: Some(inject_at),
                seed: None,
            })?;
        }
    }
    Ok(())
}

/// Fault config files in the directory, sorted for a deterministic sweep order.
fn fault_files(dir: &std::path::Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("reading fault dir {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            matches!(
                path.extension().and_then(|ext| ext.to_str()),
                Some("yaml") | Some("yml") | Some("toml")
            )
        })
        .collect();
    files.sort();
    Ok(files)
}

/// `n` injection times spread evenly across `[begin, end]`, deduplicated.
fn sweep_times(begin: SimTime, end: SimTime, n: u32) -> Vec<SimTime> {
    let span = (end - begin) as f64;
    let steps = f64::from(n - 1);
    let mut times: Vec<SimTime> = (0..n)
        .map(|i| begin + (f64::from(i) * span / steps).round() as SimTime)
        .collect();
    times.dedup();
    times
}
