//! # gfsim-engine::prelude
//!
//! Re-exports of the most commonly used types from the engine and its
//! foundational crate, simplifying imports for downstream crates.

pub use crate::{
    events::{Queued, Work},
    graph::Graph,
    node::{FaultState, Node},
    output::{CsvSink, MemSink, OutputError, SnapshotSink},
    sim::{Simulator, Step, DEFAULT_SEED},
};

pub use gfsim_types::{
    config::*, errors::*, fault::*, feature::*, id::*, time::*,
};
