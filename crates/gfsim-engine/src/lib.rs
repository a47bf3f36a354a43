//! # gfsim-engine
//!
//! The core of the gfsim simulator: the graph builder, per-node runtime state
//! with the fault-injection state machines, the event queue with its ordering
//! contract, the dispatch loop, and the CSV output sinks.

#![forbid(unsafe_code)]

pub mod events;
pub mod graph;
pub mod node;
pub mod output;
pub mod prelude;
pub mod sim;
