//! # gfsim-types
//!
//! Foundational, shared data types for the gfsim workspace: configuration
//! records, fault scenario records, the feature-vector schema, identifiers,
//! simulation time, and the error taxonomy. `gfsim-engine` and `gfsim-cli`
//! both depend on this crate; it contains no simulation logic.

#![forbid(unsafe_code)]

pub mod config;
pub mod errors;
pub mod fault;
pub mod feature;
pub mod id;
pub mod time;
