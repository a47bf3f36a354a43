//! # gfsim-types::id
//!
//! Core identifier types.

/// A node's index in the graph, assigned by declaration order.
/// Invariant: nodes of a built graph have contiguous indices from 0 to N-1.
pub type NodeId = u32;
