//! # gfsim-types::config
//!
//! Strongly-typed structs for the graph configuration, mirroring the
//! structure of the config files. These types are used by `serde` to parse
//! YAML/TOML into safe, usable Rust objects. Parsing is strict: unknown
//! fields are rejected everywhere.

use crate::{errors::ConfigError, fault::FaultConfig, time::SimTime};
use serde::{Deserialize, Serialize};

/// An inclusive integer range, written `[lo, hi]` in config files.
/// Used for publish values, delivery delays, and subscription validity.
pub type IntRange = (i64, i64);

/// The role of a callback, governing which feature encoding is written when
/// the callback executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallbackRole {
    Nominal,
    Invalid,
    Lost,
    Loop,
}

/// Declares that a node publishes to a topic. At execution time a value is
/// drawn uniformly from `value_range` and, per subscriber, a transmission
/// delay from `delay_range`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublishSpec {
    pub topic: String,
    pub value_range: IntRange,
    #[serde(default)]
    pub delay_range: IntRange,
}

/// What a node does when a piece of work fires: zero or more publishes, and
/// optionally a fault it injects into itself as a side effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CallbackSpec {
    #[serde(rename = "type")]
    pub role: CallbackRole,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub publish: Vec<PublishSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fault: Option<FaultConfig>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub noop: bool,
}

impl CallbackSpec {
    /// A callback that does nothing, standing in for an absent one.
    pub fn noop(role: CallbackRole) -> Self {
        Self {
            role,
            publish: Vec::new(),
            fault: None,
            noop: true,
        }
    }
}

/// What a node does when it receives a message on a topic. Messages inside
/// `valid_range` run the nominal callback, others the invalid-input callback.
/// If a `watchdog` period is set and no new message arrives within it, the
/// lost-input callback runs instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubscriptionSpec {
    pub topic: String,
    pub valid_range: IntRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watchdog: Option<SimTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominal_callback: Option<CallbackSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_input_callback: Option<CallbackSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lost_input_callback: Option<CallbackSpec>,
}

impl SubscriptionSpec {
    /// The subscription's callbacks that are actually configured, in
    /// nominal / invalid / lost order.
    pub fn callbacks(&self) -> impl Iterator<Item = &CallbackSpec> {
        self.nominal_callback
            .iter()
            .chain(self.invalid_input_callback.iter())
            .chain(self.lost_input_callback.iter())
    }
}

/// A periodic timer driving a node's loop callback every `period` ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoopSpec {
    pub period: SimTime,
    pub callback: CallbackSpec,
}

/// One node of the compute graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#loop: Option<LoopSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscribe: Option<Vec<SubscriptionSpec>>,
}

impl NodeConfig {
    /// Checks the semantic invariants that the schema alone cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(self.invalid("a node must have a non-empty name"));
        }
        if self.r#loop.is_none() && self.subscribe.is_none() {
            return Err(self.invalid("a node needs a loop or at least one subscription"));
        }
        if let Some(subs) = &self.subscribe {
            if subs.is_empty() {
                return Err(self.invalid("subscribe must not be an empty list"));
            }
            for sub in subs {
                if matches!(sub.watchdog, Some(w) if w <= 0) {
                    return Err(self.invalid("watchdog period must be positive"));
                }
            }
        }
        if matches!(&self.r#loop, Some(lp) if lp.period <= 0) {
            return Err(self.invalid("loop period must be positive"));
        }
        Ok(())
    }

    /// All callbacks declared on this node, loop callback first, then each
    /// subscription's nominal / invalid / lost callbacks in declaration order.
    pub fn callbacks(&self) -> impl Iterator<Item = &CallbackSpec> {
        self.r#loop
            .iter()
            .map(|lp| &lp.callback)
            .chain(
                self.subscribe
                    .iter()
                    .flatten()
                    .flat_map(SubscriptionSpec::callbacks),
            )
    }

    /// Total number of publish declarations across all callback roles.
    pub fn publication_count(&self) -> usize {
        self.callbacks().map(|cb| cb.publish.len()).sum()
    }

    fn invalid(&self, message: &str) -> ConfigError {
        ConfigError::Validation {
            node: self.name.clone(),
            message: message.to_string(),
        }
    }
}

/// The top-level structure of a graph configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphConfig {
    pub nodes: Vec<NodeConfig>,
}
