//! # gfsim-types::errors
//!
//! The common error types used throughout the gfsim workspace. All of them
//! are fatal and surfaced before a simulation begins: once a graph and fault
//! config validate, the scheduler itself cannot fail.

use crate::time::SimTime;
use thiserror::Error;

/// An error parsing or semantically validating a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error reading config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config for node {node:?}: {message}")]
    Validation { node: String, message: String },
}

/// An error wiring the graph from validated node configs.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("node name must be unique: {0:?}")]
    DuplicateNode(String),
    #[error("duplicate publisher for topic {topic:?}: {existing:?} and {duplicate:?}")]
    DuplicatePublisher {
        topic: String,
        existing: String,
        duplicate: String,
    },
    #[error("node {node:?} subscribes to topic {topic:?} more than once")]
    DuplicateSubscriber { node: String, topic: String },
}

/// An error validating a fault scenario against the graph it targets.
#[derive(Error, Debug)]
pub enum FaultError {
    #[error("a fault scenario must carry inject_to and inject_at")]
    MissingTarget,
    #[error("cannot inject fault into non-existent node {0:?}")]
    UnknownNode(String),
    #[error("cannot inject loop fault into node {0:?}, it has no loop")]
    NoLoop(String),
    #[error("cannot inject publish fault: node {node:?} does not publish topic {topic:?}")]
    NotPublisher { node: String, topic: String },
    #[error("cannot inject receive fault: node {node:?} does not subscribe to topic {topic:?}")]
    NotSubscriber { node: String, topic: String },
    #[error("inject_at must lie strictly between 0 and stop_at {stop_at}, got {inject_at}")]
    InjectTimeOutOfRange { inject_at: SimTime, stop_at: SimTime },
}
