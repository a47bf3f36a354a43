//! # gfsim-cli::loader
//!
//! Loads configuration files, dispatching on the file extension.

use anyhow::{anyhow, Context, Result};
use gfsim_types::{config::GraphConfig, fault::FaultConfig};
use serde::de::DeserializeOwned;
use std::{fs, path::Path};

fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    let parsed = match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
        Some("toml") => toml::from_str(&content)?,
        _ => {
            return Err(anyhow!(
                "unsupported config file extension: {}",
                path.display()
            ))
        }
    };
    Ok(parsed)
}

pub fn load_graph_config(path: &Path) -> Result<GraphConfig> {
    load(path).with_context(|| format!("loading graph config {}", path.display()))
}

pub fn load_fault_config(path: &Path) -> Result<FaultConfig> {
    load(path).with_context(|| format!("loading fault config {}", path.display()))
}
