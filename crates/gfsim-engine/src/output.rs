//! # gfsim-engine::output
//!
//! The simulator's output surfaces: the snapshot sink the dispatch loop
//! appends feature rows to, plus writers for the static edge-index file and
//! the fault-label file. The sink is a trait so tests can capture rows in
//! memory instead of touching the filesystem.

use crate::{graph::Graph, prelude::*};
use std::{cell::RefCell, fs::File, path::Path, rc::Rc};
use thiserror::Error;

/// An error writing simulation output. The only runtime failure source: once
/// configs validate, scheduling itself cannot fail.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("I/O error writing output: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Destination for emitted feature-snapshot rows.
pub trait SnapshotSink {
    fn append(&mut self, row: &[String]) -> Result<(), OutputError>;

    fn flush(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}

/// Appends rows to a CSV file. Creating the sink truncates the target, so a
/// run's output never mixes with a previous run's.
pub struct CsvSink {
    writer: csv::Writer<File>,
}

impl CsvSink {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, OutputError> {
        Ok(Self {
            writer: csv::Writer::from_path(path)?,
        })
    }
}

impl SnapshotSink for CsvSink {
    fn append(&mut self, row: &[String]) -> Result<(), OutputError> {
        self.writer.write_record(row)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), OutputError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Collects rows in memory. Clones share the same buffer, so a test can keep
/// one handle while the simulator owns the other.
#[derive(Clone, Default)]
pub struct MemSink {
    rows: Rc<RefCell<Vec<Vec<String>>>>,
}

impl MemSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> Vec<Vec<String>> {
        self.rows.borrow().clone()
    }
}

impl SnapshotSink for MemSink {
    fn append(&mut self, row: &[String]) -> Result<(), OutputError> {
        self.rows.borrow_mut().push(row.to_vec());
        Ok(())
    }
}

/// Writes the static graph structure as `src_index,dst_index` rows.
/// Overwrites the target path.
pub fn write_edge_index(graph: &Graph, path: impl AsRef<Path>) -> Result<(), OutputError> {
    let mut writer = csv::Writer::from_path(path)?;
    for &(src, dst) in graph.edges() {
        writer.write_record([src.to_string(), dst.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads an edge-index file back into `(src, dst)` pairs.
pub fn read_edge_index(path: impl AsRef<Path>) -> Result<Vec<(NodeId, NodeId)>, OutputError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    let mut edges = Vec::new();
    for record in reader.deserialize() {
        edges.push(record?);
    }
    Ok(edges)
}

/// Writes the fault label: a single `node_index,inject_at` row.
/// Overwrites the target path.
pub fn write_fault_label(
    node_index: NodeId,
    inject_at: SimTime,
    path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([node_index.to_string(), inject_at.to_string()])?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("gfsim-{}-{}", std::process::id(), name))
    }

    fn line_graph() -> Graph {
        let config: GraphConfig = serde_yaml::from_str(
            r#"
nodes:
  - name: a
    loop:
      period: 10
      callback:
        type: loop
        publish:
          - {topic: t1, value_range: [0, 5]}
  - name: b
    subscribe:
      - topic: t1
        valid_range: [0, 5]
"#,
        )
        .unwrap();
        Graph::build(config).unwrap()
    }

    #[test]
    fn edge_index_round_trips() {
        let graph = line_graph();
        let path = scratch("edges.csv");
        write_edge_index(&graph, &path).unwrap();
        let edges = read_edge_index(&path).unwrap();
        assert_eq!(edges, graph.edges());

        // Re-emitting the parsed edges yields an identical file.
        let first = fs::read_to_string(&path).unwrap();
        write_edge_index(&graph, &path).unwrap();
        let second = fs::read_to_string(&path).unwrap();
        assert_eq!(first, second);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn fault_label_is_a_single_row() {
        let path = scratch("label.csv");
        write_fault_label(2, 17, &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim(), "2,17");
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn mem_sink_handles_share_rows() {
        let sink = MemSink::new();
        let mut writer = sink.clone();
        writer.append(&["x".to_string()]).unwrap();
        assert_eq!(sink.rows(), vec![vec!["x".to_string()]]);
    }
}
