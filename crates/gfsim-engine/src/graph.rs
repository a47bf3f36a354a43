//! # gfsim-engine::graph
//!
//! The static compute graph: all nodes keyed by name in declaration order,
//! the topic wiring (one publisher, many subscribers per topic), and the
//! derived adjacency list. Node indices are assigned by declaration order and
//! are part of the output contract.

use crate::{node::Node, prelude::*};
use indexmap::IndexMap;

/// The wired graph. Built once from validated configs, never mutated
/// structurally afterwards.
#[derive(Debug)]
pub struct Graph {
    nodes: IndexMap<String, Node>,
    topic_publisher: IndexMap<String, NodeId>,
    topic_subscribers: IndexMap<String, Vec<NodeId>>,
    adjacency: Vec<(NodeId, NodeId)>,
}

impl Graph {
    /// Validates the node configs and wires the graph.
    pub fn build(config: GraphConfig) -> Result<Self, GraphError> {
        let mut nodes = IndexMap::new();
        for node_config in config.nodes {
            node_config.validate()?;
            if nodes.contains_key(&node_config.name) {
                return Err(GraphError::DuplicateNode(node_config.name));
            }
            let id = nodes.len() as NodeId;
            nodes.insert(node_config.name.clone(), Node::new(id, node_config));
        }

        let mut graph = Self {
            nodes,
            topic_publisher: IndexMap::new(),
            topic_subscribers: IndexMap::new(),
            adjacency: Vec::new(),
        };
        graph.wire()?;
        Ok(graph)
    }

    fn wire(&mut self) -> Result<(), GraphError> {
        for (index, node) in self.nodes.values().enumerate() {
            let id = index as NodeId;
            let config = node.config();

            if let Some(lp) = &config.r#loop {
                for publish in &lp.callback.publish {
                    Self::add_publisher(
                        &mut self.topic_publisher,
                        &self.nodes,
                        &publish.topic,
                        id,
                    )?;
                }
            }

            for sub in config.subscribe.iter().flatten() {
                let subscribers = self
                    .topic_subscribers
                    .entry(sub.topic.clone())
                    .or_default();
                if subscribers.contains(&id) {
                    return Err(GraphError::DuplicateSubscriber {
                        node: config.name.clone(),
                        topic: sub.topic.clone(),
                    });
                }
                subscribers.push(id);

                for callback in sub.callbacks() {
                    for publish in &callback.publish {
                        Self::add_publisher(
                            &mut self.topic_publisher,
                            &self.nodes,
                            &publish.topic,
                            id,
                        )?;
                    }
                }
            }
        }

        for (topic, &publisher) in &self.topic_publisher {
            if let Some(subscribers) = self.topic_subscribers.get(topic) {
                for &subscriber in subscribers {
                    self.adjacency.push((publisher, subscriber));
                }
            }
        }
        Ok(())
    }

    fn add_publisher(
        map: &mut IndexMap<String, NodeId>,
        nodes: &IndexMap<String, Node>,
        topic: &str,
        publisher: NodeId,
    ) -> Result<(), GraphError> {
        if let Some(&existing) = map.get(topic) {
            // A node may declare the same topic from several of its own
            // callbacks; only a second distinct node is a wiring error.
            if existing != publisher {
                let name_of = |id: NodeId| {
                    nodes
                        .get_index(id as usize)
                        .map(|(name, _)| name.clone())
                        .unwrap_or_default()
                };
                return Err(GraphError::DuplicatePublisher {
                    topic: topic.to_string(),
                    existing: name_of(existing),
                    duplicate: name_of(publisher),
                });
            }
            return Ok(());
        }
        map.insert(topic.to_string(), publisher);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns a node by index. Panics if the index is invalid.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize]
    }

    /// Returns a node by index, mutably. Panics if the index is invalid.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id as usize]
    }

    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    /// The declaration-order index of a node.
    pub fn node_index(&self, name: &str) -> Option<NodeId> {
        self.nodes.get_index_of(name).map(|i| i as NodeId)
    }

    /// All nodes in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn nodes_with_loops(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(|n| n.config().r#loop.is_some())
    }

    pub fn topic_publisher(&self, topic: &str) -> Option<NodeId> {
        self.topic_publisher.get(topic).copied()
    }

    /// Subscribers of a topic in registration order.
    pub fn topic_subscribers(&self, topic: &str) -> &[NodeId] {
        self.topic_subscribers
            .get(topic)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Directed edges `(publisher, subscriber)` in registration order.
    pub fn edges(&self) -> &[(NodeId, NodeId)] {
        &self.adjacency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> GraphConfig {
        serde_yaml::from_str(
            r#"
nodes:
  - name: root
    loop:
      period: 10
      callback:
        type: loop
        publish:
          - {topic: left, value_range: [0, 5]}
          - {topic: right, value_range: [0, 5]}
  - name: west
    subscribe:
      - topic: left
        valid_range: [0, 5]
        nominal_callback:
          type: nominal
          publish:
            - {topic: merged, value_range: [0, 5]}
  - name: east
    subscribe:
      - topic: right
        valid_range: [0, 5]
        nominal_callback:
          type: nominal
          publish:
            - {topic: merged, value_range: [0, 5]}
  - name: sink
    subscribe:
      - topic: merged
        valid_range: [0, 5]
"#,
        )
        .unwrap()
    }

    #[test]
    fn duplicate_publisher_across_nodes_is_rejected() {
        let err = Graph::build(diamond()).unwrap_err();
        assert!(matches!(
            err,
            GraphError::DuplicatePublisher { ref topic, .. } if topic == "merged"
        ));
    }

    fn chain() -> GraphConfig {
        serde_yaml::from_str(
            r#"
nodes:
  - name: source
    loop:
      period: 10
      callback:
        type: loop
        publish:
          - {topic: raw, value_range: [0, 5]}
  - name: stage
    subscribe:
      - topic: raw
        valid_range: [0, 5]
        nominal_callback:
          type: nominal
          publish:
            - {topic: cooked, value_range: [0, 5]}
  - name: sink
    subscribe:
      - topic: cooked
        valid_range: [0, 5]
      - topic: raw
        valid_range: [0, 5]
"#,
        )
        .unwrap()
    }

    #[test]
    fn assigns_indices_in_declaration_order() {
        let graph = Graph::build(chain()).unwrap();
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.node_index("source"), Some(0));
        assert_eq!(graph.node_index("stage"), Some(1));
        assert_eq!(graph.node_index("sink"), Some(2));
        assert_eq!(graph.node_index("ghost"), None);
        assert_eq!(graph.node(1).name(), "stage");
    }

    #[test]
    fn wires_topics_and_derives_adjacency() {
        let graph = Graph::build(chain()).unwrap();
        assert_eq!(graph.topic_publisher("raw"), Some(0));
        assert_eq!(graph.topic_publisher("cooked"), Some(1));
        assert_eq!(graph.topic_publisher("unknown"), None);
        assert_eq!(graph.topic_subscribers("raw"), &[1, 2]);
        assert_eq!(graph.topic_subscribers("cooked"), &[2]);
        // raw registered before cooked, so its edges come first.
        assert_eq!(graph.edges(), &[(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn duplicate_node_name_is_rejected() {
        let mut config = chain();
        config.nodes[2].name = "source".to_string();
        assert!(matches!(
            Graph::build(config),
            Err(GraphError::DuplicateNode(ref name)) if name == "source"
        ));
    }

    #[test]
    fn duplicate_subscription_is_rejected() {
        let mut config = chain();
        let subs = config.nodes[2].subscribe.as_mut().unwrap();
        subs[1].topic = "cooked".to_string();
        assert!(matches!(
            Graph::build(config),
            Err(GraphError::DuplicateSubscriber { ref node, ref topic })
                if node == "sink" && topic == "cooked"
        ));
    }

    #[test]
    fn same_node_may_publish_topic_from_several_callbacks() {
        let config: GraphConfig = serde_yaml::from_str(
            r#"
nodes:
  - name: relay
    loop:
      period: 5
      callback:
        type: loop
        publish:
          - {topic: beat, value_range: [0, 1]}
    subscribe:
      - topic: beat
        valid_range: [0, 1]
        lost_input_callback:
          type: lost
          publish:
            - {topic: beat, value_range: [0, 1]}
"#,
        )
        .unwrap();
        let err = Graph::build(config);
        assert!(err.is_ok());
    }

    #[test]
    fn invalid_node_config_surfaces_as_config_error() {
        let config: GraphConfig =
            serde_yaml::from_str("nodes: [{name: stray}]").unwrap();
        assert!(matches!(
            Graph::build(config),
            Err(GraphError::Config(ConfigError::Validation { .. }))
        ));
    }
}
