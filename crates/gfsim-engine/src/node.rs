//! # gfsim-engine::node
//!
//! Per-node runtime state: the feature vector, per-topic last-received
//! timestamps, the crash flag, and the FIFO of pending fault states with the
//! predicates the scheduler consults before dispatching work.
//!
//! Predicates come in pairs: `should_*` is pure, the matching `maybe_*` acts
//! on the first applicable fault (incrementing its action count, retiring it
//! once its budget is spent). Faults are honored serially in enqueue order.

use crate::prelude::*;
use fxhash::FxHashMap;
use std::collections::VecDeque;

/// One pending fault attached to a node. Created at injection, retired when
/// its action budget is spent (or, for a crash, immediately on firing).
#[derive(Debug, Clone)]
pub struct FaultState {
    at: SimTime,
    config: FaultConfig,
    action_count: u32,
    done: bool,
}

impl FaultState {
    pub fn new(at: SimTime, config: FaultConfig) -> Self {
        Self {
            at,
            config,
            action_count: 0,
            done: false,
        }
    }

    fn armed(&self, now: SimTime) -> bool {
        !self.done && now >= self.at
    }

    fn bump(&mut self, limit: u32) {
        self.action_count += 1;
        if self.action_count >= limit {
            self.done = true;
        }
    }

    fn drop_loop_budget(&self, now: SimTime) -> Option<u32> {
        match &self.config.affect_loop {
            Some(LoopFault::Drop(f)) if self.armed(now) && self.action_count < f.drop => {
                Some(f.drop)
            }
            _ => None,
        }
    }

    fn delay_loop_spec(&self, now: SimTime) -> Option<(SimTime, u32)> {
        match &self.config.affect_loop {
            Some(LoopFault::Delay(f)) if self.armed(now) && self.action_count < f.count => {
                Some((f.delay, f.count))
            }
            _ => None,
        }
    }

    fn drop_receive_budget(&self, now: SimTime, topic: &str) -> Option<u32> {
        match &self.config.affect_receive {
            Some(ReceiveFault::Drop(f))
                if f.topic == topic && self.armed(now) && self.action_count < f.drop =>
            {
                Some(f.drop)
            }
            _ => None,
        }
    }

    fn delay_receive_spec(&self, now: SimTime, topic: &str) -> Option<(SimTime, u32)> {
        match &self.config.affect_receive {
            Some(ReceiveFault::Delay(f))
                if f.topic == topic && self.armed(now) && self.action_count < f.count =>
            {
                Some((f.delay, f.count))
            }
            _ => None,
        }
    }

    fn drop_publish_budget(&self, now: SimTime, topic: &str) -> Option<u32> {
        match &self.config.affect_publish {
            Some(PublishFault::Drop(f))
                if f.topic == topic && self.armed(now) && self.action_count < f.drop =>
            {
                Some(f.drop)
            }
            _ => None,
        }
    }

    fn mutate_publish_spec(&self, now: SimTime, topic: &str) -> Option<(i64, u32)> {
        match &self.config.affect_publish {
            Some(PublishFault::Mutate(f))
                if f.topic == topic && self.armed(now) && self.action_count < f.count =>
            {
                Some((f.value, f.count))
            }
            _ => None,
        }
    }

    fn crash_due(&self, now: SimTime) -> bool {
        self.config.crash && self.armed(now)
    }
}

/// A node of the running graph.
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    config: NodeConfig,
    features: FeatureVec,
    message_received: FxHashMap<String, SimTime>,
    pending_faults: VecDeque<FaultState>,
    crashed: bool,
}

impl Node {
    pub fn new(id: NodeId, config: NodeConfig) -> Self {
        let features = FeatureVec::new(&config);
        Self {
            id,
            config,
            features,
            message_received: FxHashMap::default(),
            pending_faults: VecDeque::new(),
            crashed: false,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn features(&self) -> &FeatureVec {
        &self.features
    }

    /// The subscription this node holds on `topic`, if any.
    pub fn subscription(&self, topic: &str) -> Option<&SubscriptionSpec> {
        self.config
            .subscribe
            .iter()
            .flatten()
            .find(|sub| sub.topic == topic)
    }

    /// Appends a fault to this node's pending FIFO, stamping target and time.
    pub fn inject(&mut self, at: SimTime, mut config: FaultConfig) {
        config.inject_to = Some(self.config.name.clone());
        config.inject_at = Some(at);
        tracing::warn!(target: "faults", node = %self.config.name, at, "fault injected");
        self.pending_faults.push_back(FaultState::new(at, config));
    }

    pub fn pending_fault_count(&self) -> usize {
        self.pending_faults.len()
    }

    pub fn is_crashed(&self) -> bool {
        self.crashed
    }

    /// Records a delivered message so watchdogs can observe liveness.
    pub fn receive_message(&mut self, topic: &str, now: SimTime) {
        self.message_received.insert(topic.to_string(), now);
    }

    /// When `topic` last delivered, or `NEVER_RECEIVED`.
    pub fn last_received(&self, topic: &str) -> SimTime {
        self.message_received
            .get(topic)
            .copied()
            .unwrap_or(NEVER_RECEIVED)
    }

    pub fn update_event_feature(&mut self, kind: EventKind, timestamp: SimTime) {
        self.features.record_event(kind, timestamp);
    }

    pub fn update_callback_feature(&mut self, role: CallbackRole) {
        self.features.record_callback(role);
    }

    pub fn record_publish(&mut self) {
        self.features.record_publish();
    }

    // Pure predicates.

    pub fn should_crash(&self, now: SimTime) -> bool {
        self.pending_faults.iter().any(|f| f.crash_due(now))
    }

    pub fn should_drop_loop(&self, now: SimTime) -> bool {
        self.pending_faults
            .iter()
            .any(|f| f.drop_loop_budget(now).is_some())
    }

    pub fn should_delay_loop(&self, now: SimTime) -> Option<SimTime> {
        self.pending_faults
            .iter()
            .find_map(|f| f.delay_loop_spec(now).map(|(delay, _)| delay))
    }

    pub fn should_drop_receive(&self, now: SimTime, topic: &str) -> bool {
        self.pending_faults
            .iter()
            .any(|f| f.drop_receive_budget(now, topic).is_some())
    }

    pub fn should_delay_receive(&self, now: SimTime, topic: &str) -> Option<SimTime> {
        self.pending_faults
            .iter()
            .find_map(|f| f.delay_receive_spec(now, topic).map(|(delay, _)| delay))
    }

    pub fn should_drop_publish(&self, now: SimTime, topic: &str) -> bool {
        self.pending_faults
            .iter()
            .any(|f| f.drop_publish_budget(now, topic).is_some())
    }

    pub fn should_mutate_publish(&self, now: SimTime, topic: &str) -> Option<i64> {
        self.pending_faults
            .iter()
            .find_map(|f| f.mutate_publish_spec(now, topic).map(|(value, _)| value))
    }

    // Acting counterparts: apply the first matching fault and spend budget.

    pub fn maybe_crash(&mut self, now: SimTime) -> bool {
        let due = self
            .pending_faults
            .iter_mut()
            .find_map(|f| {
                if f.crash_due(now) {
                    f.done = true;
                    Some(())
                } else {
                    None
                }
            })
            .is_some();
        if due {
            self.crashed = true;
            self.retire_done();
            tracing::warn!(target: "faults", node = %self.config.name, now, "node crashed");
        }
        due
    }

    pub fn maybe_drop_loop(&mut self, now: SimTime) -> bool {
        let applied = self
            .pending_faults
            .iter_mut()
            .find_map(|f| {
                let limit = f.drop_loop_budget(now)?;
                f.bump(limit);
                Some(())
            })
            .is_some();
        if applied {
            self.retire_done();
            tracing::warn!(target: "faults", node = %self.config.name, now, "dropped loop work");
        }
        applied
    }

    pub fn maybe_delay_loop(&mut self, now: SimTime) -> Option<SimTime> {
        let delay = self.pending_faults.iter_mut().find_map(|f| {
            let (delay, limit) = f.delay_loop_spec(now)?;
            f.bump(limit);
            Some(delay)
        });
        if let Some(delay) = delay {
            self.retire_done();
            tracing::warn!(
                target: "faults",
                node = %self.config.name,
                until = now + delay,
                "delayed loop work"
            );
        }
        delay
    }

    pub fn maybe_drop_receive(&mut self, now: SimTime, topic: &str) -> bool {
        let applied = self
            .pending_faults
            .iter_mut()
            .find_map(|f| {
                let limit = f.drop_receive_budget(now, topic)?;
                f.bump(limit);
                Some(())
            })
            .is_some();
        if applied {
            self.retire_done();
            tracing::warn!(target: "faults", node = %self.config.name, topic, now, "dropped received message");
        }
        applied
    }

    pub fn maybe_delay_receive(&mut self, now: SimTime, topic: &str) -> Option<SimTime> {
        let delay = self.pending_faults.iter_mut().find_map(|f| {
            let (delay, limit) = f.delay_receive_spec(now, topic)?;
            f.bump(limit);
            Some(delay)
        });
        if let Some(delay) = delay {
            self.retire_done();
            tracing::warn!(
                target: "faults",
                node = %self.config.name,
                topic,
                until = now + delay,
                "delayed received message"
            );
        }
        delay
    }

    pub fn maybe_drop_publish(&mut self, now: SimTime, topic: &str) -> bool {
        let applied = self
            .pending_faults
            .iter_mut()
            .find_map(|f| {
                let limit = f.drop_publish_budget(now, topic)?;
                f.bump(limit);
                Some(())
            })
            .is_some();
        if applied {
            self.retire_done();
            tracing::warn!(target: "faults", node = %self.config.name, topic, now, "dropped publish");
        }
        applied
    }

    pub fn maybe_mutate_publish(&mut self, now: SimTime, topic: &str) -> Option<i64> {
        let value = self.pending_faults.iter_mut().find_map(|f| {
            let (value, limit) = f.mutate_publish_spec(now, topic)?;
            f.bump(limit);
            Some(value)
        });
        if let Some(value) = value {
            self.retire_done();
            tracing::warn!(target: "faults", node = %self.config.name, topic, value, now, "mutated publish");
        }
        value
    }

    fn retire_done(&mut self) {
        self.pending_faults.retain(|f| !f.done);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub_node() -> Node {
        let config: NodeConfig = serde_yaml::from_str(
            r#"
name: sink
subscribe:
  - topic: t1
    valid_range: [0, 10]
"#,
        )
        .unwrap();
        Node::new(0, config)
    }

    fn receive_drop(topic: &str, drop: u32) -> FaultConfig {
        FaultConfig {
            affect_receive: Some(ReceiveFault::Drop(DropReceive {
                topic: topic.to_string(),
                drop,
            })),
            ..FaultConfig::default()
        }
    }

    fn receive_delay(topic: &str, delay: SimTime) -> FaultConfig {
        FaultConfig {
            affect_receive: Some(ReceiveFault::Delay(DelayReceive {
                topic: topic.to_string(),
                delay,
                count: 1,
            })),
            ..FaultConfig::default()
        }
    }

    #[test]
    fn last_received_defaults_to_sentinel() {
        let mut node = sub_node();
        assert_eq!(node.last_received("t1"), NEVER_RECEIVED);
        node.receive_message("t1", 0);
        assert_eq!(node.last_received("t1"), 0);
        node.receive_message("t1", 7);
        assert_eq!(node.last_received("t1"), 7);
    }

    #[test]
    fn fault_not_armed_before_inject_time() {
        let mut node = sub_node();
        node.inject(10, receive_drop("t1", 1));
        assert!(!node.should_drop_receive(9, "t1"));
        assert!(!node.maybe_drop_receive(9, "t1"));
        assert!(node.should_drop_receive(10, "t1"));
        assert!(node.maybe_drop_receive(10, "t1"));
    }

    #[test]
    fn drop_budget_is_spent_then_fault_retires() {
        let mut node = sub_node();
        node.inject(0, receive_drop("t1", 2));
        assert!(node.maybe_drop_receive(5, "t1"));
        assert_eq!(node.pending_fault_count(), 1);
        assert!(node.maybe_drop_receive(6, "t1"));
        assert_eq!(node.pending_fault_count(), 0);
        assert!(!node.maybe_drop_receive(7, "t1"));
    }

    #[test]
    fn pure_predicates_do_not_spend_budget() {
        let mut node = sub_node();
        node.inject(0, receive_drop("t1", 1));
        assert!(node.should_drop_receive(5, "t1"));
        assert!(node.should_drop_receive(5, "t1"));
        assert_eq!(node.pending_fault_count(), 1);
        assert!(node.maybe_drop_receive(5, "t1"));
        assert!(!node.should_drop_receive(5, "t1"));
    }

    #[test]
    fn faults_are_honored_in_fifo_order() {
        let mut node = sub_node();
        node.inject(0, receive_delay("t1", 3));
        node.inject(0, receive_delay("t1", 7));
        assert_eq!(node.maybe_delay_receive(1, "t1"), Some(3));
        assert_eq!(node.maybe_delay_receive(2, "t1"), Some(7));
        assert_eq!(node.maybe_delay_receive(3, "t1"), None);
    }

    #[test]
    fn topic_must_match() {
        let mut node = sub_node();
        node.inject(0, receive_drop("t1", 1));
        assert!(!node.maybe_drop_receive(5, "other"));
        assert!(node.maybe_drop_receive(5, "t1"));
    }

    #[test]
    fn crash_fires_once_and_sticks() {
        let mut node = sub_node();
        node.inject(15, FaultConfig {
            crash: true,
            ..FaultConfig::default()
        });
        assert!(!node.should_crash(14));
        assert!(!node.maybe_crash(14));
        assert!(!node.is_crashed());
        assert!(node.maybe_crash(15));
        assert!(node.is_crashed());
        assert_eq!(node.pending_fault_count(), 0);
    }

    #[test]
    fn mutate_applies_value_with_budget() {
        let config: NodeConfig = serde_yaml::from_str(
            r#"
name: source
loop:
  period: 5
  callback:
    type: loop
    publish:
      - {topic: out, value_range: [0, 3]}
"#,
        )
        .unwrap();
        let mut node = Node::new(0, config);
        node.inject(0, FaultConfig {
            affect_publish: Some(PublishFault::Mutate(MutatePublish {
                topic: "out".to_string(),
                value: 99,
                count: 1,
            })),
            ..FaultConfig::default()
        });
        assert_eq!(node.should_mutate_publish(1, "out"), Some(99));
        assert_eq!(node.maybe_mutate_publish(1, "out"), Some(99));
        assert_eq!(node.maybe_mutate_publish(2, "out"), None);
    }
}
