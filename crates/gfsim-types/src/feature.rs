//! # gfsim-types::feature
//!
//! The fixed per-node feature schema. Every node carries one vector of
//! identical width; the concatenation of all vectors (in graph declaration
//! order) forms one training-data row. The static descriptor (name plus
//! wiring counts) and the numeric dynamic fields are stored separately and
//! joined on write.

use crate::{
    config::{CallbackRole, NodeConfig},
    time::SimTime,
};

/// Column of each field within a node's flattened feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum FeatureIndex {
    NodeName = 0,
    NumSubscriptions = 1,
    NumPublications = 2,
    LoopPeriod = 3,
    LastEventTimestamp = 4,
    LastEventType = 5,
    CallbackType = 6,
    LoopCount = 7,
    SubscriptionTotalCount = 8,
    PublishCount = 9,
}

/// Width of one node's feature vector.
pub const FEATURE_WIDTH: usize = 10;

/// The kind of scheduler event a node last processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Loop,
    Subscription,
}

impl EventKind {
    /// Integer written into the `LastEventType` column.
    pub fn encoding(self) -> i64 {
        match self {
            EventKind::Loop => 2,
            EventKind::Subscription => 3,
        }
    }
}

impl CallbackRole {
    /// Integer written into the `CallbackType` column.
    pub fn encoding(self) -> i64 {
        match self {
            CallbackRole::Nominal => 2,
            CallbackRole::Invalid => 3,
            CallbackRole::Lost => 4,
            CallbackRole::Loop => 5,
        }
    }
}

/// One node's feature vector.
///
/// Every dynamic field initializes to 1. This is an intentional encoding
/// choice (1 means "nothing observed yet", real encodings start at 2 and
/// counters count from 1), not a tally of real events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureVec {
    name: String,
    num_subscriptions: i64,
    num_publications: i64,
    loop_period: i64,
    last_event_timestamp: i64,
    last_event_type: i64,
    callback_type: i64,
    loop_count: i64,
    subscription_total_count: i64,
    publish_count: i64,
}

impl FeatureVec {
    /// Builds the vector for a node, filling the static descriptor from its
    /// config.
    pub fn new(config: &NodeConfig) -> Self {
        Self {
            name: config.name.clone(),
            num_subscriptions: config
                .subscribe
                .as_ref()
                .map_or(0, |subs| subs.len() as i64),
            num_publications: config.publication_count() as i64,
            loop_period: config.r#loop.as_ref().map_or(0, |lp| lp.period),
            last_event_timestamp: 1,
            last_event_type: 1,
            callback_type: 1,
            loop_count: 1,
            subscription_total_count: 1,
            publish_count: 1,
        }
    }

    /// Records a dispatched loop or subscription event.
    pub fn record_event(&mut self, kind: EventKind, timestamp: SimTime) {
        self.last_event_timestamp = timestamp;
        self.last_event_type = kind.encoding();
        match kind {
            EventKind::Loop => self.loop_count += 1,
            EventKind::Subscription => self.subscription_total_count += 1,
        }
    }

    /// Records which callback role ran last.
    pub fn record_callback(&mut self, role: CallbackRole) {
        self.callback_type = role.encoding();
    }

    /// Records an executed (non-dropped) publish.
    pub fn record_publish(&mut self) {
        self.publish_count += 1;
    }

    /// Appends the vector's `FEATURE_WIDTH` cells to a row, in
    /// `FeatureIndex` order.
    pub fn flatten_into(&self, row: &mut Vec<String>) {
        row.push(self.name.clone());
        for value in [
            self.num_subscriptions,
            self.num_publications,
            self.loop_period,
            self.last_event_timestamp,
            self.last_event_type,
            self.callback_type,
            self.loop_count,
            self.subscription_total_count,
            self.publish_count,
        ] {
            row.push(value.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loop_config() -> NodeConfig {
        serde_yaml::from_str(
            r#"
name: pump
loop:
  period: 4
  callback:
    type: loop
    publish:
      - {topic: flow, value_range: [0, 5]}
subscribe:
  - topic: pressure
    valid_range: [0, 10]
    nominal_callback:
      type: nominal
      publish:
        - {topic: ack, value_range: [1, 1]}
"#,
        )
        .unwrap()
    }

    #[test]
    fn flattened_width_matches_schema() {
        let features = FeatureVec::new(&loop_config());
        let mut row = Vec::new();
        features.flatten_into(&mut row);
        assert_eq!(row.len(), FEATURE_WIDTH);
        assert_eq!(row[FeatureIndex::NodeName as usize], "pump");
        assert_eq!(row[FeatureIndex::NumSubscriptions as usize], "1");
        assert_eq!(row[FeatureIndex::NumPublications as usize], "2");
        assert_eq!(row[FeatureIndex::LoopPeriod as usize], "4");
    }

    #[test]
    fn dynamic_fields_initialize_to_one() {
        let features = FeatureVec::new(&loop_config());
        let mut row = Vec::new();
        features.flatten_into(&mut row);
        for idx in [
            FeatureIndex::LastEventTimestamp,
            FeatureIndex::LastEventType,
            FeatureIndex::CallbackType,
            FeatureIndex::LoopCount,
            FeatureIndex::SubscriptionTotalCount,
            FeatureIndex::PublishCount,
        ] {
            assert_eq!(row[idx as usize], "1");
        }
    }

    #[test]
    fn record_event_updates_type_timestamp_and_counter() {
        let mut features = FeatureVec::new(&loop_config());
        features.record_event(EventKind::Loop, 12);
        features.record_event(EventKind::Subscription, 14);
        let mut row = Vec::new();
        features.flatten_into(&mut row);
        assert_eq!(row[FeatureIndex::LastEventTimestamp as usize], "14");
        assert_eq!(row[FeatureIndex::LastEventType as usize], "3");
        assert_eq!(row[FeatureIndex::LoopCount as usize], "2");
        assert_eq!(row[FeatureIndex::SubscriptionTotalCount as usize], "2");
    }

    #[test]
    fn callback_encodings() {
        assert_eq!(CallbackRole::Nominal.encoding(), 2);
        assert_eq!(CallbackRole::Invalid.encoding(), 3);
        assert_eq!(CallbackRole::Lost.encoding(), 4);
        assert_eq!(CallbackRole::Loop.encoding(), 5);
        assert_eq!(EventKind::Loop.encoding(), 2);
        assert_eq!(EventKind::Subscription.encoding(), 3);
    }
}
