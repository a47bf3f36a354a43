//! # gfsim-engine::events
//!
//! Defines the work kinds a node can be dispatched and the `Queued` wrapper
//! stored in the simulator's priority queue. Equally timestamped events are
//! ordered by `(work priority, node name, topic)` — this tie-break is part of
//! the public contract and is what makes simulations reproducible.

use crate::prelude::*;
use std::cmp::Ordering;

/// A unit of work dispatched to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Work {
    /// A round of the node's periodic loop.
    Loop,
    /// Delivery of a published value on a subscribed topic.
    Subscription { topic: String, data: i64 },
    /// A liveness check on a subscription. `last_seen` is the last-received
    /// timestamp known when the watchdog was armed.
    Watchdog { topic: String, last_seen: SimTime },
}

impl Work {
    /// Tie-break priority among equally timestamped events.
    pub fn priority(&self) -> u8 {
        match self {
            Work::Loop => 0,
            Work::Subscription { .. } => 1,
            Work::Watchdog { .. } => 2,
        }
    }

    /// The topic this work concerns, if any.
    pub fn topic(&self) -> Option<&str> {
        match self {
            Work::Loop => None,
            Work::Subscription { topic, .. } | Work::Watchdog { topic, .. } => Some(topic),
        }
    }
}

/// A scheduled event: the type stored in the simulator's priority queue.
/// Carries the target node's name because the name participates in the
/// ordering contract.
#[derive(Debug, Clone)]
pub struct Queued {
    pub time: SimTime,
    pub node: NodeId,
    pub node_name: String,
    pub work: Work,
}

impl Queued {
    fn key(&self) -> (SimTime, u8, &str, &str) {
        (
            self.time,
            self.work.priority(),
            &self.node_name,
            self.work.topic().unwrap_or(""),
        )
    }
}

// `BinaryHeap` is a max-heap; the ordering is reversed to make it pop the
// earliest event first.

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;

    fn queued(time: SimTime, name: &str, work: Work) -> Queued {
        Queued {
            time,
            node: 0,
            node_name: name.to_string(),
            work,
        }
    }

    fn sub(topic: &str) -> Work {
        Work::Subscription {
            topic: topic.to_string(),
            data: 0,
        }
    }

    #[test]
    fn pops_earliest_timestamp_first() {
        let mut heap = BinaryHeap::new();
        heap.push(queued(30, "a", Work::Loop));
        heap.push(queued(10, "a", Work::Loop));
        heap.push(queued(20, "a", Work::Loop));
        let times: Vec<SimTime> = std::iter::from_fn(|| heap.pop().map(|q| q.time)).collect();
        assert_eq!(times, [10, 20, 30]);
    }

    #[test]
    fn ties_break_by_work_priority() {
        let mut heap = BinaryHeap::new();
        heap.push(queued(5, "a", Work::Watchdog { topic: "t".into(), last_seen: -1 }));
        heap.push(queued(5, "a", sub("t")));
        heap.push(queued(5, "a", Work::Loop));
        let prios: Vec<u8> =
            std::iter::from_fn(|| heap.pop().map(|q| q.work.priority())).collect();
        assert_eq!(prios, [0, 1, 2]);
    }

    #[test]
    fn ties_break_by_node_name_then_topic() {
        let mut heap = BinaryHeap::new();
        heap.push(queued(5, "beta", sub("t1")));
        heap.push(queued(5, "alpha", sub("t2")));
        heap.push(queued(5, "alpha", sub("t1")));
        let order: Vec<(String, String)> = std::iter::from_fn(|| {
            heap.pop()
                .map(|q| (q.node_name.clone(), q.work.topic().unwrap().to_string()))
        })
        .collect();
        assert_eq!(
            order,
            [
                ("alpha".to_string(), "t1".to_string()),
                ("alpha".to_string(), "t2".to_string()),
                ("beta".to_string(), "t1".to_string()),
            ]
        );
    }
}
