//! # gfsim-engine::sim
//!
//! The `Simulator` is the main entry point and orchestrator: it owns the
//! master clock, the event queue, the wired graph, and the deterministic RNG.
//! The `step` method forms the core of the discrete-event loop; `run` drives
//! it until the queue empties or the clock reaches the stop time.

use crate::{
    events::{Queued, Work},
    graph::Graph,
    output::{OutputError, SnapshotSink},
    prelude::*,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::collections::BinaryHeap;

/// The fixed seed used for dataset generation. Publish values and delivery
/// delays are drawn from one shared stream, so runs with the same graph,
/// fault, and stop time are byte-identical.
pub const DEFAULT_SEED: u64 = 24;

/// What one call to [`Simulator::step`] dispatched.
#[derive(Debug, Clone)]
pub struct Step {
    pub time: SimTime,
    pub node: NodeId,
    pub node_name: String,
    pub work: Work,
    /// False when the event was dropped (crashed node, drop fault) or
    /// requeued by a delay fault. Only executed steps can emit a snapshot.
    pub executed: bool,
}

/// The discrete-event scheduler.
pub struct Simulator {
    graph: Graph,
    queue: BinaryHeap<Queued>,
    clock: SimTime,
    stop_at: SimTime,
    rng: ChaCha20Rng,
    sink: Box<dyn SnapshotSink>,
    last_row: Option<Vec<String>>,
    rows_emitted: u64,
}

impl Simulator {
    /// Creates a simulator with the fixed dataset seed.
    pub fn new(
        graph: Graph,
        stop_at: SimTime,
        fault: Option<FaultConfig>,
        sink: Box<dyn SnapshotSink>,
    ) -> Result<Self, FaultError> {
        Self::with_seed(graph, stop_at, fault, sink, DEFAULT_SEED)
    }

    /// Creates a simulator with an explicit RNG seed. The RNG is owned by the
    /// simulator and shared by every draw, so substituting the seed is the
    /// way tests get a different deterministic stream.
    pub fn with_seed(
        mut graph: Graph,
        stop_at: SimTime,
        fault: Option<FaultConfig>,
        sink: Box<dyn SnapshotSink>,
        seed: u64,
    ) -> Result<Self, FaultError> {
        if let Some(fault) = fault {
            let (target, inject_at) = Self::validate_fault(&graph, &fault, stop_at)?;
            graph.node_mut(target).inject(inject_at, fault);
        }

        let mut seeded = Vec::new();
        for (index, node) in graph.nodes().enumerate() {
            let id = index as NodeId;
            if node.config().r#loop.is_some() {
                seeded.push(Queued {
                    time: SIM_EPOCH,
                    node: id,
                    node_name: node.name().to_string(),
                    work: Work::Loop,
                });
            }
            for sub in node.config().subscribe.iter().flatten() {
                if let Some(watchdog) = sub.watchdog {
                    seeded.push(Queued {
                        time: watchdog,
                        node: id,
                        node_name: node.name().to_string(),
                        work: Work::Watchdog {
                            topic: sub.topic.clone(),
                            last_seen: NEVER_RECEIVED,
                        },
                    });
                }
            }
        }

        Ok(Self {
            graph,
            queue: BinaryHeap::from(seeded),
            clock: SIM_EPOCH - 1,
            stop_at,
            rng: ChaCha20Rng::seed_from_u64(seed),
            sink,
            last_row: None,
            rows_emitted: 0,
        })
    }

    /// Checks a fault scenario against the graph it targets and returns the
    /// resolved `(node index, inject_at)` pair.
    pub fn validate_fault(
        graph: &Graph,
        fault: &FaultConfig,
        stop_at: SimTime,
    ) -> Result<(NodeId, SimTime), FaultError> {
        let target_name = fault.inject_to.as_deref().ok_or(FaultError::MissingTarget)?;
        let inject_at = fault.inject_at.ok_or(FaultError::MissingTarget)?;
        let target = graph
            .node_index(target_name)
            .ok_or_else(|| FaultError::UnknownNode(target_name.to_string()))?;
        if inject_at <= 0 || inject_at >= stop_at {
            return Err(FaultError::InjectTimeOutOfRange { inject_at, stop_at });
        }
        if fault.affect_loop.is_some() && graph.node(target).config().r#loop.is_none() {
            return Err(FaultError::NoLoop(target_name.to_string()));
        }
        if let Some(publish) = &fault.affect_publish {
            if graph.topic_publisher(publish.topic()) != Some(target) {
                return Err(FaultError::NotPublisher {
                    node: target_name.to_string(),
                    topic: publish.topic().to_string(),
                });
            }
        }
        if let Some(receive) = &fault.affect_receive {
            if graph.node(target).subscription(receive.topic()).is_none() {
                return Err(FaultError::NotSubscriber {
                    node: target_name.to_string(),
                    topic: receive.topic().to_string(),
                });
            }
        }
        Ok((target, inject_at))
    }

    /// Runs until the queue empties or the clock reaches the stop time.
    pub fn run(&mut self) -> Result<(), OutputError> {
        while self.step()?.is_some() {}
        self.sink.flush()
    }

    /// Dispatches the earliest event. Returns `None` once the queue is empty
    /// or the stop time is reached (the queue is cleared at that point).
    pub fn step(&mut self) -> Result<Option<Step>, OutputError> {
        let Some(event) = self.queue.pop() else {
            return Ok(None);
        };

        if event.time != self.clock {
            debug_assert!(event.time > self.clock, "time went backwards");
            self.clock = event.time;
            if self.clock >= self.stop_at {
                tracing::info!(target: "events", stop_at = self.stop_at, "time limit reached");
                self.queue.clear();
                return Ok(None);
            }
            tracing::trace!(target: "events", time = self.clock, "clock advanced");
        }
        let now = self.clock;

        let node = self.graph.node_mut(event.node);
        if node.is_crashed() || node.maybe_crash(now) {
            tracing::debug!(target: "events", node = %event.node_name, "event dropped, node is down");
            return Ok(Some(Step {
                time: now,
                node: event.node,
                node_name: event.node_name,
                work: event.work,
                executed: false,
            }));
        }

        let executed = match &event.work {
            Work::Loop => self.dispatch_loop(event.node),
            Work::Subscription { topic, data } => {
                self.dispatch_subscription(event.node, topic, *data)
            }
            Work::Watchdog { topic, last_seen } => {
                self.dispatch_watchdog(event.node, topic, *last_seen)
            }
        };

        if executed {
            self.emit_snapshot()?;
        }

        Ok(Some(Step {
            time: now,
            node: event.node,
            node_name: event.node_name,
            work: event.work,
            executed,
        }))
    }

    pub fn now(&self) -> SimTime {
        self.clock
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Number of snapshot rows emitted so far.
    pub fn rows_emitted(&self) -> u64 {
        self.rows_emitted
    }

    fn dispatch_loop(&mut self, id: NodeId) -> bool {
        let now = self.clock;
        let (period, callback) = {
            let node = self.graph.node(id);
            let lp = node
                .config()
                .r#loop
                .as_ref()
                .expect("loop event on a node without a loop");
            (lp.period, lp.callback.clone())
        };

        if let Some(delay) = self.graph.node_mut(id).maybe_delay_loop(now) {
            // The whole round runs late; the next tick follows from the
            // delayed execution, not from this slot.
            self.schedule(now + delay, id, Work::Loop);
            return false;
        }
        if self.graph.node_mut(id).maybe_drop_loop(now) {
            self.schedule(now + period, id, Work::Loop);
            return false;
        }
        self.schedule(now + period, id, Work::Loop);

        let node = self.graph.node_mut(id);
        node.update_event_feature(EventKind::Loop, now);
        node.update_callback_feature(callback.role);
        tracing::debug!(target: "events", node = %self.graph.node(id).name(), time = now, "loop callback");
        self.execute_callback(id, &callback);
        true
    }

    fn dispatch_subscription(&mut self, id: NodeId, topic: &str, data: i64) -> bool {
        let now = self.clock;
        if self.graph.node_mut(id).maybe_drop_receive(now, topic) {
            return false;
        }
        if let Some(delay) = self.graph.node_mut(id).maybe_delay_receive(now, topic) {
            self.schedule(
                now + delay,
                id,
                Work::Subscription {
                    topic: topic.to_string(),
                    data,
                },
            );
            return false;
        }

        let (valid, callback) = {
            let node = self.graph.node_mut(id);
            node.receive_message(topic, now);
            node.update_event_feature(EventKind::Subscription, now);
            let sub = node
                .subscription(topic)
                .expect("subscription event for an unknown topic");
            let (lo, hi) = sub.valid_range;
            let valid = lo <= data && data <= hi;
            let callback = if valid {
                sub.nominal_callback
                    .clone()
                    .unwrap_or_else(|| CallbackSpec::noop(CallbackRole::Nominal))
            } else {
                sub.invalid_input_callback
                    .clone()
                    .unwrap_or_else(|| CallbackSpec::noop(CallbackRole::Invalid))
            };
            node.update_callback_feature(callback.role);
            (valid, callback)
        };
        tracing::debug!(
            target: "events",
            node = %self.graph.node(id).name(),
            topic,
            data,
            valid,
            time = now,
            "subscription callback"
        );
        self.execute_callback(id, &callback);
        true
    }

    fn dispatch_watchdog(&mut self, id: NodeId, topic: &str, last_seen: SimTime) -> bool {
        let now = self.clock;
        let (watchdog, lost_callback, last) = {
            let node = self.graph.node(id);
            let sub = node
                .subscription(topic)
                .expect("watchdog event for an unknown topic");
            let watchdog = sub
                .watchdog
                .expect("watchdog event for a subscription without a watchdog");
            (watchdog, sub.lost_input_callback.clone(), node.last_received(topic))
        };

        if last == last_seen {
            // Nothing arrived in the window.
            let callback =
                lost_callback.unwrap_or_else(|| CallbackSpec::noop(CallbackRole::Lost));
            self.graph.node_mut(id).update_callback_feature(callback.role);
            tracing::debug!(
                target: "events",
                node = %self.graph.node(id).name(),
                topic,
                last_seen,
                time = now,
                "watchdog expired, lost-input callback"
            );
            self.execute_callback(id, &callback);
            self.schedule(
                now + watchdog,
                id,
                Work::Watchdog {
                    topic: topic.to_string(),
                    last_seen,
                },
            );
        } else {
            self.schedule(
                now + watchdog,
                id,
                Work::Watchdog {
                    topic: topic.to_string(),
                    last_seen: last,
                },
            );
        }
        true
    }

    /// Runs a callback on behalf of `id`: executes its publishes (fanning out
    /// one subscription event per subscriber) and applies its inline fault to
    /// the executing node itself.
    ///
    /// Draw order is part of the contract: per publish, first the value, then
    /// one delivery delay per subscriber in registration order.
    fn execute_callback(&mut self, id: NodeId, callback: &CallbackSpec) {
        for publish in &callback.publish {
            let drawn = self.draw(publish.value_range);
            if self
                .graph
                .node_mut(id)
                .maybe_drop_publish(self.clock, &publish.topic)
            {
                continue;
            }
            let value = self
                .graph
                .node_mut(id)
                .maybe_mutate_publish(self.clock, &publish.topic)
                .unwrap_or(drawn);
            self.graph.node_mut(id).record_publish();

            let subscribers: Vec<NodeId> =
                self.graph.topic_subscribers(&publish.topic).to_vec();
            for subscriber in subscribers {
                let delay = self.draw(publish.delay_range);
                tracing::trace!(
                    target: "events",
                    from = %self.graph.node(id).name(),
                    to = %self.graph.node(subscriber).name(),
                    topic = %publish.topic,
                    value,
                    at = self.clock + delay,
                    "publish"
                );
                self.schedule(
                    self.clock + delay,
                    subscriber,
                    Work::Subscription {
                        topic: publish.topic.clone(),
                        data: value,
                    },
                );
            }
        }

        if let Some(fault) = &callback.fault {
            // Self-injection: the fault lands on the executing node, armed
            // from the current instant.
            self.graph.node_mut(id).inject(self.clock, fault.clone());
        }
    }

    fn schedule(&mut self, time: SimTime, node: NodeId, work: Work) {
        let node_name = self.graph.node(node).name().to_string();
        self.queue.push(Queued {
            time,
            node,
            node_name,
            work,
        });
    }

    fn draw(&mut self, (lo, hi): IntRange) -> i64 {
        if lo >= hi {
            lo
        } else {
            self.rng.gen_range(lo..=hi)
        }
    }

    fn emit_snapshot(&mut self) -> Result<(), OutputError> {
        let mut row = Vec::with_capacity(self.graph.len() * FEATURE_WIDTH);
        for node in self.graph.nodes() {
            node.features().flatten_into(&mut row);
        }
        if self.last_row.as_ref() == Some(&row) {
            return Ok(());
        }
        self.sink.append(&row)?;
        self.last_row = Some(row);
        self.rows_emitted += 1;
        Ok(())
    }
}
