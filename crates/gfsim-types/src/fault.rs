//! # gfsim-types::fault
//!
//! Fault scenario records. A `FaultConfig` targets one node and sets at most
//! one variant per axis (publish / receive / loop / crash). The axis variants
//! are distinguished structurally: each is a strict struct, and the enums are
//! untagged so `{topic, drop}` and `{topic, value}` select different variants
//! without an explicit tag in the config file.

use crate::time::SimTime;
use serde::{Deserialize, Serialize};

fn default_count() -> u32 {
    1
}

/// Drop the next `drop` publishes to `topic`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DropPublish {
    pub topic: String,
    pub drop: u32,
}

/// Replace the published value on `topic` with `value`, `count` times.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MutatePublish {
    pub topic: String,
    pub value: i64,
    #[serde(default = "default_count")]
    pub count: u32,
}

/// Drop the next `drop` messages received from `topic`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DropReceive {
    pub topic: String,
    pub drop: u32,
}

/// Postpone a received message from `topic` by `delay` ticks, `count` times.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DelayReceive {
    pub topic: String,
    pub delay: SimTime,
    #[serde(default = "default_count")]
    pub count: u32,
}

/// Postpone loop work by `delay` ticks, `count` times. The delayed work runs
/// late and subsequent ticks follow from the delayed execution time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DelayLoop {
    pub delay: SimTime,
    #[serde(default = "default_count")]
    pub count: u32,
}

/// Drop the next `drop` rounds of loop work. Subsequent ticks keep the
/// nominal phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DropLoop {
    pub drop: u32,
}

/// The publish-axis variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PublishFault {
    Drop(DropPublish),
    Mutate(MutatePublish),
}

impl PublishFault {
    pub fn topic(&self) -> &str {
        match self {
            PublishFault::Drop(f) => &f.topic,
            PublishFault::Mutate(f) => &f.topic,
        }
    }
}

/// The receive-axis variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReceiveFault {
    Drop(DropReceive),
    Delay(DelayReceive),
}

impl ReceiveFault {
    pub fn topic(&self) -> &str {
        match self {
            ReceiveFault::Drop(f) => &f.topic,
            ReceiveFault::Delay(f) => &f.topic,
        }
    }
}

/// The loop-axis variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LoopFault {
    Drop(DropLoop),
    Delay(DelayLoop),
}

/// A complete fault scenario: which node to perturb, when, and how.
///
/// `inject_to` and `inject_at` are optional in the record because faults
/// carried inline on a callback have both stamped at execution time. A fault
/// loaded as a top-level scenario must carry both; the simulator rejects it
/// otherwise.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FaultConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inject_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inject_at: Option<SimTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affect_publish: Option<PublishFault>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affect_receive: Option<ReceiveFault>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affect_loop: Option<LoopFault>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub crash: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_publish_variant_structurally() {
        let fault: PublishFault =
            serde_yaml::from_str("{topic: t1, drop: 2}").unwrap();
        assert!(matches!(fault, PublishFault::Drop(ref f) if f.drop == 2));

        let fault: PublishFault =
            serde_yaml::from_str("{topic: t1, value: 99}").unwrap();
        match fault {
            PublishFault::Mutate(f) => {
                assert_eq!(f.value, 99);
                assert_eq!(f.count, 1);
            }
            other => panic!("expected mutate, got {other:?}"),
        }
    }

    #[test]
    fn selects_loop_variant_structurally() {
        let fault: LoopFault = serde_yaml::from_str("{delay: 7, count: 2}").unwrap();
        assert!(matches!(fault, LoopFault::Delay(ref f) if f.delay == 7 && f.count == 2));

        let fault: LoopFault = serde_yaml::from_str("{drop: 3}").unwrap();
        assert!(matches!(fault, LoopFault::Drop(ref f) if f.drop == 3));
    }

    #[test]
    fn parses_full_fault_config() {
        let yaml = r#"
inject_to: sensor
inject_at: 20
affect_receive:
  topic: readings
  delay: 7
"#;
        let fault: FaultConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(fault.inject_to.as_deref(), Some("sensor"));
        assert_eq!(fault.inject_at, Some(20));
        assert!(matches!(
            fault.affect_receive,
            Some(ReceiveFault::Delay(ref f)) if f.delay == 7 && f.count == 1
        ));
        assert!(!fault.crash);
    }

    #[test]
    fn rejects_unknown_fields() {
        let res: Result<FaultConfig, _> =
            serde_yaml::from_str("{inject_to: a, inject_at: 5, severity: high}");
        assert!(res.is_err());
    }

    #[test]
    fn inline_fault_needs_no_target() {
        let fault: FaultConfig = serde_yaml::from_str("{crash: true}").unwrap();
        assert!(fault.crash);
        assert!(fault.inject_to.is_none());
        assert!(fault.inject_at.is_none());
    }
}
