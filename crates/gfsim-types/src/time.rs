//! # gfsim-types::time
//!
//! The representation of time within the simulation. Time is a unit-less
//! logical clock: events carry integer timestamps and the clock only moves
//! when an event with a later timestamp is dispatched.

/// The fundamental unit of simulation time, in logical ticks.
/// Signed so that "before the epoch" sentinels stay representable.
pub type SimTime = i64;

/// The start of simulation time.
pub const SIM_EPOCH: SimTime = 0;

/// Sentinel carried by a watchdog that has never observed a message on its
/// topic. Distinct from `SIM_EPOCH` so a message received at t=0 is
/// distinguishable from no message at all.
pub const NEVER_RECEIVED: SimTime = -1;
