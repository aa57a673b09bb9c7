//! Analysis of learned tables
//!
//! Views computed from a read-only table snapshot, never from the live
//! table of a training agent.

pub mod policy_map;

pub use policy_map::{PolicyCell, PolicyMap, PolicyMetric};
