//! adaptquiz-core — Adaptive assessment engine, collaborator traits, and session model.
//!
//! This crate holds the per-attempt state machine (answer history, difficulty
//! hysteresis, trend analysis), the behavior and mistake views fed by external
//! analytics services, and the traits those services implement.

pub mod behavior;
pub mod difficulty;
pub mod engine;
pub mod error;
pub mod mistakes;
pub mod model;
pub mod policy;
pub mod registry;
pub mod remediation;
pub mod report;
pub mod statistics;
pub mod tracker;
pub mod traits;
pub mod trend;
