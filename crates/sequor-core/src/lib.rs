//! Campaign sequencing engine core for Sequor.
//!
//! This crate is the "brain" of the engine:
//! - `sequence` -- YAML parsing, validation, filesystem load/save/discover
//! - `fact` -- glob-based fact filtering between steps
//! - `policy` -- pure failure-recovery decision function and backoff schedule
//! - `client` -- the remote operation service trait (implemented in
//!   `sequor-infra`)
//! - `executor` -- drives one step through its attempt loop
//! - `runner` -- the per-job state machine
//! - `registry` -- concurrent job tracking with cancel/retry
//! - `event` -- broadcast bus for engine lifecycle events
//!
//! It depends only on `sequor-types` -- never on `sequor-infra` or any
//! HTTP/IO crate beyond tokio primitives.

pub mod client;
pub mod event;
pub mod executor;
pub mod fact;
pub mod policy;
pub mod registry;
pub mod runner;
pub mod sequence;
