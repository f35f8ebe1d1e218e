//! Shared domain types for Sequor.
//!
//! This crate contains the core domain types used across the campaign
//! sequencing engine: sequence definitions, facts, jobs, engine events,
//! configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod event;
pub mod fact;
pub mod job;
pub mod sequence;
