//! HTTP request handlers for the REST API.

pub mod job;
pub mod sequence;
