//! Remote operation service adapters.
//!
//! `HttpOperationClient` implements the engine's `OperationClient` trait
//! against the adversary-emulation service's REST API.

pub mod http;
mod wire;

pub use http::HttpOperationClient;
