//! HTTP/REST API layer for Sequor.
//!
//! Axum-based REST API at `/api/v1/` with envelope response format and
//! CORS support. Job starts are asynchronous: the endpoints hand back 202
//! and the job is followed through snapshots.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
