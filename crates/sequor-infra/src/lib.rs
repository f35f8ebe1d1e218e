//! Infrastructure adapters for Sequor.
//!
//! Everything here touches the outside world: the remote operation service's
//! REST API and the on-disk configuration. The engine core stays free of
//! HTTP and filesystem concerns; this crate plugs into its traits.

pub mod config;
pub mod remote;
