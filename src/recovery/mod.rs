//! Failure Recovery Module
//!
//! Wraps the router in a bounded retry loop. A node that fails its health check
//! is evicted, torn down, and replaced with a freshly provisioned one before the
//! request is retried against the rebuilt ring.
//!
//! ## Attempt budget
//! The budget is the cluster size when the request arrives, so a request never
//! loops longer than it would take to try every node once.

pub mod service;
pub mod types;
