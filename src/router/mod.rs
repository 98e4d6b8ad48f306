//! Request Routing Module
//!
//! One routing attempt: hash the request key onto the current ring snapshot,
//! health-check the owning node, and forward the request if it is alive. The
//! attempt never mutates membership; it only reports what it found so the
//! recovery loop can act on it.

pub mod service;
pub mod types;
