//! Cluster Membership Module
//!
//! Owns the list of backend nodes and keeps the hash ring in step with it.
//!
//! ## Core Mechanisms
//! - **Snapshots**: readers receive an immutable `ClusterView` (members + ring).
//!   A change builds a new view and swaps it in; in-flight readers keep the old one.
//! - **Mutual exclusion**: every add/remove/evict/replace commits under one lock,
//!   so the member list and its ring can never disagree.
//! - **Validation first**: malformed requests are rejected before anything is
//!   provisioned or torn down; provisioning failures are reported, not fatal.

pub mod service;
pub mod types;

#[cfg(test)]
mod tests;
