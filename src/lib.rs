//! Consistent-Hashing Load Balancer Library
//!
//! This library crate holds everything the `hashring_lb` and `backend` binaries
//! are built from.
//!
//! ## Architecture Modules
//! - **`ring`**: The slot-array hash ring. Places `K` virtual nodes per server with
//!   pluggable hash strategies and linear or quadratic probing, and maps request keys
//!   to servers.
//! - **`membership`**: The single owner of the server list. Validates and applies
//!   scale-up/scale-down requests and hands out immutable membership + ring snapshots.
//! - **`provisioner`**: The capability used to create, destroy and health-check backend
//!   nodes (local child processes or externally managed hosts).
//! - **`router`**: One routing attempt: lookup, health check, dispatch.
//! - **`recovery`**: Bounded retry loop that evicts dead nodes and provisions replacements.
//! - **`balancer`**: The public HTTP API (`/rep`, `/add`, `/rm`, `/home`).
//! - **`backend`**: The minimal server the balancer fronts.
//! - **`config`**: Command-line and environment configuration.

pub mod backend;
pub mod balancer;
pub mod config;
pub mod membership;
pub mod provisioner;
pub mod recovery;
pub mod ring;
pub mod router;

#[cfg(test)]
mod test_support;
