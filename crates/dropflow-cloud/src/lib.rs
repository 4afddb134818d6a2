//! dropflow cloud resources
//!
//! Provider-neutral view of the three resources the lifecycle touches: one
//! compute instance, one persistent volume and one DNS "A" record.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 dropflow-lifecycle               │
//! │              (start / stop / poll)               │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                 dropflow-cloud                   │
//! │  trait CloudClient { ... }                       │
//! │  trait ConnectivityProbe { ... }                 │
//! │  ServerInstance / Volume / DnsRecord             │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//!         ┌─────────▼──────────────┐
//!         │ dropflow-cloud-        │
//!         │ digitalocean (REST v2) │
//!         └────────────────────────┘
//! ```
//!
//! Every response is decoded into the typed records of [`model`] at the
//! client boundary, so callers never see raw JSON.

pub mod error;
pub mod model;
pub mod provider;

pub use error::{CloudError, Result};
pub use model::{
    CreateInstance, DnsRecord, InstanceStatus, ServerInstance, Volume, VolumeAction,
    VolumeActionKind,
};
pub use provider::{CloudClient, ConnectivityProbe};
