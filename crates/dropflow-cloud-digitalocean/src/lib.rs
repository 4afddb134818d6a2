//! DigitalOcean provider for dropflow
//!
//! Implements [`dropflow_cloud::CloudClient`] over the DigitalOcean v2 REST
//! API using bearer-token authentication.
//!
//! # Example
//!
//! ```ignore
//! use dropflow_cloud::CloudClient;
//! use dropflow_cloud_digitalocean::DigitalOceanClient;
//!
//! let client = DigitalOceanClient::new(token)?;
//!
//! let instances = client.list_instances_by_tag("DO-MinecraftServer").await?;
//! let records = client
//!     .list_dns_records("example.com", "mc.example.com", "A")
//!     .await?;
//! ```

mod api;
pub mod client;

pub use client::{DEFAULT_API_BASE, DigitalOceanClient};
