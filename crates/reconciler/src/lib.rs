//! Idempotent reconciliation of VPC peering relationships.
//!
//! This crate keeps a logical peering between two VPCs, possibly in
//! different accounts and regions, in line with an eventually-consistent
//! remote networking API:
//!
//! - **Fetch**: find an existing connection, searching both directions
//! - **Provision**: request + accept, deleting the request again when the
//!   accept is rejected
//! - **Destroy**: delete whatever fetch finds, or do nothing
//!
//! # Key Concepts
//!
//! ## Gateways
//!
//! The remote API is reached through a [`GatewayDirectory`] that hands out
//! one [`Gateway`] per (account, region). [`InMemoryNetwork`] implements both
//! for tests and dry runs.
//!
//! ## Relationships
//!
//! A [`PeeringRelationship`] is an unordered pair: `(A, B)` and `(B, A)`
//! compare and hash equal, so a driver can deduplicate pairs discovered from
//! either side.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use peering_core::VpcRef;
//! use peering_reconciler::{InMemoryNetwork, PeeringAction, PeeringRelationship};
//!
//! #[tokio::main]
//! async fn main() -> peering_core::Result<()> {
//!     let a = VpcRef::new("vpc-a", "111111111111", "eu-west-1");
//!     let b = VpcRef::new("vpc-b", "222222222222", "us-east-1");
//!     let network = InMemoryNetwork::builder().vpc(a.clone()).vpc(b.clone()).build();
//!
//!     let relationship = PeeringRelationship::new(Arc::new(network), (a, b));
//!     relationship.perform("provision".parse::<PeeringAction>()?).await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod config;
pub mod gateway;
pub mod memory;
pub mod observer;
pub mod relationship;
pub mod types;
pub mod waiter;

// Re-export main types
pub use config::{AcceptWaitPolicy, ReconcilerConfig};
pub use gateway::{Gateway, GatewayDirectory, RemotePeeringConnection};
pub use memory::{InMemoryGateway, InMemoryNetwork, InMemoryNetworkBuilder, Operation};
pub use observer::{Checkpoint, ReconcileObserver, RecordingObserver, TracingObserver};
pub use relationship::{PeeringRelationship, PeeringRelationshipBuilder};
pub use types::{ActionOutcome, DestroyOutcome, PeeringAction, ProvisionOutcome};
pub use waiter::{WaitCondition, Waiter};
