//! # peering-core
//!
//! Core types and errors for VPC peering reconciliation.
//!
//! - [`VpcRef`] identifies a VPC by id, owning account and region.
//! - [`PeeringConnection`] is a snapshot of a remote peering connection.
//! - [`PeeringFilter`] is the query shape used to search for connections.
//! - [`Error`] classifies failures so callers can tell compensable remote
//!   rejections from fatal ones.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod result;
pub mod types;

pub use error::Error;
pub use result::{Result, ResultExt};
pub use types::{
    AccountId, PeeringConnection, PeeringConnectionId, PeeringFilter, PeeringStatus, Region,
    VpcId, VpcRef,
};
