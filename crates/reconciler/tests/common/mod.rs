//! Shared fixtures for reconciler integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use peering_core::{Result, VpcRef};
use peering_reconciler::{
    AcceptWaitPolicy, InMemoryNetwork, PeeringRelationship, ReconcilerConfig,
};
use tracing_subscriber::EnvFilter;

/// Route reconciler logs to the test writer once per binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// VPC in the first account, Ireland.
pub fn vpc_a() -> VpcRef {
    VpcRef::new("vpc-0aaa", "111111111111", "eu-west-1")
}

/// VPC in the second account, Virginia.
pub fn vpc_b() -> VpcRef {
    VpcRef::new("vpc-0bbb", "222222222222", "us-east-1")
}

/// Network knowing both VPCs, with the given visibility lag.
pub fn network_with_lag(lag: u32) -> InMemoryNetwork {
    InMemoryNetwork::builder()
        .vpc(vpc_a())
        .vpc(vpc_b())
        .visibility_lag(lag)
        .build()
}

/// Wait policy that polls every millisecond.
pub fn fast_wait(max_attempts: u32) -> ReconcilerConfig {
    ReconcilerConfig::with_accept_wait(AcceptWaitPolicy::bounded(
        Duration::from_millis(1),
        max_attempts,
    ))
}

/// Relationship over `network` between `vpc1` and `vpc2`.
pub fn relationship(
    network: &InMemoryNetwork,
    vpc1: VpcRef,
    vpc2: VpcRef,
    config: ReconcilerConfig,
) -> Result<PeeringRelationship> {
    PeeringRelationship::builder()
        .with_gateways(Arc::new(network.clone()))
        .between(vpc1, vpc2)
        .with_config(config)
        .build()
}
