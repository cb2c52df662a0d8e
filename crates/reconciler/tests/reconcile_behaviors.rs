//! Behavior tests for peering reconciliation against the in-memory network.
//!
//! Behaviors verified:
//! - Fetch is read-only and finds a connection from either ordering
//! - Provision leaves exactly one accepted connection between the pair
//! - Provision over an existing connection rolls its own request back
//! - Destroy is idempotent and undoes provision
//! - The existence wait policy decides how visibility lag is handled

mod common;

use common::{fast_wait, init_tracing, network_with_lag, relationship, vpc_a, vpc_b};
use peering_core::{Error, PeeringStatus, Result, VpcRef};
use peering_reconciler::{
    AcceptWaitPolicy, ActionOutcome, DestroyOutcome, Operation, PeeringAction, ProvisionOutcome,
    ReconcilerConfig,
};

fn sides(requester: &VpcRef, accepter: &VpcRef) -> Vec<String> {
    let mut ids = vec![requester.id.to_string(), accepter.id.to_string()];
    ids.sort();
    ids
}

// ==========================================================================
// FETCH
// ==========================================================================

#[tokio::test]
async fn fetch_is_idempotent() -> Result<()> {
    init_tracing();
    let network = network_with_lag(0);
    network
        .seed_connection(vpc_a(), vpc_b(), PeeringStatus::Active)
        .await;
    let rel = relationship(&network, vpc_a(), vpc_b(), fast_wait(5))?;

    let first = rel.fetch().await?;
    let second = rel.fetch().await?;

    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(network.call_count(Operation::Delete).await, 0);
    assert_eq!(network.call_count(Operation::Accept).await, 0);
    Ok(())
}

#[tokio::test]
async fn fetch_finds_connection_from_both_orderings() -> Result<()> {
    init_tracing();
    let network = network_with_lag(0);
    // vpc_a accepts, vpc_b requested
    let existing = network
        .seed_connection(vpc_b(), vpc_a(), PeeringStatus::Active)
        .await;

    let ab = relationship(&network, vpc_a(), vpc_b(), fast_wait(5))?;
    let ba = relationship(&network, vpc_b(), vpc_a(), fast_wait(5))?;

    let from_ab = ab.fetch().await?;
    let from_ba = ba.fetch().await?;

    assert_eq!(from_ab.as_ref().map(|c| c.id()), Some(&existing));
    assert_eq!(from_ba.as_ref().map(|c| c.id()), Some(&existing));
    Ok(())
}

#[tokio::test]
async fn fetch_without_connection_is_not_an_error() -> Result<()> {
    init_tracing();
    let network = network_with_lag(0);
    let rel = relationship(&network, vpc_a(), vpc_b(), fast_wait(5))?;

    assert!(rel.fetch().await?.is_none());
    Ok(())
}

#[tokio::test]
async fn fetch_with_unknown_gateway_fails() -> Result<()> {
    init_tracing();
    let network = network_with_lag(0);
    let stranger = VpcRef::new("vpc-0ccc", "333333333333", "ap-south-1");
    let rel = relationship(&network, vpc_a(), stranger, fast_wait(5))?;

    let result = rel.fetch().await;

    assert!(matches!(result, Err(Error::GatewayNotFound { .. })));
    Ok(())
}

// ==========================================================================
// PROVISION
// ==========================================================================

#[tokio::test]
async fn provision_then_fetch_returns_the_pair() -> Result<()> {
    init_tracing();
    let network = network_with_lag(0);
    let rel = relationship(&network, vpc_a(), vpc_b(), fast_wait(5))?;

    let outcome = rel.provision().await?;
    let found = rel.fetch().await?;

    let Some(found) = found else {
        return Err(Error::transport("provisioned connection not found"));
    };
    assert_eq!(found.id(), outcome.connection_id());
    assert_eq!(found.status(), PeeringStatus::Active);
    assert_eq!(
        sides(found.requester_vpc(), found.accepter_vpc()),
        sides(&vpc_a(), &vpc_b())
    );
    Ok(())
}

#[tokio::test]
async fn provision_over_existing_connection_rolls_back() -> Result<()> {
    init_tracing();
    let network = network_with_lag(0);
    let rel = relationship(&network, vpc_a(), vpc_b(), fast_wait(5))?;
    let first = rel.provision().await?;

    let second = rel.provision().await?;

    assert!(first.is_accepted());
    assert!(matches!(second, ProvisionOutcome::RolledBack { .. }));
    assert_ne!(first.connection_id(), second.connection_id());

    let remaining = network
        .connections_between(&vpc_a().id, &vpc_b().id)
        .await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining.first().map(|c| &c.id), Some(first.connection_id()));
    assert_eq!(remaining.first().map(|c| c.status), Some(PeeringStatus::Active));
    assert_eq!(network.deleted_ids().await, vec![second.connection_id().clone()]);
    Ok(())
}

#[tokio::test]
async fn provision_from_the_other_side_also_rolls_back() -> Result<()> {
    init_tracing();
    let network = network_with_lag(0);
    let ab = relationship(&network, vpc_a(), vpc_b(), fast_wait(5))?;
    let ba = relationship(&network, vpc_b(), vpc_a(), fast_wait(5))?;

    let first = ab.provision().await?;
    let second = ba.provision().await?;

    assert!(first.is_accepted());
    assert!(!second.is_accepted());
    assert_eq!(
        network
            .connections_between(&vpc_a().id, &vpc_b().id)
            .await
            .len(),
        1
    );
    Ok(())
}

#[tokio::test]
async fn failed_request_is_fatal_and_leaves_nothing() -> Result<()> {
    init_tracing();
    let network = network_with_lag(0);
    network
        .inject_fault(
            Operation::Request,
            Error::remote_api("VpcPeeringConnectionLimitExceeded", "too many"),
        )
        .await;
    let rel = relationship(&network, vpc_a(), vpc_b(), fast_wait(5))?;

    let result = rel.provision().await;

    assert!(matches!(result, Err(ref e) if e.has_code("VpcPeeringConnectionLimitExceeded")));
    assert!(network.connections().await.is_empty());
    assert_eq!(network.call_count(Operation::Accept).await, 0);
    Ok(())
}

// ==========================================================================
// WAIT POLICY
// ==========================================================================

#[tokio::test]
async fn wait_absorbs_visibility_lag() -> Result<()> {
    init_tracing();
    let network = network_with_lag(3);
    let rel = relationship(&network, vpc_a(), vpc_b(), fast_wait(10))?;

    let outcome = rel.provision().await?;

    assert!(outcome.is_accepted());
    Ok(())
}

#[tokio::test]
async fn lag_without_wait_is_fatal() -> Result<()> {
    init_tracing();
    let network = network_with_lag(3);
    let config = ReconcilerConfig::with_accept_wait(AcceptWaitPolicy::disabled());
    let rel = relationship(&network, vpc_a(), vpc_b(), config)?;

    let result = rel.provision().await;

    assert!(matches!(result, Err(Error::ConnectionNotVisible { .. })));
    assert_eq!(network.call_count(Operation::Accept).await, 0);
    assert!(network.deleted_ids().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn exhausted_wait_is_fatal_and_not_compensated() -> Result<()> {
    init_tracing();
    let network = network_with_lag(10);
    let rel = relationship(&network, vpc_a(), vpc_b(), fast_wait(3))?;

    let result = rel.provision().await;

    assert!(matches!(result, Err(Error::WaiterExhausted { attempts: 3, .. })));
    assert_eq!(network.connections().await.len(), 1);
    assert!(network.deleted_ids().await.is_empty());
    Ok(())
}

// ==========================================================================
// DESTROY
// ==========================================================================

#[tokio::test]
async fn destroy_without_connection_is_noop() -> Result<()> {
    init_tracing();
    let network = network_with_lag(0);
    let rel = relationship(&network, vpc_a(), vpc_b(), fast_wait(5))?;

    assert_eq!(rel.destroy().await?, DestroyOutcome::NothingToDestroy);
    assert_eq!(network.call_count(Operation::Delete).await, 0);
    Ok(())
}

#[tokio::test]
async fn destroy_twice_leaves_nothing() -> Result<()> {
    init_tracing();
    let network = network_with_lag(0);
    network
        .seed_connection(vpc_b(), vpc_a(), PeeringStatus::Active)
        .await;
    let rel = relationship(&network, vpc_a(), vpc_b(), fast_wait(5))?;

    let first = rel.destroy().await?;
    assert!(network.connections().await.is_empty());
    let second = rel.destroy().await?;
    assert!(network.connections().await.is_empty());

    assert!(matches!(first, DestroyOutcome::Deleted { .. }));
    assert_eq!(second, DestroyOutcome::NothingToDestroy);
    Ok(())
}

#[tokio::test]
async fn provision_then_destroy_round_trips() -> Result<()> {
    init_tracing();
    let network = network_with_lag(2);
    let rel = relationship(&network, vpc_a(), vpc_b(), fast_wait(10))?;
    let before = network.connections().await;

    rel.provision().await?;
    let destroyed = rel.destroy().await?;

    assert!(matches!(destroyed, DestroyOutcome::Deleted { .. }));
    assert_eq!(network.connections().await, before);
    Ok(())
}

// ==========================================================================
// DISPATCH
// ==========================================================================

#[tokio::test]
async fn perform_drives_a_plan_of_named_actions() -> Result<()> {
    init_tracing();
    let network = network_with_lag(0);
    let rel = relationship(&network, vpc_a(), vpc_b(), fast_wait(5))?;

    let plan = ["fetch", "provision", "fetch", "destroy", "destroy"]
        .into_iter()
        .map(str::parse::<PeeringAction>)
        .collect::<Result<Vec<_>>>()?;

    let mut outcomes = Vec::new();
    for action in plan {
        outcomes.push(rel.perform(action).await?);
    }

    let actions = outcomes.iter().map(ActionOutcome::action).collect::<Vec<_>>();
    assert_eq!(
        actions,
        vec![
            PeeringAction::Fetch,
            PeeringAction::Provision,
            PeeringAction::Fetch,
            PeeringAction::Destroy,
            PeeringAction::Destroy,
        ]
    );
    assert!(matches!(outcomes.first(), Some(ActionOutcome::Fetched(None))));
    assert!(matches!(outcomes.get(2), Some(ActionOutcome::Fetched(Some(_)))));
    assert!(matches!(
        outcomes.last(),
        Some(ActionOutcome::Destroyed(DestroyOutcome::NothingToDestroy))
    ));
    Ok(())
}

#[test]
fn unknown_action_is_rejected_before_running() {
    let parsed = ["provision", "destory"]
        .into_iter()
        .map(str::parse::<PeeringAction>)
        .collect::<Result<Vec<_>>>();

    assert!(matches!(parsed, Err(Error::UnknownAction { name }) if name == "destory"));
}
