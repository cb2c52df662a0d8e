//! Peering relationship between two VPCs.
//!
//! A relationship is an unordered pair of VPCs plus the gateway directory
//! used to reach them. It offers three idempotent operations against the
//! remote API:
//!
//! - [`fetch`](PeeringRelationship::fetch) searches both directions for an
//!   existing connection; the first match wins.
//! - [`provision`](PeeringRelationship::provision) requests a connection from
//!   `vpc1` and accepts it on `vpc2`'s side. When the accept is rejected by
//!   the remote API (typically because the pair is already peered) the
//!   request is deleted again.
//! - [`destroy`](PeeringRelationship::destroy) deletes whatever `fetch` finds.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use peering_core::{Error, PeeringFilter, Result, ResultExt, VpcRef};
use tracing::error;

use crate::config::ReconcilerConfig;
use crate::gateway::{Gateway, GatewayDirectory, RemotePeeringConnection};
use crate::observer::{ReconcileObserver, TracingObserver};
use crate::types::{ActionOutcome, DestroyOutcome, PeeringAction, ProvisionOutcome};
use crate::waiter::{WaitCondition, Waiter};

/// Logical peering between two VPCs.
///
/// Equality and hashing only consider the unordered pair of VPCs, so
/// `(A, B)` and `(B, A)` are the same relationship.
#[derive(Clone)]
pub struct PeeringRelationship {
    vpc1: VpcRef,
    vpc2: VpcRef,
    gateways: Arc<dyn GatewayDirectory>,
    config: ReconcilerConfig,
    observer: Arc<dyn ReconcileObserver>,
}

impl PeeringRelationship {
    /// Create a relationship with the default configuration.
    ///
    /// `vpc1` is the requesting side when provisioning.
    pub fn new(gateways: Arc<dyn GatewayDirectory>, between: (VpcRef, VpcRef)) -> Self {
        let (vpc1, vpc2) = between;
        Self {
            vpc1,
            vpc2,
            gateways,
            config: ReconcilerConfig::default(),
            observer: Arc::new(TracingObserver),
        }
    }

    /// Start building a relationship.
    pub fn builder() -> PeeringRelationshipBuilder {
        PeeringRelationshipBuilder::new()
    }

    /// Requesting side.
    pub const fn vpc1(&self) -> &VpcRef {
        &self.vpc1
    }

    /// Accepting side.
    pub const fn vpc2(&self) -> &VpcRef {
        &self.vpc2
    }

    /// Get the configuration.
    pub const fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// The pair in canonical order, independent of construction order.
    pub fn canonical_pair(&self) -> (&VpcRef, &VpcRef) {
        if self.vpc1 <= self.vpc2 {
            (&self.vpc1, &self.vpc2)
        } else {
            (&self.vpc2, &self.vpc1)
        }
    }

    /// Run an action and wrap its result.
    ///
    /// # Errors
    ///
    /// Propagates the error of the underlying operation.
    pub async fn perform(&self, action: PeeringAction) -> Result<ActionOutcome> {
        match action {
            PeeringAction::Fetch => self.fetch().await.map(ActionOutcome::Fetched),
            PeeringAction::Provision => self.provision().await.map(ActionOutcome::Provisioned),
            PeeringAction::Destroy => self.destroy().await.map(ActionOutcome::Destroyed),
        }
    }

    /// Find the connection between the pair, if any.
    ///
    /// Searches with `vpc1` as accepter first, then with `vpc2` as accepter.
    ///
    /// # Errors
    ///
    /// Returns an error if a gateway cannot be resolved or queried.
    pub async fn fetch(&self) -> Result<Option<RemotePeeringConnection>> {
        if let Some(found) = self.connection_for(&self.vpc1, &self.vpc2).await? {
            return Ok(Some(found));
        }

        self.connection_for(&self.vpc2, &self.vpc1).await
    }

    /// Request a connection from `vpc1` to `vpc2` and accept it.
    ///
    /// Does not look for an existing connection first. If the pair is
    /// already peered the accept is rejected, the new request is deleted and
    /// [`ProvisionOutcome::RolledBack`] is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the request itself fails, if the existence wait
    /// runs out of attempts, if the request never becomes visible to the
    /// accepter, if the accept fails for a reason other than a remote API
    /// rejection, or if the compensating delete fails.
    pub async fn provision(&self) -> Result<ProvisionOutcome> {
        self.observer.provision_started(&self.vpc1, &self.vpc2);

        let requester_gateway = self.gateway_for(&self.vpc1)?;
        let requested = requester_gateway
            .request_peering_connection(&self.vpc1, &self.vpc2)
            .await
            .inspect_error(|e| {
                error!(
                    vpc1 = %self.vpc1.id,
                    vpc2 = %self.vpc2.id,
                    error = %e,
                    "Peering connection request failed"
                );
            })?;
        let requested = RemotePeeringConnection::new(requested, requester_gateway);

        match self.accept(&requested).await {
            Ok(()) => Ok(ProvisionOutcome::Accepted {
                connection_id: requested.id().clone(),
            }),
            Err(cause) if cause.is_client_error() => self.roll_back(&requested, &cause).await,
            Err(cause) => Err(cause),
        }
    }

    /// Delete the connection between the pair, if there is one.
    ///
    /// # Errors
    ///
    /// Returns an error if the search or the delete fails.
    pub async fn destroy(&self) -> Result<DestroyOutcome> {
        let found = self.fetch().await?;
        self.observer.destroy_decided(
            &self.vpc1,
            &self.vpc2,
            found.as_ref().map(RemotePeeringConnection::snapshot),
        );

        match found {
            Some(connection) => {
                connection.delete().await?;
                Ok(DestroyOutcome::Deleted {
                    connection_id: connection.id().clone(),
                })
            }
            None => Ok(DestroyOutcome::NothingToDestroy),
        }
    }

    fn gateway_for(&self, vpc: &VpcRef) -> Result<Arc<dyn Gateway>> {
        self.gateways.resolve(&vpc.account_id, &vpc.region)
    }

    /// First connection accepted by `accepter` and requested by `requester`.
    async fn connection_for(
        &self,
        accepter: &VpcRef,
        requester: &VpcRef,
    ) -> Result<Option<RemotePeeringConnection>> {
        self.observer.search_started(accepter, requester);

        let gateway = self.gateway_for(accepter)?;
        RemotePeeringConnection::first_matching(
            &gateway,
            &PeeringFilter::between(&accepter.id, &requester.id),
        )
        .await
    }

    /// Wait for the request to show up on `vpc2`'s side, then accept it there.
    async fn accept(&self, requested: &RemotePeeringConnection) -> Result<()> {
        let accepter_gateway = self.gateway_for(&self.vpc2)?;
        let ids = [requested.id().clone()];

        if self.config.accept_wait.enabled {
            self.observer.wait_started(requested.id());
            Waiter::new(
                Arc::clone(&accepter_gateway),
                WaitCondition::PeeringConnectionExists,
            )
            .wait(&ids, &self.config.accept_wait)
            .await?;
        }

        self.observer.accept_attempted(requested.id());
        let pending =
            RemotePeeringConnection::first_matching(&accepter_gateway, &PeeringFilter::by_ids(ids))
                .await?
                .ok_or_else(|| Error::connection_not_visible(requested.id().as_str()))?;

        pending.accept().await?;
        Ok(())
    }

    async fn roll_back(
        &self,
        requested: &RemotePeeringConnection,
        cause: &Error,
    ) -> Result<ProvisionOutcome> {
        self.observer.compensation_triggered(requested.id(), cause);

        requested
            .delete()
            .await
            .map_err(|e| Error::rollback_failed(requested.id().as_str(), e.to_string()))?;

        Ok(ProvisionOutcome::RolledBack {
            connection_id: requested.id().clone(),
            reason: cause.to_string(),
        })
    }
}

impl PartialEq for PeeringRelationship {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_pair() == other.canonical_pair()
    }
}

impl Eq for PeeringRelationship {}

impl Hash for PeeringRelationship {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_pair().hash(state);
    }
}

impl std::fmt::Debug for PeeringRelationship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (first, second) = self.canonical_pair();
        f.debug_struct("PeeringRelationship")
            .field("vpcs", &[first, second])
            .finish_non_exhaustive()
    }
}

/// Builder for [`PeeringRelationship`].
pub struct PeeringRelationshipBuilder {
    gateways: Option<Arc<dyn GatewayDirectory>>,
    between: Option<(VpcRef, VpcRef)>,
    config: ReconcilerConfig,
    observer: Arc<dyn ReconcileObserver>,
}

impl PeeringRelationshipBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            gateways: None,
            between: None,
            config: ReconcilerConfig::default(),
            observer: Arc::new(TracingObserver),
        }
    }

    /// Set the gateway directory.
    #[must_use]
    pub fn with_gateways(mut self, gateways: Arc<dyn GatewayDirectory>) -> Self {
        self.gateways = Some(gateways);
        self
    }

    /// Set the pair; `vpc1` requests, `vpc2` accepts.
    #[must_use]
    pub fn between(mut self, vpc1: VpcRef, vpc2: VpcRef) -> Self {
        self.between = Some((vpc1, vpc2));
        self
    }

    /// Set the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ReconcilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the observer receiving checkpoints.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ReconcileObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Build the relationship.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` when the directory or pair is missing,
    /// when both sides are the same VPC, or when the configuration is invalid.
    pub fn build(self) -> Result<PeeringRelationship> {
        let gateways = self
            .gateways
            .ok_or_else(|| Error::invalid_config("Gateway directory is required"))?;
        let (vpc1, vpc2) = self
            .between
            .ok_or_else(|| Error::invalid_config("VPC pair is required"))?;

        if vpc1.id == vpc2.id {
            return Err(Error::invalid_config(format!(
                "cannot peer VPC '{}' with itself",
                vpc1.id
            )));
        }
        self.config.validate()?;

        Ok(PeeringRelationship {
            vpc1,
            vpc2,
            gateways,
            config: self.config,
            observer: self.observer,
        })
    }
}

impl Default for PeeringRelationshipBuilder {
    fn default() -> Self {
        Self::new()
    }
}
