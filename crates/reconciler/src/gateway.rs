//! Gateway traits onto the remote networking API.
//!
//! A [`GatewayDirectory`] hands out one [`Gateway`] per (account, region).
//! Connections read through a gateway come back as
//! [`RemotePeeringConnection`] handles that remember which gateway to use
//! for follow-up calls.

use std::sync::Arc;

use async_trait::async_trait;
use peering_core::{
    AccountId, PeeringConnection, PeeringConnectionId, PeeringFilter, PeeringStatus, Region,
    Result, VpcRef,
};

/// Resolves the gateway for an account and region.
pub trait GatewayDirectory: Send + Sync {
    /// Get the gateway serving `account_id` in `region`.
    ///
    /// # Errors
    ///
    /// Returns `Error::GatewayNotFound` when no gateway is known for the pair.
    fn resolve(&self, account_id: &AccountId, region: &Region) -> Result<Arc<dyn Gateway>>;
}

/// Per-(account, region) handle onto the remote networking API.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Account this gateway acts as.
    fn account_id(&self) -> &AccountId;

    /// Region this gateway talks to.
    fn region(&self) -> &Region;

    /// List the connections visible to this gateway that match `filter`.
    async fn describe_peering_connections(
        &self,
        filter: &PeeringFilter,
    ) -> Result<Vec<PeeringConnection>>;

    /// Ask for a new connection from `requester` (owned by this gateway) to `peer`.
    async fn request_peering_connection(
        &self,
        requester: &VpcRef,
        peer: &VpcRef,
    ) -> Result<PeeringConnection>;

    /// Accept a pending connection on the accepter side.
    async fn accept_peering_connection(
        &self,
        id: &PeeringConnectionId,
    ) -> Result<PeeringConnection>;

    /// Delete a connection from either side.
    async fn delete_peering_connection(&self, id: &PeeringConnectionId) -> Result<()>;
}

/// A peering connection bound to the gateway it was read through.
#[derive(Clone)]
pub struct RemotePeeringConnection {
    connection: PeeringConnection,
    gateway: Arc<dyn Gateway>,
}

impl RemotePeeringConnection {
    /// Bind a connection snapshot to a gateway.
    pub fn new(connection: PeeringConnection, gateway: Arc<dyn Gateway>) -> Self {
        Self {
            connection,
            gateway,
        }
    }

    /// Query `gateway` and keep the first match.
    ///
    /// # Errors
    ///
    /// Propagates any error from the gateway.
    pub async fn first_matching(
        gateway: &Arc<dyn Gateway>,
        filter: &PeeringFilter,
    ) -> Result<Option<Self>> {
        let found = gateway.describe_peering_connections(filter).await?;
        Ok(found
            .into_iter()
            .next()
            .map(|connection| Self::new(connection, Arc::clone(gateway))))
    }

    /// Connection id.
    pub fn id(&self) -> &PeeringConnectionId {
        &self.connection.id
    }

    /// Requesting side.
    pub fn requester_vpc(&self) -> &VpcRef {
        &self.connection.requester
    }

    /// Accepting side.
    pub fn accepter_vpc(&self) -> &VpcRef {
        &self.connection.accepter
    }

    /// Status at the time of the read.
    pub fn status(&self) -> PeeringStatus {
        self.connection.status
    }

    /// The underlying snapshot.
    pub fn snapshot(&self) -> &PeeringConnection {
        &self.connection
    }

    /// Accept the connection through the bound gateway.
    ///
    /// # Errors
    ///
    /// Propagates the remote API's rejection.
    pub async fn accept(&self) -> Result<PeeringConnection> {
        self.gateway.accept_peering_connection(self.id()).await
    }

    /// Delete the connection through the bound gateway.
    ///
    /// # Errors
    ///
    /// Propagates the remote API's rejection.
    pub async fn delete(&self) -> Result<()> {
        self.gateway.delete_peering_connection(self.id()).await
    }
}

impl std::fmt::Debug for RemotePeeringConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemotePeeringConnection")
            .field("connection", &self.connection)
            .field("gateway_account", self.gateway.account_id())
            .field("gateway_region", self.gateway.region())
            .finish()
    }
}

impl PartialEq for RemotePeeringConnection {
    fn eq(&self, other: &Self) -> bool {
        self.connection == other.connection
    }
}
