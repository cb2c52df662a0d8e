//! In-memory networking API.
//!
//! Behaves like the remote API closely enough to drive every reconciliation
//! path: per-(account, region) visibility, directional connections, accept
//! conflicts, an eventual-consistency lag for new connections and one-shot
//! fault injection.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use itertools::Itertools;
use peering_core::error::{
    CODE_ALREADY_EXISTS, CODE_CONNECTION_NOT_FOUND, CODE_INVALID_STATE, CODE_NOT_PERMITTED,
    CODE_VPC_NOT_FOUND,
};
use peering_core::{
    AccountId, Error, PeeringConnection, PeeringConnectionId, PeeringFilter, PeeringStatus,
    Region, Result, VpcId, VpcRef,
};
use tokio::sync::Mutex;
use ulid::Ulid;

use crate::gateway::{Gateway, GatewayDirectory};

/// Remote calls that can be counted and made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `describe_peering_connections`.
    Describe,
    /// `request_peering_connection`.
    Request,
    /// `accept_peering_connection`.
    Accept,
    /// `delete_peering_connection`.
    Delete,
}

#[derive(Debug)]
struct StoredConnection {
    connection: PeeringConnection,
    /// Matching describe calls left before the connection shows up.
    hidden_for: u32,
}

#[derive(Debug, Default)]
struct NetworkState {
    /// Insertion order is the order queries return matches in.
    connections: Vec<StoredConnection>,
    deleted: Vec<PeeringConnectionId>,
    faults: HashMap<Operation, VecDeque<Error>>,
    calls: HashMap<Operation, usize>,
}

impl NetworkState {
    fn enter(&mut self, operation: Operation) -> Result<()> {
        let count = self.calls.entry(operation).or_default();
        *count = count.saturating_add(1);

        match self
            .faults
            .get_mut(&operation)
            .and_then(VecDeque::pop_front)
        {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }

    fn position(&self, id: &PeeringConnectionId) -> Option<usize> {
        self.connections
            .iter()
            .position(|stored| &stored.connection.id == id)
    }
}

#[derive(Debug, Default)]
struct Topology {
    gateways: HashSet<(AccountId, Region)>,
    vpcs: HashMap<VpcId, VpcRef>,
    visibility_lag: u32,
}

/// Builder for [`InMemoryNetwork`].
#[derive(Debug, Default)]
pub struct InMemoryNetworkBuilder {
    topology: Topology,
}

impl InMemoryNetworkBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a gateway for an account and region.
    #[must_use]
    pub fn gateway(mut self, account_id: impl Into<AccountId>, region: impl Into<Region>) -> Self {
        self.topology
            .gateways
            .insert((account_id.into(), region.into()));
        self
    }

    /// Register a VPC, and the gateway for its account and region.
    #[must_use]
    pub fn vpc(mut self, vpc: VpcRef) -> Self {
        self.topology
            .gateways
            .insert((vpc.account_id.clone(), vpc.region.clone()));
        self.topology.vpcs.insert(vpc.id.clone(), vpc);
        self
    }

    /// Hide each new connection from its first `describes` matching queries.
    #[must_use]
    pub fn visibility_lag(mut self, describes: u32) -> Self {
        self.topology.visibility_lag = describes;
        self
    }

    /// Build the network.
    pub fn build(self) -> InMemoryNetwork {
        InMemoryNetwork {
            topology: Arc::new(self.topology),
            state: Arc::new(Mutex::new(NetworkState::default())),
        }
    }
}

/// In-memory networking API for testing and dry runs.
///
/// Clones share the same remote state.
#[derive(Debug, Clone)]
pub struct InMemoryNetwork {
    topology: Arc<Topology>,
    state: Arc<Mutex<NetworkState>>,
}

impl InMemoryNetwork {
    /// Start building a network.
    pub fn builder() -> InMemoryNetworkBuilder {
        InMemoryNetworkBuilder::new()
    }

    /// Every connection currently stored, lag ignored.
    pub async fn connections(&self) -> Vec<PeeringConnection> {
        let state = self.state.lock().await;
        state
            .connections
            .iter()
            .map(|stored| stored.connection.clone())
            .collect_vec()
    }

    /// Live connections linking `a` and `b` in either direction.
    pub async fn connections_between(&self, a: &VpcId, b: &VpcId) -> Vec<PeeringConnection> {
        self.connections()
            .await
            .into_iter()
            .filter(|c| c.connects(a, b) && c.status.is_live())
            .collect_vec()
    }

    /// Ids of deleted connections, in deletion order.
    pub async fn deleted_ids(&self) -> Vec<PeeringConnectionId> {
        self.state.lock().await.deleted.clone()
    }

    /// Insert a connection directly, bypassing request and accept.
    pub async fn seed_connection(
        &self,
        requester: VpcRef,
        accepter: VpcRef,
        status: PeeringStatus,
    ) -> PeeringConnectionId {
        let connection = PeeringConnection {
            id: new_connection_id(),
            requester,
            accepter,
            status,
        };
        let id = connection.id.clone();
        self.state.lock().await.connections.push(StoredConnection {
            connection,
            hidden_for: 0,
        });
        id
    }

    /// Make the next call of `operation` fail with `error`.
    ///
    /// Faults queue up and are consumed one per call.
    pub async fn inject_fault(&self, operation: Operation, error: Error) {
        self.state
            .lock()
            .await
            .faults
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Number of calls of `operation` so far, failed ones included.
    pub async fn call_count(&self, operation: Operation) -> usize {
        self.state
            .lock()
            .await
            .calls
            .get(&operation)
            .copied()
            .unwrap_or_default()
    }
}

impl GatewayDirectory for InMemoryNetwork {
    fn resolve(&self, account_id: &AccountId, region: &Region) -> Result<Arc<dyn Gateway>> {
        let key = (account_id.clone(), region.clone());
        if !self.topology.gateways.contains(&key) {
            return Err(Error::gateway_not_found(account_id.as_str(), region.as_str()));
        }

        Ok(Arc::new(InMemoryGateway {
            account_id: key.0,
            region: key.1,
            topology: Arc::clone(&self.topology),
            state: Arc::clone(&self.state),
        }))
    }
}

/// Gateway onto an [`InMemoryNetwork`] for one account and region.
#[derive(Debug)]
pub struct InMemoryGateway {
    account_id: AccountId,
    region: Region,
    topology: Arc<Topology>,
    state: Arc<Mutex<NetworkState>>,
}

impl InMemoryGateway {
    fn sees(&self, connection: &PeeringConnection) -> bool {
        connection.involves(&self.account_id, &self.region)
    }

    fn known_vpc(&self, vpc: &VpcRef) -> Result<()> {
        match self.topology.vpcs.get(&vpc.id) {
            Some(known) if known == vpc => Ok(()),
            _ => Err(Error::remote_api(
                CODE_VPC_NOT_FOUND,
                format!("The vpc ID '{}' does not exist", vpc.id),
            )),
        }
    }
}

fn new_connection_id() -> PeeringConnectionId {
    PeeringConnectionId::new(format!("pcx-{}", Ulid::new().to_string().to_lowercase()))
}

fn connection_not_found(id: &PeeringConnectionId) -> Error {
    Error::remote_api(
        CODE_CONNECTION_NOT_FOUND,
        format!("The vpcPeeringConnection ID '{id}' does not exist"),
    )
}

#[async_trait]
impl Gateway for InMemoryGateway {
    fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    fn region(&self) -> &Region {
        &self.region
    }

    async fn describe_peering_connections(
        &self,
        filter: &PeeringFilter,
    ) -> Result<Vec<PeeringConnection>> {
        let mut state = self.state.lock().await;
        state.enter(Operation::Describe)?;

        let mut visible = Vec::new();
        for stored in &mut state.connections {
            if !self.sees(&stored.connection) || !filter.matches(&stored.connection) {
                continue;
            }
            if stored.hidden_for > 0 {
                stored.hidden_for = stored.hidden_for.saturating_sub(1);
                continue;
            }
            visible.push(stored.connection.clone());
        }

        Ok(visible)
    }

    async fn request_peering_connection(
        &self,
        requester: &VpcRef,
        peer: &VpcRef,
    ) -> Result<PeeringConnection> {
        let mut state = self.state.lock().await;
        state.enter(Operation::Request)?;

        if !requester.lives_in(&self.account_id, &self.region) {
            return Err(Error::remote_api(
                CODE_VPC_NOT_FOUND,
                format!(
                    "The vpc ID '{}' does not exist in account {} region {}",
                    requester.id, self.account_id, self.region
                ),
            ));
        }
        self.known_vpc(requester)?;
        self.known_vpc(peer)?;

        let connection = PeeringConnection {
            id: new_connection_id(),
            requester: requester.clone(),
            accepter: peer.clone(),
            status: PeeringStatus::PendingAcceptance,
        };
        state.connections.push(StoredConnection {
            connection: connection.clone(),
            hidden_for: self.topology.visibility_lag,
        });

        Ok(connection)
    }

    async fn accept_peering_connection(
        &self,
        id: &PeeringConnectionId,
    ) -> Result<PeeringConnection> {
        let mut state = self.state.lock().await;
        state.enter(Operation::Accept)?;

        let position = state
            .position(id)
            .filter(|&at| {
                state
                    .connections
                    .get(at)
                    .is_some_and(|stored| stored.hidden_for == 0 && self.sees(&stored.connection))
            })
            .ok_or_else(|| connection_not_found(id))?;
        let pending = state
            .connections
            .get(position)
            .map(|stored| stored.connection.clone())
            .ok_or_else(|| connection_not_found(id))?;

        if !pending.accepter.lives_in(&self.account_id, &self.region) {
            return Err(Error::remote_api(
                CODE_NOT_PERMITTED,
                format!("Only the accepter of '{id}' may accept it"),
            ));
        }
        if pending.status != PeeringStatus::PendingAcceptance {
            return Err(Error::remote_api(
                CODE_INVALID_STATE,
                format!("Cannot accept '{id}' in state {}", pending.status),
            ));
        }

        let conflict = state.connections.iter().find(|stored| {
            stored.connection.id != pending.id
                && stored.connection.status == PeeringStatus::Active
                && stored
                    .connection
                    .connects(&pending.requester.id, &pending.accepter.id)
        });
        if let Some(existing) = conflict {
            return Err(Error::remote_api(
                CODE_ALREADY_EXISTS,
                format!(
                    "An active peering connection '{}' already exists between {} and {}",
                    existing.connection.id, pending.requester.id, pending.accepter.id
                ),
            ));
        }

        let accepted = state
            .connections
            .get_mut(position)
            .map(|stored| {
                stored.connection.status = PeeringStatus::Active;
                stored.connection.clone()
            })
            .ok_or_else(|| connection_not_found(id))?;

        Ok(accepted)
    }

    async fn delete_peering_connection(&self, id: &PeeringConnectionId) -> Result<()> {
        let mut state = self.state.lock().await;
        state.enter(Operation::Delete)?;

        let position = state
            .position(id)
            .filter(|&at| {
                state
                    .connections
                    .get(at)
                    .is_some_and(|stored| self.sees(&stored.connection))
            })
            .ok_or_else(|| connection_not_found(id))?;

        state.connections.remove(position);
        state.deleted.push(id.clone());
        Ok(())
    }
}
