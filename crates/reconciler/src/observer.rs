//! Observability hooks invoked at fixed checkpoints of a reconciliation.
//!
//! The relationship never logs directly. It reports checkpoints to a
//! [`ReconcileObserver`]; [`TracingObserver`] turns them into `tracing`
//! events and [`RecordingObserver`] keeps them for inspection.

use std::sync::{Mutex, PoisonError};

use peering_core::{Error, PeeringConnection, PeeringConnectionId, VpcId, VpcRef};
use tracing::{debug, info, warn};

/// Receives checkpoints from a peering relationship.
///
/// Every method defaults to a no-op.
pub trait ReconcileObserver: Send + Sync {
    /// A directional search is about to query the accepter's gateway.
    fn search_started(&self, _accepter: &VpcRef, _requester: &VpcRef) {}

    /// A connection is about to be requested.
    fn provision_started(&self, _requester: &VpcRef, _accepter: &VpcRef) {}

    /// The existence wait is starting for a requested connection.
    fn wait_started(&self, _connection_id: &PeeringConnectionId) {}

    /// The accepter side is about to accept.
    fn accept_attempted(&self, _connection_id: &PeeringConnectionId) {}

    /// Accepting failed and the requested connection is being deleted.
    fn compensation_triggered(&self, _connection_id: &PeeringConnectionId, _cause: &Error) {}

    /// Destroy decided whether there is anything to delete.
    fn destroy_decided(
        &self,
        _vpc1: &VpcRef,
        _vpc2: &VpcRef,
        _connection: Option<&PeeringConnection>,
    ) {
    }
}

/// Observer that emits `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ReconcileObserver for TracingObserver {
    fn search_started(&self, accepter: &VpcRef, requester: &VpcRef) {
        debug!(
            accepter = %accepter.id,
            requester = %requester.id,
            account_id = %accepter.account_id,
            region = %accepter.region,
            "Searching for peering connection"
        );
    }

    fn provision_started(&self, requester: &VpcRef, accepter: &VpcRef) {
        info!(
            vpc1 = %requester.id,
            vpc2 = %accepter.id,
            "Requesting peering connection"
        );
    }

    fn wait_started(&self, connection_id: &PeeringConnectionId) {
        info!(connection_id = %connection_id, "Waiting for peering connection to exist");
    }

    fn accept_attempted(&self, connection_id: &PeeringConnectionId) {
        info!(connection_id = %connection_id, "Accepting peering connection");
    }

    fn compensation_triggered(&self, connection_id: &PeeringConnectionId, cause: &Error) {
        warn!(
            connection_id = %connection_id,
            error = %cause,
            "Could not accept peering connection, deleting request"
        );
    }

    fn destroy_decided(
        &self,
        vpc1: &VpcRef,
        vpc2: &VpcRef,
        connection: Option<&PeeringConnection>,
    ) {
        match connection {
            Some(found) => info!(
                connection_id = %found.id,
                requester = %found.requester.id,
                accepter = %found.accepter.id,
                "Destroying peering connection"
            ),
            None => info!(
                vpc1 = %vpc1.id,
                vpc2 = %vpc2.id,
                "No peering connection to destroy"
            ),
        }
    }
}

/// A checkpoint captured by [`RecordingObserver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Checkpoint {
    /// See [`ReconcileObserver::search_started`].
    SearchStarted { accepter: VpcId, requester: VpcId },
    /// See [`ReconcileObserver::provision_started`].
    ProvisionStarted { requester: VpcId, accepter: VpcId },
    /// See [`ReconcileObserver::wait_started`].
    WaitStarted { connection_id: PeeringConnectionId },
    /// See [`ReconcileObserver::accept_attempted`].
    AcceptAttempted { connection_id: PeeringConnectionId },
    /// See [`ReconcileObserver::compensation_triggered`].
    CompensationTriggered {
        connection_id: PeeringConnectionId,
        reason: String,
    },
    /// See [`ReconcileObserver::destroy_decided`].
    DestroyDecided {
        connection_id: Option<PeeringConnectionId>,
    },
}

/// Observer that keeps every checkpoint in order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    checkpoints: Mutex<Vec<Checkpoint>>,
}

impl RecordingObserver {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Checkpoints recorded so far.
    pub fn checkpoints(&self) -> Vec<Checkpoint> {
        self.checkpoints
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, checkpoint: Checkpoint) {
        self.checkpoints
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(checkpoint);
    }
}

impl ReconcileObserver for RecordingObserver {
    fn search_started(&self, accepter: &VpcRef, requester: &VpcRef) {
        self.record(Checkpoint::SearchStarted {
            accepter: accepter.id.clone(),
            requester: requester.id.clone(),
        });
    }

    fn provision_started(&self, requester: &VpcRef, accepter: &VpcRef) {
        self.record(Checkpoint::ProvisionStarted {
            requester: requester.id.clone(),
            accepter: accepter.id.clone(),
        });
    }

    fn wait_started(&self, connection_id: &PeeringConnectionId) {
        self.record(Checkpoint::WaitStarted {
            connection_id: connection_id.clone(),
        });
    }

    fn accept_attempted(&self, connection_id: &PeeringConnectionId) {
        self.record(Checkpoint::AcceptAttempted {
            connection_id: connection_id.clone(),
        });
    }

    fn compensation_triggered(&self, connection_id: &PeeringConnectionId, cause: &Error) {
        self.record(Checkpoint::CompensationTriggered {
            connection_id: connection_id.clone(),
            reason: cause.to_string(),
        });
    }

    fn destroy_decided(
        &self,
        _vpc1: &VpcRef,
        _vpc2: &VpcRef,
        connection: Option<&PeeringConnection>,
    ) {
        self.record(Checkpoint::DestroyDecided {
            connection_id: connection.map(|c| c.id.clone()),
        });
    }
}
