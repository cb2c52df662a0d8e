//! Actions and outcomes of peering reconciliation.

use std::str::FromStr;

use peering_core::{Error, PeeringConnectionId};
use serde::{Deserialize, Serialize};

use crate::gateway::RemotePeeringConnection;

/// Operations a driver can ask a relationship to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeeringAction {
    /// Look up the current connection.
    Fetch,
    /// Ensure an accepted connection exists.
    Provision,
    /// Ensure no connection exists.
    Destroy,
}

impl PeeringAction {
    /// Every action, in declaration order.
    pub const ALL: [Self; 3] = [Self::Fetch, Self::Provision, Self::Destroy];

    /// Stable lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Provision => "provision",
            Self::Destroy => "destroy",
        }
    }

    /// Whether the action can change remote state.
    pub const fn is_mutating(self) -> bool {
        !matches!(self, Self::Fetch)
    }
}

impl std::fmt::Display for PeeringAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PeeringAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|action| action.name() == wanted)
            .ok_or_else(|| Error::unknown_action(s))
    }
}

/// Result of a provisioning attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProvisionOutcome {
    /// The requested connection was accepted.
    Accepted { connection_id: PeeringConnectionId },
    /// Accepting failed; the requested connection was deleted again.
    RolledBack {
        connection_id: PeeringConnectionId,
        reason: String,
    },
}

impl ProvisionOutcome {
    /// Id of the connection this attempt requested.
    pub const fn connection_id(&self) -> &PeeringConnectionId {
        match self {
            Self::Accepted { connection_id } | Self::RolledBack { connection_id, .. } => {
                connection_id
            }
        }
    }

    /// Whether the requested connection is now accepted.
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// Result of a destroy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DestroyOutcome {
    /// A connection was found and deleted.
    Deleted { connection_id: PeeringConnectionId },
    /// There was nothing to delete.
    NothingToDestroy,
}

/// Result of [`PeeringRelationship::perform`](crate::PeeringRelationship::perform).
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// Result of a fetch.
    Fetched(Option<RemotePeeringConnection>),
    /// Result of a provision.
    Provisioned(ProvisionOutcome),
    /// Result of a destroy.
    Destroyed(DestroyOutcome),
}

impl ActionOutcome {
    /// The action that produced this outcome.
    pub const fn action(&self) -> PeeringAction {
        match self {
            Self::Fetched(_) => PeeringAction::Fetch,
            Self::Provisioned(_) => PeeringAction::Provision,
            Self::Destroyed(_) => PeeringAction::Destroy,
        }
    }

    /// Get a description of the outcome.
    pub fn description(&self) -> String {
        match self {
            Self::Fetched(Some(found)) => format!("found peering connection {}", found.id()),
            Self::Fetched(None) => "no peering connection".to_string(),
            Self::Provisioned(ProvisionOutcome::Accepted { connection_id }) => {
                format!("accepted peering connection {connection_id}")
            }
            Self::Provisioned(ProvisionOutcome::RolledBack {
                connection_id,
                reason,
            }) => {
                format!("rolled back peering connection {connection_id}: {reason}")
            }
            Self::Destroyed(DestroyOutcome::Deleted { connection_id }) => {
                format!("deleted peering connection {connection_id}")
            }
            Self::Destroyed(DestroyOutcome::NothingToDestroy) => {
                "nothing to destroy".to_string()
            }
        }
    }
}
