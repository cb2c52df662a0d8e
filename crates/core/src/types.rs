//! Core types shared by the peering crates.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create from any string-like value.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the raw identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identifier of a VPC (e.g. `vpc-0a1b2c`).
    VpcId
);

string_id!(
    /// Identifier of the account that owns a VPC.
    AccountId
);

string_id!(
    /// Cloud region name (e.g. `eu-west-1`).
    Region
);

string_id!(
    /// Identifier of a remote peering connection (e.g. `pcx-...`).
    PeeringConnectionId
);

/// Reference to a VPC: identifier, owning account and region.
///
/// Ordering is by `(id, account_id, region)`, which gives every unordered
/// pair of references a canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VpcRef {
    /// VPC identifier.
    pub id: VpcId,
    /// Owning account.
    pub account_id: AccountId,
    /// Region the VPC lives in.
    pub region: Region,
}

impl VpcRef {
    /// Create a new VPC reference.
    pub fn new(
        id: impl Into<VpcId>,
        account_id: impl Into<AccountId>,
        region: impl Into<Region>,
    ) -> Self {
        Self {
            id: id.into(),
            account_id: account_id.into(),
            region: region.into(),
        }
    }

    /// Whether the VPC lives in the given account and region.
    pub fn lives_in(&self, account_id: &AccountId, region: &Region) -> bool {
        &self.account_id == account_id && &self.region == region
    }
}

impl std::fmt::Display for VpcRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}/{})", self.id, self.account_id, self.region)
    }
}

/// Lifecycle status of a remote peering connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PeeringStatus {
    /// Request is being created.
    InitiatingRequest,
    /// Waiting for the accepter side.
    PendingAcceptance,
    /// Accepted, routes being set up.
    Provisioning,
    /// Live and routable.
    Active,
    /// Accepter declined.
    Rejected,
    /// Could not be established.
    Failed,
    /// Not accepted in time.
    Expired,
    /// Being torn down.
    Deleting,
    /// Gone.
    Deleted,
}

impl PeeringStatus {
    /// Whether the connection still occupies the VPC pair.
    pub const fn is_live(self) -> bool {
        matches!(
            self,
            Self::InitiatingRequest | Self::PendingAcceptance | Self::Provisioning | Self::Active
        )
    }
}

impl std::fmt::Display for PeeringStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::InitiatingRequest => "initiating-request",
            Self::PendingAcceptance => "pending-acceptance",
            Self::Provisioning => "provisioning",
            Self::Active => "active",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
            Self::Expired => "expired",
            Self::Deleting => "deleting",
            Self::Deleted => "deleted",
        };
        write!(f, "{name}")
    }
}

/// Snapshot of a remote peering connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeeringConnection {
    /// Connection identifier.
    pub id: PeeringConnectionId,
    /// VPC that requested the connection.
    pub requester: VpcRef,
    /// VPC that must accept the connection.
    pub accepter: VpcRef,
    /// Current status.
    pub status: PeeringStatus,
}

impl PeeringConnection {
    /// Whether this connection links `a` and `b`, in either direction.
    pub fn connects(&self, a: &VpcId, b: &VpcId) -> bool {
        (&self.requester.id == a && &self.accepter.id == b)
            || (&self.requester.id == b && &self.accepter.id == a)
    }

    /// Whether either side of the connection lives in the account and region.
    pub fn involves(&self, account_id: &AccountId, region: &Region) -> bool {
        self.requester.lives_in(account_id, region) || self.accepter.lives_in(account_id, region)
    }
}

/// Resource-style query over peering connections.
///
/// Empty criteria match everything; set criteria must all hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeeringFilter {
    /// Required accepter VPC.
    pub accepter_vpc_id: Option<VpcId>,
    /// Required requester VPC.
    pub requester_vpc_id: Option<VpcId>,
    /// Required connection ids (any of).
    pub connection_ids: Vec<PeeringConnectionId>,
}

impl PeeringFilter {
    /// Filter for connections accepted by `accepter` and requested by `requester`.
    pub fn between(accepter: &VpcId, requester: &VpcId) -> Self {
        Self {
            accepter_vpc_id: Some(accepter.clone()),
            requester_vpc_id: Some(requester.clone()),
            connection_ids: Vec::new(),
        }
    }

    /// Filter for connections with the given ids.
    pub fn by_ids(ids: impl IntoIterator<Item = PeeringConnectionId>) -> Self {
        Self {
            connection_ids: ids.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Whether a connection satisfies every criterion.
    pub fn matches(&self, connection: &PeeringConnection) -> bool {
        self.accepter_vpc_id
            .as_ref()
            .is_none_or(|id| id == &connection.accepter.id)
            && self
                .requester_vpc_id
                .as_ref()
                .is_none_or(|id| id == &connection.requester.id)
            && (self.connection_ids.is_empty() || self.connection_ids.contains(&connection.id))
    }
}
