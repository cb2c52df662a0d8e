//! Error types for peering reconciliation.
//!
//! The taxonomy mirrors how a reconciliation pass reacts to failure:
//! client-level remote API errors may be compensated at the accept boundary,
//! everything else aborts the pass and is left for the next one.

use thiserror::Error;

/// Remote error code reported when a peering connection id is unknown.
pub const CODE_CONNECTION_NOT_FOUND: &str = "InvalidVpcPeeringConnectionID.NotFound";

/// Remote error code reported when a VPC id is unknown to the caller.
pub const CODE_VPC_NOT_FOUND: &str = "InvalidVpcID.NotFound";

/// Remote error code reported when an active connection already links the pair.
pub const CODE_ALREADY_EXISTS: &str = "VpcPeeringConnectionAlreadyExists";

/// Remote error code reported when a connection is not in a state that allows the call.
pub const CODE_INVALID_STATE: &str = "InvalidStateTransition";

/// Remote error code reported when the caller's account may not perform the call.
pub const CODE_NOT_PERMITTED: &str = "OperationNotPermitted";

/// Core error type for peering operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The remote networking API rejected a call (client-level error).
    #[error("remote API error {code}: {message}")]
    RemoteApi { code: String, message: String },

    /// The remote API could not be reached or answered unintelligibly.
    #[error("transport failure: {reason}")]
    Transport { reason: String },

    /// No gateway is known for the account and region.
    #[error("no gateway for account '{account_id}' in region '{region}'")]
    GatewayNotFound { account_id: String, region: String },

    /// A waiter ran out of attempts before its condition held.
    #[error("waiter '{condition}' gave up after {attempts} attempts")]
    WaiterExhausted { condition: String, attempts: u32 },

    /// A connection id could not be found on the accepter side.
    #[error("peering connection '{connection_id}' is not visible to the accepter")]
    ConnectionNotVisible { connection_id: String },

    /// The compensating delete after a failed accept did not succeed.
    #[error("rollback of peering connection '{connection_id}' failed: {reason}")]
    RollbackFailed {
        connection_id: String,
        reason: String,
    },

    /// An action name did not match any known action.
    #[error("unknown action '{name}'")]
    UnknownAction { name: String },

    /// Configuration was rejected.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a remote API (client-level) error.
    pub fn remote_api(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteApi {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a transport error.
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Create a gateway not found error.
    pub fn gateway_not_found(account_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self::GatewayNotFound {
            account_id: account_id.into(),
            region: region.into(),
        }
    }

    /// Create a waiter exhausted error.
    pub fn waiter_exhausted(condition: impl Into<String>, attempts: u32) -> Self {
        Self::WaiterExhausted {
            condition: condition.into(),
            attempts,
        }
    }

    /// Create a connection not visible error.
    pub fn connection_not_visible(connection_id: impl Into<String>) -> Self {
        Self::ConnectionNotVisible {
            connection_id: connection_id.into(),
        }
    }

    /// Create a rollback failed error.
    pub fn rollback_failed(connection_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RollbackFailed {
            connection_id: connection_id.into(),
            reason: reason.into(),
        }
    }

    /// Create an unknown action error.
    pub fn unknown_action(name: impl Into<String>) -> Self {
        Self::UnknownAction { name: name.into() }
    }

    /// Create an invalid config error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Whether the remote API itself rejected the call.
    ///
    /// Only these errors are eligible for compensation during provisioning.
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::RemoteApi { .. })
    }

    /// Whether this is a client-level error with the given remote code.
    pub fn has_code(&self, expected: &str) -> bool {
        matches!(self, Self::RemoteApi { code, .. } if code == expected)
    }

    /// Whether the remote API reported an unknown connection id.
    pub fn is_not_found(&self) -> bool {
        self.has_code(CODE_CONNECTION_NOT_FOUND)
    }
}
