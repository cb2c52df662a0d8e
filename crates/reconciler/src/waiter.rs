//! Bounded polling until a remote condition holds.

use std::sync::Arc;

use peering_core::{Error, PeeringConnectionId, PeeringFilter, Result};
use tracing::debug;

use crate::config::AcceptWaitPolicy;
use crate::gateway::Gateway;

/// Remote conditions a [`Waiter`] can poll for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitCondition {
    /// Every listed connection id is visible to the gateway.
    PeeringConnectionExists,
}

impl WaitCondition {
    /// Stable name used in logs and errors.
    pub const fn name(self) -> &'static str {
        match self {
            Self::PeeringConnectionExists => "peering_connection_exists",
        }
    }
}

impl std::fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Polls a gateway with a fixed delay until a condition holds.
pub struct Waiter {
    gateway: Arc<dyn Gateway>,
    condition: WaitCondition,
}

impl Waiter {
    /// Create a waiter for `condition` on `gateway`.
    pub fn new(gateway: Arc<dyn Gateway>, condition: WaitCondition) -> Self {
        Self { gateway, condition }
    }

    /// Block until the condition holds for `ids`, returning the attempts used.
    ///
    /// A not-found rejection while polling counts as "not yet". The delay is
    /// only slept between attempts.
    ///
    /// # Errors
    ///
    /// Returns `Error::WaiterExhausted` once `policy.max_attempts` polls have
    /// failed, or any other error the gateway raises while polling.
    pub async fn wait(
        &self,
        ids: &[PeeringConnectionId],
        policy: &AcceptWaitPolicy,
    ) -> Result<u32> {
        let filter = PeeringFilter::by_ids(ids.iter().cloned());

        for attempt in 1..=policy.max_attempts {
            if self.holds(ids, &filter).await? {
                debug!(condition = %self.condition, attempt, "Wait condition met");
                return Ok(attempt);
            }

            debug!(
                condition = %self.condition,
                attempt,
                max_attempts = policy.max_attempts,
                "Wait condition not met yet"
            );

            if attempt < policy.max_attempts {
                tokio::time::sleep(policy.delay).await;
            }
        }

        Err(Error::waiter_exhausted(
            self.condition.name(),
            policy.max_attempts,
        ))
    }

    async fn holds(&self, ids: &[PeeringConnectionId], filter: &PeeringFilter) -> Result<bool> {
        match self.condition {
            WaitCondition::PeeringConnectionExists => {
                match self.gateway.describe_peering_connections(filter).await {
                    Ok(found) => Ok(ids.iter().all(|id| found.iter().any(|c| &c.id == id))),
                    Err(e) if e.is_not_found() => Ok(false),
                    Err(e) => Err(e),
                }
            }
        }
    }
}
