//! Configuration for peering reconciliation.

use std::path::Path;
use std::time::Duration;

use peering_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Reconciler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Whether and how to wait for a requested connection before accepting it.
    #[serde(default)]
    pub accept_wait: AcceptWaitPolicy,
}

/// Existence wait between the request and accept phases of provisioning.
///
/// The remote API is eventually consistent: a connection just requested on
/// one side may not yet be visible on the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptWaitPolicy {
    /// Wait before accepting.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Pause between polls.
    #[serde(with = "duration_ms", default = "default_delay", rename = "delay_ms")]
    pub delay: Duration,

    /// Polls before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for AcceptWaitPolicy {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            delay: default_delay(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl AcceptWaitPolicy {
    /// Accept straight after the request, trusting the lookup by id.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Wait with the given delay and attempt budget.
    pub const fn bounded(delay: Duration, max_attempts: u32) -> Self {
        Self {
            enabled: true,
            delay,
            max_attempts,
        }
    }
}

impl ReconcilerConfig {
    /// Create a config with the given wait policy.
    pub const fn with_accept_wait(accept_wait: AcceptWaitPolicy) -> Self {
        Self { accept_wait }
    }

    /// Check the configuration for values the reconciler cannot honor.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` when waiting is enabled with no attempts.
    pub fn validate(&self) -> Result<()> {
        if self.accept_wait.enabled && self.accept_wait.max_attempts == 0 {
            return Err(Error::invalid_config(
                "accept_wait.max_attempts must be at least 1 when waiting is enabled",
            ));
        }
        Ok(())
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unparsable values leave the default in place.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(flag) = lookup("PEERING_ACCEPT_WAIT") {
            config.accept_wait.enabled = !matches!(
                flag.trim().to_lowercase().as_str(),
                "0" | "false" | "off" | "no"
            );
        }

        if let Some(delay) = lookup("PEERING_ACCEPT_WAIT_DELAY_MS")
            .and_then(|raw| raw.trim().parse::<u64>().ok())
        {
            config.accept_wait.delay = Duration::from_millis(delay);
        }

        if let Some(attempts) = lookup("PEERING_ACCEPT_WAIT_MAX_ATTEMPTS")
            .and_then(|raw| raw.trim().parse::<u32>().ok())
        {
            config.accept_wait.max_attempts = attempts;
        }

        config
    }

    /// Load configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, does not parse, or fails
    /// validation.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        // JSON by extension, TOML otherwise
        let config: Self = if path.extension().is_some_and(|e| e == "json") {
            serde_json::from_str(&content)?
        } else {
            toml::from_str(&content)
                .map_err(|e| Error::invalid_config(format!("Failed to parse config: {e}")))?
        };

        config.validate()?;
        Ok(config)
    }
}

const fn default_enabled() -> bool {
    true
}

const fn default_delay() -> Duration {
    Duration::from_secs(2)
}

const fn default_max_attempts() -> u32 {
    10
}

/// Serialization helper for Duration as milliseconds.
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        u64::try_from(duration.as_millis())
            .unwrap_or(u64::MAX)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
