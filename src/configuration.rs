use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use typed_builder::TypedBuilder;

use crate::Result;

const DEFAULT_RECONCILE_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 5;

#[derive(Debug, TypedBuilder, Deserialize)]
pub struct Configuration {
    pub controller_name: String,
    #[builder(default)]
    pub enable_open_telemetry: Option<bool>,
    /// Watch Ingresses in this namespace only, every namespace when absent.
    #[builder(default)]
    pub watch_namespace: Option<String>,
    #[builder(default)]
    pub reconcile_timeout_seconds: Option<u64>,
    #[builder(default)]
    pub max_conflict_retries: Option<u32>,
}

#[derive(Error, Debug)]
enum ConfigurationError {
    #[error("controller name must be not empty")]
    ControllerName,
    #[error("reconcile timeout must be greater than zero")]
    ReconcileTimeout,
    #[error("at least one attempt to write the tunnel configuration is needed")]
    ConflictRetries,
}

impl Configuration {
    pub fn validate(&self) -> Result<()> {
        if self.controller_name.is_empty() {
            return Err(ConfigurationError::ControllerName.into());
        }
        if self.reconcile_timeout_seconds == Some(0) {
            return Err(ConfigurationError::ReconcileTimeout.into());
        }
        if self.max_conflict_retries == Some(0) {
            return Err(ConfigurationError::ConflictRetries.into());
        }
        Ok(())
    }

    pub fn reconcile_timeout(&self) -> Duration {
        Duration::from_secs(self.reconcile_timeout_seconds.unwrap_or(DEFAULT_RECONCILE_TIMEOUT_SECONDS))
    }

    pub fn max_conflict_retries(&self) -> u32 {
        self.max_conflict_retries.unwrap_or(DEFAULT_MAX_CONFLICT_RETRIES)
    }
}
