//! Orchestrator configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Turn orchestration configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestratorConfig {
    /// Bound on each extractor, profile and retriever call, in seconds
    #[serde(default = "default_collaborator_timeout")]
    pub collaborator_timeout_secs: u64,
}

impl OrchestratorConfig {
    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_secs(self.collaborator_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.collaborator_timeout_secs == 0 || self.collaborator_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout(
                "orchestrator.collaborator_timeout_secs",
            ));
        }
        Ok(())
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            collaborator_timeout_secs: default_collaborator_timeout(),
        }
    }
}

fn default_collaborator_timeout() -> u64 {
    crate::application::DEFAULT_COLLABORATOR_TIMEOUT.as_secs()
}
