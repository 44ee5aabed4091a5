//! Single-step Pupil Capture connection
//!
//! Contrast to the staged capture flow: a Pupil endpoint needs no
//! project/participant/calibration sequencing, only one reachable remote.
//! The wire protocol to the remote plugin lives behind [`PupilDialer`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Probes a Pupil Capture remote-plugin endpoint.
#[async_trait]
pub trait PupilDialer: Send + Sync {
    async fn dial(&self, endpoint: &str) -> Result<()>;
}

/// One-shot connection: remembers the endpoint once a probe succeeds.
pub struct PupilConnection {
    dialer: Arc<dyn PupilDialer>,
    endpoint: Option<String>,
}

impl PupilConnection {
    pub fn new(dialer: Arc<dyn PupilDialer>) -> Self {
        Self {
            dialer,
            endpoint: None,
        }
    }

    /// Probe `endpoint` and adopt it on success. A failed probe leaves the
    /// previously configured endpoint (if any) in place.
    pub async fn update(&mut self, endpoint: &str) -> Result<()> {
        self.dialer
            .dial(endpoint)
            .await
            .with_context(|| format!("failed to reach Pupil Capture at {endpoint}"))?;
        info!(endpoint, "pupil capture connected");
        self.endpoint = Some(endpoint.to_string());
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Configured endpoint. Using the connection before a successful probe
    /// is a caller bug and surfaces as a hard error.
    pub fn endpoint(&self) -> Result<&str> {
        self.endpoint
            .as_deref()
            .context("pupil connection is not configured")
    }
}
