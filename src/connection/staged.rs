//! Staged capture connection
//!
//! Each commit validates its candidate value against the device registry
//! scoped by everything committed before it, advances on success, and on
//! failure falls back to the attempted field's prerequisite stage so earlier
//! commitments survive a retry.

use super::stage::{EnabledStatus, Stage, StageField};
use crate::registry::{CaptureApi, RecordKey};
use crate::session::DeviceHub;
use anyhow::anyhow;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Successful commit outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Commit {
    /// The value was accepted and the connection advanced. `options` holds
    /// the valid choices for the next stage under the accepted value.
    Advanced {
        value: RecordKey,
        options: BTreeSet<RecordKey>,
    },
    /// The submitted value matches the committed one; nothing changed and no
    /// downstream state was reset, so the caller should not refresh anything.
    Unchanged,
}

/// Failed commit outcome: one surfaced shape, two distinct triggers.
#[derive(Debug, Error)]
pub enum CommitError {
    /// The commit was attempted before its prerequisite stage was reached.
    /// State is left untouched; this points at a stale caller.
    #[error("cannot update {field}: in invalid state {stage}")]
    OutOfOrder { field: &'static str, stage: Stage },

    /// The device rejected or failed to resolve the value. State was rolled
    /// back to the attempted field's prerequisite stage.
    #[error("{0}")]
    Rejected(String),
}

/// State machine enforcing strictly-ordered capture setup.
///
/// Commits take `&mut self`, so one connection can only ever have a single
/// in-flight commit: a commit fully succeeds or fully reverts before the
/// caller regains control.
pub struct StagedConnection {
    hub: Arc<DeviceHub>,
    /// Registry handle for the committed endpoint; `Some` iff the stage has
    /// reached `EndpointSet`.
    device: Option<Arc<dyn CaptureApi>>,
    stage: Stage,
    endpoint: Option<String>,
    project: Option<RecordKey>,
    participant: Option<RecordKey>,
    calibration: Option<RecordKey>,
    recording: Option<RecordKey>,
}

impl StagedConnection {
    pub fn new(hub: Arc<DeviceHub>) -> Self {
        Self {
            hub,
            device: None,
            stage: Stage::Disconnected,
            endpoint: None,
            project: None,
            participant: None,
            calibration: None,
            recording: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn project(&self) -> Option<&RecordKey> {
        self.project.as_ref()
    }

    pub fn participant(&self) -> Option<&RecordKey> {
        self.participant.as_ref()
    }

    pub fn calibration(&self) -> Option<&RecordKey> {
        self.calibration.as_ref()
    }

    pub fn recording(&self) -> Option<&RecordKey> {
        self.recording.as_ref()
    }

    /// Which commits are currently legal. Callers rendering controls should
    /// re-query this after every commit, successful or not.
    pub fn enabled_status(&self) -> EnabledStatus {
        EnabledStatus::for_stage(self.stage)
    }

    /// Connect to a capture endpoint. Allowed from any state; success drops
    /// every downstream commitment and lands on `EndpointSet`, returning the
    /// project ids already present on the device.
    pub async fn commit_endpoint(&mut self, endpoint: &str) -> Result<Commit, CommitError> {
        debug!(endpoint, stage = %self.stage, "setting endpoint");
        if self.endpoint.as_deref() == Some(endpoint) {
            return Ok(Commit::Unchanged);
        }

        let hub = Arc::clone(&self.hub);
        let attempt = async {
            let device = hub.connect(endpoint)?;
            let projects = device.projects().await?;
            anyhow::Ok((device, projects))
        }
        .await;

        match attempt {
            Ok((device, projects)) => {
                self.reset_to(Stage::EndpointSet);
                self.device = Some(device);
                self.endpoint = Some(endpoint.to_string());
                Ok(Commit::Advanced {
                    value: RecordKey::Name(endpoint.to_string()),
                    options: projects,
                })
            }
            Err(err) => {
                warn!(endpoint, "endpoint rejected: {err:#}");
                self.reset_to(Stage::Disconnected);
                Err(CommitError::Rejected(err.to_string()))
            }
        }
    }

    /// Commit the project id for this session.
    pub async fn commit_project(&mut self, id: RecordKey) -> Result<Commit, CommitError> {
        self.guard(StageField::Project)?;
        if self.project.as_ref() == Some(&id) {
            return Ok(Commit::Unchanged);
        }

        let attempt = match self.scope(StageField::Project) {
            Ok((device, path)) => device.resolve_or_create(&path, Some(id)).await,
            Err(err) => Err(err),
        };
        self.finish(StageField::Project, attempt)
    }

    /// Commit the participant id under the committed project.
    pub async fn commit_participant(&mut self, id: RecordKey) -> Result<Commit, CommitError> {
        self.guard(StageField::Participant)?;
        if self.participant.as_ref() == Some(&id) {
            return Ok(Commit::Unchanged);
        }

        let attempt = match self.scope(StageField::Participant) {
            Ok((device, path)) => device.resolve_or_create(&path, Some(id)).await,
            Err(err) => Err(err),
        };
        self.finish(StageField::Participant, attempt)
    }

    /// Commit a calibration under the committed participant. `None` asks the
    /// device to assign the next free integer id.
    pub async fn commit_calibration(
        &mut self,
        id: Option<RecordKey>,
    ) -> Result<Commit, CommitError> {
        self.guard(StageField::Calibration)?;
        // `None` always requests a fresh device-assigned id, so only an
        // explicit id can short-circuit.
        if id.is_some() && self.calibration == id {
            return Ok(Commit::Unchanged);
        }

        let attempt = match self.scope(StageField::Calibration) {
            Ok((device, path)) => device.resolve_or_create(&path, id).await,
            Err(err) => Err(err),
        };
        self.finish(StageField::Calibration, attempt)
    }

    /// Commit a recording under the committed calibration; terminal stage.
    /// Recordings have no children, so the returned options are empty.
    pub async fn commit_recording(
        &mut self,
        id: Option<RecordKey>,
    ) -> Result<Commit, CommitError> {
        self.guard(StageField::Recording)?;
        if id.is_some() && self.recording == id {
            return Ok(Commit::Unchanged);
        }

        let attempt = match self.scope(StageField::Recording) {
            Ok((device, path)) => device.resolve_or_create(&path, id).await,
            Err(err) => Err(err),
        };
        self.finish(StageField::Recording, attempt)
    }

    fn guard(&self, field: StageField) -> Result<(), CommitError> {
        if self.stage < field.required() {
            return Err(CommitError::OutOfOrder {
                field: field.name(),
                stage: self.stage,
            });
        }
        Ok(())
    }

    /// Device handle plus the committed ancestor chain for `field`.
    ///
    /// Guards run first, so a `None` here would mean the ordering invariant
    /// is broken; the error funnels through the normal rejection path rather
    /// than panicking.
    fn scope(
        &self,
        field: StageField,
    ) -> anyhow::Result<(Arc<dyn CaptureApi>, Vec<RecordKey>)> {
        let device = self
            .device
            .clone()
            .ok_or_else(|| anyhow!("no device connection for {}", field.name()))?;

        let depth = match field {
            StageField::Endpoint | StageField::Project => 0,
            StageField::Participant => 1,
            StageField::Calibration => 2,
            StageField::Recording => 3,
        };
        let chain = [&self.project, &self.participant, &self.calibration];
        let mut path = Vec::with_capacity(depth);
        for slot in chain.iter().take(depth) {
            let key = slot
                .as_ref()
                .ok_or_else(|| anyhow!("missing ancestor for {}", field.name()))?;
            path.push(key.clone());
        }
        Ok((device, path))
    }

    /// Land the registry outcome: advance on success, fall back on failure.
    fn finish(
        &mut self,
        field: StageField,
        attempt: anyhow::Result<(RecordKey, BTreeSet<RecordKey>)>,
    ) -> Result<Commit, CommitError> {
        match attempt {
            Ok((value, options)) => {
                debug!(field = field.name(), %value, "committed");
                self.reset_to(field.target());
                self.set(field, value.clone());
                Ok(Commit::Advanced { value, options })
            }
            Err(err) => {
                warn!(field = field.name(), "commit rejected: {err:#}");
                // The attempted field and everything below it are dropped;
                // validated ancestors survive for a retry.
                self.reset_to(field.required());
                Err(CommitError::Rejected(err.to_string()))
            }
        }
    }

    /// Drop every commitment belonging to a stage above `stage`.
    fn reset_to(&mut self, stage: Stage) {
        if stage < Stage::EndpointSet {
            self.endpoint = None;
            self.device = None;
        }
        if stage < Stage::ProjectSet {
            self.project = None;
        }
        if stage < Stage::ParticipantSet {
            self.participant = None;
        }
        if stage < Stage::CalibrationSet {
            self.calibration = None;
        }
        if stage < Stage::Ready {
            self.recording = None;
        }
        self.stage = stage;
    }

    fn set(&mut self, field: StageField, value: RecordKey) {
        match field {
            // the endpoint commit installs its own state (string + handle)
            StageField::Endpoint => {}
            StageField::Project => self.project = Some(value),
            StageField::Participant => self.participant = Some(value),
            StageField::Calibration => self.calibration = Some(value),
            StageField::Recording => self.recording = Some(value),
        }
    }
}
