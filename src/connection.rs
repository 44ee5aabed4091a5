//! Staged connection state machine for capture setup
//!
//! A recording session on a capture device is configured in strict order:
//! endpoint, then project, participant, calibration, recording. This module
//! enforces that order, validates every value against the device registry,
//! and rolls back cleanly when the device rejects one.

mod stage;
mod staged;


pub use stage::{EnabledStatus, Stage, StageField};
pub use staged::{Commit, CommitError, StagedConnection};
