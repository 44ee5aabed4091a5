//! Capture device registry boundary
//!
//! The staged connection validates every setup value against the capture
//! service's registry of projects, participants, calibrations, and
//! recordings. This module defines that boundary as a trait plus the
//! in-memory implementation used for local sessions and tests.

mod key;
mod memory;

pub use key::RecordKey;
pub use memory::MemoryRegistry;

use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Capture service API surface the staged connection depends on.
///
/// In production this is backed by the device's remote API; [`MemoryRegistry`]
/// reproduces the same contract so either can sit behind the connection.
/// Implementations must tolerate concurrent calls from independent
/// connections addressing the same endpoint.
#[async_trait]
pub trait CaptureApi: Send + Sync {
    /// List the project ids currently known to the device.
    async fn projects(&self) -> Result<BTreeSet<RecordKey>>;

    /// Resolve `key` under the ancestor chain `path`, creating any missing
    /// entries on the way (idempotent set-or-create). A `None` key asks the
    /// device to assign the next free integer id.
    ///
    /// Returns the resolved key and the ids of its children, which are the
    /// valid choices for the next setup stage.
    async fn resolve_or_create(
        &self,
        path: &[RecordKey],
        key: Option<RecordKey>,
    ) -> Result<(RecordKey, BTreeSet<RecordKey>)>;
}
