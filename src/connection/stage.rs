//! Setup stage ordering and per-stage gating

use std::collections::HashMap;
use std::fmt;

/// Setup progress of a staged capture connection.
///
/// Stages are strictly ordered; each one is reachable only after a value has
/// been committed for every stage below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Disconnected,
    EndpointSet,
    ProjectSet,
    ParticipantSet,
    CalibrationSet,
    /// All five values committed; data collection can start.
    Ready,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Disconnected => "disconnected",
            Stage::EndpointSet => "endpoint-set",
            Stage::ProjectSet => "project-set",
            Stage::ParticipantSet => "participant-set",
            Stage::CalibrationSet => "calibration-set",
            Stage::Ready => "ready",
        };
        write!(f, "{}", name)
    }
}

/// The five user-settable fields, one per stage transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageField {
    Endpoint,
    Project,
    Participant,
    Calibration,
    Recording,
}

impl StageField {
    pub fn name(self) -> &'static str {
        match self {
            StageField::Endpoint => "endpoint",
            StageField::Project => "project",
            StageField::Participant => "participant",
            StageField::Calibration => "calibration",
            StageField::Recording => "recording",
        }
    }

    /// Stage the connection reaches when this field commits.
    pub fn target(self) -> Stage {
        match self {
            StageField::Endpoint => Stage::EndpointSet,
            StageField::Project => Stage::ProjectSet,
            StageField::Participant => Stage::ParticipantSet,
            StageField::Calibration => Stage::CalibrationSet,
            StageField::Recording => Stage::Ready,
        }
    }

    /// Minimum stage required before this field may be attempted. Also the
    /// stage a failed attempt falls back to.
    pub fn required(self) -> Stage {
        match self {
            StageField::Endpoint => Stage::Disconnected,
            StageField::Project => Stage::EndpointSet,
            StageField::Participant => Stage::ProjectSet,
            StageField::Calibration => Stage::ParticipantSet,
            StageField::Recording => Stage::CalibrationSet,
        }
    }
}

/// Which setup actions are currently legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnabledStatus {
    pub endpoint: bool,
    pub project: bool,
    pub participant: bool,
    pub calibration: bool,
    pub recording: bool,
}

impl EnabledStatus {
    /// Gating is a pure function of the current stage; the endpoint field is
    /// always available as the entry point.
    pub fn for_stage(stage: Stage) -> Self {
        Self {
            endpoint: true,
            project: stage >= Stage::EndpointSet,
            participant: stage >= Stage::ProjectSet,
            calibration: stage >= Stage::ParticipantSet,
            recording: stage >= Stage::CalibrationSet,
        }
    }

    /// Field-name to flag map for renderers that iterate over controls.
    pub fn as_map(&self) -> HashMap<&'static str, bool> {
        HashMap::from([
            ("endpoint", self.endpoint),
            ("project", self.project),
            ("participant", self.participant),
            ("calibration", self.calibration),
            ("recording", self.recording),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stages_are_strictly_ordered() {
        assert!(Stage::Disconnected < Stage::EndpointSet);
        assert!(Stage::EndpointSet < Stage::ProjectSet);
        assert!(Stage::ProjectSet < Stage::ParticipantSet);
        assert!(Stage::ParticipantSet < Stage::CalibrationSet);
        assert!(Stage::CalibrationSet < Stage::Ready);
    }

    #[test]
    fn test_required_is_the_stage_below_target() {
        for field in [
            StageField::Endpoint,
            StageField::Project,
            StageField::Participant,
            StageField::Calibration,
            StageField::Recording,
        ] {
            assert!(field.required() < field.target(), "{}", field.name());
        }
    }

    #[test]
    fn test_gating_follows_the_stage() {
        let disconnected = EnabledStatus::for_stage(Stage::Disconnected);
        assert!(disconnected.endpoint);
        assert!(!disconnected.project);
        assert!(!disconnected.recording);

        let project_set = EnabledStatus::for_stage(Stage::ProjectSet);
        assert!(project_set.participant);
        assert!(!project_set.calibration);

        let ready = EnabledStatus::for_stage(Stage::Ready);
        assert!(ready.project && ready.participant && ready.calibration && ready.recording);
    }

    #[test]
    fn test_map_covers_every_field() {
        let map = EnabledStatus::for_stage(Stage::EndpointSet).as_map();
        assert_eq!(map.len(), 5);
        assert!(map["endpoint"]);
        assert!(map["project"]);
        assert!(!map["participant"]);
    }
}
