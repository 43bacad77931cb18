//! Encounter metadata for one completed measurement session.

use serde::{Deserialize, Serialize};

/// Metadata of one completed encounter, as it appears in a recording.
///
/// The serialized tag and field names are the profiler's established wire
/// format (camelCase, dungeon runs tagged `mythicplus`); viewer-side
/// tooling depends on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Encounter {
    /// Explicitly started/stopped test session.
    Manual {
        #[serde(rename = "startTime")]
        start_time: u64,
        #[serde(rename = "endTime")]
        end_time: u64,
    },
    /// Raid boss encounter.
    Raid {
        #[serde(rename = "startTime")]
        start_time: u64,
        #[serde(rename = "endTime")]
        end_time: u64,
        #[serde(rename = "encounterName")]
        encounter_name: String,
        #[serde(rename = "encounterId")]
        encounter_id: u64,
        success: bool,
        #[serde(rename = "difficultyId")]
        difficulty_id: u64,
        #[serde(rename = "groupSize")]
        group_size: u64,
    },
    /// Timed dungeon run.
    #[serde(rename = "mythicplus")]
    Dungeon {
        #[serde(rename = "startTime")]
        start_time: u64,
        #[serde(rename = "endTime")]
        end_time: u64,
        success: bool,
        #[serde(rename = "mapId")]
        map_id: u64,
        #[serde(rename = "groupSize")]
        group_size: u64,
    },
}

impl Encounter {
    /// Unix start timestamp (seconds).
    #[must_use]
    pub fn start_time(&self) -> u64 {
        match self {
            Self::Manual { start_time, .. }
            | Self::Raid { start_time, .. }
            | Self::Dungeon { start_time, .. } => *start_time,
        }
    }

    /// Unix end timestamp (seconds).
    #[must_use]
    pub fn end_time(&self) -> u64 {
        match self {
            Self::Manual { end_time, .. }
            | Self::Raid { end_time, .. }
            | Self::Dungeon { end_time, .. } => *end_time,
        }
    }
}
