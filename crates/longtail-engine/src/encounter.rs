//! Encounter lifecycle.
//!
//! An encounter is a bounded measurement session delimited by host events:
//! a raid boss pull, a timed dungeon run, or a manual test session. Exactly
//! one may be active at a time; its close triggers the snapshot.

use tracing::debug;

use longtail_types::Encounter;

/// Discriminant used to match stop events against the active encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncounterTag {
    Manual,
    Raid,
    Dungeon,
}

/// An encounter in progress, carrying everything known at start time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveEncounter {
    Manual {
        start_time: u64,
    },
    Raid {
        start_time: u64,
        encounter_id: u64,
        encounter_name: String,
        difficulty_id: u64,
        group_size: u64,
    },
    Dungeon {
        start_time: u64,
        map_id: u64,
        group_size: u64,
    },
}

impl ActiveEncounter {
    #[must_use]
    pub fn tag(&self) -> EncounterTag {
        match self {
            Self::Manual { .. } => EncounterTag::Manual,
            Self::Raid { .. } => EncounterTag::Raid,
            Self::Dungeon { .. } => EncounterTag::Dungeon,
        }
    }

    /// Finalize into encounter metadata for the recording.
    #[must_use]
    pub fn close(self, end_time: u64, success: bool) -> Encounter {
        match self {
            Self::Manual { start_time } => Encounter::Manual {
                start_time,
                end_time,
            },
            Self::Raid {
                start_time,
                encounter_id,
                encounter_name,
                difficulty_id,
                group_size,
            } => Encounter::Raid {
                start_time,
                end_time,
                encounter_name,
                encounter_id,
                success,
                difficulty_id,
                group_size,
            },
            Self::Dungeon {
                start_time,
                map_id,
                group_size,
            } => Encounter::Dungeon {
                start_time,
                end_time,
                success,
                map_id,
                group_size,
            },
        }
    }
}

/// Idle/Active state machine over host encounter events.
///
/// Start-while-active is ignored; in particular a raid start during an
/// active dungeon is suppressed (bosses inside a timed run belong to the
/// run). Stop events only close an encounter of their own kind.
#[derive(Debug, Default)]
pub struct EncounterLifecycle {
    active: Option<ActiveEncounter>,
}

impl EncounterLifecycle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    #[must_use]
    pub fn active(&self) -> Option<&ActiveEncounter> {
        self.active.as_ref()
    }

    /// Attempt to start an encounter. Returns `true` if it became active.
    pub fn try_start(&mut self, incoming: ActiveEncounter) -> bool {
        if let Some(current) = &self.active {
            debug!(
                target: "longtail.encounter",
                active = ?current.tag(),
                incoming = ?incoming.tag(),
                "start ignored, encounter already active"
            );
            return false;
        }
        debug!(target: "longtail.encounter", kind = ?incoming.tag(), "encounter started");
        self.active = Some(incoming);
        true
    }

    /// Attempt to close the active encounter with a stop event of `tag`.
    ///
    /// Returns the finalized metadata when the tags match; otherwise the
    /// event is ignored and the active encounter (if any) keeps running.
    pub fn try_stop(&mut self, tag: EncounterTag, end_time: u64, success: bool) -> Option<Encounter> {
        match &self.active {
            Some(current) if current.tag() == tag => {
                let closed = self.active.take()?.close(end_time, success);
                debug!(target: "longtail.encounter", kind = ?tag, success, "encounter closed");
                Some(closed)
            }
            Some(current) => {
                debug!(
                    target: "longtail.encounter",
                    active = ?current.tag(),
                    incoming = ?tag,
                    "stop ignored, kind does not match active encounter"
                );
                None
            }
            None => {
                debug!(target: "longtail.encounter", incoming = ?tag, "stop ignored, idle");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raid() -> ActiveEncounter {
        ActiveEncounter::Raid {
            start_time: 100,
            encounter_id: 2680,
            encounter_name: "Rashok".to_owned(),
            difficulty_id: 16,
            group_size: 20,
        }
    }

    fn dungeon() -> ActiveEncounter {
        ActiveEncounter::Dungeon {
            start_time: 50,
            map_id: 403,
            group_size: 5,
        }
    }

    #[test]
    fn test_start_stop_roundtrip() {
        let mut lc = EncounterLifecycle::new();
        assert!(!lc.is_active());
        assert!(lc.try_start(raid()));
        assert!(lc.is_active());

        let closed = lc.try_stop(EncounterTag::Raid, 400, true).unwrap();
        assert!(!lc.is_active());
        match closed {
            Encounter::Raid {
                start_time,
                end_time,
                success,
                ..
            } => {
                assert_eq!(start_time, 100);
                assert_eq!(end_time, 400);
                assert!(success);
            }
            other => panic!("expected raid, got {other:?}"),
        }
        println!("[PASS] lifecycle: start/stop closes with metadata");
    }

    #[test]
    fn test_start_while_active_ignored() {
        let mut lc = EncounterLifecycle::new();
        assert!(lc.try_start(raid()));
        assert!(!lc.try_start(ActiveEncounter::Manual { start_time: 1 }));
        assert_eq!(lc.active().unwrap().tag(), EncounterTag::Raid);
        println!("[PASS] lifecycle: second start is a no-op");
    }

    #[test]
    fn test_raid_start_suppressed_during_dungeon() {
        let mut lc = EncounterLifecycle::new();
        assert!(lc.try_start(dungeon()));
        assert!(!lc.try_start(raid()), "dungeon takes precedence");
        assert_eq!(lc.active().unwrap().tag(), EncounterTag::Dungeon);

        // The raid's end event cannot close the dungeon either.
        assert!(lc.try_stop(EncounterTag::Raid, 200, true).is_none());
        assert!(lc.is_active());

        let closed = lc.try_stop(EncounterTag::Dungeon, 300, true).unwrap();
        assert!(matches!(closed, Encounter::Dungeon { .. }));
        println!("[PASS] lifecycle: dungeon precedence over raid events");
    }

    #[test]
    fn test_stop_while_idle_ignored() {
        let mut lc = EncounterLifecycle::new();
        assert!(lc.try_stop(EncounterTag::Manual, 10, false).is_none());
        println!("[PASS] lifecycle: stop while idle is a no-op");
    }
}
