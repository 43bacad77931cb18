//! Public API facade for the longtail profiler core.
//!
//! Host integrations normally need [`Engine`] plus the registration and
//! snapshot value types; the sketch layer is re-exported for tooling that
//! builds sketches directly.

pub use longtail_engine::{
    EmitOutcome, Engine, EngineConfig, JsonCodec, SnapshotCodec, ENGINE_VERSION,
};
pub use longtail_error::{LongtailError, Result};
pub use longtail_sketch::{BinPool, TieredSketch, TopK};
pub use longtail_types::{
    Encounter, FrameHandle, Recording, RecordingSnapshot, ScriptSlot, SketchParams,
    SketchSnapshot, TrackerExport, TrackerGroup, TrackerId,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facade_end_to_end() {
        let mut engine = Engine::new(EngineConfig::default());
        let id = engine
            .register_named_tracker("@addon/lib:Tick", false, TrackerGroup::Externals)
            .expect("fresh identity registers");

        engine.manual_start(100);
        engine.on_render(16.6);
        engine.record(id, 1.25);
        engine.manual_stop(101);
        assert_eq!(engine.emit_tick(false), EmitOutcome::Written);
        assert_eq!(engine.store().len(), 1);
    }
}
