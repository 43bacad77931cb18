//! Measurement engine of the longtail profiler.
//!
//! Runs embedded in a single-threaded, hard-real-time render loop. For
//! every instrumented callable the engine coalesces all invocations within
//! one render into one sample (see [`ScriptTracker`]), summarizes those
//! samples per encounter in a tiered sketch, and when the encounter
//! closes builds a snapshot that is encoded and persisted off the combat
//! hot path.
//!
//! The host drives everything from one thread:
//!
//! - wrapped callables call [`Engine::record`];
//! - the per-render hook calls [`Engine::on_render`];
//! - host event dispatches call the encounter methods;
//! - a ~1 Hz ticker calls [`Engine::emit_tick`] until the pending
//!   recording is written.
//!
//! Nothing from the instrumented path ever propagates an error to the
//! host callback: a failure in measurement must never break what is being
//! measured.

mod encounter;
mod engine;
mod registry;
mod snapshot;
mod tracker;

pub use encounter::{ActiveEncounter, EncounterLifecycle, EncounterTag};
pub use engine::{EmitOutcome, Engine, EngineConfig, ENGINE_VERSION};
pub use registry::{FrameClock, TrackerRegistry};
pub use snapshot::{JsonCodec, RecordingStore, SnapshotCodec, DEFAULT_STORE_CAPACITY};
pub use tracker::{ScriptTracker, TrackerFactory};
