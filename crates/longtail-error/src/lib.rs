//! Error types for the longtail profiler core.
//!
//! The engine handles almost everything locally: ignored start events,
//! gated records, bin overflow, and pool exhaustion are policies, not
//! errors. What remains is surfaced through [`LongtailError`]: registration
//! conflicts (the core refuses to overwrite an existing identity) and
//! snapshot encoding failures (the recording is dropped, the engine stays
//! usable).

use thiserror::Error;

/// Primary error type for longtail operations.
#[derive(Error, Debug)]
pub enum LongtailError {
    // === Registration Errors ===
    /// Two different bindings were registered under the same identity
    /// string. The existing tracker is never overwritten.
    #[error("identity already registered: '{key}'")]
    IdentityCollision { key: String },

    /// A named identity was re-registered with metadata that does not match
    /// the original registration (dependent flag or group differ).
    #[error("identity '{key}' re-registered with conflicting metadata")]
    IdentityMetadataMismatch { key: String },

    /// A tracker id was used that this engine never issued.
    #[error("unknown tracker id: {id}")]
    UnknownTracker { id: u32 },

    // === Snapshot Errors ===
    /// The snapshot codec failed to serialize or compress a recording.
    /// The recording for that encounter is lost; nothing is retried.
    #[error("snapshot encoding failed: {detail}")]
    SnapshotFailed { detail: String },
}

/// Convenience alias used across the workspace.
pub type Result<T> = std::result::Result<T, LongtailError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LongtailError::IdentityCollision {
            key: "@addon/frame:OnUpdate".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "identity already registered: '@addon/frame:OnUpdate'"
        );

        let err = LongtailError::SnapshotFailed {
            detail: "buffer too small".to_owned(),
        };
        assert!(err.to_string().contains("buffer too small"));

        println!("[PASS] error display: messages render");
    }
}
