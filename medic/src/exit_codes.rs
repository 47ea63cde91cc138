//! Stable exit codes for medic CLI commands.
//!
//! Guardrail skips and gate rejections are completed passes, not failures:
//! they exit [`OK`] and the written artifact carries the verdict.

/// Command completed and wrote its artifact (including skipped/rejected outcomes).
pub const OK: i32 = 0;
/// Configuration or input error (missing/malformed documents) or unexpected
/// internal failure. No partial state mutation is implied.
pub const INVALID: i32 = 1;
