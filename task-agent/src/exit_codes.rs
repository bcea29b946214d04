//! Stable exit codes for the `task-agent` binary.

/// The session ended, either with the task done or cancelled by the user.
pub const OK: i32 = 0;
/// Invalid config, or a terminal or filesystem error stopped the session.
pub const INVALID: i32 = 1;
