//! Diagnostic logging for CodeBuddy.
//!
//! Diagnostics go to a rolling JSON file and, for warnings and errors, to
//! stderr. The activity log a session records is separate and never passes
//! through here.

pub mod logger;
pub mod redact;

pub use logger::{init_logger, LoggerGuard};
pub use redact::redact_sensitive_data;
