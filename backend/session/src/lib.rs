pub mod activity_log;
pub mod error;
pub mod store;

pub use activity_log::ActivityLog;
pub use error::SessionError;
pub use store::{ActiveSession, Session, SessionStore, LOG_FILE_NAME, SCREENSHOTS_DIR_NAME};
