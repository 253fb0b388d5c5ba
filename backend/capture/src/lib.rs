//! Ambient screen capture: a timer-driven task that describes the focused
//! screen with a vision model and appends the result to the current
//! session's activity log.

pub mod capture_loop;
pub mod pause;
pub mod platform;
pub mod worker;

pub use capture_loop::CaptureLoop;
pub use pause::PauseHandle;
pub use platform::{downscale_png, SystemFrameSource, SystemWindowInspector};
pub use worker::{CaptureOutcome, CaptureSettings, CaptureState, CaptureWorker, VISION_SYSTEM_PROMPT};
