use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use codebuddy_core::{
    CaptureError, ChatMessage, CompletionClient, CompletionRequest, ContentPart, Frame,
    FrameSource, WindowId, WindowInspector,
};
use codebuddy_session::{ActiveSession, SessionStore};
use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::pause::PauseHandle;

pub const VISION_SYSTEM_PROMPT: &str = "You are looking at one screenshot from a series taken \
while the user works. Your reply is appended to the user's activity log, so only output \
information that matters. The user will later ask questions about this log to recall what \
they were doing, so it acts as their short-term memory.";

#[derive(Debug, Clone)]
pub struct CaptureSettings {
    /// Sleep between capture attempts.
    pub interval: Duration,
    pub vision_model: String,
    pub max_tokens: u32,
    /// Skip captures while the window the tool was started from has focus.
    pub skip_own_window: bool,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            vision_model: "gpt-4o-mini".to_string(),
            max_tokens: 500,
            skip_own_window: true,
        }
    }
}

/// State owned by the running loop.
#[derive(Debug)]
pub struct CaptureState {
    /// Screenshots taken in the current session; names the files.
    pub counter: u32,
    pub starting_window: WindowId,
    session_id: Option<String>,
}

impl CaptureState {
    pub fn new(starting_window: WindowId) -> Self {
        Self {
            counter: 0,
            starting_window,
            session_id: None,
        }
    }
}

/// What one wake-up of the loop did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Paused,
    NoSession,
    SkippedOwnWindow,
    /// The frame could not be acquired.
    CaptureFailed,
    /// The frame was taken but the vision call failed.
    DescribeFailed,
    Described,
}

/// Performs single capture attempts against the current session.
pub struct CaptureWorker {
    sessions: Arc<SessionStore>,
    frames: Arc<dyn FrameSource>,
    windows: Arc<dyn WindowInspector>,
    model: Arc<dyn CompletionClient>,
    settings: CaptureSettings,
    pause: PauseHandle,
}

impl CaptureWorker {
    pub fn new(
        sessions: Arc<SessionStore>,
        frames: Arc<dyn FrameSource>,
        windows: Arc<dyn WindowInspector>,
        model: Arc<dyn CompletionClient>,
        settings: CaptureSettings,
    ) -> Self {
        Self {
            sessions,
            frames,
            windows,
            model,
            settings,
            pause: PauseHandle::new(),
        }
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    pub fn pause_handle(&self) -> PauseHandle {
        self.pause.clone()
    }

    /// Identity of the focused window right now.
    pub async fn current_window(&self) -> WindowId {
        let windows = Arc::clone(&self.windows);
        tokio::task::spawn_blocking(move || windows.active_window_identity())
            .await
            .unwrap_or(WindowId::Unsupported)
    }

    /// One wake-up: capture unless paused.
    pub async fn tick(&self, state: &mut CaptureState) -> CaptureOutcome {
        if self.pause.is_paused() {
            return CaptureOutcome::Paused;
        }
        self.capture_screen(state).await
    }

    /// Capture, describe, and log one frame. Failures are logged, never returned.
    pub async fn capture_screen(&self, state: &mut CaptureState) -> CaptureOutcome {
        let Some(active) = self.sessions.current() else {
            debug!("No current session; nothing to capture into");
            return CaptureOutcome::NoSession;
        };
        if state.session_id.as_deref() != Some(active.id()) {
            state.session_id = Some(active.id().to_string());
            state.counter = 0;
        }

        if self.settings.skip_own_window
            && self.current_window().await.same_window(&state.starting_window)
        {
            debug!("Skipping capture; still in starting window");
            return CaptureOutcome::SkippedOwnWindow;
        }

        let windows = Arc::clone(&self.windows);
        let label = tokio::task::spawn_blocking(move || windows.active_window_label())
            .await
            .unwrap_or_else(|_| "Unknown".to_string());
        info!(session = %active.id(), window = %label, "Capturing screen");

        let frames = Arc::clone(&self.frames);
        let frame = tokio::task::spawn_blocking(move || frames.capture_frame())
            .await
            .unwrap_or_else(|e| {
                Err(CaptureError::Command {
                    command: "capture_frame".to_string(),
                    message: e.to_string(),
                })
            });
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                error!(error = %e, "Screen capture failed");
                record(&active, &format!("Failed to capture screen: {e}")).await;
                return CaptureOutcome::CaptureFailed;
            }
        };

        let screenshot = active
            .session
            .screenshot_path(state.counter, frame.format.extension());
        state.counter += 1;
        match fs::write(&screenshot, &frame.bytes).await {
            Ok(()) => debug!(path = %screenshot.display(), "Saved screenshot"),
            Err(e) => warn!(path = %screenshot.display(), error = %e, "Failed to save screenshot"),
        }

        match self.model.complete(vision_request(&self.settings, &label, &frame)).await {
            Ok(completion) => {
                record(&active, &format!("Active window: {label}")).await;
                let description = completion
                    .content
                    .unwrap_or_else(|| "(vision model returned no description)".to_string());
                record(&active, &description).await;
                CaptureOutcome::Described
            }
            Err(e) => {
                error!(error = %e, model = %self.settings.vision_model, "Vision request failed");
                record(&active, &format!("Failed to send screenshot to vision model: {e}")).await;
                CaptureOutcome::DescribeFailed
            }
        }
    }
}

fn vision_request(settings: &CaptureSettings, label: &str, frame: &Frame) -> CompletionRequest {
    let parts = vec![
        ContentPart::Text(format!(
            "Describe what's happening in this screenshot. The active window is: {label}"
        )),
        ContentPart::Image {
            media_type: frame.format.mime_type().to_string(),
            data: STANDARD.encode(&frame.bytes),
        },
    ];
    CompletionRequest::new(&settings.vision_model, vec![ChatMessage::user_parts(parts)])
        .with_system(VISION_SYSTEM_PROMPT)
        .with_max_tokens(settings.max_tokens)
}

async fn record(active: &ActiveSession, text: &str) {
    if let Err(e) = active.log.append(text).await {
        warn!(session = %active.id(), error = %e, "Failed to append to activity log");
    }
}


#[cfg(test)]
mod tests {
    use super::stubs::{StubFrames, StubWindows};
    use super::*;
    use async_trait::async_trait;
    use codebuddy_core::{Completion, MessageContent, ModelError};
    use codebuddy_providers::MockClient;
    use tokio::sync::Notify;

    struct Harness {
        _dir: tempfile::TempDir,
        sessions: Arc<SessionStore>,
        windows: Arc<StubWindows>,
    }

    async fn harness() -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let sessions = Arc::new(SessionStore::open(dir.path().join("sessions")).unwrap());
        sessions.create_session(None).await.unwrap();
        Harness {
            _dir: dir,
            sessions,
            windows: Arc::new(StubWindows::focused("terminal", "Code: main.rs")),
        }
    }

    fn worker(h: &Harness, model: Arc<dyn CompletionClient>, fail_frames: bool) -> CaptureWorker {
        CaptureWorker::new(
            Arc::clone(&h.sessions),
            Arc::new(StubFrames { fail: fail_frames }),
            h.windows.clone(),
            model,
            CaptureSettings::default(),
        )
    }

    async fn log_lines(h: &Harness) -> Vec<String> {
        let content = h.sessions.current().unwrap().log.read_all().await.unwrap();
        content
            .lines()
            .map(|l| l.split_once("] ").map(|(_, t)| t).unwrap_or(l).to_string())
            .collect()
    }

    fn starting_state() -> CaptureState {
        CaptureState::new(WindowId::Known("terminal".into()))
    }

    #[tokio::test]
    async fn capture_logs_window_and_description() {
        let h = harness().await;
        let model = Arc::new(MockClient::new().with_response("Editor open"));
        let worker = worker(&h, model.clone(), false);
        let mut state = starting_state();
        h.windows.focus("editor");

        assert_eq!(worker.tick(&mut state).await, CaptureOutcome::Described);

        assert_eq!(log_lines(&h).await, vec!["Active window: Code: main.rs", "Editor open"]);
        assert_eq!(state.counter, 1);
        let active = h.sessions.current().unwrap();
        assert!(active.session.screenshot_path(0, "png").is_file());

        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "gpt-4o-mini");
        assert_eq!(requests[0].max_tokens, Some(500));
        assert_eq!(requests[0].system.as_deref(), Some(VISION_SYSTEM_PROMPT));
        let MessageContent::Parts(parts) = &requests[0].messages[0].content else {
            panic!("vision request should be multi-part");
        };
        assert!(matches!(&parts[0], ContentPart::Text(t) if t.ends_with("Code: main.rs")));
        assert!(matches!(
            &parts[1],
            ContentPart::Image { media_type, data }
                if media_type == "image/png" && *data == STANDARD.encode(b"not-really-a-png")
        ));
    }

    #[tokio::test]
    async fn own_window_is_skipped_silently() {
        let h = harness().await;
        let model = Arc::new(MockClient::new());
        let worker = worker(&h, model.clone(), false);
        let mut state = starting_state();

        assert_eq!(worker.tick(&mut state).await, CaptureOutcome::SkippedOwnWindow);
        assert!(log_lines(&h).await.is_empty());
        assert_eq!(state.counter, 0);
        assert!(model.requests().is_empty());
    }

    #[tokio::test]
    async fn own_window_captured_when_skipping_disabled() {
        let h = harness().await;
        let worker = CaptureWorker::new(
            Arc::clone(&h.sessions),
            Arc::new(StubFrames { fail: false }),
            h.windows.clone(),
            Arc::new(MockClient::new()),
            CaptureSettings {
                skip_own_window: false,
                ..CaptureSettings::default()
            },
        );
        let mut state = starting_state();
        assert_eq!(worker.tick(&mut state).await, CaptureOutcome::Described);
        assert_eq!(state.counter, 1);
    }

    #[tokio::test]
    async fn paused_tick_writes_nothing() {
        let h = harness().await;
        let worker = worker(&h, Arc::new(MockClient::new()), false);
        let mut state = starting_state();
        h.windows.focus("editor");

        worker.pause_handle().pause();
        assert_eq!(worker.tick(&mut state).await, CaptureOutcome::Paused);
        assert!(log_lines(&h).await.is_empty());
        assert_eq!(state.counter, 0);

        worker.pause_handle().resume();
        assert_eq!(worker.tick(&mut state).await, CaptureOutcome::Described);
    }

    #[tokio::test]
    async fn vision_failure_is_logged_and_loop_continues() {
        let h = harness().await;
        let model = Arc::new(MockClient::new().with_response("Browser open"));
        model.push_failure("overloaded");
        let worker = worker(&h, model, false);
        let mut state = starting_state();
        h.windows.focus("browser");

        assert_eq!(worker.tick(&mut state).await, CaptureOutcome::DescribeFailed);
        assert_eq!(worker.tick(&mut state).await, CaptureOutcome::Described);

        let lines = log_lines(&h).await;
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Failed to send screenshot to vision model:"));
        assert!(lines[0].contains("overloaded"));
        assert_eq!(lines[2], "Browser open");
        assert_eq!(state.counter, 2);
    }

    #[tokio::test]
    async fn frame_failure_keeps_counter() {
        let h = harness().await;
        let model = Arc::new(MockClient::new());
        let worker = worker(&h, model.clone(), true);
        let mut state = starting_state();
        h.windows.focus("editor");

        assert_eq!(worker.tick(&mut state).await, CaptureOutcome::CaptureFailed);
        assert_eq!(state.counter, 0);
        assert!(model.requests().is_empty());
        assert!(log_lines(&h).await[0].starts_with("Failed to capture screen:"));
    }

    #[tokio::test]
    async fn new_session_restarts_counter() {
        let h = harness().await;
        let worker = worker(&h, Arc::new(MockClient::new()), false);
        let mut state = starting_state();
        h.windows.focus("editor");

        worker.tick(&mut state).await;
        worker.tick(&mut state).await;
        assert_eq!(state.counter, 2);
        let old = h.sessions.current().unwrap();

        let fresh = h.sessions.create_session(None).await.unwrap();
        worker.tick(&mut state).await;

        assert_eq!(state.counter, 1);
        assert!(fresh.session.screenshot_path(0, "png").is_file());
        assert_eq!(log_lines(&h).await.len(), 2);
        assert_eq!(old.log.read_all().await.unwrap().lines().count(), 4);
    }

    #[tokio::test]
    async fn no_session_no_capture() {
        let dir = tempfile::tempdir().unwrap();
        let sessions = Arc::new(SessionStore::open(dir.path()).unwrap());
        let worker = CaptureWorker::new(
            sessions,
            Arc::new(StubFrames { fail: false }),
            Arc::new(StubWindows::focused("editor", "Editor")),
            Arc::new(MockClient::new()),
            CaptureSettings::default(),
        );
        let mut state = CaptureState::new(WindowId::Unsupported);
        assert_eq!(worker.tick(&mut state).await, CaptureOutcome::NoSession);
    }

    /// Holds every completion until released.
    struct GatedClient {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl CompletionClient for GatedClient {
        async fn complete(&self, _request: CompletionRequest) -> Result<Completion, ModelError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(Completion::text("Terminal busy"))
        }
    }

    #[tokio::test]
    async fn pause_does_not_cancel_in_flight_capture() {
        let h = harness().await;
        let gate = Arc::new(GatedClient {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let worker = Arc::new(worker(&h, gate.clone(), false));
        let pause = worker.pause_handle();
        h.windows.focus("editor");

        let in_flight = {
            let worker = Arc::clone(&worker);
            tokio::spawn(async move {
                let mut state = starting_state();
                let outcome = worker.tick(&mut state).await;
                (outcome, state)
            })
        };

        gate.entered.notified().await;
        pause.pause();
        gate.release.notify_one();

        let (outcome, mut state) = in_flight.await.unwrap();
        assert_eq!(outcome, CaptureOutcome::Described);
        assert_eq!(state.counter, 1);
        assert_eq!(log_lines(&h).await.last().map(String::as_str), Some("Terminal busy"));

        assert_eq!(worker.tick(&mut state).await, CaptureOutcome::Paused);
        assert_eq!(state.counter, 1);
        assert_eq!(log_lines(&h).await.len(), 2);
    }
}
