use std::sync::Arc;

use anyhow::bail;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::pause::PauseHandle;
use crate::worker::{CaptureState, CaptureWorker};

struct RunningLoop {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the background capture task.
///
/// The task sleeps for the configured interval, then asks the worker for one
/// capture. Pausing only gates future captures; one already in flight runs
/// to completion.
pub struct CaptureLoop {
    worker: Arc<CaptureWorker>,
    running: Mutex<Option<RunningLoop>>,
}

impl CaptureLoop {
    pub fn new(worker: CaptureWorker) -> Self {
        Self {
            worker: Arc::new(worker),
            running: Mutex::new(None),
        }
    }

    pub fn pause_handle(&self) -> PauseHandle {
        self.worker.pause_handle()
    }

    pub fn pause(&self) {
        self.worker.pause_handle().pause();
    }

    pub fn resume(&self) {
        self.worker.pause_handle().resume();
    }

    pub fn is_paused(&self) -> bool {
        self.worker.pause_handle().is_paused()
    }

    pub async fn is_running(&self) -> bool {
        self.running
            .lock()
            .await
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }

    /// Record the starting window and spawn the loop.
    pub async fn start(&self) -> anyhow::Result<()> {
        let mut running = self.running.lock().await;
        if running.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            bail!("capture loop already running");
        }

        let period = self.worker.settings().interval;
        if period.is_zero() {
            bail!("capture interval must be non-zero");
        }
        let Some(first_tick) = Instant::now().checked_add(period) else {
            bail!("capture interval of {}s is too large", period.as_secs());
        };

        let starting_window = self.worker.current_window().await;
        debug!(window = ?starting_window, "Recorded starting window");

        let cancel = CancellationToken::new();
        let worker = Arc::clone(&self.worker);
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut state = CaptureState::new(starting_window);
            let mut ticker = interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let outcome = worker.tick(&mut state).await;
                        debug!(?outcome, counter = state.counter, "Capture tick");
                    }
                }
            }
            info!("Capture loop stopped");
        });

        info!(interval_secs = period.as_secs_f64(), "Capture loop started");
        *running = Some(RunningLoop { cancel, handle });
        Ok(())
    }

    /// Cancel the loop and wait for it to finish its current tick.
    pub async fn stop(&self) {
        let Some(running) = self.running.lock().await.take() else {
            return;
        };
        running.cancel.cancel();
        if let Err(e) = running.handle.await {
            warn!(error = %e, "Capture task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::stubs::{StubFrames, StubWindows};
    use crate::worker::CaptureSettings;
    use codebuddy_providers::MockClient;
    use codebuddy_session::SessionStore;
    use std::time::Duration;

    fn unstarted(
        sessions: &Arc<SessionStore>,
        windows: &Arc<StubWindows>,
        model: &Arc<MockClient>,
        interval: Duration,
    ) -> CaptureLoop {
        let worker = CaptureWorker::new(
            Arc::clone(sessions),
            Arc::new(StubFrames { fail: false }),
            windows.clone(),
            model.clone(),
            CaptureSettings {
                interval,
                ..CaptureSettings::default()
            },
        );
        CaptureLoop::new(worker)
    }

    async fn setup(interval: Duration) -> (tempfile::TempDir, Arc<SessionStore>, Arc<MockClient>, CaptureLoop) {
        let dir = tempfile::tempdir().unwrap();
        let sessions = Arc::new(SessionStore::open(dir.path()).unwrap());
        sessions.create_session(None).await.unwrap();
        let windows = Arc::new(StubWindows::focused("terminal", "Terminal"));
        let model = Arc::new(MockClient::new().with_response("Working"));
        let capture = unstarted(&sessions, &windows, &model, interval);
        capture.start().await.unwrap();
        // Focus moves away from the launching terminal after start.
        windows.focus("editor");
        (dir, sessions, model, capture)
    }

    #[tokio::test]
    async fn captures_until_paused_then_resumes() {
        let (_dir, _sessions, model, capture) = setup(Duration::from_millis(20)).await;
        assert!(capture.is_running().await);

        tokio::time::sleep(Duration::from_millis(150)).await;
        capture.pause();
        // Let any capture dispatched before the pause finish.
        tokio::time::sleep(Duration::from_millis(60)).await;
        let while_paused = model.requests().len();
        assert!(while_paused >= 1);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(model.requests().len(), while_paused);
        assert!(capture.is_paused());

        capture.resume();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(model.requests().len() > while_paused);

        capture.stop().await;
        assert!(!capture.is_running().await);
    }

    #[tokio::test]
    async fn first_capture_waits_one_interval() {
        let (_dir, sessions, model, capture) = setup(Duration::from_secs(30)).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(model.requests().is_empty());
        let log = sessions.current().unwrap().log.read_all().await.unwrap();
        assert!(log.is_empty());
        capture.stop().await;
    }

    #[tokio::test]
    async fn double_start_is_rejected() {
        let (_dir, _sessions, _model, capture) = setup(Duration::from_secs(30)).await;
        assert!(capture.start().await.is_err());
        capture.stop().await;
        capture.start().await.unwrap();
        capture.stop().await;
    }

    #[tokio::test]
    async fn unrepresentable_interval_fails_start() {
        let dir = tempfile::tempdir().unwrap();
        let sessions = Arc::new(SessionStore::open(dir.path()).unwrap());
        let windows = Arc::new(StubWindows::focused("terminal", "Terminal"));
        let model = Arc::new(MockClient::new());

        let capture = unstarted(&sessions, &windows, &model, Duration::from_secs(u64::MAX / 2));
        let err = capture.start().await.unwrap_err();
        assert!(err.to_string().contains("too large"));
        assert!(!capture.is_running().await);

        let capture = unstarted(&sessions, &windows, &model, Duration::ZERO);
        assert!(capture.start().await.is_err());
        assert!(!capture.is_running().await);
    }
}
