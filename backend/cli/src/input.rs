//! Line-based user input.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Line(String),
    /// Ctrl-C while waiting for a line.
    Interrupted,
    /// End of input.
    Closed,
}

/// Source of user lines. Moved between the controller and the Enter watcher.
#[async_trait]
pub trait LineSource: Send + 'static {
    /// Wait for the next event. Must be cancel safe.
    async fn next_event(&mut self) -> InputEvent;

    /// Resolve on the next Ctrl-C without consuming typed lines. Must be
    /// cancel safe.
    async fn interrupted(&mut self);
}

pub struct StdinLines {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinLines {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

#[async_trait]
impl LineSource for StdinLines {
    async fn next_event(&mut self) -> InputEvent {
        tokio::select! {
            line = self.lines.next_line() => match line {
                Ok(Some(line)) => InputEvent::Line(line.trim_end_matches('\r').to_string()),
                Ok(None) => InputEvent::Closed,
                Err(e) => {
                    warn!(error = %e, "Failed to read from stdin");
                    InputEvent::Closed
                }
            },
            _ = tokio::signal::ctrl_c() => InputEvent::Interrupted,
        }
    }

    async fn interrupted(&mut self) {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}

/// Lines fed through a channel; a dropped sender reads as end of input.
///
/// Events read while waiting for an interrupt are queued for `next_event`.
#[cfg(test)]
pub struct ScriptedLines {
    rx: tokio::sync::mpsc::UnboundedReceiver<InputEvent>,
    pending: std::collections::VecDeque<InputEvent>,
}

#[cfg(test)]
impl ScriptedLines {
    pub fn channel() -> (tokio::sync::mpsc::UnboundedSender<InputEvent>, Self) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (
            tx,
            Self {
                rx,
                pending: Default::default(),
            },
        )
    }
}

#[cfg(test)]
#[async_trait]
impl LineSource for ScriptedLines {
    async fn next_event(&mut self) -> InputEvent {
        if let Some(event) = self.pending.pop_front() {
            return event;
        }
        self.rx.recv().await.unwrap_or(InputEvent::Closed)
    }

    async fn interrupted(&mut self) {
        if let Some(i) = self
            .pending
            .iter()
            .position(|e| *e == InputEvent::Interrupted)
        {
            self.pending.remove(i);
            return;
        }
        loop {
            match self.rx.recv().await {
                Some(InputEvent::Interrupted) => return,
                Some(event) => self.pending.push_back(event),
                None => std::future::pending::<()>().await,
            }
        }
    }
}
