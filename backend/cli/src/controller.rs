//! Ambient / Interactive mode switching between background capture and
//! question answering.

use std::sync::Arc;

use anyhow::{Context, Result};
use codebuddy_capture::CaptureLoop;
use codebuddy_core::CompletionClient;
use codebuddy_logging::redact_sensitive_data;
use codebuddy_session::SessionStore;
use tracing::{debug, error, info};

use crate::input::{InputEvent, LineSource};
use crate::inquiry::{self, QaSettings};
use crate::terminal_output::{
    clear_screen, note_error, note_info, note_success, note_warn, print_panel, prompt,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Capture running; a watcher waits for a bare Enter.
    Ambient,
    /// Capture paused; lines are commands or questions.
    Interactive,
    Exit,
}

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Exit,
    Reset,
    /// `continue` or an empty line.
    Continue,
    Ask(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() || line.eq_ignore_ascii_case("continue") {
            Command::Continue
        } else if line.eq_ignore_ascii_case("exit") {
            Command::Exit
        } else if line.eq_ignore_ascii_case("reset") {
            Command::Reset
        } else {
            Command::Ask(line)
        }
    }
}

/// What ended an Ambient watch.
enum Watch {
    Enter,
    Quit,
}

pub struct InteractionController {
    sessions: Arc<SessionStore>,
    model: Arc<dyn CompletionClient>,
    capture: Arc<CaptureLoop>,
    qa: QaSettings,
}

impl InteractionController {
    pub fn new(
        sessions: Arc<SessionStore>,
        model: Arc<dyn CompletionClient>,
        capture: Arc<CaptureLoop>,
        qa: QaSettings,
    ) -> Self {
        Self {
            sessions,
            model,
            capture,
            qa,
        }
    }

    /// Start capturing and alternate between modes until the user exits or
    /// input ends. Capture is left running on return; the caller ends the
    /// process.
    pub async fn run<S: LineSource>(&self, input: S) -> Result<()> {
        self.capture.start().await?;

        let mut input = input;
        let mut mode = Mode::Ambient;
        loop {
            debug!(?mode, "Controller mode");
            mode = match mode {
                Mode::Ambient => {
                    let (returned, watch) = self.watch_for_enter(input).await?;
                    input = returned;
                    match watch {
                        Watch::Enter => Mode::Interactive,
                        Watch::Quit => Mode::Exit,
                    }
                }
                Mode::Interactive => self.interact(&mut input).await,
                Mode::Exit => {
                    info!("Exiting");
                    note_info("Exiting...");
                    return Ok(());
                }
            };
        }
    }

    /// Hand the input to a watcher task that pauses capture on a bare Enter.
    ///
    /// The watcher gives the input back when it finishes, so exactly one
    /// reader exists at a time.
    async fn watch_for_enter<S: LineSource>(&self, input: S) -> Result<(S, Watch)> {
        let pause = self.capture.pause_handle();
        let watcher = tokio::spawn(async move {
            let mut input = input;
            loop {
                match input.next_event().await {
                    InputEvent::Line(line) if line.trim().is_empty() => {
                        pause.pause();
                        return (input, Watch::Enter);
                    }
                    InputEvent::Line(_) => {
                        note_info("Press Enter on an empty line to ask a question.");
                    }
                    InputEvent::Interrupted | InputEvent::Closed => return (input, Watch::Quit),
                }
            }
        });
        watcher.await.context("Input watcher failed")
    }

    async fn interact<S: LineSource>(&self, input: &mut S) -> Mode {
        info!("Entering inquiry mode");
        note_info("Entering inquiry mode. Screen capture paused.");
        loop {
            prompt("Enter your question");
            let line = match input.next_event().await {
                InputEvent::Line(line) => line,
                InputEvent::Interrupted => {
                    println!();
                    note_warn("Input interrupted. Type 'exit' to quit or 'continue' to resume capture.");
                    continue;
                }
                InputEvent::Closed => return Mode::Exit,
            };

            match Command::parse(&line) {
                Command::Exit => return Mode::Exit,
                Command::Continue => {
                    self.resume_capture();
                    return Mode::Ambient;
                }
                Command::Reset => match self.sessions.create_session(None).await {
                    Ok(active) => {
                        clear_screen();
                        note_success(&format!(
                            "Log cleared and new session created {}",
                            active.id()
                        ));
                        self.resume_capture();
                        return Mode::Ambient;
                    }
                    Err(e) => {
                        error!(error = %e, "Reset failed");
                        note_error(&format!("Could not start a new session: {e}"));
                    }
                },
                Command::Ask(question) => self.ask(input, question).await,
            }
        }
    }

    /// Answer one question. Ctrl-C abandons the request and returns to the
    /// prompt.
    async fn ask<S: LineSource>(&self, input: &mut S, question: &str) {
        let Some(active) = self.sessions.current() else {
            note_error("No active session to answer from.");
            return;
        };
        note_info("Thinking...");
        tokio::select! {
            result = inquiry::answer(&active, self.model.as_ref(), &self.qa, question) => match result {
                Ok(reply) => print_panel("CodeBuddy's Response", &reply),
                Err(e) => note_error(&format!(
                    "Sorry, I couldn't answer that: {}",
                    redact_sensitive_data(&e.to_string())
                )),
            },
            _ = input.interrupted() => {
                println!();
                info!("Inquiry cancelled");
                note_warn("Question cancelled.");
            }
        }
    }

    fn resume_capture(&self) {
        self.capture.resume();
        info!("Resuming screen capture");
        note_success("Resuming screen capture...");
    }
}
