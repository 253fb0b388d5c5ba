//! Answering questions from the activity log.

use codebuddy_core::{ChatMessage, CompletionClient, CompletionRequest, ModelError};
use codebuddy_logging::redact_sensitive_data;
use codebuddy_session::{ActiveSession, SessionError};
use thiserror::Error;
use tracing::{error, info, warn};

pub const QA_SYSTEM_PROMPT: &str = "You are an assistant. Answer using the user's activity log. \
The log was written by a vision model describing screenshots of the user's screen, and it may \
also contain earlier questions from the user and your previous answers.";

#[derive(Debug, Clone)]
pub struct QaSettings {
    pub model: String,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Error)]
pub enum InquiryError {
    #[error("could not read the activity log: {0}")]
    Log(#[from] SessionError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Log the question, ask the QA model with the full log as context, and log
/// the answer.
pub async fn answer(
    active: &ActiveSession,
    model: &dyn CompletionClient,
    settings: &QaSettings,
    question: &str,
) -> Result<String, InquiryError> {
    active.log.append(&format!("USER INQUIRY: {question}")).await?;
    let log = active.log.read_all().await?;

    let mut request = CompletionRequest::new(
        &settings.model,
        vec![ChatMessage::user(format!(
            "The user asked: '{question}'. Based on the following log, provide an appropriate response:\n\n{log}"
        ))],
    )
    .with_system(QA_SYSTEM_PROMPT);
    if let Some(max_tokens) = settings.max_tokens {
        request = request.with_max_tokens(max_tokens);
    }

    let completion = model.complete(request).await.map_err(|e| {
        error!(
            model = %settings.model,
            error = %redact_sensitive_data(&e.to_string()),
            "Inquiry failed"
        );
        e
    })?;

    let reply = completion.content.unwrap_or_else(|| {
        warn!(model = %settings.model, "QA model returned no content");
        "(no answer)".to_string()
    });
    active
        .log
        .append(&format!("ASSISTANT RESPONSE: {reply}"))
        .await?;
    info!(session = %active.id(), "Answered inquiry");
    Ok(reply)
}
