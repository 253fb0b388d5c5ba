//! `codebuddy sessions`: stored sessions, newest first.

use std::path::Path;

use anyhow::{Context, Result};
use codebuddy_session::{Session, SessionStore};

use crate::terminal_output::{note_info, render_table, Column};

/// List sessions under `sessions_dir` without creating it.
pub async fn run(sessions_dir: &Path) -> Result<()> {
    let exists = tokio::fs::try_exists(sessions_dir)
        .await
        .with_context(|| format!("Failed to check {}", sessions_dir.display()))?;
    if !exists {
        note_info(&format!("No sessions under {}", sessions_dir.display()));
        return Ok(());
    }
    let store = SessionStore::open(sessions_dir)?;
    list(&store).await
}

async fn list(store: &SessionStore) -> Result<()> {
    let sessions = store
        .list_sessions()
        .await
        .context("Failed to list sessions")?;
    if sessions.is_empty() {
        note_info(&format!("No sessions under {}", store.root().display()));
        return Ok(());
    }

    let mut rows = Vec::with_capacity(sessions.len());
    for session in &sessions {
        rows.push(row(session).await);
    }
    let columns = [
        Column::left("Session"),
        Column::right("Log"),
        Column::right("Screenshots"),
    ];
    println!("\nSessions in {}\n", store.root().display());
    print!("{}", render_table(&columns, &rows));
    Ok(())
}

async fn row(session: &Session) -> Vec<String> {
    let log_size = tokio::fs::metadata(&session.log_path)
        .await
        .map(|m| human_size(m.len()))
        .unwrap_or_else(|_| "-".to_string());
    let screenshots = count_entries(session).await;
    vec![session.id.clone(), log_size, screenshots.to_string()]
}

async fn count_entries(session: &Session) -> usize {
    let Ok(mut entries) = tokio::fs::read_dir(&session.screenshots_dir).await else {
        return 0;
    };
    let mut count = 0;
    while let Ok(Some(_)) = entries.next_entry().await {
        count += 1;
    }
    count
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.1} {}", UNITS[unit])
}
