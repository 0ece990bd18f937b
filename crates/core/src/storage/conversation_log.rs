use crate::config::Settings;
use anyhow::Context;
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub user_message: String,
    pub bot_response: String,
}

impl LogEntry {
    pub fn new<Tz: TimeZone>(at: &DateTime<Tz>, user_message: &str, bot_response: &str) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            user_message: user_message.to_string(),
            bot_response: bot_response.to_string(),
        }
    }
}

/// Per-day conversation files holding one JSON object per line.
///
/// Every entry is appended with a single `write_all` on a file opened with `O_APPEND`, so
/// concurrent writers never overwrite each other's entries.
#[derive(Debug, Clone)]
pub struct ConversationLog {
    dir: PathBuf,
}

impl ConversationLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.conversation_log_dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("conversation_log_{}.json", date.format("%Y-%m-%d")))
    }

    /// Appends an entry stamped with the current local time to today's file.
    pub async fn append(&self, user_message: &str, bot_response: &str) -> anyhow::Result<PathBuf> {
        let now = Local::now();
        let entry = LogEntry::new(&now, user_message, bot_response);
        self.append_entry(now.date_naive(), &entry).await
    }

    pub async fn append_entry(&self, date: NaiveDate, entry: &LogEntry) -> anyhow::Result<PathBuf> {
        let mut line = serde_json::to_string(entry).context("serialize log entry failed")?;
        line.push('\n');

        let dir = self.dir.clone();
        let path = self.path_for(date);
        let out = path.clone();
        tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("create log dir {} failed", dir.display()))?;
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("open log file {} failed", path.display()))?;
            file.write_all(line.as_bytes())
                .with_context(|| format!("append to {} failed", path.display()))?;
            Ok(())
        })
        .await
        .context("join log writer task failed")??;

        Ok(out)
    }

    /// Entries for one day in write order. Missing file means no entries; malformed lines are
    /// skipped.
    pub async fn read_day(&self, date: NaiveDate) -> anyhow::Result<Vec<LogEntry>> {
        let path = self.path_for(date);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("read log file {} failed", path.display())))
            }
        };

        let mut out = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<LogEntry>(line) {
                Ok(entry) => out.push(entry),
                Err(err) => {
                    tracing::warn!(line = idx + 1, path = %path.display(), error = %err, "skipping malformed log line");
                }
            }
        }
        Ok(out)
    }
}
