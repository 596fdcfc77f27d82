//! Reading JSONL conversation transcripts out of a project directory.
//!
//! Each conversation is one `.jsonl` file of records. The viewer needs two
//! reads: a cheap per-file summary for the sidebar (preview, counts, mtime)
//! and the full user/assistant message list for the conversation pane.
//! Malformed lines are a normal occurrence in live transcript files and are
//! skipped, never fatal.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

const PREVIEW_MAX_CHARS: usize = 100;

/// One transcript line, as much of it as the viewer cares about.
#[derive(Debug, Deserialize)]
struct TranscriptRecord {
    #[serde(rename = "type")]
    record_type: Option<String>,
    message: Option<Value>,
    timestamp: Option<String>,
    uuid: Option<String>,
    #[serde(rename = "isMeta", default)]
    is_meta: bool,
    #[serde(rename = "isSidechain", default)]
    is_sidechain: bool,
}

/// Sidebar entry for one conversation file.
#[derive(Debug, Serialize)]
pub struct ConversationSummary {
    pub id: String,
    pub filename: String,
    pub preview: String,
    #[serde(rename = "messageCount")]
    pub message_count: usize,
    /// File mtime, ISO 8601.
    pub modified: String,
    /// File size in bytes.
    pub size: u64,
    #[serde(rename = "isWarmup")]
    pub is_warmup: bool,
}

/// A user or assistant record, passed through to the frontend with its
/// message payload untouched.
#[derive(Debug, Serialize)]
pub struct MessageRecord {
    #[serde(rename = "type")]
    pub record_type: String,
    pub message: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(rename = "isMeta")]
    pub is_meta: bool,
    #[serde(rename = "isSidechain")]
    pub is_sidechain: bool,
}

/// Summarize every `.jsonl` conversation in a project directory, most
/// recently modified first. Warmup conversations (no genuine user-authored
/// text) are dropped unless `include_warmup` is set.
pub fn list_conversations(
    project_dir: &Path,
    include_warmup: bool,
) -> io::Result<Vec<ConversationSummary>> {
    let mut conversations = Vec::new();

    for entry in fs::read_dir(project_dir)? {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("Unreadable entry in {}: {}", project_dir.display(), e);
                continue;
            }
        };
        let path = entry.path();
        if path.extension().map_or(true, |ext| ext != "jsonl") {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("Cannot stat {}: {}", path.display(), e);
                continue;
            }
        };

        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Cannot read {}: {}", path.display(), e);
                continue;
            }
        };

        let filename = entry.file_name().to_string_lossy().to_string();
        let id = filename.trim_end_matches(".jsonl").to_string();

        let mut message_count = 0;
        let mut preview: Option<String> = None;
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            message_count += 1;
            if preview.is_some() {
                continue;
            }
            match serde_json::from_str::<TranscriptRecord>(line) {
                Ok(record) => preview = genuine_user_text(&record),
                Err(e) => tracing::debug!("Skipping malformed line in {}: {}", filename, e),
            }
        }

        // No genuine user text anywhere means nobody typed into this
        // conversation: command plumbing, warmup runs, tool-result echoes.
        let is_warmup = preview.is_none();
        if is_warmup && !include_warmup {
            continue;
        }

        conversations.push(ConversationSummary {
            id,
            filename,
            preview: preview
                .map(|p| truncate_chars(&p, PREVIEW_MAX_CHARS))
                .unwrap_or_else(|| "No preview available".to_string()),
            message_count,
            modified: iso_from_system_time(metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH)),
            size: metadata.len(),
            is_warmup,
        });
    }

    // ISO 8601 sorts lexicographically; newest first.
    conversations.sort_by(|a, b| b.modified.cmp(&a.modified));

    Ok(conversations)
}

/// Load the user/assistant records of one conversation file, in file order.
pub fn read_conversation(path: &Path) -> io::Result<Vec<MessageRecord>> {
    let content = fs::read_to_string(path)?;
    let mut messages = Vec::new();

    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        let record = match serde_json::from_str::<TranscriptRecord>(line) {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("Skipping malformed line in {}: {}", path.display(), e);
                continue;
            }
        };
        let record_type = match record.record_type.as_deref() {
            Some(t @ ("user" | "assistant")) => t.to_string(),
            _ => continue,
        };
        let message = match record.message {
            Some(m) => m,
            None => continue,
        };
        messages.push(MessageRecord {
            record_type,
            message,
            timestamp: record.timestamp,
            uuid: record.uuid,
            is_meta: record.is_meta,
            is_sidechain: record.is_sidechain,
        });
    }

    Ok(messages)
}

/// Text of a user record that a human actually typed, if any.
///
/// Rejects meta records, tool-result echoes, and slash-command plumbing
/// (`<command-name>` tags). Content may be a plain string or an array of
/// blocks; only the first block's text is considered, matching what the
/// sidebar preview needs.
fn genuine_user_text(record: &TranscriptRecord) -> Option<String> {
    if record.record_type.as_deref() != Some("user") || record.is_meta {
        return None;
    }
    let content = record.message.as_ref()?.get("content")?;
    let text = match content {
        Value::String(s) => s.clone(),
        Value::Array(blocks) => blocks
            .first()?
            .get("text")?
            .as_str()
            .map(|s| s.to_string())?,
        _ => return None,
    };
    if text.trim().is_empty() || text.contains("tool_result") || text.contains("<command-name>") {
        return None;
    }
    Some(text)
}

/// Truncate to at most `max` characters without splitting a code point.
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    text.chars().take(max).collect()
}

/// File mtime as an ISO 8601 string.
fn iso_from_system_time(t: SystemTime) -> String {
    let secs = t
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let datetime = time::OffsetDateTime::from_unix_timestamp(secs as i64)
        .unwrap_or(time::OffsetDateTime::UNIX_EPOCH);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        datetime.year(),
        datetime.month() as u8,
        datetime.day(),
        datetime.hour(),
        datetime.minute(),
        datetime.second()
    )
}
