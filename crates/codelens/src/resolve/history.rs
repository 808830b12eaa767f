//! Resolution of history lenses.

use chrono::{DateTime, Utc};
use lsp_types::{Command, Range, Uri};
use serde_json::Value;
use tracing::trace;

use super::relative_time::from_now;
use crate::blame::PendingHistory;
use crate::error::{Error, Result};
use crate::lens::{Lens, VIEW_FILE_HISTORY_COMMAND};
use crate::types::ChangeRecord;

/// The most recent record attributed to a line of `range`.
///
/// Records with equal timestamps resolve to the earliest one in `records`.
#[must_use]
pub fn select_change<'a>(records: &'a [ChangeRecord], range: &Range) -> Option<&'a ChangeRecord> {
    records
        .iter()
        .filter(|record| record.covers(range))
        .fold(None, |best: Option<&ChangeRecord>, record| match best {
            Some(best) if best.timestamp >= record.timestamp => Some(best),
            _ => Some(record),
        })
}

/// `"{author}, {relative time}"`.
#[must_use]
pub fn history_label(record: &ChangeRecord, now: DateTime<Utc>) -> String {
    format!("{}, {}", record.author, from_now(record.timestamp, now))
}

/// Command opening the history of the whole file.
#[must_use]
pub fn history_command(title: String, uri: &Uri) -> Command {
    Command::new(
        title,
        VIEW_FILE_HISTORY_COMMAND.to_string(),
        Some(vec![Value::String(uri.as_str().to_string())]),
    )
}

/// Attach the most recent change in the lens's range.
///
/// # Errors
///
/// Returns `Error::History` if the file's history could not be fetched and
/// `Error::EmptyAttribution` if no record falls in the range. The lens is
/// dropped unchanged in both cases; the caller still holds its own copy.
pub async fn resolve_history(lens: Lens, history: &PendingHistory, now: DateTime<Utc>) -> Result<Lens> {
    let records = history.records().await?;
    let range = lens.range();

    let Some(record) = select_change(&records, &range) else {
        return Err(Error::EmptyAttribution {
            path: lens.file().path().to_path_buf(),
            start_line: range.start.line,
            end_line: range.end.line,
        });
    };

    trace!(
        sha = %record.sha,
        line = record.line,
        start_line = range.start.line,
        "Selected change for history lens"
    );

    let command = history_command(history_label(record, now), lens.file().uri());
    Ok(lens.attach(command))
}
