//! Common display utilities for CLI commands.

use codelens::{ChangeRecord, Error, Lens};
use colored::Colorize;

/// Characters of a commit id shown in blame output.
const SHORT_SHA_LEN: usize = 8;

/// A lens as the CLI reports it, with the reason it stayed unresolved.
pub struct LensRow {
    pub lens: Lens,
    pub failure: Option<String>,
}

impl LensRow {
    /// A lens that was not resolved.
    pub fn pending(lens: Lens) -> Self {
        Self {
            lens,
            failure: None,
        }
    }

    /// A lens returned by a successful resolution.
    pub fn resolved(lens: Lens) -> Self {
        Self::pending(lens)
    }

    /// A lens whose resolution failed; the lens itself is unchanged.
    pub fn failed(lens: Lens, error: &Error) -> Self {
        Self {
            lens,
            failure: Some(error.to_string()),
        }
    }
}

/// Print one line per lens: line number, kind, then the label.
///
/// Failure reasons are only shown when `verbose` is set.
pub fn print_lens_rows(rows: &[LensRow], verbose: bool) {
    if rows.is_empty() {
        println!("  {}", "(no declarations)".dimmed());
        return;
    }

    for row in rows {
        let line = format!("{:>5}", row.lens.range().start.line + 1);
        let kind = format!("{:<8}", row.lens.kind().tag());

        let label = match (row.lens.label(), &row.failure) {
            (Some(label), _) => label.normal(),
            (None, Some(reason)) if verbose => format!("unresolved ({reason})").yellow(),
            (None, Some(_)) => "unresolved".yellow(),
            (None, None) => "-".dimmed(),
        };

        println!("  {} {} {label}", line.dimmed(), kind.cyan());
    }
}

/// Print change records in `git blame`-like columns.
pub fn print_change_records(records: &[ChangeRecord]) {
    if records.is_empty() {
        println!("  {}", "(no lines)".dimmed());
        return;
    }

    let author_width = records
        .iter()
        .map(|r| r.author.chars().count())
        .max()
        .unwrap_or(0);

    for record in records {
        let sha: String = record.sha.chars().take(SHORT_SHA_LEN).collect();
        println!(
            "{} {:<author_width$} {} {:>5} {}",
            sha.yellow(),
            record.author,
            record.timestamp.format("%Y-%m-%d").to_string().dimmed(),
            record.line,
            record.code,
        );
    }
}
