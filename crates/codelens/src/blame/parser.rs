//! Incremental parser for `git blame -c` output.
//!
//! Each attribution line has the annotate layout:
//!
//! ```text
//! <sha>\t(<author>\t<date>\t<line>)<code>
//! ```
//!
//! Output arrives in arbitrary chunks that need not end on a line boundary, so
//! [`BlameLineBuffer`] keeps the unterminated tail of each chunk and only parses
//! complete lines.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use tracing::{debug, trace};

use crate::types::ChangeRecord;

/// Annotate-format attribution line.
///
/// Author and date cannot contain tabs, so tabs in the code text never shift
/// the captures.
static BLAME_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^\t]*)\t\(([^\t]*)\t([^\t]*)\t\s*(\d+)\)(.*)$").expect("valid blame regex")
});

/// Date layout printed by `git blame -c` (e.g. `2024-01-01 12:30:00 +0100`).
const ANNOTATE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Accumulates stdout bytes and yields a record per complete line.
#[derive(Debug, Default)]
pub struct BlameLineBuffer {
    pending: Vec<u8>,
    records: Vec<ChangeRecord>,
    skipped: usize,
}

impl BlameLineBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of output.
    ///
    /// Every complete line in the buffer is parsed; a trailing partial line is
    /// kept until the next chunk or [`finish`](Self::finish).
    pub fn push(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);

        let Some(last_newline) = self.pending.iter().rposition(|&b| b == b'\n') else {
            return;
        };

        let complete: Vec<u8> = self.pending.drain(..=last_newline).collect();
        for raw in complete.split(|&b| b == b'\n') {
            if !raw.is_empty() {
                self.parse_raw(raw);
            }
        }
    }

    /// Parse whatever remains and return the records in emission order.
    #[must_use]
    pub fn finish(mut self) -> Vec<ChangeRecord> {
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.parse_raw(&rest);
        }
        if self.skipped > 0 {
            debug!(
                skipped = self.skipped,
                parsed = self.records.len(),
                "Skipped unparseable blame lines"
            );
        }
        self.records
    }

    /// Records parsed so far.
    #[must_use]
    pub fn records(&self) -> &[ChangeRecord] {
        &self.records
    }

    fn parse_raw(&mut self, raw: &[u8]) {
        let text = String::from_utf8_lossy(raw);
        let line = text.strip_suffix('\r').unwrap_or(&*text);
        match parse_line(line) {
            Some(record) => self.records.push(record),
            None => {
                trace!(line = %line, "Blame line did not match annotate format");
                self.skipped += 1;
            }
        }
    }
}

/// Parse a single attribution line (without its newline).
///
/// Returns `None` if the line does not match the annotate layout or its line
/// number or date cannot be read.
#[must_use]
pub fn parse_line(line: &str) -> Option<ChangeRecord> {
    let caps = BLAME_LINE_REGEX.captures(line)?;

    let line_number = caps[4].trim().parse::<u32>().ok()?;
    let timestamp = parse_timestamp(&caps[3])?;

    Some(ChangeRecord {
        sha: caps[1].to_string(),
        author: caps[2].trim().to_string(),
        timestamp,
        line: line_number,
        code: caps[5].to_string(),
    })
}

/// Parse a blame date.
///
/// Accepts the annotate layout, RFC 3339, and a bare `YYYY-MM-DD` (midnight UTC).
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_str(raw, ANNOTATE_DATE_FORMAT) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_minimal_attribution_line() {
        let record = parse_line("abc123\t(Alice\t2024-01-01\t1)int x;").expect("should parse");

        assert_eq!(record.sha, "abc123");
        assert_eq!(record.author, "Alice");
        assert_eq!(
            record.timestamp,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(record.line, 1);
        assert_eq!(record.code, "int x;");
    }

    #[test]
    fn parses_git_annotate_line_with_padding() {
        let line = "^1a2b3c4d\t(   Bob Smith\t2023-06-01 10:15:30 +0200\t  12)    return 0;";
        let record = parse_line(line).expect("should parse");

        assert_eq!(record.sha, "^1a2b3c4d");
        assert_eq!(record.author, "Bob Smith");
        assert_eq!(
            record.timestamp,
            Utc.with_ymd_and_hms(2023, 6, 1, 8, 15, 30).unwrap()
        );
        assert_eq!(record.line, 12);
        assert_eq!(record.code, "    return 0;");
    }

    #[test]
    fn code_containing_parentheses_is_kept_whole() {
        let record =
            parse_line("abc\t(Alice\t2024-01-01\t3)call(a, b);").expect("should parse");

        assert_eq!(record.line, 3);
        assert_eq!(record.code, "call(a, b);");
    }

    #[test]
    fn tabs_in_code_do_not_shift_fields() {
        let record = parse_line("abc\t(Alice\t2024-01-01\t7)\t\tfoo();").expect("should parse");

        assert_eq!(record.author, "Alice");
        assert_eq!(record.line, 7);
        assert_eq!(record.code, "\t\tfoo();");
    }

    #[test]
    fn rejects_lines_without_annotate_layout() {
        assert!(parse_line("").is_none());
        assert!(parse_line("not a blame line").is_none());
        assert!(parse_line("abc\t(Alice\tnot-a-date\t1)x").is_none());
        assert!(parse_line("abc\t(Alice\t2024-01-01\tten)x").is_none());
    }

    #[test]
    fn parse_timestamp_accepts_rfc3339() {
        assert_eq!(
            parse_timestamp("2024-03-05T10:00:00Z"),
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn buffer_parses_complete_lines_in_order() {
        let mut buffer = BlameLineBuffer::new();
        buffer.push(b"a\t(Alice\t2024-01-01\t2)two\nb\t(Bob\t2024-01-02\t1)one\n");

        let records = buffer.finish();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line, 2);
        assert_eq!(records[1].line, 1);
    }

    #[test]
    fn buffer_joins_lines_split_across_chunks() {
        let mut buffer = BlameLineBuffer::new();
        buffer.push(b"abc123\t(Ali");
        assert!(buffer.records().is_empty());

        buffer.push(b"ce\t2024-01-01\t1)int x;\nabc124\t(Bob\t2024-01-");
        assert_eq!(buffer.records().len(), 1);
        assert_eq!(buffer.records()[0].author, "Alice");

        buffer.push(b"02\t2)int y;\n");
        let records = buffer.finish();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].author, "Bob");
        assert_eq!(records[1].code, "int y;");
    }

    #[test]
    fn buffer_joins_multibyte_characters_split_across_chunks() {
        let line = "abc\t(Zoë\t2024-01-01\t1)let s = \"é\";\n".as_bytes();
        let split = line
            .iter()
            .position(|&b| b == 0xC3)
            .expect("line contains a multi-byte character")
            + 1;

        let mut buffer = BlameLineBuffer::new();
        buffer.push(&line[..split]);
        buffer.push(&line[split..]);

        let records = buffer.finish();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].author, "Zoë");
    }

    #[test]
    fn finish_parses_unterminated_last_line() {
        let mut buffer = BlameLineBuffer::new();
        buffer.push(b"abc\t(Alice\t2024-01-01\t1)last");

        let records = buffer.finish();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].code, "last");
    }

    #[test]
    fn strips_carriage_returns() {
        let mut buffer = BlameLineBuffer::new();
        buffer.push(b"abc\t(Alice\t2024-01-01\t1)int x;\r\n");

        assert_eq!(buffer.finish()[0].code, "int x;");
    }

    #[test]
    fn empty_output_yields_no_records() {
        let buffer = BlameLineBuffer::new();
        assert!(buffer.finish().is_empty());
    }
}
