//! The lens placeholder and its one-way resolved state.

use std::fmt;
use std::sync::Arc;

use lsp_types::{CodeLens, Command, Position, Range};
use serde_json::Value;

use crate::blame::PendingHistory;
use crate::types::SourceFile;

/// Host command that opens the history of a whole file.
pub const VIEW_FILE_HISTORY_COMMAND: &str = "git.viewFileHistory";

/// Host command that lists reference locations.
pub const SHOW_REFERENCES_COMMAND: &str = "editor.action.showReferences";

/// What a lens shows once resolved, and what it needs to get there.
#[derive(Clone)]
pub enum LensKind {
    /// Most recent change in the lens's range.
    History {
        /// The file's change records, shared with every other history lens.
        history: PendingHistory,
    },
    /// Number of references to the declaration.
    Usage {
        /// Declaration position the reference query is issued for (0-indexed).
        position: Position,
    },
}

impl LensKind {
    /// Tag carried in [`CodeLens::data`] so a host can route resolution.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::History { .. } => "history",
            Self::Usage { .. } => "usages",
        }
    }
}

impl fmt::Debug for LensKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::History { history } => f.debug_tuple("History").field(history).finish(),
            Self::Usage { position } => f
                .debug_struct("Usage")
                .field("line", &position.line)
                .field("character", &position.character)
                .finish(),
        }
    }
}

/// An annotation anchored to a range of a file.
///
/// A lens starts without a command. Resolving it attaches one, whose title is
/// the label; after that the lens never changes again. The range is fixed at
/// creation.
#[derive(Debug, Clone)]
pub struct Lens {
    file: Arc<SourceFile>,
    range: Range,
    kind: LensKind,
    command: Option<Command>,
}

impl Lens {
    /// An unresolved history lens over `range`.
    #[must_use]
    pub fn history(file: Arc<SourceFile>, range: Range, history: PendingHistory) -> Self {
        Self {
            file,
            range,
            kind: LensKind::History { history },
            command: None,
        }
    }

    /// An unresolved usage lens at `range`, querying references at its start.
    #[must_use]
    pub fn usage(file: Arc<SourceFile>, range: Range) -> Self {
        Self {
            file,
            range,
            kind: LensKind::Usage {
                position: range.start,
            },
            command: None,
        }
    }

    /// File the lens belongs to.
    #[must_use]
    pub fn file(&self) -> &SourceFile {
        &self.file
    }

    /// Display range.
    #[must_use]
    pub fn range(&self) -> Range {
        self.range
    }

    /// Lens variant.
    #[must_use]
    pub fn kind(&self) -> &LensKind {
        &self.kind
    }

    /// Attached command, once resolved.
    #[must_use]
    pub fn command(&self) -> Option<&Command> {
        self.command.as_ref()
    }

    /// Label shown by the host, once resolved.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.command.as_ref().map(|c| c.title.as_str())
    }

    /// Returns `true` once a command has been attached.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.command.is_some()
    }

    /// Attach the resolved command.
    ///
    /// A lens that already has a command keeps it.
    #[must_use]
    pub(crate) fn attach(mut self, command: Command) -> Self {
        if self.command.is_none() {
            self.command = Some(command);
        }
        self
    }

    /// Convert to the protocol representation.
    #[must_use]
    pub fn to_code_lens(&self) -> CodeLens {
        CodeLens {
            range: self.range,
            command: self.command.clone(),
            data: Some(Value::String(self.kind.tag().to_string())),
        }
    }
}
