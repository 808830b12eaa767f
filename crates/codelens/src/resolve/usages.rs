//! Resolution of usage lenses.

use lsp_types::{Command, Location, Position, Uri};
use serde_json::Value;
use tracing::trace;

use crate::error::{Error, Result};
use crate::lens::{Lens, SHOW_REFERENCES_COMMAND};
use crate::services::{ReferenceQuery, ReferenceService};
use crate::types::SourceFile;

/// `"1 reference"` or `"{count} references"`.
#[must_use]
pub fn reference_label(count: usize) -> String {
    if count == 1 {
        "1 reference".to_string()
    } else {
        format!("{count} references")
    }
}

/// Command listing `locations`, anchored at the declaration.
#[must_use]
pub fn references_command(title: String, uri: &Uri, position: Position, locations: &[Location]) -> Command {
    Command::new(
        title,
        SHOW_REFERENCES_COMMAND.to_string(),
        Some(vec![
            Value::String(uri.as_str().to_string()),
            serde_json::to_value(position).unwrap_or(Value::Null),
            serde_json::to_value(locations).unwrap_or(Value::Null),
        ]),
    )
}

/// Query for references to the declaration at a 0-indexed `position`.
#[must_use]
pub fn reference_query(file: &SourceFile, position: Position) -> ReferenceQuery {
    ReferenceQuery {
        file: file.clone(),
        line: position.line + 1,
        column: position.character + 1,
        exclude_definition: true,
        whole_workspace: true,
    }
}

/// Attach the reference count of the declaration at `position`.
///
/// An empty or absent answer leaves the lens without a command.
///
/// # Errors
///
/// Returns `Error::References` if the query fails.
pub async fn resolve_usages(
    lens: Lens,
    position: Position,
    references: &dyn ReferenceService,
) -> Result<Lens> {
    let query = reference_query(lens.file(), position);
    let locations = references
        .find_references(&query)
        .await
        .map_err(Error::References)?
        .unwrap_or_default();

    trace!(
        line = query.line,
        column = query.column,
        count = locations.len(),
        "Reference query answered"
    );

    if locations.is_empty() {
        return Ok(lens);
    }

    let command = references_command(
        reference_label(locations.len()),
        lens.file().uri(),
        lens.range().start,
        &locations,
    );
    Ok(lens.attach(command))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{NoReferences, QueryResult};
    use async_trait::async_trait;
    use lsp_types::Range;
    use rstest::rstest;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    struct FixedReferences {
        answer: Option<Vec<Location>>,
        seen: Mutex<Vec<ReferenceQuery>>,
    }

    impl FixedReferences {
        fn new(answer: Option<Vec<Location>>) -> Self {
            Self {
                answer,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ReferenceService for FixedReferences {
        async fn find_references(&self, query: &ReferenceQuery) -> QueryResult<Option<Vec<Location>>> {
            self.seen.lock().unwrap().push(query.clone());
            Ok(self.answer.clone())
        }
    }

    fn location(line: u32) -> Location {
        Location::new(
            "file:///work/src/other.rs".parse().unwrap(),
            Range::new(Position::new(line, 0), Position::new(line, 5)),
        )
    }

    fn lens() -> Lens {
        let file = Arc::new(SourceFile::new(Path::new("/work/src/lib.rs")).expect("absolute path"));
        Lens::usage(file, Range::new(Position::new(9, 4), Position::new(9, 10)))
    }

    #[rstest]
    #[case::zero(0, "0 references")]
    #[case::one(1, "1 reference")]
    #[case::many(3, "3 references")]
    fn labels(#[case] count: usize, #[case] expected: &str) {
        assert_eq!(reference_label(count), expected);
    }

    #[test]
    fn query_is_one_based_workspace_wide_and_excludes_definition() {
        let file = SourceFile::new(Path::new("/work/src/lib.rs")).expect("absolute path");
        let query = reference_query(&file, Position::new(9, 4));

        assert_eq!((query.line, query.column), (10, 5));
        assert!(query.exclude_definition);
        assert!(query.whole_workspace);
    }

    #[rstest]
    #[case::one(1, "1 reference")]
    #[case::three(3, "3 references")]
    #[tokio::test]
    async fn non_empty_answer_attaches_count(#[case] count: u32, #[case] expected: &str) {
        let service = FixedReferences::new(Some((0..count).map(location).collect()));

        let resolved = resolve_usages(lens(), Position::new(9, 4), &service)
            .await
            .expect("query succeeds");

        assert_eq!(resolved.label(), Some(expected));
        let command = resolved.command().expect("command attached");
        assert_eq!(command.command, SHOW_REFERENCES_COMMAND);
        let args = command.arguments.as_ref().expect("arguments");
        assert_eq!(args[0], Value::from("file:///work/src/lib.rs"));
        assert_eq!(args[1]["line"], 9);
        assert_eq!(args[2].as_array().map(Vec::len), Some(count as usize));
    }

    #[rstest]
    #[case::empty(Some(Vec::new()))]
    #[case::absent(None)]
    #[tokio::test]
    async fn empty_answer_leaves_lens_unresolved(#[case] answer: Option<Vec<Location>>) {
        let service = FixedReferences::new(answer);

        let resolved = resolve_usages(lens(), Position::new(9, 4), &service)
            .await
            .expect("query succeeds");

        assert!(!resolved.is_resolved());
        assert_eq!(service.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn query_failure_is_reported() {
        let result = resolve_usages(lens(), Position::new(9, 4), &NoReferences).await;
        assert!(matches!(result, Err(Error::References(_))));
    }
}
