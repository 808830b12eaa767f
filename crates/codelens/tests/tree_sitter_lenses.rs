//! End-to-end lens lists over files on disk, with tree-sitter symbol trees.

use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use codelens::{
    Error, LensConfig, LensKind, LensProvider, NoReferences, QueryError, TreeSitterSymbols,
};
use tokio_util::sync::CancellationToken;

const SHAPES_CS: &str = "\
namespace Shop
{
    public class Point
    {
        public int X { get; }

        public double Distance(Point other)
        {
            return 0.0;
        }

        public override bool Equals(object obj) => obj is Point;

        public override int GetHashCode() => X;

        public override string ToString() => \"point\";

        ~Point() { }
    }
}
";

fn offline_provider(config: LensConfig) -> LensProvider {
    LensProvider::new(Arc::new(TreeSitterSymbols), Arc::new(NoReferences), config)
}

fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("should write file");
    path
}

#[tokio::test]
async fn csharp_object_overrides_get_no_lenses() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = write_file(dir.path(), "Point.cs", SHAPES_CS);
    let config = LensConfig {
        history_lenses: false,
        ..LensConfig::default()
    };

    let lenses = offline_provider(config)
        .provide_lenses(&path, &CancellationToken::new())
        .await
        .expect("lens list should be produced");

    // Shop, Point, X, Distance, ~Point: one usage lens each.
    let lines: Vec<u32> = lenses.iter().map(|lens| lens.range().start.line).collect();
    assert_eq!(lines, [0, 2, 4, 6, 17]);
    assert!(
        lenses
            .iter()
            .all(|lens| matches!(lens.kind(), LensKind::Usage { .. }))
    );
}

#[tokio::test]
async fn rust_file_produces_paired_lenses() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = write_file(
        dir.path(),
        "widget.rs",
        "struct Widget;\n\nimpl Widget {\n    fn draw(&self) {}\n}\n",
    );
    let provider = offline_provider(LensConfig::default());

    let lenses = provider
        .provide_lenses(&path, &CancellationToken::new())
        .await
        .expect("lens list should be produced");

    let summary: Vec<_> = lenses
        .iter()
        .map(|lens| (lens.kind().tag(), lens.range().start.line))
        .collect();
    assert_eq!(
        summary,
        [
            ("usages", 0),
            ("history", 0),
            ("usages", 2),
            ("history", 2),
            ("usages", 3),
            ("history", 3),
        ]
    );
}

#[tokio::test]
async fn usages_without_reference_service_stay_unresolved() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = write_file(dir.path(), "lib.rs", "fn main() {}\n");
    let config = LensConfig {
        history_lenses: false,
        ..LensConfig::default()
    };
    let provider = offline_provider(config);
    let cancel = CancellationToken::new();

    let lenses = provider
        .provide_lenses(&path, &cancel)
        .await
        .expect("lens list should be produced");
    let lens = lenses.into_iter().next().expect("one usage lens");

    let result = provider.resolve_lens(lens, &cancel).await;
    assert!(matches!(
        result,
        Err(Error::References(QueryError::Unavailable(_)))
    ));
}

#[tokio::test]
async fn unsupported_file_fails_the_request() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = write_file(dir.path(), "notes.txt", "hello\n");

    let result = offline_provider(LensConfig::default())
        .provide_lenses(&path, &CancellationToken::new())
        .await;

    assert!(matches!(
        result,
        Err(Error::SymbolTree {
            source: QueryError::UnsupportedLanguage(_),
            ..
        })
    ));
}

fn later() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 4, 10, 0, 0).unwrap()
}

#[tokio::test]
async fn history_lenses_resolve_from_git() {
    let git_available = Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success());
    if !git_available {
        eprintln!("Skipping test: git not installed");
        return;
    }

    let dir = tempfile::tempdir().expect("should create temp dir");
    let git = |args: &[&str]| {
        let status = Command::new("git")
            .args(args)
            .current_dir(dir.path())
            .env("GIT_AUTHOR_NAME", "Alice")
            .env("GIT_AUTHOR_EMAIL", "alice@example.com")
            .env("GIT_AUTHOR_DATE", "2024-05-01T10:00:00+00:00")
            .env("GIT_COMMITTER_NAME", "Alice")
            .env("GIT_COMMITTER_EMAIL", "alice@example.com")
            .env("GIT_COMMITTER_DATE", "2024-05-01T10:00:00+00:00")
            .status()
            .expect("failed to run git");
        assert!(status.success(), "git {args:?} failed");
    };
    git(&["init", "--quiet"]);
    let path = write_file(dir.path(), "widget.rs", "struct Widget;\n\nfn render() {}\n");
    git(&["add", "."]);
    git(&["commit", "--quiet", "-m", "Add widget"]);

    let provider = offline_provider(LensConfig::default()).with_clock(later);
    let cancel = CancellationToken::new();
    let lenses = provider
        .provide_lenses(&path, &cancel)
        .await
        .expect("lens list should be produced");

    let mut labels = Vec::new();
    for lens in lenses {
        if matches!(lens.kind(), LensKind::History { .. }) {
            let resolved = provider
                .resolve_lens(lens, &cancel)
                .await
                .expect("history should resolve");
            labels.push(resolved.label().map(str::to_string));
        }
    }

    let expected = Some("Alice, 3 days ago".to_string());
    assert_eq!(labels, [expected.clone(), expected]);
}
