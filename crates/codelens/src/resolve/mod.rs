//! Lens resolvers.
//!
//! Each lens resolves on its own: a history lens awaits its file's shared
//! [`PendingHistory`](crate::blame::PendingHistory), a usage lens issues its
//! own reference query. Failures return an error and leave the lens as it was.

mod history;
mod relative_time;
mod usages;

pub use history::{history_command, history_label, resolve_history, select_change};
pub use relative_time::from_now;
pub use usages::{reference_label, reference_query, references_command, resolve_usages};

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::lens::{Lens, LensKind};
use crate::services::ReferenceService;

/// Resolve any lens with the resolver for its kind.
///
/// # Errors
///
/// Returns the kind-specific resolver's error.
pub async fn resolve(lens: Lens, references: &dyn ReferenceService, now: DateTime<Utc>) -> Result<Lens> {
    match lens.kind().clone() {
        LensKind::History { history } => resolve_history(lens, &history, now).await,
        LensKind::Usage { position } => resolve_usages(lens, position, references).await,
    }
}
