//! Turns a declaration tree into a flat list of unresolved lenses.

use std::sync::Arc;

use crate::blame::PendingHistory;
use crate::lens::Lens;
use crate::types::{DeclarationNode, NodeKind, SourceFile};

/// Generated or boilerplate member names that never get lenses.
///
/// Matched case-sensitively against method declarations only.
pub const DENYLIST: &[&str] = &["Equals", "Finalize", "GetHashCode", "ToString"];

/// Returns `true` if the node and its whole subtree are skipped.
#[must_use]
pub fn is_pruned(node: &DeclarationNode) -> bool {
    node.kind == NodeKind::Method && DENYLIST.contains(&node.text.as_str())
}

/// Walk `nodes` depth first and emit the lenses for every kept declaration.
///
/// Each kept node yields a usage lens at its name and, when `history` is
/// given, a history lens over its full extent, before any lens of its
/// children. Pruned nodes are not descended into.
#[must_use]
pub fn walk(
    nodes: &[DeclarationNode],
    file: &Arc<SourceFile>,
    history: Option<&PendingHistory>,
) -> Vec<Lens> {
    let mut lenses = Vec::new();
    visit(nodes, file, history, &mut lenses);
    lenses
}

fn visit(
    nodes: &[DeclarationNode],
    file: &Arc<SourceFile>,
    history: Option<&PendingHistory>,
    lenses: &mut Vec<Lens>,
) {
    for node in nodes {
        if is_pruned(node) {
            continue;
        }

        lenses.push(Lens::usage(Arc::clone(file), node.selection_range));
        if let Some(history) = history {
            lenses.push(Lens::history(Arc::clone(file), node.range, history.clone()));
        }

        visit(&node.children, file, history, lenses);
    }
}
