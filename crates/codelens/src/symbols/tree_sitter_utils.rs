//! Shared tree-sitter helpers for the language modules.

// Tree-sitter reports usize positions; lens geometry is u32. No practical
// source file exceeds u32 lines or columns.
#![allow(clippy::cast_possible_truncation)]

use lsp_types::{Position, Range};

use crate::types::{DeclarationNode, NodeKind};

/// Get text content of a tree-sitter node.
///
/// Returns `None` if the node's byte range contains invalid UTF-8.
pub fn node_text(node: &tree_sitter::Node, content: &[u8]) -> Option<String> {
    match std::str::from_utf8(&content[node.byte_range()]) {
        Ok(s) => Some(s.to_string()),
        Err(e) => {
            tracing::trace!(
                byte_range = ?node.byte_range(),
                error = %e,
                node_kind = %node.kind(),
                "Failed to decode node text as UTF-8"
            );
            None
        }
    }
}

/// 0-indexed range of a node, as lenses use it.
pub fn node_range(node: &tree_sitter::Node) -> Range {
    let start = node.start_position();
    let end = node.end_position();
    Range::new(
        Position::new(start.row as u32, start.column as u32),
        Position::new(end.row as u32, end.column as u32),
    )
}

/// A declaration whose name is the node's `field` child.
///
/// Returns `None` if the node has no such child (e.g. a parse error).
pub fn named_declaration(
    node: &tree_sitter::Node,
    field: &str,
    content: &[u8],
    kind: NodeKind,
) -> Option<DeclarationNode> {
    let name = node.child_by_field_name(field)?;
    Some(DeclarationNode::new(
        kind,
        node_text(&name, content)?,
        node_range(node),
        node_range(&name),
    ))
}
