//! Declaration trees for Rust sources.

use super::tree_sitter_utils::named_declaration;
use crate::types::{DeclarationNode, NodeKind};

/// Tree-sitter node kind constants for the Rust grammar.
mod node_kinds {
    pub const FUNCTION_ITEM: &str = "function_item";
    pub const FUNCTION_SIGNATURE_ITEM: &str = "function_signature_item";
    pub const STRUCT_ITEM: &str = "struct_item";
    pub const ENUM_ITEM: &str = "enum_item";
    pub const UNION_ITEM: &str = "union_item";
    pub const TYPE_ITEM: &str = "type_item";
    pub const TRAIT_ITEM: &str = "trait_item";
    pub const IMPL_ITEM: &str = "impl_item";
    pub const MOD_ITEM: &str = "mod_item";
    pub const CONST_ITEM: &str = "const_item";
    pub const STATIC_ITEM: &str = "static_item";
    pub const MACRO_DEFINITION: &str = "macro_definition";
}

/// Build the declaration tree of a parsed Rust file.
///
/// Trait and impl blocks and inline modules are containers; function bodies
/// are not descended into.
pub fn declarations(tree: &tree_sitter::Tree, content: &[u8]) -> Vec<DeclarationNode> {
    let mut nodes = Vec::new();
    collect(&tree.root_node(), content, &mut nodes);
    nodes
}

fn collect(node: &tree_sitter::Node, content: &[u8], out: &mut Vec<DeclarationNode>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = declaration(&child, content) {
            out.push(found);
        } else if !is_declaration_kind(child.kind()) {
            collect(&child, content, out);
        }
    }
}

fn is_declaration_kind(kind: &str) -> bool {
    use node_kinds::{
        CONST_ITEM, ENUM_ITEM, FUNCTION_ITEM, FUNCTION_SIGNATURE_ITEM, IMPL_ITEM,
        MACRO_DEFINITION, MOD_ITEM, STATIC_ITEM, STRUCT_ITEM, TRAIT_ITEM, TYPE_ITEM, UNION_ITEM,
    };

    matches!(
        kind,
        FUNCTION_ITEM
            | FUNCTION_SIGNATURE_ITEM
            | STRUCT_ITEM
            | ENUM_ITEM
            | UNION_ITEM
            | TYPE_ITEM
            | TRAIT_ITEM
            | IMPL_ITEM
            | MOD_ITEM
            | CONST_ITEM
            | STATIC_ITEM
            | MACRO_DEFINITION
    )
}

fn declaration(node: &tree_sitter::Node, content: &[u8]) -> Option<DeclarationNode> {
    use node_kinds::{
        CONST_ITEM, ENUM_ITEM, FUNCTION_ITEM, FUNCTION_SIGNATURE_ITEM, IMPL_ITEM,
        MACRO_DEFINITION, MOD_ITEM, STATIC_ITEM, STRUCT_ITEM, TRAIT_ITEM, TYPE_ITEM, UNION_ITEM,
    };

    match node.kind() {
        FUNCTION_ITEM | FUNCTION_SIGNATURE_ITEM => {
            named_declaration(node, "name", content, NodeKind::Method)
        }
        STRUCT_ITEM | ENUM_ITEM | UNION_ITEM | TYPE_ITEM => {
            named_declaration(node, "name", content, NodeKind::Type)
        }
        TRAIT_ITEM => container(node, "name", content, NodeKind::Type),
        // Named after the implementing type: `impl Display for Widget` is `Widget`.
        IMPL_ITEM => container(node, "type", content, NodeKind::Type),
        MOD_ITEM => container(node, "name", content, NodeKind::Other),
        CONST_ITEM | STATIC_ITEM | MACRO_DEFINITION => {
            named_declaration(node, "name", content, NodeKind::Other)
        }
        _ => None,
    }
}

fn container(
    node: &tree_sitter::Node,
    field: &str,
    content: &[u8],
    kind: NodeKind,
) -> Option<DeclarationNode> {
    let declaration = named_declaration(node, field, content, kind)?;

    let mut children = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        collect(&body, content, &mut children);
    }

    Some(declaration.with_children(children))
}
