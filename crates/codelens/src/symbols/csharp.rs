//! Declaration trees for C# sources.

use super::tree_sitter_utils::{named_declaration, node_range, node_text};
use crate::types::{DeclarationNode, NodeKind};

/// Tree-sitter node kind constants for the C# grammar.
mod node_kinds {
    // Namespaces
    pub const NAMESPACE_DECLARATION: &str = "namespace_declaration";
    pub const FILE_SCOPED_NAMESPACE_DECLARATION: &str = "file_scoped_namespace_declaration";

    // Types
    pub const CLASS_DECLARATION: &str = "class_declaration";
    pub const STRUCT_DECLARATION: &str = "struct_declaration";
    pub const INTERFACE_DECLARATION: &str = "interface_declaration";
    pub const RECORD_DECLARATION: &str = "record_declaration";
    pub const ENUM_DECLARATION: &str = "enum_declaration";

    // Members
    pub const METHOD_DECLARATION: &str = "method_declaration";
    pub const CONSTRUCTOR_DECLARATION: &str = "constructor_declaration";
    pub const DESTRUCTOR_DECLARATION: &str = "destructor_declaration";
    pub const PROPERTY_DECLARATION: &str = "property_declaration";
    pub const FIELD_DECLARATION: &str = "field_declaration";
    pub const EVENT_FIELD_DECLARATION: &str = "event_field_declaration";

    // Structure
    pub const VARIABLE_DECLARATOR: &str = "variable_declarator";
    pub const IDENTIFIER: &str = "identifier";
}

/// Build the declaration tree of a parsed C# file.
///
/// Namespaces and class-like types are containers; members are leaves.
pub fn declarations(tree: &tree_sitter::Tree, content: &[u8]) -> Vec<DeclarationNode> {
    let mut nodes = Vec::new();
    collect(&tree.root_node(), content, &mut nodes);
    nodes
}

/// Collect the declarations under `node` into `out`.
///
/// Declarations that follow a file-scoped namespace at the same level become
/// its children, whichever way the grammar nests them.
fn collect(node: &tree_sitter::Node, content: &[u8], out: &mut Vec<DeclarationNode>) {
    let mut scoped: Option<usize> = None;
    let mut cursor = node.walk();

    for child in node.children(&mut cursor) {
        let sink = match scoped {
            Some(index) => &mut out[index].children,
            None => &mut *out,
        };

        match declaration(&child, content) {
            Some(found) => {
                sink.push(found);
                if scoped.is_none() && child.kind() == node_kinds::FILE_SCOPED_NAMESPACE_DECLARATION {
                    scoped = Some(out.len() - 1);
                }
            }
            None if is_member_kind(child.kind()) => {}
            None => collect(&child, content, sink),
        }
    }
}

/// Kinds whose subtrees never hold further declarations of interest.
fn is_member_kind(kind: &str) -> bool {
    use node_kinds::{
        CONSTRUCTOR_DECLARATION, DESTRUCTOR_DECLARATION, ENUM_DECLARATION,
        EVENT_FIELD_DECLARATION, FIELD_DECLARATION, METHOD_DECLARATION, PROPERTY_DECLARATION,
    };

    matches!(
        kind,
        METHOD_DECLARATION
            | CONSTRUCTOR_DECLARATION
            | DESTRUCTOR_DECLARATION
            | PROPERTY_DECLARATION
            | FIELD_DECLARATION
            | EVENT_FIELD_DECLARATION
            | ENUM_DECLARATION
    )
}

fn declaration(node: &tree_sitter::Node, content: &[u8]) -> Option<DeclarationNode> {
    use node_kinds::{
        CLASS_DECLARATION, CONSTRUCTOR_DECLARATION, DESTRUCTOR_DECLARATION, ENUM_DECLARATION,
        EVENT_FIELD_DECLARATION, FIELD_DECLARATION, FILE_SCOPED_NAMESPACE_DECLARATION,
        INTERFACE_DECLARATION, METHOD_DECLARATION, NAMESPACE_DECLARATION, PROPERTY_DECLARATION,
        RECORD_DECLARATION, STRUCT_DECLARATION,
    };

    match node.kind() {
        NAMESPACE_DECLARATION | FILE_SCOPED_NAMESPACE_DECLARATION => {
            container(node, content, NodeKind::Other)
        }
        CLASS_DECLARATION | STRUCT_DECLARATION | INTERFACE_DECLARATION | RECORD_DECLARATION => {
            container(node, content, NodeKind::Type)
        }
        ENUM_DECLARATION => named_declaration(node, "name", content, NodeKind::Type),
        METHOD_DECLARATION | CONSTRUCTOR_DECLARATION | DESTRUCTOR_DECLARATION => {
            named_declaration(node, "name", content, NodeKind::Method)
        }
        PROPERTY_DECLARATION => named_declaration(node, "name", content, NodeKind::Other),
        FIELD_DECLARATION | EVENT_FIELD_DECLARATION => field(node, content),
        _ => None,
    }
}

/// A namespace or type with its members as children.
///
/// File-scoped namespaces have no body; their members follow the name as
/// direct children.
fn container(node: &tree_sitter::Node, content: &[u8], kind: NodeKind) -> Option<DeclarationNode> {
    let declaration = named_declaration(node, "name", content, kind)?;

    let mut children = Vec::new();
    match node.child_by_field_name("body") {
        Some(body) => collect(&body, content, &mut children),
        None if node.kind() == node_kinds::FILE_SCOPED_NAMESPACE_DECLARATION => {
            collect(node, content, &mut children);
        }
        None => {}
    }

    Some(declaration.with_children(children))
}

/// A field, named after its first declarator (`int a, b;` is `a`).
fn field(node: &tree_sitter::Node, content: &[u8]) -> Option<DeclarationNode> {
    let declarator = find_descendant(node, node_kinds::VARIABLE_DECLARATOR)?;
    let name = declarator
        .child_by_field_name("name")
        .or_else(|| find_descendant(&declarator, node_kinds::IDENTIFIER))?;

    Some(DeclarationNode::new(
        NodeKind::Other,
        node_text(&name, content)?,
        node_range(node),
        node_range(&name),
    ))
}

fn find_descendant<'tree>(
    node: &tree_sitter::Node<'tree>,
    kind: &str,
) -> Option<tree_sitter::Node<'tree>> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == kind {
            return Some(child);
        }
        if let Some(found) = find_descendant(&child, kind) {
            return Some(found);
        }
    }
    None
}
