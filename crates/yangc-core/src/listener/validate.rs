//! Exit validations run when the walker pops a schema node.

use crate::error::{CompileError, ErrorKind, StructuralErrorKind};
use crate::schema::{NodeBody, NodeId, NodeKind, SchemaTree};

/// Strict `YYYY-MM-DD` calendar validation.
///
/// The shape is checked first (chrono would accept single-digit fields),
/// then the calendar (leap years, month lengths).
#[must_use]
pub fn is_valid_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }
    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| matches!(i, 4 | 7) || b.is_ascii_digit());
    if !digits_ok {
        return false;
    }
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// The effective config flag of a node: the nearest declared `config` on
/// the node or an ancestor, defaulting to `true`.
#[must_use]
pub fn effective_config(tree: &SchemaTree, id: NodeId) -> bool {
    std::iter::once(id)
        .chain(tree.ancestors(id))
        .find_map(|n| tree[n].declared_config())
        .unwrap_or(true)
}

/// Whether the node has an unexpanded `uses` among its direct children.
#[must_use]
pub fn has_uses_child(tree: &SchemaTree, id: NodeId) -> bool {
    tree.children(id).any(|c| tree[c].kind == NodeKind::Uses)
}

/// Whether the node sits inside a `grouping` template.
#[must_use]
pub fn inside_grouping(tree: &SchemaTree, id: NodeId) -> bool {
    tree.ancestors(id).any(|a| tree[a].kind == NodeKind::Grouping)
}

/// Validate a `list` on statement exit.
///
/// A `config true` list must declare a non-empty key; each key must name a
/// direct child leaf that is not of type `empty` and shares the list's
/// config flag. Both checks are deferred when the list still contains an
/// unexpanded `uses` or sits inside a grouping (the resolver re-runs them
/// after expansion).
pub fn validate_list_on_exit(tree: &SchemaTree, list: NodeId, errors: &mut Vec<CompileError>) {
    let node = &tree[list];
    let NodeBody::List(info) = &node.body else {
        return;
    };

    let config = effective_config(tree, list);
    let deferred = has_uses_child(tree, list) || inside_grouping(tree, list);

    // A node with config false admits no config true descendants
    if !config {
        for child in tree.children(list) {
            if tree[child].kind.is_data_node() && tree[child].declared_config() == Some(true) {
                errors.push(CompileError::at(
                    ErrorKind::Constraint,
                    tree[child].span,
                    format!(
                        "node '{}' has config true while list '{}' has config false",
                        tree.name(child),
                        tree.name(list)
                    ),
                ));
            }
        }
    }

    if config && info.keys.is_empty() && !deferred {
        errors.push(CompileError::at(
            ErrorKind::Constraint,
            node.span,
            format!(
                "list '{}' with config true must declare a key",
                tree.name(list)
            ),
        ));
    }

    let key_span = info.key_span.unwrap_or(node.span);
    for key in &info.keys {
        let Some(leaf) = tree.find_child(list, key, Some(NodeKind::Leaf)) else {
            if !deferred {
                errors.push(CompileError::at(
                    ErrorKind::Constraint,
                    key_span,
                    format!(
                        "key '{key}' must refer to a direct child leaf of list '{}'",
                        tree.name(list)
                    ),
                ));
            }
            continue;
        };

        if let Some(leaf_info) = tree[leaf].leaf_info() {
            if leaf_info
                .type_spec
                .as_ref()
                .is_some_and(|t| t.is_empty_type())
            {
                errors.push(CompileError::at(
                    ErrorKind::Constraint,
                    tree[leaf].span,
                    format!("key leaf '{key}' must not be of type empty"),
                ));
            }
        }

        if effective_config(tree, leaf) != config {
            errors.push(CompileError::at(
                ErrorKind::Constraint,
                tree[leaf].span,
                format!(
                    "key leaf '{key}' must have the same config value as list '{}'",
                    tree.name(list)
                ),
            ));
        }
    }
}

/// Validate a `choice` on statement exit: a default must name a child
/// case, and a mandatory choice must not have a default.
pub fn validate_choice_on_exit(tree: &SchemaTree, choice: NodeId, errors: &mut Vec<CompileError>) {
    let node = &tree[choice];
    let NodeBody::Choice(info) = &node.body else {
        return;
    };
    let Some(default) = &info.default_case else {
        return;
    };
    let span = info.default_span.unwrap_or(node.span);

    if info.mandatory == Some(true) {
        errors.push(CompileError::at(
            ErrorKind::Constraint,
            span,
            format!(
                "choice '{}' is mandatory and must not declare a default case",
                tree.name(choice)
            ),
        ));
    }

    if tree.find_child(choice, default, Some(NodeKind::Case)).is_none() {
        errors.push(CompileError::at(
            ErrorKind::Constraint,
            span,
            format!(
                "default '{default}' does not match any case of choice '{}'",
                tree.name(choice)
            ),
        ));
    }
}

/// Validate a `module`/`submodule` on exit: mandatory header statements.
pub fn validate_module_on_exit(tree: &SchemaTree, root: NodeId, errors: &mut Vec<CompileError>) {
    let node = &tree[root];
    let Some(info) = node.module_info() else {
        return;
    };
    let cardinality = |what: &str| {
        CompileError::at(
            ErrorKind::Structural(StructuralErrorKind::Cardinality),
            node.span,
            format!("{} '{}' is missing '{what}'", node.kind.keyword(), tree.name(root)),
        )
    };

    match node.kind {
        NodeKind::Module => {
            if info.namespace_uri.is_none() {
                errors.push(cardinality("namespace"));
            }
            if info.prefix.is_none() {
                errors.push(cardinality("prefix"));
            }
        }
        NodeKind::Submodule => {
            if info.belongs_to.is_none() {
                errors.push(cardinality("belongs-to"));
            }
        }
        _ => {}
    }
}

/// Validate a `uses` on exit: refine targets are relative descendant paths.
pub fn validate_uses_on_exit(tree: &SchemaTree, uses: NodeId, errors: &mut Vec<CompileError>) {
    let Some(info) = tree[uses].uses_info() else {
        return;
    };
    for refine in &info.refines {
        if refine.path.absolute || refine.path.up > 0 {
            errors.push(CompileError::at(
                ErrorKind::Constraint,
                refine.span,
                format!(
                    "refine target '{}' must be a descendant path relative to the grouping",
                    refine.path
                ),
            ));
        }
    }
}
