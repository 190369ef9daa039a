//! Phase 1: submodule inclusion.
//!
//! For each module, recursively load included submodules, verify their
//! `belongs-to`, and merge their top-level definitions into the module's
//! scope. Prefix bindings of merged definitions come from the including
//! module: the submodule's `belongs-to` prefix and its imports are folded
//! into the module's tables.

use crate::error::{ErrorKind, ReferenceErrorKind, StructuralErrorKind};
use crate::resolver::context::ResolverContext;
use crate::schema::{NodeId, ResolvableStatus};
use crate::source::parse_file;
use std::collections::BTreeSet;
use tracing::debug;

/// Run submodule inclusion over every module in the unit.
pub fn run(ctx: &mut ResolverContext) {
    let roots = ctx.module_roots.clone();
    for module in roots {
        let mut visiting = BTreeSet::new();
        process_module(ctx, module, &mut visiting);
    }

    // A submodule that was passed in but never included is an input error
    for sub in ctx.submodule_roots.clone() {
        if ctx.tree[sub].parent.is_none() && !ctx.origin.values().any(|&r| r == sub) {
            let name = ctx.tree.name(sub).to_string();
            ctx.error_at_node(
                ErrorKind::Reference(ReferenceErrorKind::UnresolvedReference),
                sub,
                format!("submodule '{name}' is not included by any module"),
            );
        }
    }
}

/// Process the includes of one module (also used by the import phase for
/// modules loaded on demand).
pub fn process_module(ctx: &mut ResolverContext, module: NodeId, visiting: &mut BTreeSet<String>) {
    let module_name = ctx.tree.name(module).to_string();
    merge_includes_into(ctx, module, module, &module_name, visiting);
}

fn merge_includes_into(
    ctx: &mut ResolverContext,
    module: NodeId,
    holder: NodeId,
    module_name: &str,
    visiting: &mut BTreeSet<String>,
) {
    let includes = ctx.tree[holder]
        .module_info()
        .map(|info| info.includes.clone())
        .unwrap_or_default();

    for (index, include) in includes.iter().enumerate() {
        if include.status == ResolvableStatus::Resolved {
            continue;
        }
        if !visiting.insert(include.submodule.clone()) {
            ctx.error_at_span(
                ErrorKind::Reference(ReferenceErrorKind::CyclicReference),
                holder,
                include.span,
                format!("include cycle through submodule '{}'", include.submodule),
            );
            continue;
        }

        let Some(sub) = locate_submodule(ctx, holder, include.submodule.as_str(), include) else {
            visiting.remove(&include.submodule);
            continue;
        };

        // belongs-to must name the including module
        let belongs_to = ctx.tree[sub]
            .module_info()
            .and_then(|info| info.belongs_to.clone());
        if belongs_to.as_deref() != Some(module_name) {
            ctx.error_at_node(
                ErrorKind::Structural(StructuralErrorKind::InvalidHolder),
                sub,
                format!(
                    "submodule '{}' belongs to '{}', not to module '{module_name}'",
                    include.submodule,
                    belongs_to.as_deref().unwrap_or("<none>")
                ),
            );
            visiting.remove(&include.submodule);
            continue;
        }

        // Depth first: a submodule may include further submodules
        merge_includes_into(ctx, module, sub, module_name, visiting);
        merge_submodule(ctx, module, sub);
        visiting.remove(&include.submodule);

        if let Some(info) = ctx.tree[holder].module_info_mut() {
            if let Some(entry) = info.includes.get_mut(index) {
                entry.resolved = Some(sub);
                entry.status = ResolvableStatus::Resolved;
            }
        }
        debug!(module = module_name, submodule = %include.submodule, "merged submodule");
    }
}

fn locate_submodule(
    ctx: &mut ResolverContext,
    holder: NodeId,
    name: &str,
    include: &crate::schema::Include,
) -> Option<NodeId> {
    // Already parsed?
    if let Some(&sub) = ctx
        .submodule_roots
        .iter()
        .find(|&&s| ctx.tree.name(s) == name)
    {
        return Some(sub);
    }

    // Load on demand
    let located = match ctx.locator.locate(name, include.revision.as_deref()) {
        Ok(found) => found,
        Err(err) => {
            ctx.errors.push(err);
            return None;
        }
    };
    let Some(path) = located else {
        ctx.error_at_span(
            ErrorKind::Reference(ReferenceErrorKind::MissingImport),
            holder,
            include.span,
            format!("submodule '{name}' not found in any search directory"),
        );
        return None;
    };

    match parse_file(&path) {
        Ok(parsed) => {
            let sub = ctx.add_parsed(parsed);
            if ctx.tree[sub].kind != crate::schema::NodeKind::Submodule {
                ctx.error_at_span(
                    ErrorKind::Structural(StructuralErrorKind::InvalidHolder),
                    holder,
                    include.span,
                    format!("'{name}' is a module, not a submodule"),
                );
                return None;
            }
            Some(sub)
        }
        Err(errors) => {
            ctx.errors.extend(errors);
            None
        }
    }
}

/// Move a submodule's top-level definitions into the module and fold its
/// prefix tables into the module's.
fn merge_submodule(ctx: &mut ResolverContext, module: NodeId, sub: NodeId) {
    // The submodule's belongs-to prefix denotes the module itself
    if let Some(prefix) = ctx.tree[sub]
        .module_info()
        .and_then(|info| info.prefix.clone())
    {
        ctx.prefix_bindings.insert((module, prefix), module);
    }

    // Fold imports (prefix bindings are taken from the including module)
    let sub_imports = ctx.tree[sub]
        .module_info()
        .map(|info| info.imports.clone())
        .unwrap_or_default();
    for import in sub_imports {
        let conflict = ctx.tree[module].module_info().is_some_and(|info| {
            info.imports
                .iter()
                .any(|i| i.prefix == import.prefix && i.module != import.module)
        });
        if conflict {
            ctx.error_at_span(
                ErrorKind::Constraint,
                sub,
                import.span,
                format!(
                    "prefix '{}' of submodule '{}' conflicts with an import of module '{}'",
                    import.prefix,
                    ctx.tree.name(sub),
                    ctx.tree.name(module)
                ),
            );
            continue;
        }
        let duplicate = ctx.tree[module]
            .module_info()
            .is_some_and(|info| info.imports.iter().any(|i| i.prefix == import.prefix));
        if !duplicate {
            if let Some(info) = ctx.tree[module].module_info_mut() {
                info.imports.push(import);
            }
        }
    }

    // Move top-level definitions, preserving their order, and remember
    // which file they came from for diagnostics
    for child in ctx.tree.child_ids(sub) {
        ctx.tree.detach(child);
        ctx.tree.append_child(module, child);
        ctx.origin.insert(child, sub);
    }
}
