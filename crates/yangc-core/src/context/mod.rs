//! Serializer context: the resolved tree as seen by codecs.
//!
//! Exposes the root schema context plus externally registered protocol
//! annotations, and resolves [`ResourceId`]s against the schema. List and
//! leaf-list key values address instances; the schema context ignores them
//! and follows schema identifiers only.

mod resource;

pub use resource::{KeyValue, NodeKey, ResourceId, ResourceIdBuilder, ResourceIdError, SchemaId};

use crate::resolver::ResolvedTree;
use crate::schema::{NodeId, NodeKind, SchemaTree};
use indexmap::IndexMap;

/// An externally registered protocol annotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Annotation {
    /// Annotation name.
    pub name: String,
    /// Annotation namespace.
    pub namespace: String,
    /// Annotation value.
    pub value: String,
}

/// Registry of protocol annotations, keyed by (name, namespace).
#[derive(Clone, Debug, Default)]
pub struct AnnotationRegistry {
    annotations: IndexMap<(String, String), Annotation>,
}

impl AnnotationRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an annotation, replacing any previous one with the same
    /// (name, namespace).
    pub fn register(&mut self, annotation: Annotation) {
        let key = (annotation.name.clone(), annotation.namespace.clone());
        self.annotations.insert(key, annotation);
    }

    /// Look up an annotation by (name, namespace).
    #[must_use]
    pub fn get(&self, name: &str, namespace: &str) -> Option<&Annotation> {
        self.annotations
            .get(&(name.to_string(), namespace.to_string()))
    }

    /// Iterate over all annotations in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.values()
    }

    /// Number of registered annotations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}

/// The module-level root context of a resolved unit.
#[derive(Clone, Copy, Debug)]
pub struct RootContext<'a> {
    resolved: &'a ResolvedTree,
}

impl<'a> RootContext<'a> {
    /// Iterate over (name, namespace, root) of the unit's modules.
    pub fn modules(&self) -> impl Iterator<Item = (&'a str, &'a str, NodeId)> + 'a {
        let resolved = self.resolved;
        resolved.modules().iter().map(move |&m| {
            let tree = resolved.tree();
            let namespace = tree[m]
                .namespace
                .map_or("", |ns| tree.get_str(ns));
            (tree.name(m), namespace, m)
        })
    }
}

/// Serializer context over one resolved compilation unit.
#[derive(Debug)]
pub struct SerializerContext {
    resolved: ResolvedTree,
    annotations: AnnotationRegistry,
}

impl SerializerContext {
    /// Create a context from a resolved tree and annotation registry.
    #[must_use]
    pub fn new(resolved: ResolvedTree, annotations: AnnotationRegistry) -> Self {
        Self {
            resolved,
            annotations,
        }
    }

    /// The resolved tree backing this context.
    #[must_use]
    pub fn resolved(&self) -> &ResolvedTree {
        &self.resolved
    }

    /// The module-level root schema context.
    #[must_use]
    pub fn root_context(&self) -> RootContext<'_> {
        RootContext {
            resolved: &self.resolved,
        }
    }

    /// Externally registered protocol annotations.
    #[must_use]
    pub fn protocol_annotations(&self) -> &AnnotationRegistry {
        &self.annotations
    }

    /// Resolve a resource id to the schema node it addresses.
    ///
    /// Walks the resolved tree following schema ids; list and leaf-list
    /// key values are ignored. Returns `None` for dangling ids.
    #[must_use]
    pub fn lookup(&self, id: &ResourceId) -> Option<NodeId> {
        let tree = self.resolved.tree();
        let mut keys = id.node_keys().iter();

        let first = keys.next()?;
        let mut current = self.find_top_level(first.schema_id())?;

        for key in keys {
            let schema_id = key.schema_id();
            let name = tree.strings().find(&schema_id.name)?;
            let namespace = tree.strings().find(&schema_id.namespace)?;
            current = tree.find_data_child(current, name, Some(namespace))?;
        }
        Some(current)
    }

    /// Find a top-level data node by schema id across all modules.
    fn find_top_level(&self, id: &SchemaId) -> Option<NodeId> {
        let tree = self.resolved.tree();
        let name = tree.strings().find(&id.name)?;
        let namespace = tree.strings().find(&id.namespace)?;
        self.resolved
            .modules()
            .iter()
            .find_map(|&m| tree.find_data_child(m, name, Some(namespace)))
    }

    /// Build the resource id addressing a schema node.
    ///
    /// Choice and case layers do not appear in instance paths and are
    /// skipped; lists and leaf-lists are addressed at the schema level
    /// (no key values).
    #[must_use]
    pub fn resource_id_of(&self, node: NodeId) -> Option<ResourceId> {
        let tree = self.resolved.tree();
        let mut segments = Vec::new();
        let mut current = node;

        loop {
            let n = &tree[current];
            match n.kind {
                NodeKind::Module | NodeKind::Submodule => break,
                NodeKind::Choice | NodeKind::Case => {}
                k if k.is_data_node() => {
                    let namespace = tree.get_str(n.namespace?).to_string();
                    segments.push((tree.name(current).to_string(), namespace));
                }
                _ => return None,
            }
            current = n.parent?;
        }
        segments.reverse();

        let mut builder = ResourceId::builder();
        for (name, namespace) in segments {
            builder = builder.add_branch_point(name, namespace).ok()?;
        }
        builder.build().ok()
    }

    /// Iterate depth-first over all data nodes of the unit (choice and
    /// case layers included, grouping templates excluded).
    #[must_use]
    pub fn data_nodes(&self) -> DataNodes<'_> {
        let tree = self.resolved.tree();
        let mut stack: Vec<NodeId> = Vec::new();
        for &module in self.resolved.modules().iter().rev() {
            let mut children: Vec<NodeId> = tree
                .children(module)
                .filter(|&c| tree[c].kind.is_data_node())
                .collect();
            children.reverse();
            stack.extend(children);
        }
        DataNodes { tree, stack }
    }
}

/// Depth-first iterator over the data nodes of a resolved unit.
#[derive(Debug)]
pub struct DataNodes<'a> {
    tree: &'a SchemaTree,
    stack: Vec<NodeId>,
}

impl Iterator for DataNodes<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        let mut children: Vec<NodeId> = self
            .tree
            .children(next)
            .filter(|&c| self.tree[c].kind.is_data_node())
            .collect();
        children.reverse();
        self.stack.extend(children);
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve_set;
    use crate::source::{parse_source, CompileOptions};

    fn context_for(sources: &[&str]) -> SerializerContext {
        let modules = sources
            .iter()
            .map(|s| parse_source(s, None).expect("parse failed"))
            .collect();
        let resolved = resolve_set(modules, &CompileOptions::default()).expect("resolve failed");
        SerializerContext::new(resolved, AnnotationRegistry::new())
    }

    const M: &str = "module m { namespace \"urn:m\"; prefix m; container ifs { list if { key name; leaf name { type string; } leaf-list addrs { type string; } } } }";

    #[test]
    fn test_root_context_modules() {
        let ctx = context_for(&[M]);
        let modules: Vec<_> = ctx.root_context().modules().collect();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].0, "m");
        assert_eq!(modules[0].1, "urn:m");
    }

    #[test]
    fn test_lookup_walks_schema_ids() {
        let ctx = context_for(&[M]);
        let id = ResourceId::builder()
            .add_branch_point("ifs", "urn:m")
            .unwrap()
            .add_branch_point("if", "urn:m")
            .unwrap()
            .add_key_leaf("name", "urn:m", "eth0")
            .unwrap()
            .add_branch_point("name", "urn:m")
            .unwrap()
            .build()
            .unwrap();

        let node = ctx.lookup(&id).expect("lookup failed");
        let tree = ctx.resolved().tree();
        assert_eq!(tree.name(node), "name");
        assert_eq!(tree[node].kind, NodeKind::Leaf);
    }

    #[test]
    fn test_lookup_ignores_key_values() {
        let ctx = context_for(&[M]);
        let with_keys = ResourceId::builder()
            .add_branch_point("ifs", "urn:m")
            .unwrap()
            .add_branch_point("if", "urn:m")
            .unwrap()
            .add_key_leaf("name", "urn:m", "eth999")
            .unwrap()
            .build()
            .unwrap();
        let without_keys = ResourceId::builder()
            .add_branch_point("ifs", "urn:m")
            .unwrap()
            .add_branch_point("if", "urn:m")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(ctx.lookup(&with_keys), ctx.lookup(&without_keys));
    }

    #[test]
    fn test_lookup_dangling() {
        let ctx = context_for(&[M]);
        let id = ResourceId::builder()
            .add_branch_point("nope", "urn:m")
            .unwrap()
            .build()
            .unwrap();
        assert!(ctx.lookup(&id).is_none());

        let wrong_ns = ResourceId::builder()
            .add_branch_point("ifs", "urn:other")
            .unwrap()
            .build()
            .unwrap();
        assert!(ctx.lookup(&wrong_ns).is_none());
    }

    #[test]
    fn test_resource_id_round_trip() {
        let ctx = context_for(&[M]);
        for node in ctx.data_nodes() {
            let kind = ctx.resolved().tree()[node].kind;
            if matches!(kind, NodeKind::Choice | NodeKind::Case) {
                continue;
            }
            let id = ctx.resource_id_of(node).expect("id built");
            assert_eq!(ctx.lookup(&id), Some(node), "round trip for {id}");
        }
    }

    #[test]
    fn test_data_nodes_iterates_in_order() {
        let ctx = context_for(&[M]);
        let tree = ctx.resolved().tree();
        let names: Vec<&str> = ctx.data_nodes().map(|n| tree.name(n)).collect();
        assert_eq!(names, vec!["ifs", "if", "name", "addrs"]);
    }

    #[test]
    fn test_annotations() {
        let mut registry = AnnotationRegistry::new();
        registry.register(Annotation {
            name: "encoding".to_string(),
            namespace: "urn:proto".to_string(),
            value: "json".to_string(),
        });
        let modules = vec![parse_source(M, None).unwrap()];
        let resolved = resolve_set(modules, &CompileOptions::default()).unwrap();
        let ctx = SerializerContext::new(resolved, registry);

        let ann = ctx.protocol_annotations().get("encoding", "urn:proto");
        assert_eq!(ann.map(|a| a.value.as_str()), Some("json"));
        assert!(ctx.protocol_annotations().get("encoding", "urn:other").is_none());
        assert_eq!(ctx.protocol_annotations().len(), 1);
    }
}
