//! Schema tree data model.
//!
//! The schema tree is an arena of nodes addressed by stable [`NodeId`]
//! indices. Parent, child and sibling links are ids, as are all resolver
//! back-links (resolved `uses` targets, augmented-by lists); only the arena
//! owns nodes. Sibling order is insertion order and is semantically
//! meaningful throughout (cloning, refinement and augmentation preserve it).
//!
//! Names and namespace URIs are interned so that schema-id comparisons are
//! cheap key compares.

mod ids;
mod interner;
mod node;
mod path;
mod types;

pub use ids::{NodeId, StrId};
pub use interner::StringInterner;
pub use node::{
    AnyInfo, AugmentInfo, ChoiceInfo, CommonMeta, ContainerInfo, IdentityInfo, IfFeatureExpr,
    Import, Include, LeafInfo, ListInfo, MaxElements, ModuleInfo, Must, NodeBody, NodeKind,
    OrderedBy, Refine, Revision, SchemaNode, Status, TypedefInfo, UsesInfo, When, YangVersion,
};
pub use path::{PathStep, PrefixedName, ResolvableStatus, SchemaPath};
pub use types::{BitMember, BuiltinType, EnumMember, TypeRef, TypeSpec};

use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::ops::{Index, IndexMut};

/// A schema identifier: (name, namespace).
///
/// Among data-tree children of one parent this pair is unique.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId {
    /// Node name.
    pub name: StrId,
    /// Node namespace.
    pub namespace: StrId,
}

/// An entry in a container's child schema-id map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChildContext {
    /// The child node.
    pub child: NodeId,
    /// For children reached through a `case`: the case node the child
    /// actually sits under (context-switched entry).
    pub context_switched: Option<NodeId>,
}

/// A detected schema-id collision, reported by map construction.
#[derive(Clone, Copy, Debug)]
pub struct Collision {
    /// The scope whose identifier namespace is violated.
    pub scope: NodeId,
    /// The child registered first.
    pub existing: NodeId,
    /// The child that collided with it.
    pub incoming: NodeId,
    /// The contested schema id.
    pub id: SchemaId,
}

/// The schema tree arena.
#[derive(Clone, Debug, Default)]
pub struct SchemaTree {
    strings: StringInterner,
    nodes: Vec<SchemaNode>,
    /// Per-container child schema-id maps, built after resolution.
    child_maps: BTreeMap<NodeId, IndexMap<SchemaId, ChildContext>>,
}

impl Index<NodeId> for SchemaTree {
    type Output = SchemaNode;

    fn index(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.slot()]
    }
}

impl IndexMut<NodeId> for SchemaTree {
    fn index_mut(&mut self, id: NodeId) -> &mut SchemaNode {
        &mut self.nodes[id.slot()]
    }
}

impl SchemaTree {
    /// Create a new empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // === String operations ===

    /// Intern a string and return its ID.
    pub fn intern(&mut self, s: &str) -> StrId {
        self.strings.intern(s)
    }

    /// Get a string by its ID.
    #[must_use]
    pub fn get_str(&self, id: StrId) -> &str {
        self.strings.get(id)
    }

    /// Get the string interner.
    #[must_use]
    pub fn strings(&self) -> &StringInterner {
        &self.strings
    }

    /// A node's name.
    #[must_use]
    pub fn name(&self, id: NodeId) -> &str {
        self.get_str(self[id].name)
    }

    // === Node operations ===

    /// Add an unlinked node and return its handle.
    ///
    /// # Panics
    ///
    /// Panics when the arena no longer fits a [`NodeId`] (more than
    /// `u32::MAX - 1` nodes).
    pub fn add_node(&mut self, node: SchemaNode) -> NodeId {
        let id = NodeId::new(self.nodes.len()).expect("schema tree handle space exhausted");
        self.nodes.push(node);
        id
    }

    /// Get a node, or `None` when the id is out of range.
    #[must_use]
    pub fn get_node(&self, id: NodeId) -> Option<&SchemaNode> {
        self.nodes.get(id.slot())
    }

    /// Number of nodes in the arena (detached nodes included).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // === Link management ===

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self[child].parent.is_none(), "child is already linked");
        let prev = self[parent].last_child;
        self[child].parent = Some(parent);
        self[child].prev_sibling = prev;
        self[child].next_sibling = None;
        if let Some(prev) = prev {
            self[prev].next_sibling = Some(child);
        } else {
            self[parent].first_child = Some(child);
        }
        self[parent].last_child = Some(child);
    }

    /// Insert `new` immediately before `anchor` under the same parent.
    pub fn insert_before(&mut self, anchor: NodeId, new: NodeId) {
        debug_assert!(self[new].parent.is_none(), "node is already linked");
        let parent = self[anchor].parent;
        let prev = self[anchor].prev_sibling;
        self[new].parent = parent;
        self[new].prev_sibling = prev;
        self[new].next_sibling = Some(anchor);
        self[anchor].prev_sibling = Some(new);
        match prev {
            Some(prev) => self[prev].next_sibling = Some(new),
            None => {
                if let Some(parent) = parent {
                    self[parent].first_child = Some(new);
                }
            }
        }
    }

    /// Unlink a node from its parent and siblings. The node itself stays in
    /// the arena (ids are stable); it just becomes unreachable.
    pub fn detach(&mut self, id: NodeId) {
        let parent = self[id].parent;
        let prev = self[id].prev_sibling;
        let next = self[id].next_sibling;
        match prev {
            Some(prev) => self[prev].next_sibling = next,
            None => {
                if let Some(parent) = parent {
                    self[parent].first_child = next;
                }
            }
        }
        match next {
            Some(next) => self[next].prev_sibling = prev,
            None => {
                if let Some(parent) = parent {
                    self[parent].last_child = prev;
                }
            }
        }
        let node = &mut self[id];
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
    }

    // === Traversal ===

    /// Iterate over a node's children in insertion order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let first = self[id].first_child;
        std::iter::successors(first, move |&c| self[c].next_sibling)
    }

    /// Collect a node's child ids (for loops that mutate the tree).
    #[must_use]
    pub fn child_ids(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).collect()
    }

    /// Iterate over a node's ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self[id].parent, move |&a| self[a].parent)
    }

    /// The nearest module/submodule ancestor (or the node itself).
    #[must_use]
    pub fn enclosing_module(&self, id: NodeId) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|&n| matches!(self[n].kind, NodeKind::Module | NodeKind::Submodule))
    }

    /// Walk the subtree at `start` pre-order; stops when the visitor
    /// returns false.
    pub fn walk<F>(&self, start: NodeId, visitor: &mut F) -> bool
    where
        F: FnMut(NodeId) -> bool,
    {
        if !visitor(start) {
            return false;
        }
        let mut child = self[start].first_child;
        while let Some(c) = child {
            if !self.walk(c, visitor) {
                return false;
            }
            child = self[c].next_sibling;
        }
        true
    }

    /// Find a direct child by name (and optionally kind).
    #[must_use]
    pub fn find_child(&self, parent: NodeId, name: &str, kind: Option<NodeKind>) -> Option<NodeId> {
        let name_id = self.strings.find(name)?;
        self.children(parent).find(|&c| {
            self[c].name == name_id && kind.is_none_or(|k| self[c].kind == k)
        })
    }

    /// Find a data-tree child by (name, namespace), descending transparently
    /// through `choice` and `case` layers.
    ///
    /// A `namespace` of `None` matches children regardless of namespace
    /// (used before namespaces are assigned, when everything in scope comes
    /// from one module anyway).
    #[must_use]
    pub fn find_data_child(
        &self,
        parent: NodeId,
        name: StrId,
        namespace: Option<StrId>,
    ) -> Option<NodeId> {
        for child in self.children(parent) {
            let node = &self[child];
            match node.kind {
                NodeKind::Choice | NodeKind::Case => {
                    if node.kind == NodeKind::Choice
                        && node.name == name
                        && namespace.is_none_or(|ns| node.namespace == Some(ns))
                    {
                        // The choice identifier itself shares the scope
                        return Some(child);
                    }
                    if let Some(found) = self.find_data_child(child, name, namespace) {
                        return Some(found);
                    }
                }
                k if k.is_data_node() => {
                    if node.name == name
                        && namespace.is_none_or(|ns| node.namespace == Some(ns))
                    {
                        return Some(child);
                    }
                }
                _ => {}
            }
        }
        None
    }

    // === Collision detection ===

    /// The node whose identifier namespace an insertion under `holder`
    /// lands in: `case` and `choice` are transparent, and a holder that is
    /// an `augment` with a resolved target context-switches to the target.
    #[must_use]
    pub fn collision_scope(&self, holder: NodeId) -> NodeId {
        let mut scope = holder;
        loop {
            match self[scope].kind {
                NodeKind::Choice | NodeKind::Case => match self[scope].parent {
                    Some(parent) => scope = parent,
                    None => return scope,
                },
                NodeKind::Augment => match &self[scope].body {
                    NodeBody::Augment(info) if info.resolved.is_some() => {
                        scope = info.resolved.unwrap_or(scope);
                    }
                    _ => return scope,
                },
                _ => return scope,
            }
        }
    }

    /// Check whether inserting a data node `(name, namespace)` under
    /// `holder` would collide, walking up to the authoritative scope.
    /// Returns the conflicting node.
    #[must_use]
    pub fn detect_colliding_child(
        &self,
        holder: NodeId,
        name: StrId,
        namespace: Option<StrId>,
    ) -> Option<NodeId> {
        let scope = self.collision_scope(holder);
        self.find_data_child(scope, name, namespace)
    }

    // === Cloning ===

    /// Deep-copy the subtree rooted at `src`, returning the unlinked copy.
    ///
    /// The copy shares no mutable state with the original: refining the
    /// copy never touches the template. Sibling order is preserved, and
    /// augmented-by back-links are not carried over.
    pub fn clone_subtree(&mut self, src: NodeId) -> NodeId {
        let mut node = self[src].clone();
        node.parent = None;
        node.first_child = None;
        node.last_child = None;
        node.prev_sibling = None;
        node.next_sibling = None;
        node.augmented_by = Vec::new();
        let copy = self.add_node(node);
        for child in self.child_ids(src) {
            let child_copy = self.clone_subtree(child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// Copy the subtree rooted at `src` in `other` into this tree,
    /// re-interning names. Only unresolved trees may be merged this way:
    /// resolver back-links are not remapped.
    pub fn copy_subtree_from(&mut self, other: &SchemaTree, src: NodeId) -> NodeId {
        let mut node = other[src].clone();
        node.name = self.intern(other.get_str(node.name));
        node.namespace = node.namespace.map(|ns| self.intern(other.get_str(ns)));
        node.parent = None;
        node.first_child = None;
        node.last_child = None;
        node.prev_sibling = None;
        node.next_sibling = None;
        node.augmented_by = Vec::new();
        let copy = self.add_node(node);
        for child in other.child_ids(src) {
            let child_copy = self.copy_subtree_from(other, child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    // === Child schema-id maps ===

    /// Build (or rebuild) the child schema-id map of one scope.
    ///
    /// Direct data children are entered as-is; `choice` children contribute
    /// their own identifier plus, per case, the case's data children as
    /// context-switched entries. The choice's own map records its case
    /// identifiers. Collisions are returned rather than inserted.
    pub fn build_child_map(&mut self, scope: NodeId) -> Vec<Collision> {
        let mut collisions = Vec::new();
        let mut map: IndexMap<SchemaId, ChildContext> = IndexMap::new();

        self.collect_map_entries(scope, scope, None, &mut map, &mut collisions);
        self.child_maps.insert(scope, map);
        collisions
    }

    fn collect_map_entries(
        &mut self,
        scope: NodeId,
        parent: NodeId,
        case: Option<NodeId>,
        map: &mut IndexMap<SchemaId, ChildContext>,
        collisions: &mut Vec<Collision>,
    ) {
        for child in self.child_ids(parent) {
            let node = &self[child];
            match node.kind {
                NodeKind::Choice => {
                    let Some(id) = self.schema_id_of(child) else {
                        continue;
                    };
                    Self::insert_map_entry(map, scope, id, child, case, collisions);

                    // The choice's own map holds its case identifiers
                    let mut case_map: IndexMap<SchemaId, ChildContext> = IndexMap::new();
                    for case_child in self.child_ids(child) {
                        if let Some(case_id) = self.schema_id_of(case_child) {
                            Self::insert_map_entry(
                                &mut case_map,
                                child,
                                case_id,
                                case_child,
                                None,
                                collisions,
                            );
                        }
                    }
                    self.child_maps.insert(child, case_map);

                    // Case data children surface in the enclosing scope
                    for case_child in self.child_ids(child) {
                        self.collect_map_entries(
                            scope,
                            case_child,
                            Some(case_child),
                            map,
                            collisions,
                        );
                    }
                }
                k if k.is_data_node() => {
                    if let Some(id) = self.schema_id_of(child) {
                        Self::insert_map_entry(map, scope, id, child, case, collisions);
                    }
                }
                _ => {}
            }
        }
    }

    fn insert_map_entry(
        map: &mut IndexMap<SchemaId, ChildContext>,
        scope: NodeId,
        id: SchemaId,
        child: NodeId,
        case: Option<NodeId>,
        collisions: &mut Vec<Collision>,
    ) {
        if let Some(existing) = map.get(&id) {
            collisions.push(Collision {
                scope,
                existing: existing.child,
                incoming: child,
                id,
            });
        } else {
            map.insert(
                id,
                ChildContext {
                    child,
                    context_switched: case,
                },
            );
        }
    }

    /// The (name, namespace) schema id of a node, when its namespace has
    /// been assigned.
    #[must_use]
    pub fn schema_id_of(&self, id: NodeId) -> Option<SchemaId> {
        let node = &self[id];
        Some(SchemaId {
            name: node.name,
            namespace: node.namespace?,
        })
    }

    /// A scope's child schema-id map, when built.
    #[must_use]
    pub fn child_map(&self, scope: NodeId) -> Option<&IndexMap<SchemaId, ChildContext>> {
        self.child_maps.get(&scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Span;

    fn leaf(tree: &mut SchemaTree, name: &str) -> NodeId {
        let name = tree.intern(name);
        tree.add_node(SchemaNode::new(
            NodeKind::Leaf,
            name,
            NodeBody::Leaf(Box::default()),
            Span::SYNTHETIC,
        ))
    }

    fn container(tree: &mut SchemaTree, name: &str) -> NodeId {
        let name = tree.intern(name);
        tree.add_node(SchemaNode::new(
            NodeKind::Container,
            name,
            NodeBody::Container(ContainerInfo::default()),
            Span::SYNTHETIC,
        ))
    }

    #[test]
    fn test_append_preserves_order() {
        let mut tree = SchemaTree::new();
        let parent = container(&mut tree, "c");
        let a = leaf(&mut tree, "a");
        let b = leaf(&mut tree, "b");
        let c = leaf(&mut tree, "c");
        tree.append_child(parent, a);
        tree.append_child(parent, b);
        tree.append_child(parent, c);

        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![a, b, c]);
        assert_eq!(tree[b].prev_sibling, Some(a));
        assert_eq!(tree[b].next_sibling, Some(c));
    }

    #[test]
    fn test_insert_before() {
        let mut tree = SchemaTree::new();
        let parent = container(&mut tree, "c");
        let a = leaf(&mut tree, "a");
        let c = leaf(&mut tree, "c");
        tree.append_child(parent, a);
        tree.append_child(parent, c);

        let b = leaf(&mut tree, "b");
        tree.insert_before(c, b);
        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![a, b, c]);

        let first = leaf(&mut tree, "first");
        tree.insert_before(a, first);
        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![first, a, b, c]);
        assert_eq!(tree[parent].first_child, Some(first));
    }

    #[test]
    fn test_detach() {
        let mut tree = SchemaTree::new();
        let parent = container(&mut tree, "c");
        let a = leaf(&mut tree, "a");
        let b = leaf(&mut tree, "b");
        let c = leaf(&mut tree, "c");
        tree.append_child(parent, a);
        tree.append_child(parent, b);
        tree.append_child(parent, c);

        tree.detach(b);
        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![a, c]);
        assert!(tree[b].parent.is_none());

        tree.detach(a);
        assert_eq!(tree[parent].first_child, Some(c));
        tree.detach(c);
        assert!(tree[parent].first_child.is_none());
        assert!(tree[parent].last_child.is_none());
    }

    #[test]
    fn test_clone_subtree_is_deep() {
        let mut tree = SchemaTree::new();
        let root = container(&mut tree, "root");
        let child = leaf(&mut tree, "x");
        tree.append_child(root, child);

        let copy = tree.clone_subtree(root);
        assert_ne!(copy, root);
        let copy_kids = tree.child_ids(copy);
        assert_eq!(copy_kids.len(), 1);
        assert_ne!(copy_kids[0], child);
        assert_eq!(tree.name(copy_kids[0]), "x");

        // Mutating the copy leaves the original alone
        if let NodeBody::Leaf(info) = &mut tree[copy_kids[0]].body {
            info.defaults.push("changed".to_string());
        }
        assert!(tree[child].leaf_info().unwrap().defaults.is_empty());
    }

    #[test]
    fn test_copy_subtree_across_trees() {
        let mut src = SchemaTree::new();
        let root = container(&mut src, "root");
        let child = leaf(&mut src, "x");
        src.append_child(root, child);

        let mut dst = SchemaTree::new();
        let copy = dst.copy_subtree_from(&src, root);
        assert_eq!(dst.name(copy), "root");
        let kids = dst.child_ids(copy);
        assert_eq!(kids.len(), 1);
        assert_eq!(dst.name(kids[0]), "x");
    }

    #[test]
    fn test_find_data_child_through_choice() {
        let mut tree = SchemaTree::new();
        let parent = container(&mut tree, "c");
        let choice_name = tree.intern("proto");
        let choice = tree.add_node(SchemaNode::new(
            NodeKind::Choice,
            choice_name,
            NodeBody::Choice(ChoiceInfo::default()),
            Span::SYNTHETIC,
        ));
        tree.append_child(parent, choice);
        let case_name = tree.intern("a");
        let case = tree.add_node(SchemaNode::new(
            NodeKind::Case,
            case_name,
            NodeBody::Empty,
            Span::SYNTHETIC,
        ));
        tree.append_child(choice, case);
        let inner = leaf(&mut tree, "addr");
        tree.append_child(case, inner);

        let addr = tree.strings.find("addr").unwrap();
        assert_eq!(tree.find_data_child(parent, addr, None), Some(inner));
    }

    #[test]
    fn test_collision_scope_walks_out_of_case() {
        let mut tree = SchemaTree::new();
        let parent = container(&mut tree, "c");
        let choice_name = tree.intern("proto");
        let choice = tree.add_node(SchemaNode::new(
            NodeKind::Choice,
            choice_name,
            NodeBody::Choice(ChoiceInfo::default()),
            Span::SYNTHETIC,
        ));
        tree.append_child(parent, choice);
        let case_name = tree.intern("a");
        let case = tree.add_node(SchemaNode::new(
            NodeKind::Case,
            case_name,
            NodeBody::Empty,
            Span::SYNTHETIC,
        ));
        tree.append_child(choice, case);

        assert_eq!(tree.collision_scope(case), parent);
        assert_eq!(tree.collision_scope(choice), parent);
        assert_eq!(tree.collision_scope(parent), parent);
    }

    #[test]
    fn test_detect_colliding_child_across_cases() {
        // choice proto { case a { leaf ethernet; } case b { ... } }:
        // inserting "ethernet" under case b must collide
        let mut tree = SchemaTree::new();
        let parent = container(&mut tree, "c");
        let choice_name = tree.intern("proto");
        let choice = tree.add_node(SchemaNode::new(
            NodeKind::Choice,
            choice_name,
            NodeBody::Choice(ChoiceInfo::default()),
            Span::SYNTHETIC,
        ));
        tree.append_child(parent, choice);

        let make_case = |tree: &mut SchemaTree, name: &str| {
            let n = tree.intern(name);
            let case = tree.add_node(SchemaNode::new(
                NodeKind::Case,
                n,
                NodeBody::Empty,
                Span::SYNTHETIC,
            ));
            tree.append_child(choice, case);
            case
        };
        let case_a = make_case(&mut tree, "a");
        let case_b = make_case(&mut tree, "b");
        let eth = leaf(&mut tree, "ethernet");
        tree.append_child(case_a, eth);

        let eth_name = tree.strings.find("ethernet").unwrap();
        assert_eq!(
            tree.detect_colliding_child(case_b, eth_name, None),
            Some(eth)
        );
    }

    #[test]
    fn test_build_child_map_with_context_switch() {
        let mut tree = SchemaTree::new();
        let ns = tree.intern("urn:acme");
        let parent = container(&mut tree, "c");
        tree[parent].namespace = Some(ns);

        let direct = leaf(&mut tree, "direct");
        tree[direct].namespace = Some(ns);
        tree.append_child(parent, direct);

        let choice_name = tree.intern("proto");
        let choice = tree.add_node(SchemaNode::new(
            NodeKind::Choice,
            choice_name,
            NodeBody::Choice(ChoiceInfo::default()),
            Span::SYNTHETIC,
        ));
        tree[choice].namespace = Some(ns);
        tree.append_child(parent, choice);
        let case_name = tree.intern("a");
        let case = tree.add_node(SchemaNode::new(
            NodeKind::Case,
            case_name,
            NodeBody::Empty,
            Span::SYNTHETIC,
        ));
        tree[case].namespace = Some(ns);
        tree.append_child(choice, case);
        let nested = leaf(&mut tree, "nested");
        tree[nested].namespace = Some(ns);
        tree.append_child(case, nested);

        let collisions = tree.build_child_map(parent);
        assert!(collisions.is_empty());

        let map = tree.child_map(parent).unwrap();
        assert_eq!(map.len(), 3); // direct, proto (choice), nested
        let nested_id = tree.schema_id_of(nested).unwrap();
        let entry = map.get(&nested_id).unwrap();
        assert_eq!(entry.child, nested);
        assert_eq!(entry.context_switched, Some(case));

        // The choice's own map holds the case identifier
        let choice_map = tree.child_map(choice).unwrap();
        assert_eq!(choice_map.len(), 1);
    }

    #[test]
    fn test_build_child_map_reports_collision() {
        let mut tree = SchemaTree::new();
        let ns = tree.intern("urn:acme");
        let parent = container(&mut tree, "c");
        let a = leaf(&mut tree, "x");
        let b = leaf(&mut tree, "x");
        for id in [parent, a, b] {
            tree[id].namespace = Some(ns);
        }
        tree.append_child(parent, a);
        tree.append_child(parent, b);

        let collisions = tree.build_child_map(parent);
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].existing, a);
        assert_eq!(collisions[0].incoming, b);
    }

    #[test]
    fn test_enclosing_module() {
        let mut tree = SchemaTree::new();
        let mod_name = tree.intern("m");
        let module = tree.add_node(SchemaNode::new(
            NodeKind::Module,
            mod_name,
            NodeBody::Module(Box::default()),
            Span::SYNTHETIC,
        ));
        let c = container(&mut tree, "c");
        tree.append_child(module, c);
        let x = leaf(&mut tree, "x");
        tree.append_child(c, x);

        assert_eq!(tree.enclosing_module(x), Some(module));
        assert_eq!(tree.enclosing_module(module), Some(module));
    }

    #[test]
    fn test_walk_early_termination() {
        let mut tree = SchemaTree::new();
        let root = container(&mut tree, "root");
        for name in ["a", "b", "c"] {
            let l = leaf(&mut tree, name);
            tree.append_child(root, l);
        }

        let mut seen = 0;
        tree.walk(root, &mut |_| {
            seen += 1;
            seen < 2
        });
        assert_eq!(seen, 2);
    }
}
