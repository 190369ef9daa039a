//! Tree-walk listener: statement tree → unresolved schema tree.
//!
//! A stack-based state machine in the manner of the parser pipeline: on
//! entry to a node-creating statement it validates the top of the stack
//! against the holder table, pushes a typed schema node and links it under
//! its holder; on exit it pops and runs the node's exit validation.
//! One-shot attribute statements assert the stack top has a matching kind
//! and fill the addressed field.
//!
//! The listener is lenient like the lexer: it collects every error it can
//! find in one pass; the driver decides that any error is fatal to the
//! file.

mod holder;
mod validate;

pub use validate::{effective_config, is_valid_date, validate_list_on_exit};

use crate::error::{CompileError, ErrorKind, StructuralErrorKind};
use crate::parser::{Keyword, Statement, StmtKind};
use crate::schema::{
    AnyInfo, AugmentInfo, BitMember, BuiltinType, ChoiceInfo, ContainerInfo, EnumMember,
    IdentityInfo, IfFeatureExpr, Import, Include, ListInfo, MaxElements, Must, NodeBody, NodeId,
    NodeKind, OrderedBy, PrefixedName, Refine, ResolvableStatus, Revision, SchemaNode, SchemaPath,
    SchemaTree, Status, TypeRef, TypeSpec, UsesInfo, When, YangVersion,
};
use holder::{attribute_holders, is_legal_holder, node_holders};
use std::collections::BTreeSet;
use tracing::trace;

/// Result of lowering one file's statement tree.
#[derive(Debug)]
pub struct LowerResult {
    /// The schema tree holding the lowered module.
    pub tree: SchemaTree,
    /// The module/submodule root, when lowering got that far.
    pub root: Option<NodeId>,
    /// Structural and constraint errors found during lowering.
    pub errors: Vec<CompileError>,
}

/// Lower a parsed statement tree into an unresolved schema tree.
#[must_use]
pub fn lower(root_stmt: &Statement) -> LowerResult {
    let mut listener = Listener::new();
    let root = listener.lower_root(root_stmt);
    LowerResult {
        tree: listener.tree,
        root,
        errors: listener.errors,
    }
}

struct Listener {
    tree: SchemaTree,
    stack: Vec<NodeId>,
    errors: Vec<CompileError>,
    /// Module YANG version, once seen (affects leaf-list defaults and
    /// multiple identity bases).
    version: YangVersion,
    /// One-shot statements already seen per node.
    seen: BTreeSet<(NodeId, StmtKind)>,
}

impl Listener {
    fn new() -> Self {
        Self {
            tree: SchemaTree::new(),
            stack: Vec::new(),
            errors: Vec::new(),
            version: YangVersion::V1,
            seen: BTreeSet::new(),
        }
    }

    fn error(&mut self, kind: ErrorKind, stmt_span: crate::lexer::Span, message: String) {
        self.errors.push(CompileError::at(kind, stmt_span, message));
    }

    fn structural(
        &mut self,
        kind: StructuralErrorKind,
        stmt: &Statement,
        context: &str,
    ) {
        let message = format!(
            "statement '{} {}' {context}",
            stmt.keyword.text(),
            stmt.arg_value()
        );
        self.error(ErrorKind::Structural(kind), stmt.keyword_span, message);
    }

    /// Record a one-shot statement; false (with an error) on a duplicate.
    fn once(&mut self, node: NodeId, kind: StmtKind, stmt: &Statement) -> bool {
        if self.seen.insert((node, kind)) {
            true
        } else {
            self.structural(
                StructuralErrorKind::DuplicateStatement,
                stmt,
                "may appear at most once here",
            );
            false
        }
    }

    // === Root ===

    fn lower_root(&mut self, stmt: &Statement) -> Option<NodeId> {
        let kind = match &stmt.keyword {
            Keyword::Std(StmtKind::Module) => NodeKind::Module,
            Keyword::Std(StmtKind::Submodule) => NodeKind::Submodule,
            _ => {
                self.structural(
                    StructuralErrorKind::MissingHolder,
                    stmt,
                    "must be 'module' or 'submodule' at the top level",
                );
                return None;
            }
        };

        if stmt.arg.is_none() {
            self.structural(
                StructuralErrorKind::Cardinality,
                stmt,
                "is missing its name argument",
            );
            return None;
        }

        let name = self.tree.intern(stmt.arg_value());
        let root = self.tree.add_node(SchemaNode::new(
            kind,
            name,
            NodeBody::Module(Box::default()),
            stmt.span,
        ));

        self.stack.push(root);
        for sub in &stmt.substatements {
            self.walk(sub);
        }
        self.stack.pop();

        validate::validate_module_on_exit(&self.tree, root, &mut self.errors);
        Some(root)
    }

    // === Dispatch ===

    fn walk(&mut self, stmt: &Statement) {
        let kind = match &stmt.keyword {
            Keyword::Extension { prefix, name } => {
                trace!(prefix = %prefix, name = %name, "skipping extension statement");
                return;
            }
            Keyword::Std(kind) => *kind,
        };

        if node_holders(kind).is_some() {
            self.enter_node(kind, stmt);
        } else if attribute_holders(kind).is_some() {
            self.handle_attribute(kind, stmt);
        } else {
            match kind {
                StmtKind::Extension => {
                    // Extension definitions carry no schema semantics here
                    trace!(name = stmt.arg_value(), "skipping extension definition");
                }
                StmtKind::Module | StmtKind::Submodule => {
                    self.structural(
                        StructuralErrorKind::InvalidHolder,
                        stmt,
                        "may only appear at the top level",
                    );
                }
                _ => {
                    // Sub-only statements (value, position, path, range,
                    // revision-date, ...) reached the generic walk
                    if self.stack.is_empty() {
                        self.structural(
                            StructuralErrorKind::MissingHolder,
                            stmt,
                            "has no enclosing statement",
                        );
                    } else {
                        self.structural(
                            StructuralErrorKind::InvalidHolder,
                            stmt,
                            "may not appear here",
                        );
                    }
                }
            }
        }
    }

    // === Node-creating statements ===

    fn node_kind_for(kind: StmtKind) -> NodeKind {
        match kind {
            StmtKind::Container => NodeKind::Container,
            StmtKind::List => NodeKind::List,
            StmtKind::Leaf => NodeKind::Leaf,
            StmtKind::LeafList => NodeKind::LeafList,
            StmtKind::Choice => NodeKind::Choice,
            StmtKind::Case => NodeKind::Case,
            StmtKind::Grouping => NodeKind::Grouping,
            StmtKind::Uses => NodeKind::Uses,
            StmtKind::Augment => NodeKind::Augment,
            StmtKind::Typedef => NodeKind::Typedef,
            StmtKind::Identity => NodeKind::Identity,
            StmtKind::Feature => NodeKind::Feature,
            StmtKind::Rpc => NodeKind::Rpc,
            StmtKind::Action => NodeKind::Action,
            StmtKind::Input => NodeKind::Input,
            StmtKind::Output => NodeKind::Output,
            StmtKind::Notification => NodeKind::Notification,
            StmtKind::Anyxml => NodeKind::Anyxml,
            StmtKind::Anydata => NodeKind::Anydata,
            // node_holders() returned Some for exactly the kinds above
            _ => unreachable!("not a node-creating statement"),
        }
    }

    fn initial_body(&mut self, kind: StmtKind, stmt: &Statement) -> Option<NodeBody> {
        let body = match kind {
            StmtKind::Container => NodeBody::Container(ContainerInfo::default()),
            StmtKind::List => NodeBody::List(ListInfo::default()),
            StmtKind::Leaf | StmtKind::LeafList => NodeBody::Leaf(Box::default()),
            StmtKind::Choice => NodeBody::Choice(ChoiceInfo::default()),
            StmtKind::Anyxml | StmtKind::Anydata => NodeBody::Any(AnyInfo::default()),
            StmtKind::Typedef => NodeBody::Typedef(Box::default()),
            StmtKind::Identity => NodeBody::Identity(IdentityInfo::default()),
            StmtKind::Uses => NodeBody::Uses(Box::new(UsesInfo {
                target: PrefixedName::parse(stmt.arg_value(), stmt.arg_span()),
                refines: Vec::new(),
                resolved: None,
                status: ResolvableStatus::Unresolved,
            })),
            StmtKind::Augment => {
                let path = match SchemaPath::parse(stmt.arg_value(), stmt.arg_span()) {
                    Ok(path) => path,
                    Err(message) => {
                        self.error(ErrorKind::Syntax, stmt.arg_span(), message);
                        return None;
                    }
                };
                NodeBody::Augment(Box::new(AugmentInfo {
                    target: path,
                    resolved: None,
                    status: ResolvableStatus::Unresolved,
                }))
            }
            _ => NodeBody::Empty,
        };
        Some(body)
    }

    fn enter_node(&mut self, kind: StmtKind, stmt: &Statement) {
        let Some(&holder) = self.stack.last() else {
            self.structural(
                StructuralErrorKind::MissingHolder,
                stmt,
                "has no enclosing statement",
            );
            return;
        };

        let holders = node_holders(kind).unwrap_or(&[]);
        if !is_legal_holder(holders, self.tree[holder].kind) {
            self.structural(
                StructuralErrorKind::InvalidHolder,
                stmt,
                &format!(
                    "may not appear inside '{} {}'",
                    self.tree[holder].kind.keyword(),
                    self.tree.name(holder)
                ),
            );
            return;
        }

        // Everything except input/output carries a name argument
        let needs_arg = !matches!(kind, StmtKind::Input | StmtKind::Output);
        if needs_arg && stmt.arg.is_none() {
            self.structural(
                StructuralErrorKind::Cardinality,
                stmt,
                "is missing its argument",
            );
            return;
        }

        let node_kind = Self::node_kind_for(kind);
        let name_text = if needs_arg {
            stmt.arg_value().to_string()
        } else {
            kind.text().to_string()
        };

        // A data node written directly under a choice is shorthand for a
        // case of the same name wrapping it
        let holder = if self.tree[holder].kind == NodeKind::Choice && node_kind != NodeKind::Case
        {
            match self.wrap_in_implicit_case(holder, &name_text, stmt) {
                Some(case) => case,
                None => return,
            }
        } else {
            holder
        };

        if !self.check_entry_collisions(holder, node_kind, &name_text, stmt) {
            return;
        }

        let Some(body) = self.initial_body(kind, stmt) else {
            return;
        };
        let name = self.tree.intern(&name_text);
        let node = self
            .tree
            .add_node(SchemaNode::new(node_kind, name, body, stmt.span));
        self.tree.append_child(holder, node);

        self.stack.push(node);
        for sub in &stmt.substatements {
            self.walk(sub);
        }
        self.stack.pop();

        self.exit_node(node, kind, stmt);
    }

    fn wrap_in_implicit_case(
        &mut self,
        choice: NodeId,
        name_text: &str,
        stmt: &Statement,
    ) -> Option<NodeId> {
        if self
            .tree
            .find_child(choice, name_text, Some(NodeKind::Case))
            .is_some()
        {
            self.error(
                ErrorKind::Constraint,
                stmt.arg_span(),
                format!(
                    "case '{name_text}' is already defined in choice '{}'",
                    self.tree.name(choice)
                ),
            );
            return None;
        }
        let name = self.tree.intern(name_text);
        let case = self
            .tree
            .add_node(SchemaNode::new(NodeKind::Case, name, NodeBody::Empty, stmt.span));
        self.tree.append_child(choice, case);
        Some(case)
    }

    /// Entry collision checks: data-tree identifier uniqueness (walking up
    /// through cases into the enclosing scope), case-identifier uniqueness
    /// within a choice, and definition-name shadowing for typedefs and
    /// groupings.
    fn check_entry_collisions(
        &mut self,
        holder: NodeId,
        node_kind: NodeKind,
        name_text: &str,
        stmt: &Statement,
    ) -> bool {
        match node_kind {
            NodeKind::Case => {
                if self
                    .tree
                    .find_child(holder, name_text, Some(NodeKind::Case))
                    .is_some()
                {
                    self.error(
                        ErrorKind::Constraint,
                        stmt.arg_span(),
                        format!(
                            "case '{name_text}' is already defined in choice '{}'",
                            self.tree.name(holder)
                        ),
                    );
                    return false;
                }
            }
            k if k.is_data_node() => {
                if let Some(name_id) = self.tree.strings().find(name_text) {
                    if self
                        .tree
                        .detect_colliding_child(holder, name_id, None)
                        .is_some()
                    {
                        let message = if self.tree[holder].kind == NodeKind::Case {
                            let choice = self.tree[holder]
                                .parent
                                .map_or("?", |c| self.tree.name(c))
                                .to_string();
                            format!(
                                "schema identifier '{name_text}' collides across the cases of choice '{choice}'"
                            )
                        } else {
                            format!(
                                "schema identifier '{name_text}' is already used in '{}'",
                                self.tree.name(self.tree.collision_scope(holder))
                            )
                        };
                        self.error(ErrorKind::Constraint, stmt.arg_span(), message);
                        return false;
                    }
                }
            }
            NodeKind::Typedef | NodeKind::Grouping => {
                let shadowed = std::iter::once(holder)
                    .chain(self.tree.ancestors(holder))
                    .any(|scope| {
                        self.tree
                            .find_child(scope, name_text, Some(node_kind))
                            .is_some()
                    });
                if shadowed {
                    self.error(
                        ErrorKind::Constraint,
                        stmt.arg_span(),
                        format!(
                            "{} '{name_text}' is already defined in an enclosing scope",
                            node_kind.keyword()
                        ),
                    );
                    return false;
                }
            }
            NodeKind::Identity
            | NodeKind::Feature
            | NodeKind::Rpc
            | NodeKind::Notification
            | NodeKind::Input
            | NodeKind::Output => {
                if self
                    .tree
                    .find_child(holder, name_text, Some(node_kind))
                    .is_some()
                {
                    self.error(
                        ErrorKind::Constraint,
                        stmt.arg_span(),
                        format!("{} '{name_text}' is already defined", node_kind.keyword()),
                    );
                    return false;
                }
            }
            _ => {}
        }
        true
    }

    fn exit_node(&mut self, node: NodeId, kind: StmtKind, stmt: &Statement) {
        match kind {
            StmtKind::List => {
                validate::validate_list_on_exit(&self.tree, node, &mut self.errors);
            }
            StmtKind::Choice => {
                validate::validate_choice_on_exit(&self.tree, node, &mut self.errors);
            }
            StmtKind::Uses => {
                validate::validate_uses_on_exit(&self.tree, node, &mut self.errors);
            }
            StmtKind::Leaf | StmtKind::LeafList => {
                if self.tree[node].leaf_info().is_some_and(|i| i.type_spec.is_none()) {
                    self.structural(
                        StructuralErrorKind::Cardinality,
                        stmt,
                        "is missing its 'type'",
                    );
                }
            }
            StmtKind::Typedef => {
                let missing = match &self.tree[node].body {
                    NodeBody::Typedef(info) => info.type_spec.is_none(),
                    _ => false,
                };
                if missing {
                    self.structural(
                        StructuralErrorKind::Cardinality,
                        stmt,
                        "is missing its 'type'",
                    );
                }
            }
            _ => {}
        }
    }

    // === Attribute statements ===

    #[allow(clippy::too_many_lines)] // one arm per statement kind
    fn handle_attribute(&mut self, kind: StmtKind, stmt: &Statement) {
        let Some(&node) = self.stack.last() else {
            self.structural(
                StructuralErrorKind::MissingHolder,
                stmt,
                "has no enclosing statement",
            );
            return;
        };

        let holders = attribute_holders(kind).unwrap_or(&[]);
        if !is_legal_holder(holders, self.tree[node].kind) {
            self.structural(
                StructuralErrorKind::InvalidHolder,
                stmt,
                &format!(
                    "may not appear inside '{} {}'",
                    self.tree[node].kind.keyword(),
                    self.tree.name(node)
                ),
            );
            return;
        }

        match kind {
            StmtKind::Description => {
                if self.once(node, kind, stmt) {
                    self.tree[node].meta.description = Some(stmt.arg_value().to_string());
                }
            }
            StmtKind::Reference => {
                if self.once(node, kind, stmt) {
                    self.tree[node].meta.reference = Some(stmt.arg_value().to_string());
                }
            }
            StmtKind::Status => {
                if self.once(node, kind, stmt) {
                    match stmt.arg_value() {
                        "current" => self.tree[node].meta.status = Status::Current,
                        "deprecated" => self.tree[node].meta.status = Status::Deprecated,
                        "obsolete" => self.tree[node].meta.status = Status::Obsolete,
                        other => self.error(
                            ErrorKind::Syntax,
                            stmt.arg_span(),
                            format!("invalid status '{other}'"),
                        ),
                    }
                }
            }
            StmtKind::When => {
                if self.once(node, kind, stmt) {
                    self.tree[node].meta.when = Some(When {
                        xpath: stmt.arg_value().to_string(),
                        span: stmt.arg_span(),
                    });
                }
            }
            StmtKind::IfFeature => {
                match IfFeatureExpr::parse(stmt.arg_value(), stmt.arg_span()) {
                    Ok(expr) => self.tree[node].meta.if_features.push(expr),
                    Err(message) => self.error(ErrorKind::Syntax, stmt.arg_span(), message),
                }
            }
            StmtKind::Must => {
                let must = self.build_must(stmt);
                self.tree[node].meta.musts.push(must);
            }
            StmtKind::Config => {
                if self.once(node, kind, stmt) {
                    if let Some(value) = self.parse_bool(stmt) {
                        self.set_config(node, value);
                    }
                }
            }
            StmtKind::Mandatory => {
                if self.once(node, kind, stmt) {
                    if let Some(value) = self.parse_bool(stmt) {
                        match &mut self.tree[node].body {
                            NodeBody::Leaf(info) => info.mandatory = Some(value),
                            NodeBody::Choice(info) => info.mandatory = Some(value),
                            NodeBody::Any(info) => info.mandatory = Some(value),
                            _ => {}
                        }
                    }
                }
            }
            StmtKind::Presence => {
                if self.once(node, kind, stmt) {
                    if let NodeBody::Container(info) = &mut self.tree[node].body {
                        info.presence = Some(stmt.arg_value().to_string());
                    }
                }
            }
            StmtKind::Default => self.handle_default(node, stmt),
            StmtKind::Units => {
                if self.once(node, kind, stmt) {
                    let units = stmt.arg_value().to_string();
                    match &mut self.tree[node].body {
                        NodeBody::Leaf(info) => info.units = Some(units),
                        NodeBody::Typedef(info) => info.units = Some(units),
                        _ => {}
                    }
                }
            }
            StmtKind::Key => self.handle_key(node, stmt),
            StmtKind::Unique => {
                let parts: Vec<String> = stmt
                    .arg_value()
                    .split_whitespace()
                    .map(str::to_string)
                    .collect();
                if let NodeBody::List(info) = &mut self.tree[node].body {
                    info.uniques.push(parts);
                }
            }
            StmtKind::MinElements => {
                if self.once(node, kind, stmt) {
                    if let Some(value) = self.parse_u64(stmt) {
                        match &mut self.tree[node].body {
                            NodeBody::List(info) => info.min_elements = Some(value),
                            NodeBody::Leaf(info) => info.min_elements = Some(value),
                            _ => {}
                        }
                    }
                }
            }
            StmtKind::MaxElements => {
                if self.once(node, kind, stmt) {
                    let max = if stmt.arg_value() == "unbounded" {
                        Some(MaxElements::Unbounded)
                    } else {
                        self.parse_u64(stmt).map(MaxElements::Value)
                    };
                    if let Some(max) = max {
                        match &mut self.tree[node].body {
                            NodeBody::List(info) => info.max_elements = Some(max),
                            NodeBody::Leaf(info) => info.max_elements = Some(max),
                            _ => {}
                        }
                    }
                }
            }
            StmtKind::OrderedBy => {
                if self.once(node, kind, stmt) {
                    let value = match stmt.arg_value() {
                        "user" => Some(OrderedBy::User),
                        "system" => Some(OrderedBy::System),
                        other => {
                            self.error(
                                ErrorKind::Syntax,
                                stmt.arg_span(),
                                format!("invalid ordered-by '{other}'"),
                            );
                            None
                        }
                    };
                    if let Some(value) = value {
                        match &mut self.tree[node].body {
                            NodeBody::List(info) => info.ordered_by = value,
                            NodeBody::Leaf(info) => info.ordered_by = value,
                            _ => {}
                        }
                    }
                }
            }
            StmtKind::Type => {
                if self.once(node, kind, stmt) {
                    if let Some(spec) = self.build_type_spec(stmt) {
                        match &mut self.tree[node].body {
                            NodeBody::Leaf(info) => info.type_spec = Some(spec),
                            NodeBody::Typedef(info) => info.type_spec = Some(spec),
                            _ => {}
                        }
                    }
                }
            }
            StmtKind::Base => {
                let base = PrefixedName::parse(stmt.arg_value(), stmt.arg_span());
                let mut duplicate = false;
                if let NodeBody::Identity(info) = &mut self.tree[node].body {
                    if !info.bases.is_empty() && self.version == YangVersion::V1 {
                        duplicate = true;
                    } else {
                        info.bases.push(base);
                    }
                }
                if duplicate {
                    self.structural(
                        StructuralErrorKind::DuplicateStatement,
                        stmt,
                        "may appear at most once per identity before YANG 1.1",
                    );
                }
            }
            StmtKind::YangVersion => {
                if self.once(node, kind, stmt) {
                    let version = match stmt.arg_value() {
                        "1" => Some(YangVersion::V1),
                        "1.1" => Some(YangVersion::V1_1),
                        other => {
                            self.error(
                                ErrorKind::Syntax,
                                stmt.arg_span(),
                                format!("unsupported yang-version '{other}'"),
                            );
                            None
                        }
                    };
                    if let Some(version) = version {
                        self.version = version;
                        if let Some(info) = self.tree[node].module_info_mut() {
                            info.yang_version = version;
                        }
                    }
                }
            }
            StmtKind::Namespace => {
                if self.once(node, kind, stmt) {
                    if let Some(info) = self.tree[node].module_info_mut() {
                        info.namespace_uri = Some(stmt.arg_value().to_string());
                    }
                }
            }
            StmtKind::Prefix => {
                if self.once(node, kind, stmt) {
                    let prefix = stmt.arg_value().to_string();
                    self.check_prefix_unique(node, &prefix, stmt);
                    if let Some(info) = self.tree[node].module_info_mut() {
                        info.prefix = Some(prefix);
                    }
                }
            }
            StmtKind::Organization => {
                if self.once(node, kind, stmt) {
                    if let Some(info) = self.tree[node].module_info_mut() {
                        info.organization = Some(stmt.arg_value().to_string());
                    }
                }
            }
            StmtKind::Contact => {
                if self.once(node, kind, stmt) {
                    if let Some(info) = self.tree[node].module_info_mut() {
                        info.contact = Some(stmt.arg_value().to_string());
                    }
                }
            }
            StmtKind::BelongsTo => self.handle_belongs_to(node, stmt),
            StmtKind::Import => self.handle_import(node, stmt),
            StmtKind::Include => self.handle_include(node, stmt),
            StmtKind::Revision => self.handle_revision(node, stmt),
            StmtKind::Refine => self.handle_refine(node, stmt),
            _ => {
                // attribute_holders() covered exactly the kinds above
                unreachable!("unhandled attribute statement");
            }
        }
    }

    fn parse_bool(&mut self, stmt: &Statement) -> Option<bool> {
        match stmt.arg_value() {
            "true" => Some(true),
            "false" => Some(false),
            other => {
                self.error(
                    ErrorKind::Syntax,
                    stmt.arg_span(),
                    format!(
                        "invalid {} value '{other}', expected true or false",
                        stmt.keyword.text()
                    ),
                );
                None
            }
        }
    }

    fn parse_u64(&mut self, stmt: &Statement) -> Option<u64> {
        match stmt.arg_value().parse::<u64>() {
            Ok(v) => Some(v),
            Err(_) => {
                self.error(
                    ErrorKind::Syntax,
                    stmt.arg_span(),
                    format!(
                        "invalid {} value '{}'",
                        stmt.keyword.text(),
                        stmt.arg_value()
                    ),
                );
                None
            }
        }
    }

    fn set_config(&mut self, node: NodeId, value: bool) {
        match &mut self.tree[node].body {
            NodeBody::Container(info) => info.config = Some(value),
            NodeBody::List(info) => info.config = Some(value),
            NodeBody::Leaf(info) => info.config = Some(value),
            NodeBody::Choice(info) => info.config = Some(value),
            NodeBody::Any(info) => info.config = Some(value),
            _ => {}
        }
    }

    fn handle_default(&mut self, node: NodeId, stmt: &Statement) {
        let value = stmt.arg_value().to_string();
        match self.tree[node].kind {
            NodeKind::Leaf => {
                if self.once(node, StmtKind::Default, stmt) {
                    if let NodeBody::Leaf(info) = &mut self.tree[node].body {
                        info.defaults.push(value);
                    }
                }
            }
            NodeKind::LeafList => {
                let repeat_ok = self.version == YangVersion::V1_1;
                let first = match &self.tree[node].body {
                    NodeBody::Leaf(info) => info.defaults.is_empty(),
                    _ => true,
                };
                if first || repeat_ok {
                    if let NodeBody::Leaf(info) = &mut self.tree[node].body {
                        info.defaults.push(value);
                    }
                } else {
                    self.structural(
                        StructuralErrorKind::DuplicateStatement,
                        stmt,
                        "may appear at most once per leaf-list before YANG 1.1",
                    );
                }
            }
            NodeKind::Choice => {
                if self.once(node, StmtKind::Default, stmt) {
                    if let NodeBody::Choice(info) = &mut self.tree[node].body {
                        info.default_case = Some(value);
                        info.default_span = Some(stmt.arg_span());
                    }
                }
            }
            NodeKind::Typedef => {
                if self.once(node, StmtKind::Default, stmt) {
                    if let NodeBody::Typedef(info) = &mut self.tree[node].body {
                        info.default = Some(value);
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, node: NodeId, stmt: &Statement) {
        if !self.once(node, StmtKind::Key, stmt) {
            return;
        }
        let mut keys: Vec<String> = Vec::new();
        for part in stmt.arg_value().split_whitespace() {
            if keys.iter().any(|k| k == part) {
                self.error(
                    ErrorKind::Constraint,
                    stmt.arg_span(),
                    format!("duplicate key leaf '{part}'"),
                );
                continue;
            }
            keys.push(part.to_string());
        }
        if keys.is_empty() {
            self.error(
                ErrorKind::Constraint,
                stmt.arg_span(),
                "key statement names no leaves".to_string(),
            );
        }
        if let NodeBody::List(info) = &mut self.tree[node].body {
            info.keys = keys;
            info.key_span = Some(stmt.arg_span());
        }
    }

    fn check_prefix_unique(&mut self, module: NodeId, prefix: &str, stmt: &Statement) {
        let taken = self.tree[module].module_info().is_some_and(|info| {
            info.prefix.as_deref() == Some(prefix)
                || info.imports.iter().any(|i| i.prefix == prefix)
        });
        if taken {
            self.error(
                ErrorKind::Constraint,
                stmt.arg_span(),
                format!("prefix '{prefix}' is already in use in this module"),
            );
        }
    }

    fn handle_belongs_to(&mut self, node: NodeId, stmt: &Statement) {
        if !self.once(node, StmtKind::BelongsTo, stmt) {
            return;
        }
        let parent = stmt.arg_value().to_string();
        let prefix = stmt
            .find(StmtKind::Prefix)
            .map(|p| p.arg_value().to_string());
        if prefix.is_none() {
            self.structural(
                StructuralErrorKind::Cardinality,
                stmt,
                "is missing its 'prefix'",
            );
        }
        if let Some(info) = self.tree[node].module_info_mut() {
            info.belongs_to = Some(parent);
            info.prefix = prefix;
        }
    }

    fn handle_import(&mut self, module: NodeId, stmt: &Statement) {
        let Some(prefix_stmt) = stmt.find(StmtKind::Prefix) else {
            self.structural(
                StructuralErrorKind::Cardinality,
                stmt,
                "is missing its 'prefix'",
            );
            return;
        };
        let prefix = prefix_stmt.arg_value().to_string();
        self.check_prefix_unique(module, &prefix, prefix_stmt);

        let revision = self.read_revision_date(stmt);

        if let Some(info) = self.tree[module].module_info_mut() {
            info.imports.push(Import {
                module: stmt.arg_value().to_string(),
                prefix,
                revision,
                span: stmt.arg_span(),
                resolved: None,
                status: ResolvableStatus::Unresolved,
            });
        }
    }

    fn handle_include(&mut self, module: NodeId, stmt: &Statement) {
        let revision = self.read_revision_date(stmt);
        if let Some(info) = self.tree[module].module_info_mut() {
            info.includes.push(Include {
                submodule: stmt.arg_value().to_string(),
                revision,
                span: stmt.arg_span(),
                resolved: None,
                status: ResolvableStatus::Unresolved,
            });
        }
    }

    /// Read a `revision-date` substatement (legal only inside `import` and
    /// `include`, which is enforced structurally by being read only here).
    fn read_revision_date(&mut self, stmt: &Statement) -> Option<String> {
        let date_stmt = stmt.find(StmtKind::RevisionDate)?;
        let date = date_stmt.arg_value().to_string();
        if is_valid_date(&date) {
            Some(date)
        } else {
            self.error(
                ErrorKind::Date,
                date_stmt.arg_span(),
                format!("invalid revision-date '{date}'"),
            );
            None
        }
    }

    fn handle_revision(&mut self, module: NodeId, stmt: &Statement) {
        let date = stmt.arg_value().to_string();
        if !is_valid_date(&date) {
            self.error(
                ErrorKind::Date,
                stmt.arg_span(),
                format!("invalid revision date '{date}'"),
            );
            return;
        }
        let description = stmt
            .find(StmtKind::Description)
            .map(|s| s.arg_value().to_string());
        let reference = stmt
            .find(StmtKind::Reference)
            .map(|s| s.arg_value().to_string());
        if let Some(info) = self.tree[module].module_info_mut() {
            info.revisions.push(Revision {
                date,
                description,
                reference,
                span: stmt.arg_span(),
            });
        }
    }

    fn handle_refine(&mut self, uses: NodeId, stmt: &Statement) {
        let path = match SchemaPath::parse(stmt.arg_value(), stmt.arg_span()) {
            Ok(path) => path,
            Err(message) => {
                self.error(ErrorKind::Syntax, stmt.arg_span(), message);
                return;
            }
        };

        let mut refine = Refine {
            path,
            description: None,
            reference: None,
            config: None,
            mandatory: None,
            presence: None,
            defaults: Vec::new(),
            min_elements: None,
            max_elements: None,
            musts: Vec::new(),
            span: stmt.span,
        };

        for sub in &stmt.substatements {
            let Keyword::Std(kind) = &sub.keyword else {
                continue;
            };
            match kind {
                StmtKind::Description => refine.description = Some(sub.arg_value().to_string()),
                StmtKind::Reference => refine.reference = Some(sub.arg_value().to_string()),
                StmtKind::Config => refine.config = self.parse_bool(sub),
                StmtKind::Mandatory => refine.mandatory = self.parse_bool(sub),
                StmtKind::Presence => refine.presence = Some(sub.arg_value().to_string()),
                StmtKind::Default => refine.defaults.push(sub.arg_value().to_string()),
                StmtKind::MinElements => refine.min_elements = self.parse_u64(sub),
                StmtKind::MaxElements => {
                    refine.max_elements = if sub.arg_value() == "unbounded" {
                        Some(MaxElements::Unbounded)
                    } else {
                        self.parse_u64(sub).map(MaxElements::Value)
                    };
                }
                StmtKind::Must => {
                    let must = self.build_must(sub);
                    refine.musts.push(must);
                }
                _ => {
                    self.structural(
                        StructuralErrorKind::InvalidHolder,
                        sub,
                        "may not appear inside 'refine'",
                    );
                }
            }
        }

        if let NodeBody::Uses(info) = &mut self.tree[uses].body {
            info.refines.push(refine);
        }
    }

    fn build_must(&mut self, stmt: &Statement) -> Must {
        Must {
            xpath: stmt.arg_value().to_string(),
            error_message: stmt
                .find(StmtKind::ErrorMessage)
                .map(|s| s.arg_value().to_string()),
            error_app_tag: stmt
                .find(StmtKind::ErrorAppTag)
                .map(|s| s.arg_value().to_string()),
            description: stmt
                .find(StmtKind::Description)
                .map(|s| s.arg_value().to_string()),
            reference: stmt
                .find(StmtKind::Reference)
                .map(|s| s.arg_value().to_string()),
            span: stmt.arg_span(),
        }
    }

    // === Types ===

    #[allow(clippy::too_many_lines)] // one arm per restriction statement
    fn build_type_spec(&mut self, stmt: &Statement) -> Option<TypeSpec> {
        if stmt.arg.is_none() {
            self.structural(
                StructuralErrorKind::Cardinality,
                stmt,
                "is missing its type name",
            );
            return None;
        }
        let name = stmt.arg_value();
        let base = match BuiltinType::from_name(name) {
            Some(builtin) => TypeRef::Builtin(builtin),
            None => TypeRef::Derived(PrefixedName::parse(name, stmt.arg_span())),
        };
        let mut spec = TypeSpec::new(base, stmt.span);

        for sub in &stmt.substatements {
            let Keyword::Std(kind) = &sub.keyword else {
                continue;
            };
            match kind {
                StmtKind::Range => spec.range = Some(sub.arg_value().to_string()),
                StmtKind::Length => spec.length = Some(sub.arg_value().to_string()),
                StmtKind::Pattern => spec.patterns.push(sub.arg_value().to_string()),
                StmtKind::Enum => {
                    let member_name = sub.arg_value().to_string();
                    if spec.enums.iter().any(|e| e.name == member_name) {
                        self.error(
                            ErrorKind::Constraint,
                            sub.arg_span(),
                            format!("duplicate enum '{member_name}'"),
                        );
                        continue;
                    }
                    let value = sub
                        .find(StmtKind::Value)
                        .and_then(|v| v.arg_value().parse::<i64>().ok());
                    spec.enums.push(EnumMember {
                        name: member_name,
                        value,
                        description: sub
                            .find(StmtKind::Description)
                            .map(|d| d.arg_value().to_string()),
                    });
                }
                StmtKind::Bit => {
                    let member_name = sub.arg_value().to_string();
                    if spec.bits.iter().any(|b| b.name == member_name) {
                        self.error(
                            ErrorKind::Constraint,
                            sub.arg_span(),
                            format!("duplicate bit '{member_name}'"),
                        );
                        continue;
                    }
                    let position = sub
                        .find(StmtKind::Position)
                        .and_then(|p| p.arg_value().parse::<u32>().ok());
                    spec.bits.push(BitMember {
                        name: member_name,
                        position,
                        description: sub
                            .find(StmtKind::Description)
                            .map(|d| d.arg_value().to_string()),
                    });
                }
                StmtKind::FractionDigits => {
                    match sub.arg_value().parse::<u8>() {
                        Ok(digits @ 1..=18) => spec.fraction_digits = Some(digits),
                        _ => self.error(
                            ErrorKind::Syntax,
                            sub.arg_span(),
                            format!("invalid fraction-digits '{}'", sub.arg_value()),
                        ),
                    }
                }
                StmtKind::Path => match SchemaPath::parse(sub.arg_value(), sub.arg_span()) {
                    Ok(path) => spec.path = Some(path),
                    Err(message) => self.error(ErrorKind::Syntax, sub.arg_span(), message),
                },
                StmtKind::RequireInstance => {
                    spec.require_instance = self.parse_bool(sub);
                }
                StmtKind::Base => {
                    spec.identity_bases
                        .push(PrefixedName::parse(sub.arg_value(), sub.arg_span()));
                }
                StmtKind::Type => {
                    if let Some(member) = self.build_type_spec(sub) {
                        spec.union_members.push(member);
                    }
                }
                _ => {
                    self.structural(
                        StructuralErrorKind::InvalidHolder,
                        sub,
                        "may not appear inside 'type'",
                    );
                }
            }
        }

        self.validate_type_spec(&spec, stmt);
        Some(spec)
    }

    fn validate_type_spec(&mut self, spec: &TypeSpec, stmt: &Statement) {
        let TypeRef::Builtin(builtin) = spec.base else {
            return;
        };
        let missing = |what: &str| {
            CompileError::at(
                ErrorKind::Structural(StructuralErrorKind::Cardinality),
                stmt.span,
                format!("type {builtin} requires '{what}'"),
            )
        };
        match builtin {
            BuiltinType::Leafref => {
                if spec.path.is_none() {
                    self.errors.push(missing("path"));
                }
            }
            BuiltinType::Identityref => {
                if spec.identity_bases.is_empty() {
                    self.errors.push(missing("base"));
                }
            }
            BuiltinType::Decimal64 => {
                if spec.fraction_digits.is_none() {
                    self.errors.push(missing("fraction-digits"));
                }
            }
            BuiltinType::Union => {
                if spec.union_members.is_empty() {
                    self.errors.push(missing("type"));
                }
            }
            BuiltinType::Enumeration => {
                if spec.enums.is_empty() {
                    self.errors.push(missing("enum"));
                }
            }
            BuiltinType::Bits => {
                if spec.bits.is_empty() {
                    self.errors.push(missing("bit"));
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn lower_source(source: &str) -> LowerResult {
        let parse = Parser::new(source).parse();
        assert!(
            !parse.has_errors(),
            "unexpected parse errors: {:?}",
            parse.diagnostics
        );
        lower(parse.root.as_ref().expect("parse produced no root"))
    }

    fn lower_ok(source: &str) -> (SchemaTree, NodeId) {
        let result = lower_source(source);
        assert!(result.errors.is_empty(), "unexpected errors: {:?}", result.errors);
        (result.tree, result.root.expect("no root"))
    }

    fn lower_errors(source: &str) -> Vec<CompileError> {
        let result = lower_source(source);
        assert!(!result.errors.is_empty(), "expected lowering errors");
        result.errors
    }

    const HEADER: &str = "namespace \"urn:acme:test\"; prefix t;";

    #[test]
    fn test_minimal_module() {
        let (tree, root) = lower_ok("module m { namespace \"urn:m\"; prefix m; }");
        assert_eq!(tree[root].kind, NodeKind::Module);
        assert_eq!(tree.name(root), "m");
        let info = tree[root].module_info().unwrap();
        assert_eq!(info.namespace_uri.as_deref(), Some("urn:m"));
        assert_eq!(info.prefix.as_deref(), Some("m"));
    }

    #[test]
    fn test_module_missing_namespace() {
        let errors = lower_errors("module m { prefix m; }");
        assert!(errors.iter().any(|e| e.message.contains("'namespace'")));
    }

    #[test]
    fn test_container_with_leaves() {
        let (tree, root) = lower_ok(&format!(
            "module m {{ {HEADER} container c {{ leaf a {{ type string; }} leaf-list b {{ type int32; ordered-by user; }} }} }}"
        ));
        let c = tree.find_child(root, "c", Some(NodeKind::Container)).unwrap();
        let kids = tree.child_ids(c);
        assert_eq!(kids.len(), 2);
        assert_eq!(tree[kids[1]].kind, NodeKind::LeafList);
        assert_eq!(
            tree[kids[1]].leaf_info().unwrap().ordered_by,
            OrderedBy::User
        );
    }

    #[test]
    fn test_ordered_by_user_leaf_list() {
        // Parsing `leaf-list foo { ordered-by user; }` succeeds without
        // diagnostics and records the ordering
        let (tree, root) = lower_ok(&format!(
            "module m {{ {HEADER} leaf-list foo {{ type string; ordered-by user; }} }}"
        ));
        let foo = tree.find_child(root, "foo", Some(NodeKind::LeafList)).unwrap();
        assert_eq!(tree[foo].leaf_info().unwrap().ordered_by, OrderedBy::User);
    }

    #[test]
    fn test_key_outside_list_is_invalid_holder() {
        let errors = lower_errors(&format!(
            "module m {{ {HEADER} container c {{ key x; }} }}"
        ));
        assert!(errors.iter().any(|e| {
            matches!(
                e.kind,
                ErrorKind::Structural(StructuralErrorKind::InvalidHolder)
            ) && e.message.contains("'key x'")
        }));
    }

    #[test]
    fn test_duplicate_description_rejected() {
        let errors = lower_errors(&format!(
            "module m {{ {HEADER} leaf x {{ type string; description \"a\"; description \"b\"; }} }}"
        ));
        assert!(errors.iter().any(|e| {
            matches!(
                e.kind,
                ErrorKind::Structural(StructuralErrorKind::DuplicateStatement)
            )
        }));
    }

    #[test]
    fn test_leaf_missing_type() {
        let errors = lower_errors(&format!("module m {{ {HEADER} leaf x; }}"));
        assert!(errors.iter().any(|e| e.message.contains("missing its 'type'")));
    }

    #[test]
    fn test_list_with_key() {
        let (tree, root) = lower_ok(&format!(
            "module m {{ {HEADER} list if {{ key name; leaf name {{ type string; }} }} }}"
        ));
        let list = tree.find_child(root, "if", Some(NodeKind::List)).unwrap();
        let crate::schema::NodeBody::List(info) = &tree[list].body else {
            panic!("expected list body");
        };
        assert_eq!(info.keys, vec!["name"]);
    }

    #[test]
    fn test_config_list_without_key_rejected() {
        let errors = lower_errors(&format!(
            "module m {{ {HEADER} list l {{ leaf x {{ type string; }} }} }}"
        ));
        assert!(errors.iter().any(|e| e.message.contains("must declare a key")));
    }

    #[test]
    fn test_config_false_list_without_key_accepted() {
        lower_ok(&format!(
            "module m {{ {HEADER} list l {{ config false; leaf x {{ type string; }} }} }}"
        ));
    }

    #[test]
    fn test_list_with_uses_defers_key_check() {
        lower_ok(&format!(
            "module m {{ {HEADER} grouping g {{ leaf name {{ type string; }} }} list l {{ key name; uses g; }} }}"
        ));
    }

    #[test]
    fn test_list_in_grouping_defers_key_check() {
        lower_ok(&format!(
            "module m {{ {HEADER} grouping g {{ list l {{ leaf x {{ type string; }} }} }} }}"
        ));
    }

    #[test]
    fn test_duplicate_key_leaf_rejected() {
        let errors = lower_errors(&format!(
            "module m {{ {HEADER} list l {{ key \"a a\"; leaf a {{ type string; }} }} }}"
        ));
        assert!(errors.iter().any(|e| e.message.contains("duplicate key leaf 'a'")));
    }

    #[test]
    fn test_key_of_type_empty_rejected() {
        let errors = lower_errors(&format!(
            "module m {{ {HEADER} list l {{ key a; leaf a {{ type empty; }} }} }}"
        ));
        assert!(errors.iter().any(|e| e.message.contains("type empty")));
    }

    #[test]
    fn test_key_config_mismatch_rejected() {
        let errors = lower_errors(&format!(
            "module m {{ {HEADER} list l {{ key a; leaf a {{ type string; config false; }} }} }}"
        ));
        assert!(errors
            .iter()
            .any(|e| e.message.contains("same config value")));
    }

    #[test]
    fn test_choice_default_matches_case() {
        let (tree, root) = lower_ok(&format!(
            "module m {{ {HEADER} choice proto {{ default a; case a {{ leaf x {{ type string; }} }} case b {{ leaf y {{ type string; }} }} }} }}"
        ));
        let choice = tree.find_child(root, "proto", Some(NodeKind::Choice)).unwrap();
        assert_eq!(tree.child_ids(choice).len(), 2);
    }

    #[test]
    fn test_choice_default_mismatch_rejected() {
        let errors = lower_errors(&format!(
            "module m {{ {HEADER} choice proto {{ default missing; case a {{ leaf x {{ type string; }} }} }} }}"
        ));
        assert!(errors
            .iter()
            .any(|e| e.message.contains("default 'missing' does not match any case")));
    }

    #[test]
    fn test_mandatory_choice_with_default_rejected() {
        let errors = lower_errors(&format!(
            "module m {{ {HEADER} choice proto {{ mandatory true; default a; case a {{ leaf x {{ type string; }} }} }} }}"
        ));
        assert!(errors.iter().any(|e| e.message.contains("mandatory")));
    }

    #[test]
    fn test_shorthand_case_wrapped() {
        let (tree, root) = lower_ok(&format!(
            "module m {{ {HEADER} choice proto {{ leaf x {{ type string; }} }} }}"
        ));
        let choice = tree.find_child(root, "proto", Some(NodeKind::Choice)).unwrap();
        let kids = tree.child_ids(choice);
        assert_eq!(kids.len(), 1);
        assert_eq!(tree[kids[0]].kind, NodeKind::Case);
        assert_eq!(tree.name(kids[0]), "x");
        let inner = tree.child_ids(kids[0]);
        assert_eq!(tree[inner[0]].kind, NodeKind::Leaf);
    }

    #[test]
    fn test_cross_case_collision_rejected() {
        let errors = lower_errors(&format!(
            "module m {{ {HEADER} choice proto {{ case a {{ leaf ethernet {{ type string; }} }} case b {{ container ethernet {{ }} }} }} }}"
        ));
        let err = errors
            .iter()
            .find(|e| matches!(e.kind, ErrorKind::Constraint))
            .expect("expected a constraint error");
        assert!(err.message.contains("ethernet"));
        assert!(err.message.contains("proto"));
    }

    #[test]
    fn test_sibling_collision_rejected() {
        let errors = lower_errors(&format!(
            "module m {{ {HEADER} leaf x {{ type string; }} container x {{ }} }}"
        ));
        assert!(errors
            .iter()
            .any(|e| e.message.contains("schema identifier 'x'")));
    }

    #[test]
    fn test_typedef_shadowing_rejected() {
        let errors = lower_errors(&format!(
            "module m {{ {HEADER} typedef t1 {{ type string; }} container c {{ typedef t1 {{ type int32; }} }} }}"
        ));
        assert!(errors
            .iter()
            .any(|e| e.message.contains("typedef 't1' is already defined")));
    }

    #[test]
    fn test_invalid_revision_date() {
        let errors = lower_errors(&format!(
            "module m {{ {HEADER} revision 2015-02-29 {{ description \"nope\"; }} }}"
        ));
        assert!(errors
            .iter()
            .any(|e| matches!(e.kind, ErrorKind::Date) && e.message.contains("2015-02-29")));
    }

    #[test]
    fn test_import_requires_prefix() {
        let errors = lower_errors(&format!("module m {{ {HEADER} import other; }}"));
        assert!(errors.iter().any(|e| e.message.contains("'prefix'")));
    }

    #[test]
    fn test_import_with_revision_date() {
        let (tree, root) = lower_ok(&format!(
            "module m {{ {HEADER} import other {{ prefix o; revision-date 2016-05-26; }} }}"
        ));
        let info = tree[root].module_info().unwrap();
        assert_eq!(info.imports.len(), 1);
        assert_eq!(info.imports[0].revision.as_deref(), Some("2016-05-26"));
    }

    #[test]
    fn test_duplicate_import_prefix_rejected() {
        let errors = lower_errors(&format!(
            "module m {{ {HEADER} import a {{ prefix p; }} import b {{ prefix p; }} }}"
        ));
        assert!(errors.iter().any(|e| e.message.contains("prefix 'p'")));
    }

    #[test]
    fn test_submodule_requires_belongs_to() {
        let errors = lower_errors("submodule s { }");
        assert!(errors.iter().any(|e| e.message.contains("'belongs-to'")));
    }

    #[test]
    fn test_submodule_with_belongs_to() {
        let (tree, root) =
            lower_ok("submodule s { belongs-to m { prefix m; } leaf x { type string; } }");
        assert_eq!(tree[root].kind, NodeKind::Submodule);
        let info = tree[root].module_info().unwrap();
        assert_eq!(info.belongs_to.as_deref(), Some("m"));
        assert_eq!(info.prefix.as_deref(), Some("m"));
    }

    #[test]
    fn test_uses_with_refine() {
        let (tree, root) = lower_ok(&format!(
            "module m {{ {HEADER} grouping g {{ leaf x {{ type string; default a; }} }} container c {{ uses g {{ refine x {{ default b; }} }} }} }}"
        ));
        let c = tree.find_child(root, "c", Some(NodeKind::Container)).unwrap();
        let uses = tree.child_ids(c)[0];
        let info = tree[uses].uses_info().unwrap();
        assert_eq!(info.refines.len(), 1);
        assert_eq!(info.refines[0].defaults, vec!["b"]);
        assert_eq!(info.status, ResolvableStatus::Unresolved);
    }

    #[test]
    fn test_refine_absolute_path_rejected() {
        let errors = lower_errors(&format!(
            "module m {{ {HEADER} grouping g {{ leaf x {{ type string; }} }} container c {{ uses g {{ refine /x {{ config false; }} }} }} }}"
        ));
        assert!(errors
            .iter()
            .any(|e| e.message.contains("descendant path")));
    }

    #[test]
    fn test_augment_with_inline_case() {
        let (tree, root) = lower_ok(&format!(
            "module m {{ {HEADER} augment /t:c/t:ch {{ case extra {{ leaf z {{ type string; }} }} }} }}"
        ));
        let augment = tree
            .child_ids(root)
            .into_iter()
            .find(|&n| tree[n].kind == NodeKind::Augment)
            .unwrap();
        let kids = tree.child_ids(augment);
        assert_eq!(tree[kids[0]].kind, NodeKind::Case);
    }

    #[test]
    fn test_rpc_with_input_output() {
        let (tree, root) = lower_ok(&format!(
            "module m {{ {HEADER} rpc reboot {{ input {{ leaf delay {{ type uint32; }} }} output {{ leaf status {{ type string; }} }} }} }}"
        ));
        let rpc = tree.find_child(root, "reboot", Some(NodeKind::Rpc)).unwrap();
        let kids = tree.child_ids(rpc);
        assert_eq!(tree[kids[0]].kind, NodeKind::Input);
        assert_eq!(tree[kids[1]].kind, NodeKind::Output);
        assert_eq!(tree.name(kids[0]), "input");
    }

    #[test]
    fn test_identity_with_base() {
        let (tree, root) = lower_ok(&format!(
            "module m {{ {HEADER} identity crypto-alg; identity aes {{ base crypto-alg; }} }}"
        ));
        let aes = tree.find_child(root, "aes", Some(NodeKind::Identity)).unwrap();
        let NodeBody::Identity(info) = &tree[aes].body else {
            panic!("expected identity body");
        };
        assert_eq!(info.bases.len(), 1);
        assert_eq!(info.bases[0].name, "crypto-alg");
    }

    #[test]
    fn test_feature_with_if_feature() {
        let (tree, root) = lower_ok(&format!(
            "module m {{ {HEADER} feature ssh; feature keys {{ if-feature ssh; }} }}"
        ));
        let keys = tree.find_child(root, "keys", Some(NodeKind::Feature)).unwrap();
        assert_eq!(tree[keys].meta.if_features.len(), 1);
    }

    #[test]
    fn test_typedef_with_restrictions() {
        let (tree, root) = lower_ok(&format!(
            "module m {{ {HEADER} typedef percent {{ type uint8 {{ range \"0..100\"; }} units percent; default 0; }} }}"
        ));
        let td = tree
            .find_child(root, "percent", Some(NodeKind::Typedef))
            .unwrap();
        let NodeBody::Typedef(info) = &tree[td].body else {
            panic!("expected typedef body");
        };
        let spec = info.type_spec.as_ref().unwrap();
        assert_eq!(spec.range.as_deref(), Some("0..100"));
        assert_eq!(info.units.as_deref(), Some("percent"));
        assert_eq!(info.default.as_deref(), Some("0"));
    }

    #[test]
    fn test_leafref_requires_path() {
        let errors = lower_errors(&format!(
            "module m {{ {HEADER} leaf r {{ type leafref; }} }}"
        ));
        assert!(errors.iter().any(|e| e.message.contains("requires 'path'")));
    }

    #[test]
    fn test_union_type() {
        let (tree, root) = lower_ok(&format!(
            "module m {{ {HEADER} leaf u {{ type union {{ type int32; type string; }} }} }}"
        ));
        let u = tree.find_child(root, "u", Some(NodeKind::Leaf)).unwrap();
        let spec = tree[u].leaf_info().unwrap().type_spec.as_ref().unwrap();
        assert_eq!(spec.union_members.len(), 2);
    }

    #[test]
    fn test_enumeration_type() {
        let (tree, root) = lower_ok(&format!(
            "module m {{ {HEADER} leaf state {{ type enumeration {{ enum up {{ value 1; }} enum down {{ value 2; }} }} }} }}"
        ));
        let leaf = tree.find_child(root, "state", Some(NodeKind::Leaf)).unwrap();
        let spec = tree[leaf].leaf_info().unwrap().type_spec.as_ref().unwrap();
        assert_eq!(spec.enums.len(), 2);
        assert_eq!(spec.enums[0].value, Some(1));
    }

    #[test]
    fn test_duplicate_enum_rejected() {
        let errors = lower_errors(&format!(
            "module m {{ {HEADER} leaf state {{ type enumeration {{ enum up; enum up; }} }} }}"
        ));
        assert!(errors.iter().any(|e| e.message.contains("duplicate enum 'up'")));
    }

    #[test]
    fn test_statement_with_no_holder() {
        // A bare attribute statement at the top level has no module holder
        let parse = Parser::new("description \"floating\";").parse();
        let result = lower(parse.root.as_ref().unwrap_or(&Statement {
            keyword: Keyword::Std(StmtKind::Description),
            keyword_span: crate::lexer::Span::SYNTHETIC,
            arg: None,
            substatements: Vec::new(),
            span: crate::lexer::Span::SYNTHETIC,
        }));
        assert!(result
            .errors
            .iter()
            .any(|e| e.message.contains("must be 'module' or 'submodule'")));
    }
}
