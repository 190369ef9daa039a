//! Holder rules: which parent kinds each statement may attach to.
//!
//! The tables are data; the walker consults them on statement entry and
//! raises `INVALID_HOLDER` on violation. A statement entered with an empty
//! stack (other than `module`/`submodule`) raises `MISSING_HOLDER`.

use crate::parser::StmtKind;
use crate::schema::NodeKind;

/// Parent kinds that may hold general data-definition statements
/// (`container`, `leaf`, `leaf-list`, `list`, `choice`, `anyxml`,
/// `anydata`, `uses`).
const DATA_DEF_HOLDERS: &[NodeKind] = &[
    NodeKind::Module,
    NodeKind::Submodule,
    NodeKind::Container,
    NodeKind::List,
    NodeKind::Case,
    NodeKind::Choice, // shorthand case, wrapped by the listener
    NodeKind::Grouping,
    NodeKind::Input,
    NodeKind::Output,
    NodeKind::Notification,
    NodeKind::Augment,
];

/// Parent kinds that may hold `typedef` and `grouping` statements.
const DEFINITION_HOLDERS: &[NodeKind] = &[
    NodeKind::Module,
    NodeKind::Submodule,
    NodeKind::Container,
    NodeKind::List,
    NodeKind::Case,
    NodeKind::Grouping,
    NodeKind::Rpc,
    NodeKind::Action,
    NodeKind::Input,
    NodeKind::Output,
    NodeKind::Notification,
];

/// Legal holder kinds for a node-creating statement, or `None` when the
/// statement does not create a schema node.
#[must_use]
pub fn node_holders(kind: StmtKind) -> Option<&'static [NodeKind]> {
    let holders: &'static [NodeKind] = match kind {
        StmtKind::Container
        | StmtKind::Leaf
        | StmtKind::LeafList
        | StmtKind::List
        | StmtKind::Choice
        | StmtKind::Anyxml
        | StmtKind::Anydata
        | StmtKind::Uses => DATA_DEF_HOLDERS,
        StmtKind::Case => &[NodeKind::Choice, NodeKind::Augment],
        StmtKind::Grouping | StmtKind::Typedef => DEFINITION_HOLDERS,
        StmtKind::Augment => &[NodeKind::Module, NodeKind::Submodule, NodeKind::Uses],
        StmtKind::Rpc => &[NodeKind::Module, NodeKind::Submodule],
        StmtKind::Action => &[
            NodeKind::Container,
            NodeKind::List,
            NodeKind::Grouping,
            NodeKind::Augment,
        ],
        StmtKind::Input | StmtKind::Output => &[NodeKind::Rpc, NodeKind::Action],
        StmtKind::Notification => &[
            NodeKind::Module,
            NodeKind::Submodule,
            NodeKind::Container,
            NodeKind::List,
            NodeKind::Augment,
        ],
        StmtKind::Identity | StmtKind::Feature => &[NodeKind::Module, NodeKind::Submodule],
        _ => return None,
    };
    Some(holders)
}

/// Legal holder kinds for a one-shot attribute statement, or `None` when
/// the statement is not handled by the generic attribute dispatch.
#[must_use]
pub fn attribute_holders(kind: StmtKind) -> Option<&'static [NodeKind]> {
    const MODULES: &[NodeKind] = &[NodeKind::Module, NodeKind::Submodule];
    const ANY: &[NodeKind] = &[];

    let holders: &'static [NodeKind] = match kind {
        StmtKind::YangVersion
        | StmtKind::Organization
        | StmtKind::Contact
        | StmtKind::Import
        | StmtKind::Include
        | StmtKind::Revision => MODULES,
        StmtKind::Namespace | StmtKind::Prefix => &[NodeKind::Module],
        StmtKind::BelongsTo => &[NodeKind::Submodule],
        // Common metadata may sit on any node
        StmtKind::Description
        | StmtKind::Reference
        | StmtKind::Status
        | StmtKind::IfFeature => ANY,
        StmtKind::When => &[
            NodeKind::Container,
            NodeKind::List,
            NodeKind::Leaf,
            NodeKind::LeafList,
            NodeKind::Choice,
            NodeKind::Case,
            NodeKind::Uses,
            NodeKind::Augment,
            NodeKind::Anyxml,
            NodeKind::Anydata,
        ],
        StmtKind::Must => &[
            NodeKind::Container,
            NodeKind::List,
            NodeKind::Leaf,
            NodeKind::LeafList,
            NodeKind::Anyxml,
            NodeKind::Anydata,
            NodeKind::Input,
            NodeKind::Output,
            NodeKind::Notification,
        ],
        StmtKind::Config => &[
            NodeKind::Container,
            NodeKind::List,
            NodeKind::Leaf,
            NodeKind::LeafList,
            NodeKind::Choice,
            NodeKind::Anyxml,
            NodeKind::Anydata,
        ],
        StmtKind::Mandatory => &[
            NodeKind::Leaf,
            NodeKind::Choice,
            NodeKind::Anyxml,
            NodeKind::Anydata,
        ],
        StmtKind::Presence => &[NodeKind::Container],
        StmtKind::Default => &[NodeKind::Leaf, NodeKind::LeafList, NodeKind::Choice, NodeKind::Typedef],
        StmtKind::Units => &[NodeKind::Leaf, NodeKind::LeafList, NodeKind::Typedef],
        StmtKind::Key | StmtKind::Unique => &[NodeKind::List],
        StmtKind::MinElements | StmtKind::MaxElements => &[NodeKind::List, NodeKind::LeafList],
        StmtKind::OrderedBy => &[NodeKind::List, NodeKind::LeafList],
        StmtKind::Type => &[NodeKind::Leaf, NodeKind::LeafList, NodeKind::Typedef],
        StmtKind::Base => &[NodeKind::Identity],
        StmtKind::Refine => &[NodeKind::Uses],
        _ => return None,
    };
    Some(holders)
}

/// Check a holder kind against a legal-holder table. The empty table means
/// "any holder".
#[must_use]
pub fn is_legal_holder(holders: &[NodeKind], holder: NodeKind) -> bool {
    holders.is_empty() || holders.contains(&holder)
}
