//! The demangler's output as this crate consumes it: a tagged tree of nodes
//! with optional text and index payloads.
//!
//! Producing these trees from mangled symbols is the demangler's job; here
//! they are only built programmatically or loaded from JSON.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Global,
    TypeMangling,
    Type,
    Module,
    Identifier,
    Index,
    Class,
    Enum,
    Structure,
    BoundGenericClass,
    BoundGenericEnum,
    BoundGenericStructure,
    TypeList,
    BuiltinTypeName,
    NonVariadicTuple,
    VariadicTuple,
    TupleElement,
    TupleElementName,
    FunctionType,
    ArgumentTuple,
    ReturnType,
    Protocol,
    ProtocolList,
    Metatype,
    ExistentialMetatype,
    DependentGenericParamType,
    DependentMemberType,
    DependentAssociatedTypeRef,
    Unowned,
    Weak,
    Unmanaged,
    #[serde(other)]
    Unknown,
}

impl NodeKind {
    pub fn is_nominal(self) -> bool {
        matches!(self, NodeKind::Class | NodeKind::Enum | NodeKind::Structure)
    }

    pub fn is_bound_generic(self) -> bool {
        matches!(
            self,
            NodeKind::BoundGenericClass | NodeKind::BoundGenericEnum | NodeKind::BoundGenericStructure
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Node {
        Node {
            kind,
            children: vec![],
            text: None,
            index: None,
        }
    }

    pub fn with_text(kind: NodeKind, text: impl Into<String>) -> Node {
        Node {
            text: Some(text.into()),
            ..Node::new(kind)
        }
    }

    pub fn with_index(kind: NodeKind, index: u64) -> Node {
        Node {
            index: Some(index),
            ..Node::new(kind)
        }
    }

    pub fn with_children(kind: NodeKind, children: Vec<Node>) -> Node {
        Node {
            children,
            ..Node::new(kind)
        }
    }

    #[inline(always)]
    pub fn module(name: impl Into<String>) -> Node {
        Node::with_text(NodeKind::Module, name)
    }

    #[inline(always)]
    pub fn identifier(name: impl Into<String>) -> Node {
        Node::with_text(NodeKind::Identifier, name)
    }

    /// Wraps `inner` in a `Type` node, the way the demangler does around
    /// every type in argument position.
    #[inline(always)]
    pub fn ty(inner: Node) -> Node {
        Node::with_children(NodeKind::Type, vec![inner])
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.children.first()
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.children.last()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn index(&self) -> Option<u64> {
        self.index
    }
}
