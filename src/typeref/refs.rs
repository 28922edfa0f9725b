use std::fmt;

use serde::{Deserialize, Serialize};

use super::TypeRefPtr;

#[derive(Clone, Debug)]
pub struct BuiltinTypeRef {
    mangled_name: String,
}

impl BuiltinTypeRef {
    pub fn new(mangled_name: impl Into<String>) -> Self {
        BuiltinTypeRef {
            mangled_name: mangled_name.into(),
        }
    }

    pub fn mangled_name(&self) -> &str {
        &self.mangled_name
    }
}

#[derive(Clone, Debug)]
pub struct TupleTypeRef {
    elements: Vec<TypeRefPtr>,
    variadic: bool,
}

impl TupleTypeRef {
    pub fn new(elements: Vec<TypeRefPtr>, variadic: bool) -> Self {
        TupleTypeRef { elements, variadic }
    }

    pub fn elements(&self) -> &[TypeRefPtr] {
        &self.elements
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }
}

#[derive(Clone, Debug)]
pub struct FunctionTypeRef {
    arguments: Vec<TypeRefPtr>,
    result: TypeRefPtr,
}

impl FunctionTypeRef {
    pub fn new(arguments: Vec<TypeRefPtr>, result: TypeRefPtr) -> Self {
        FunctionTypeRef { arguments, result }
    }

    pub fn arguments(&self) -> &[TypeRefPtr] {
        &self.arguments
    }

    pub fn result(&self) -> &TypeRefPtr {
        &self.result
    }
}

/// A protocol, identified by the module that declares it and its name.
/// Two protocol references are equal when both parts match.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProtocolTypeRef {
    #[serde(rename = "module")]
    module_name: String,
    name: String,
}

impl ProtocolTypeRef {
    pub fn new(module_name: impl Into<String>, name: impl Into<String>) -> Self {
        ProtocolTypeRef {
            module_name: module_name.into(),
            name: name.into(),
        }
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ProtocolTypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module_name, self.name)
    }
}

#[derive(Clone, Debug)]
pub struct ProtocolCompositionTypeRef {
    protocols: Vec<TypeRefPtr>,
}

impl ProtocolCompositionTypeRef {
    pub fn new(protocols: Vec<TypeRefPtr>) -> Self {
        ProtocolCompositionTypeRef { protocols }
    }

    pub fn protocols(&self) -> &[TypeRefPtr] {
        &self.protocols
    }
}

#[derive(Clone, Debug)]
pub struct MetatypeTypeRef {
    instance_type: TypeRefPtr,
}

impl MetatypeTypeRef {
    pub fn new(instance_type: TypeRefPtr) -> Self {
        MetatypeTypeRef { instance_type }
    }

    pub fn instance_type(&self) -> &TypeRefPtr {
        &self.instance_type
    }
}

/// Metatype of an existential. The instance type is expected to be concrete;
/// substitution checks this rather than descending into it.
#[derive(Clone, Debug)]
pub struct ExistentialMetatypeTypeRef {
    instance_type: TypeRefPtr,
}

impl ExistentialMetatypeTypeRef {
    pub fn new(instance_type: TypeRefPtr) -> Self {
        ExistentialMetatypeTypeRef { instance_type }
    }

    pub fn instance_type(&self) -> &TypeRefPtr {
        &self.instance_type
    }
}

/// A generic parameter placeholder at `(depth, index)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GenericTypeParameterTypeRef {
    depth: u32,
    index: u32,
}

impl GenericTypeParameterTypeRef {
    pub fn new(depth: u32, index: u32) -> Self {
        GenericTypeParameterTypeRef { depth, index }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn depth_and_index(&self) -> (u32, u32) {
        (self.depth, self.index)
    }
}

impl fmt::Display for GenericTypeParameterTypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "τ_{}_{}", self.depth, self.index)
    }
}

/// The associated type `member` of `protocol`, as implemented by `base`.
#[derive(Clone, Debug)]
pub struct DependentMemberTypeRef {
    member: String,
    base: TypeRefPtr,
    protocol: ProtocolTypeRef,
}

impl DependentMemberTypeRef {
    pub fn new(member: impl Into<String>, base: TypeRefPtr, protocol: ProtocolTypeRef) -> Self {
        DependentMemberTypeRef {
            member: member.into(),
            base,
            protocol,
        }
    }

    pub fn member(&self) -> &str {
        &self.member
    }

    pub fn base(&self) -> &TypeRefPtr {
        &self.base
    }

    pub fn protocol(&self) -> &ProtocolTypeRef {
        &self.protocol
    }
}

#[derive(Clone, Debug)]
pub struct ForeignClassTypeRef {
    name: String,
}

impl ForeignClassTypeRef {
    pub fn new(name: impl Into<String>) -> Self {
        ForeignClassTypeRef { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_unnamed(&self) -> bool {
        self.name.is_empty()
    }

    pub(super) fn display_name(&self) -> &str {
        if self.is_unnamed() {
            "<unnamed foreign class>"
        } else {
            &self.name
        }
    }
}

#[derive(Clone, Debug)]
pub struct ObjCClassTypeRef {
    name: String,
}

impl ObjCClassTypeRef {
    pub fn new(name: impl Into<String>) -> Self {
        ObjCClassTypeRef { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_unnamed(&self) -> bool {
        self.name.is_empty()
    }

    pub(super) fn display_name(&self) -> &str {
        if self.is_unnamed() {
            "<unnamed objc class>"
        } else {
            &self.name
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ReferenceStorageKind {
    Unowned,
    Weak,
    Unmanaged,
}

impl fmt::Display for ReferenceStorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ReferenceStorageKind::Unowned => "unowned",
                ReferenceStorageKind::Weak => "weak",
                ReferenceStorageKind::Unmanaged => "unowned(unsafe)",
            }
        )
    }
}

/// A reference-storage qualifier (`weak`, `unowned`, `unowned(unsafe)`)
/// wrapped around a type.
#[derive(Clone, Debug)]
pub struct ReferenceStorageTypeRef {
    kind: ReferenceStorageKind,
    ty: TypeRefPtr,
}

impl ReferenceStorageTypeRef {
    pub fn new(kind: ReferenceStorageKind, ty: TypeRefPtr) -> Self {
        ReferenceStorageTypeRef { kind, ty }
    }

    pub fn kind(&self) -> ReferenceStorageKind {
        self.kind
    }

    pub fn ty(&self) -> &TypeRefPtr {
        &self.ty
    }
}
