use std::{fmt, sync::Arc};

use itertools::Itertools;

mod error;
mod from_node;
mod nominal;
mod refs;
mod subst;

pub use error::*;
pub use nominal::*;
pub use refs::*;
pub use subst::*;

/// Shared handle to a type reference node.
///
/// Nodes are immutable once built, so a subtree can be shared freely between
/// trees. Substitution relies on this: a resolved generic parameter is the
/// caller's own binding, not a copy of it.
pub type TypeRefPtr = Arc<TypeRef>;

lazy_static! {
    static ref OPAQUE: TypeRefPtr = Arc::new(TypeRef::Opaque);
    static ref UNNAMED_FOREIGN_CLASS: TypeRefPtr =
        Arc::new(TypeRef::ForeignClass(ForeignClassTypeRef::new("")));
    static ref UNNAMED_OBJC_CLASS: TypeRefPtr =
        Arc::new(TypeRef::ObjCClass(ObjCClassTypeRef::new("")));
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeRefKind {
    Builtin,
    Nominal,
    BoundGeneric,
    Tuple,
    Function,
    Protocol,
    ProtocolComposition,
    Metatype,
    ExistentialMetatype,
    GenericTypeParameter,
    DependentMember,
    ForeignClass,
    ObjCClass,
    Opaque,
    UnownedStorage,
    WeakStorage,
    UnmanagedStorage,
}

impl fmt::Display for TypeRefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                TypeRefKind::Builtin => "builtin",
                TypeRefKind::Nominal => "nominal",
                TypeRefKind::BoundGeneric => "bound generic",
                TypeRefKind::Tuple => "tuple",
                TypeRefKind::Function => "function",
                TypeRefKind::Protocol => "protocol",
                TypeRefKind::ProtocolComposition => "protocol composition",
                TypeRefKind::Metatype => "metatype",
                TypeRefKind::ExistentialMetatype => "existential metatype",
                TypeRefKind::GenericTypeParameter => "generic type parameter",
                TypeRefKind::DependentMember => "dependent member",
                TypeRefKind::ForeignClass => "foreign class",
                TypeRefKind::ObjCClass => "objc class",
                TypeRefKind::Opaque => "opaque",
                TypeRefKind::UnownedStorage => "unowned storage",
                TypeRefKind::WeakStorage => "weak storage",
                TypeRefKind::UnmanagedStorage => "unmanaged storage",
            }
        )
    }
}

/// The shape of a type as seen by reflection.
///
/// A tree of these may still mention generic parameters (`τ_depth_index`) and
/// associated types of those parameters; [`TypeRef::is_concrete`] tells the
/// two apart and [`substitute`] turns the former into the latter.
#[derive(Debug)]
pub enum TypeRef {
    Builtin(BuiltinTypeRef),
    Nominal(NominalTypeRef),
    BoundGeneric(BoundGenericTypeRef),
    Tuple(TupleTypeRef),
    Function(FunctionTypeRef),
    Protocol(ProtocolTypeRef),
    ProtocolComposition(ProtocolCompositionTypeRef),
    Metatype(MetatypeTypeRef),
    ExistentialMetatype(ExistentialMetatypeTypeRef),
    GenericTypeParameter(GenericTypeParameterTypeRef),
    DependentMember(DependentMemberTypeRef),
    ForeignClass(ForeignClassTypeRef),
    ObjCClass(ObjCClassTypeRef),
    Opaque,
    ReferenceStorage(ReferenceStorageTypeRef),
}

impl TypeRef {
    #[inline(always)]
    pub fn builtin(mangled_name: impl Into<String>) -> TypeRefPtr {
        Arc::new(TypeRef::Builtin(BuiltinTypeRef::new(mangled_name)))
    }

    #[inline(always)]
    pub fn nominal(mangled_name: impl Into<String>, parent: Option<TypeRefPtr>) -> TypeRefPtr {
        Arc::new(TypeRef::Nominal(NominalTypeRef::new(mangled_name, parent)))
    }

    #[inline(always)]
    pub fn bound_generic(
        mangled_name: impl Into<String>,
        generic_args: Vec<TypeRefPtr>,
        parent: Option<TypeRefPtr>,
    ) -> TypeRefPtr {
        Arc::new(TypeRef::BoundGeneric(BoundGenericTypeRef::new(
            mangled_name,
            generic_args,
            parent,
        )))
    }

    #[inline(always)]
    pub fn tuple(elements: Vec<TypeRefPtr>, variadic: bool) -> TypeRefPtr {
        Arc::new(TypeRef::Tuple(TupleTypeRef::new(elements, variadic)))
    }

    /// Unit type `()`, represented as an empty tuple.
    #[inline(always)]
    pub fn unit() -> TypeRefPtr {
        TypeRef::tuple(vec![], false)
    }

    #[inline(always)]
    pub fn function(arguments: Vec<TypeRefPtr>, result: TypeRefPtr) -> TypeRefPtr {
        Arc::new(TypeRef::Function(FunctionTypeRef::new(arguments, result)))
    }

    #[inline(always)]
    pub fn protocol(module_name: impl Into<String>, name: impl Into<String>) -> TypeRefPtr {
        Arc::new(TypeRef::Protocol(ProtocolTypeRef::new(module_name, name)))
    }

    #[inline(always)]
    pub fn protocol_composition(protocols: Vec<TypeRefPtr>) -> TypeRefPtr {
        Arc::new(TypeRef::ProtocolComposition(
            ProtocolCompositionTypeRef::new(protocols),
        ))
    }

    #[inline(always)]
    pub fn metatype(instance_type: TypeRefPtr) -> TypeRefPtr {
        Arc::new(TypeRef::Metatype(MetatypeTypeRef::new(instance_type)))
    }

    #[inline(always)]
    pub fn existential_metatype(instance_type: TypeRefPtr) -> TypeRefPtr {
        Arc::new(TypeRef::ExistentialMetatype(
            ExistentialMetatypeTypeRef::new(instance_type),
        ))
    }

    #[inline(always)]
    pub fn generic_param(depth: u32, index: u32) -> TypeRefPtr {
        Arc::new(TypeRef::GenericTypeParameter(
            GenericTypeParameterTypeRef::new(depth, index),
        ))
    }

    #[inline(always)]
    pub fn dependent_member(
        member: impl Into<String>,
        base: TypeRefPtr,
        protocol: ProtocolTypeRef,
    ) -> TypeRefPtr {
        Arc::new(TypeRef::DependentMember(DependentMemberTypeRef::new(
            member, base, protocol,
        )))
    }

    #[inline(always)]
    pub fn foreign_class(name: impl Into<String>) -> TypeRefPtr {
        Arc::new(TypeRef::ForeignClass(ForeignClassTypeRef::new(name)))
    }

    pub fn unnamed_foreign_class() -> TypeRefPtr {
        Arc::clone(&UNNAMED_FOREIGN_CLASS)
    }

    #[inline(always)]
    pub fn objc_class(name: impl Into<String>) -> TypeRefPtr {
        Arc::new(TypeRef::ObjCClass(ObjCClassTypeRef::new(name)))
    }

    pub fn unnamed_objc_class() -> TypeRefPtr {
        Arc::clone(&UNNAMED_OBJC_CLASS)
    }

    /// The shared node standing in for any shape reflection cannot describe.
    pub fn opaque() -> TypeRefPtr {
        Arc::clone(&OPAQUE)
    }

    #[inline(always)]
    pub fn reference_storage(kind: ReferenceStorageKind, ty: TypeRefPtr) -> TypeRefPtr {
        Arc::new(TypeRef::ReferenceStorage(ReferenceStorageTypeRef::new(
            kind, ty,
        )))
    }

    #[inline(always)]
    pub fn unowned(ty: TypeRefPtr) -> TypeRefPtr {
        TypeRef::reference_storage(ReferenceStorageKind::Unowned, ty)
    }

    #[inline(always)]
    pub fn weak(ty: TypeRefPtr) -> TypeRefPtr {
        TypeRef::reference_storage(ReferenceStorageKind::Weak, ty)
    }

    #[inline(always)]
    pub fn unmanaged(ty: TypeRefPtr) -> TypeRefPtr {
        TypeRef::reference_storage(ReferenceStorageKind::Unmanaged, ty)
    }

    pub fn kind(&self) -> TypeRefKind {
        match self {
            TypeRef::Builtin(_) => TypeRefKind::Builtin,
            TypeRef::Nominal(_) => TypeRefKind::Nominal,
            TypeRef::BoundGeneric(_) => TypeRefKind::BoundGeneric,
            TypeRef::Tuple(_) => TypeRefKind::Tuple,
            TypeRef::Function(_) => TypeRefKind::Function,
            TypeRef::Protocol(_) => TypeRefKind::Protocol,
            TypeRef::ProtocolComposition(_) => TypeRefKind::ProtocolComposition,
            TypeRef::Metatype(_) => TypeRefKind::Metatype,
            TypeRef::ExistentialMetatype(_) => TypeRefKind::ExistentialMetatype,
            TypeRef::GenericTypeParameter(_) => TypeRefKind::GenericTypeParameter,
            TypeRef::DependentMember(_) => TypeRefKind::DependentMember,
            TypeRef::ForeignClass(_) => TypeRefKind::ForeignClass,
            TypeRef::ObjCClass(_) => TypeRefKind::ObjCClass,
            TypeRef::Opaque => TypeRefKind::Opaque,
            TypeRef::ReferenceStorage(rs) => match rs.kind() {
                ReferenceStorageKind::Unowned => TypeRefKind::UnownedStorage,
                ReferenceStorageKind::Weak => TypeRefKind::WeakStorage,
                ReferenceStorageKind::Unmanaged => TypeRefKind::UnmanagedStorage,
            },
        }
    }

    pub fn as_builtin(&self) -> Option<&BuiltinTypeRef> {
        match self {
            TypeRef::Builtin(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_nominal(&self) -> Option<&NominalTypeRef> {
        match self {
            TypeRef::Nominal(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_bound_generic(&self) -> Option<&BoundGenericTypeRef> {
        match self {
            TypeRef::BoundGeneric(bg) => Some(bg),
            _ => None,
        }
    }

    /// Narrows to either nominal flavour (plain or bound generic).
    pub fn as_nominal_trait(&self) -> Option<&dyn NominalTypeTrait> {
        match self {
            TypeRef::Nominal(n) => Some(n),
            TypeRef::BoundGeneric(bg) => Some(bg),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&TupleTypeRef> {
        match self {
            TypeRef::Tuple(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionTypeRef> {
        match self {
            TypeRef::Function(func) => Some(func),
            _ => None,
        }
    }

    pub fn as_protocol(&self) -> Option<&ProtocolTypeRef> {
        match self {
            TypeRef::Protocol(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_protocol_composition(&self) -> Option<&ProtocolCompositionTypeRef> {
        match self {
            TypeRef::ProtocolComposition(pc) => Some(pc),
            _ => None,
        }
    }

    pub fn as_metatype(&self) -> Option<&MetatypeTypeRef> {
        match self {
            TypeRef::Metatype(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_existential_metatype(&self) -> Option<&ExistentialMetatypeTypeRef> {
        match self {
            TypeRef::ExistentialMetatype(em) => Some(em),
            _ => None,
        }
    }

    pub fn as_generic_param(&self) -> Option<&GenericTypeParameterTypeRef> {
        match self {
            TypeRef::GenericTypeParameter(gp) => Some(gp),
            _ => None,
        }
    }

    pub fn as_dependent_member(&self) -> Option<&DependentMemberTypeRef> {
        match self {
            TypeRef::DependentMember(dm) => Some(dm),
            _ => None,
        }
    }

    pub fn as_foreign_class(&self) -> Option<&ForeignClassTypeRef> {
        match self {
            TypeRef::ForeignClass(fc) => Some(fc),
            _ => None,
        }
    }

    pub fn as_objc_class(&self) -> Option<&ObjCClassTypeRef> {
        match self {
            TypeRef::ObjCClass(oc) => Some(oc),
            _ => None,
        }
    }

    pub fn as_reference_storage(&self) -> Option<&ReferenceStorageTypeRef> {
        match self {
            TypeRef::ReferenceStorage(rs) => Some(rs),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn is_opaque(&self) -> bool {
        matches!(self, TypeRef::Opaque)
    }

    #[inline(always)]
    pub fn is_nominal(&self) -> bool {
        self.as_nominal_trait().is_some()
    }

    /// Lexical generic nesting depth of a nominal type, `None` for any other
    /// kind.
    pub fn depth(&self) -> Option<u32> {
        self.as_nominal_trait().map(|n| n.depth())
    }

    /// Returns true if no generic parameter or unresolved dependent member is
    /// reachable from this node.
    pub fn is_concrete(&self) -> bool {
        match self {
            TypeRef::Builtin(_)
            | TypeRef::Protocol(_)
            | TypeRef::ForeignClass(_)
            | TypeRef::ObjCClass(_)
            | TypeRef::Opaque => true,
            TypeRef::Nominal(n) => n.parent().map_or(true, |p| p.is_concrete()),
            TypeRef::BoundGeneric(bg) => {
                bg.parent().map_or(true, |p| p.is_concrete())
                    && bg.generic_args().iter().all(|arg| arg.is_concrete())
            }
            TypeRef::Tuple(t) => t.elements().iter().all(|el| el.is_concrete()),
            TypeRef::Function(func) => {
                func.arguments().iter().all(|arg| arg.is_concrete()) && func.result().is_concrete()
            }
            TypeRef::ProtocolComposition(pc) => pc.protocols().iter().all(|p| p.is_concrete()),
            TypeRef::Metatype(m) => m.instance_type().is_concrete(),
            TypeRef::ExistentialMetatype(em) => em.instance_type().is_concrete(),
            TypeRef::ReferenceStorage(rs) => rs.ty().is_concrete(),
            TypeRef::GenericTypeParameter(_) | TypeRef::DependentMember(_) => false,
        }
    }

    /// Compares two trees by shape and payload.
    ///
    /// `TypeRef` has no `PartialEq`; two independently built trees are
    /// distinct nodes.
    pub fn structurally_eq(&self, other: &TypeRef) -> bool {
        fn all_eq(a: &[TypeRefPtr], b: &[TypeRefPtr]) -> bool {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| a.structurally_eq(b))
        }

        fn parents_eq(a: Option<&TypeRefPtr>, b: Option<&TypeRefPtr>) -> bool {
            match (a, b) {
                (Some(a), Some(b)) => a.structurally_eq(b),
                (None, None) => true,
                _ => false,
            }
        }

        match (self, other) {
            (TypeRef::Builtin(a), TypeRef::Builtin(b)) => a.mangled_name() == b.mangled_name(),
            (TypeRef::Nominal(a), TypeRef::Nominal(b)) => {
                a.mangled_name() == b.mangled_name() && parents_eq(a.parent(), b.parent())
            }
            (TypeRef::BoundGeneric(a), TypeRef::BoundGeneric(b)) => {
                a.mangled_name() == b.mangled_name()
                    && parents_eq(a.parent(), b.parent())
                    && all_eq(a.generic_args(), b.generic_args())
            }
            (TypeRef::Tuple(a), TypeRef::Tuple(b)) => {
                a.is_variadic() == b.is_variadic() && all_eq(a.elements(), b.elements())
            }
            (TypeRef::Function(a), TypeRef::Function(b)) => {
                all_eq(a.arguments(), b.arguments()) && a.result().structurally_eq(b.result())
            }
            (TypeRef::Protocol(a), TypeRef::Protocol(b)) => a == b,
            (TypeRef::ProtocolComposition(a), TypeRef::ProtocolComposition(b)) => {
                all_eq(a.protocols(), b.protocols())
            }
            (TypeRef::Metatype(a), TypeRef::Metatype(b)) => {
                a.instance_type().structurally_eq(b.instance_type())
            }
            (TypeRef::ExistentialMetatype(a), TypeRef::ExistentialMetatype(b)) => {
                a.instance_type().structurally_eq(b.instance_type())
            }
            (TypeRef::GenericTypeParameter(a), TypeRef::GenericTypeParameter(b)) => a == b,
            (TypeRef::DependentMember(a), TypeRef::DependentMember(b)) => {
                a.member() == b.member()
                    && a.protocol() == b.protocol()
                    && a.base().structurally_eq(b.base())
            }
            (TypeRef::ForeignClass(a), TypeRef::ForeignClass(b)) => a.name() == b.name(),
            (TypeRef::ObjCClass(a), TypeRef::ObjCClass(b)) => a.name() == b.name(),
            (TypeRef::Opaque, TypeRef::Opaque) => true,
            (TypeRef::ReferenceStorage(a), TypeRef::ReferenceStorage(b)) => {
                a.kind() == b.kind() && a.ty().structurally_eq(b.ty())
            }
            _ => false,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Builtin(b) => write!(f, "{}", b.mangled_name()),
            TypeRef::Nominal(n) => write!(f, "{}", n.mangled_name()),
            TypeRef::BoundGeneric(bg) => write!(
                f,
                "{}<{}>",
                bg.mangled_name(),
                bg.generic_args().iter().join(", ")
            ),
            TypeRef::Tuple(t) => {
                let elements = t.elements().iter().join(", ");
                if t.is_variadic() {
                    write!(f, "({}...)", elements)
                } else {
                    write!(f, "({})", elements)
                }
            }
            TypeRef::Function(func) => write!(
                f,
                "({}) -> {}",
                func.arguments().iter().join(", "),
                func.result()
            ),
            TypeRef::Protocol(p) => write!(f, "{}", p),
            TypeRef::ProtocolComposition(pc) => {
                if pc.protocols().is_empty() {
                    write!(f, "Any")
                } else {
                    write!(f, "{}", pc.protocols().iter().join(" & "))
                }
            }
            TypeRef::Metatype(m) => write!(f, "{}.Type", m.instance_type()),
            TypeRef::ExistentialMetatype(em) => write!(f, "any {}.Type", em.instance_type()),
            TypeRef::GenericTypeParameter(gp) => write!(f, "{}", gp),
            TypeRef::DependentMember(dm) => {
                write!(f, "{}.{}", dm.base(), dm.member())
            }
            TypeRef::ForeignClass(fc) => write!(f, "{}", fc.display_name()),
            TypeRef::ObjCClass(oc) => write!(f, "{}", oc.display_name()),
            TypeRef::Opaque => write!(f, "<opaque>"),
            TypeRef::ReferenceStorage(rs) => write!(f, "{} {}", rs.kind(), rs.ty()),
        }
    }
}
