use std::convert::TryFrom;

use crate::demangle::{Node, NodeKind};

use super::{NominalBuilder, NominalTypeTrait, ReferenceStorageKind, TypeRef, TypeRefPtr};

/// Module of classes imported from Objective-C.
const OBJC_MODULE: &str = "__ObjC";

/// Module of classes imported from C (CoreFoundation types and friends).
const FOREIGN_MODULE: &str = "__C";

impl TypeRef {
    /// Translates a demangle tree into a type reference.
    ///
    /// Never fails: any node this translator does not understand, or one with
    /// an unexpected shape, becomes the `Opaque` node in place. Siblings of an
    /// unreadable node are still translated.
    pub fn from_demangle_node(node: &Node) -> TypeRefPtr {
        match translate(node) {
            Some(ty) => ty,
            None => {
                log::debug!("[demangle] {:?} node has no type reference", node.kind);
                TypeRef::opaque()
            }
        }
    }
}

fn translate(node: &Node) -> Option<TypeRefPtr> {
    match node.kind {
        NodeKind::Global
        | NodeKind::TypeMangling
        | NodeKind::Type
        | NodeKind::ArgumentTuple
        | NodeKind::ReturnType => node.first_child().map(TypeRef::from_demangle_node),
        NodeKind::TupleElement => node.last_child().map(TypeRef::from_demangle_node),
        NodeKind::BuiltinTypeName => node.text().map(|name| TypeRef::builtin(name)),
        NodeKind::Class | NodeKind::Enum | NodeKind::Structure => translate_nominal(node),
        NodeKind::BoundGenericClass
        | NodeKind::BoundGenericEnum
        | NodeKind::BoundGenericStructure => translate_bound_generic(node),
        NodeKind::NonVariadicTuple => Some(translate_tuple(node, false)),
        NodeKind::VariadicTuple => Some(translate_tuple(node, true)),
        NodeKind::FunctionType => translate_function(node),
        NodeKind::Protocol => {
            let module = unless!(node.child(0).and_then(Node::text));
            let name = unless!(node.child(1).and_then(Node::text));
            Some(TypeRef::protocol(module, name))
        }
        NodeKind::ProtocolList => translate_protocol_list(node),
        NodeKind::Metatype => node
            .last_child()
            .map(|instance| TypeRef::metatype(TypeRef::from_demangle_node(instance))),
        NodeKind::ExistentialMetatype => node
            .last_child()
            .map(|instance| TypeRef::existential_metatype(TypeRef::from_demangle_node(instance))),
        NodeKind::DependentGenericParamType => {
            let depth = unless!(node.child(0).and_then(Node::index));
            let index = unless!(node.child(1).and_then(Node::index));
            let depth = unless!(u32::try_from(depth).ok());
            let index = unless!(u32::try_from(index).ok());
            Some(TypeRef::generic_param(depth, index))
        }
        NodeKind::DependentMemberType => translate_dependent_member(node),
        NodeKind::Unowned => translate_storage(node, ReferenceStorageKind::Unowned),
        NodeKind::Weak => translate_storage(node, ReferenceStorageKind::Weak),
        NodeKind::Unmanaged => translate_storage(node, ReferenceStorageKind::Unmanaged),
        _ => None,
    }
}

fn translate_nominal(node: &Node) -> Option<TypeRefPtr> {
    let context = unless!(node.child(0));
    let identifier = unless!(node.child(1).and_then(Node::text));

    if context.kind == NodeKind::Module {
        let module = unless!(context.text());
        if node.kind == NodeKind::Class {
            match module {
                OBJC_MODULE if identifier.is_empty() => return Some(TypeRef::unnamed_objc_class()),
                OBJC_MODULE => return Some(TypeRef::objc_class(identifier)),
                FOREIGN_MODULE if identifier.is_empty() => {
                    return Some(TypeRef::unnamed_foreign_class())
                }
                FOREIGN_MODULE => return Some(TypeRef::foreign_class(identifier)),
                _ => {}
            }
        }

        let name = match node.text() {
            Some(text) => text.to_string(),
            None => format!("{}.{}", module, identifier),
        };
        return Some(NominalBuilder::new(name).build());
    }

    if !(context.kind.is_nominal() || context.kind.is_bound_generic()) {
        return None;
    }

    // an imported class translates to its own kind and cannot be a parent
    let parent = unless!(translate(context));
    let context_name = unless!(parent.as_nominal_trait()).mangled_name();
    let name = match node.text() {
        Some(text) => text.to_string(),
        None => format!("{}.{}", context_name, identifier),
    };
    Some(NominalBuilder::new(name).parent(parent).build())
}

fn translate_bound_generic(node: &Node) -> Option<TypeRefPtr> {
    let nominal = unless!(node.child(0));
    let args = unless!(node.child(1));
    if args.kind != NodeKind::TypeList {
        return None;
    }

    let nominal = unless!(translate(nominal));
    let nominal = unless!(nominal.as_nominal());
    let generic_args = args
        .children
        .iter()
        .map(TypeRef::from_demangle_node)
        .collect();
    Some(
        NominalBuilder::new(nominal.mangled_name())
            .parent(nominal.parent().cloned())
            .generic_args(generic_args)
            .build(),
    )
}

fn translate_tuple(node: &Node, variadic: bool) -> TypeRefPtr {
    let elements: Vec<_> = node
        .children
        .iter()
        .map(TypeRef::from_demangle_node)
        .collect();
    if elements.is_empty() && !variadic {
        return TypeRef::unit();
    }
    TypeRef::tuple(elements, variadic)
}

fn translate_function(node: &Node) -> Option<TypeRefPtr> {
    let arguments = unless!(node
        .children
        .iter()
        .find(|child| child.kind == NodeKind::ArgumentTuple));
    let result = unless!(node
        .children
        .iter()
        .find(|child| child.kind == NodeKind::ReturnType));

    let arguments = TypeRef::from_demangle_node(arguments);
    let arguments = match arguments.as_tuple() {
        Some(tuple) if !tuple.is_variadic() => tuple.elements().to_vec(),
        _ => vec![arguments.clone()],
    };
    Some(TypeRef::function(
        arguments,
        TypeRef::from_demangle_node(result),
    ))
}

fn translate_protocol_list(node: &Node) -> Option<TypeRefPtr> {
    let list = unless!(node.first_child());
    if list.kind != NodeKind::TypeList {
        return None;
    }

    let mut protocols = list
        .children
        .iter()
        .map(TypeRef::from_demangle_node)
        .collect::<Vec<_>>();
    if protocols.len() == 1 && protocols[0].as_protocol().is_some() {
        return protocols.pop();
    }
    Some(TypeRef::protocol_composition(protocols))
}

fn translate_dependent_member(node: &Node) -> Option<TypeRefPtr> {
    let base = unless!(node.child(0));
    let assoc = unless!(node.child(1));
    if assoc.kind != NodeKind::DependentAssociatedTypeRef {
        return None;
    }

    let member = unless!(assoc.child(0).and_then(Node::text));
    let protocol = TypeRef::from_demangle_node(unless!(assoc.child(1)));
    let protocol = unless!(protocol.as_protocol()).clone();
    Some(TypeRef::dependent_member(
        member,
        TypeRef::from_demangle_node(base),
        protocol,
    ))
}

fn translate_storage(node: &Node, kind: ReferenceStorageKind) -> Option<TypeRefPtr> {
    node.first_child()
        .map(|ty| TypeRef::reference_storage(kind, TypeRef::from_demangle_node(ty)))
}
