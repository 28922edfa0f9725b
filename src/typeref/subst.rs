use std::{
    fmt,
    iter::FromIterator,
    ops::{Deref, DerefMut},
    sync::Arc,
};

use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};

use crate::reflection::WitnessResolver;

use super::{
    DependentMemberTypeRef, GenericTypeParameterTypeRef, NominalBuilder, NominalTypeTrait,
    SubstError, TypeRef, TypeRefPtr,
};

pub type DepthAndIndex = (u32, u32);

pub const DEFAULT_MAX_SUBST_DEPTH: usize = 256;

/// Bindings from generic parameter coordinates to concrete type references.
#[derive(Clone, Default)]
pub struct GenericArgumentMap(FnvHashMap<DepthAndIndex, TypeRefPtr>);

impl Deref for GenericArgumentMap {
    type Target = FnvHashMap<DepthAndIndex, TypeRefPtr>;

    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for GenericArgumentMap {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl IntoIterator for GenericArgumentMap {
    type Item = (DepthAndIndex, TypeRefPtr);

    type IntoIter = std::collections::hash_map::IntoIter<DepthAndIndex, TypeRefPtr>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<(DepthAndIndex, TypeRefPtr)> for GenericArgumentMap {
    fn from_iter<T: IntoIterator<Item = (DepthAndIndex, TypeRefPtr)>>(iter: T) -> Self {
        GenericArgumentMap(iter.into_iter().collect())
    }
}

impl fmt::Debug for GenericArgumentMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.sorted()
                    .into_iter()
                    .map(|((depth, index), ty)| (format!("τ_{}_{}", depth, index), ty.to_string())),
            )
            .finish()
    }
}

impl fmt::Display for GenericArgumentMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl GenericArgumentMap {
    pub fn new() -> GenericArgumentMap {
        GenericArgumentMap(FnvHashMap::default())
    }

    pub fn bind(mut self, depth: u32, index: u32, ty: TypeRefPtr) -> Self {
        self.insert((depth, index), ty);
        self
    }

    /// Entries ordered by coordinate.
    pub fn sorted(&self) -> Vec<(DepthAndIndex, &TypeRefPtr)> {
        let mut entries = self.0.iter().map(|(k, v)| (*k, v)).collect::<Vec<_>>();
        entries.sort_by_key(|(k, _)| *k);
        entries
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubstOptions {
    /// Maximum nesting of the traversal, counted across the nested passes
    /// that resolve dependent-member witnesses.
    pub max_depth: usize,
}

impl Default for SubstOptions {
    fn default() -> Self {
        SubstOptions {
            max_depth: DEFAULT_MAX_SUBST_DEPTH,
        }
    }
}

/// Replaces generic parameters in `root` with their `bindings`, resolving
/// dependent members through `resolver`.
///
/// The result is concrete. A result that is not is a bug in the bindings or
/// the tree and panics.
pub fn substitute<R>(
    root: &TypeRefPtr,
    bindings: &GenericArgumentMap,
    resolver: &R,
) -> Result<TypeRefPtr, SubstError>
where
    R: WitnessResolver + ?Sized,
{
    substitute_with_options(root, bindings, resolver, &SubstOptions::default())
}

/// Like [`substitute`], with an explicit nesting limit.
///
/// `max_depth` bounds how deep the traversal of `root` and of resolved
/// witnesses goes. Bindings are spliced in whole and are not walked, so a
/// result may be nested deeper than the limit.
pub fn substitute_with_options<R>(
    root: &TypeRefPtr,
    bindings: &GenericArgumentMap,
    resolver: &R,
    options: &SubstOptions,
) -> Result<TypeRefPtr, SubstError>
where
    R: WitnessResolver + ?Sized,
{
    log::debug!("substituting `{}` with {}", root, bindings);
    let result = TypeRefSubstitution::new(resolver, bindings, options).visit(root)?;
    assert!(
        result.is_concrete(),
        "substitution of `{}` produced non-concrete type `{}`",
        root,
        result
    );
    Ok(result)
}

pub trait SubstTypeRef {
    fn subst<R>(&self, resolver: &R, bindings: &GenericArgumentMap) -> Result<TypeRefPtr, SubstError>
    where
        R: WitnessResolver + ?Sized;
}

impl SubstTypeRef for TypeRefPtr {
    fn subst<R>(&self, resolver: &R, bindings: &GenericArgumentMap) -> Result<TypeRefPtr, SubstError>
    where
        R: WitnessResolver + ?Sized,
    {
        substitute(self, bindings, resolver)
    }
}

/// A single substitution pass over one tree with one set of bindings.
///
/// Dependent members spawn a nested pass with the bindings of the resolved
/// base type; the nested pass inherits the current nesting depth so the limit
/// in [`SubstOptions`] covers the whole reduction.
pub struct TypeRefSubstitution<'a, R: ?Sized> {
    resolver: &'a R,
    substitutions: &'a GenericArgumentMap,
    options: &'a SubstOptions,
    depth: usize,
}

impl<'a, R> TypeRefSubstitution<'a, R>
where
    R: WitnessResolver + ?Sized,
{
    pub fn new(
        resolver: &'a R,
        substitutions: &'a GenericArgumentMap,
        options: &'a SubstOptions,
    ) -> Self {
        TypeRefSubstitution {
            resolver,
            substitutions,
            options,
            depth: 0,
        }
    }

    pub fn visit(&mut self, ty: &TypeRefPtr) -> Result<TypeRefPtr, SubstError> {
        if self.depth >= self.options.max_depth {
            return Err(SubstError::recursion_limit(self.options.max_depth, ty.clone()));
        }

        self.depth += 1;
        let result = self.visit_kind(ty);
        self.depth -= 1;
        result
    }

    fn visit_all(&mut self, tys: &[TypeRefPtr]) -> Result<Vec<TypeRefPtr>, SubstError> {
        tys.iter().map(|ty| self.visit(ty)).collect()
    }

    fn visit_kind(&mut self, ty: &TypeRefPtr) -> Result<TypeRefPtr, SubstError> {
        log::trace!("[subst] visiting {} `{}`", ty.kind(), ty);
        Ok(match &**ty {
            TypeRef::Builtin(_)
            | TypeRef::Nominal(_)
            | TypeRef::Protocol(_)
            | TypeRef::ProtocolComposition(_)
            | TypeRef::ForeignClass(_)
            | TypeRef::ObjCClass(_)
            | TypeRef::Opaque => Arc::clone(ty),
            TypeRef::BoundGeneric(bg) => {
                let generic_args = self.visit_all(bg.generic_args())?;
                let parent = match bg.parent() {
                    Some(parent) => Some(self.visit(parent)?),
                    None => None,
                };
                NominalBuilder::new(bg.mangled_name())
                    .parent(parent)
                    .generic_args(generic_args)
                    .build()
            }
            TypeRef::Tuple(t) => TypeRef::tuple(self.visit_all(t.elements())?, t.is_variadic()),
            TypeRef::Function(func) => {
                let arguments = self.visit_all(func.arguments())?;
                let result = self.visit(func.result())?;
                TypeRef::function(arguments, result)
            }
            TypeRef::Metatype(m) => TypeRef::metatype(self.visit(m.instance_type())?),
            TypeRef::ExistentialMetatype(em) => {
                assert!(
                    em.instance_type().is_concrete(),
                    "existential metatype instance type `{}` is not concrete",
                    em.instance_type()
                );
                Arc::clone(ty)
            }
            TypeRef::ReferenceStorage(rs) => {
                TypeRef::reference_storage(rs.kind(), self.visit(rs.ty())?)
            }
            TypeRef::GenericTypeParameter(gp) => self.visit_generic_param(gp)?,
            TypeRef::DependentMember(dm) => self.visit_dependent_member(dm)?,
        })
    }

    fn visit_generic_param(
        &mut self,
        gp: &GenericTypeParameterTypeRef,
    ) -> Result<TypeRefPtr, SubstError> {
        let bound = self
            .substitutions
            .get(&gp.depth_and_index())
            .ok_or_else(|| SubstError::missing_binding(gp.depth_and_index()))?;
        assert!(
            bound.is_concrete(),
            "generic parameter {} is bound to non-concrete type `{}`",
            gp,
            bound
        );
        Ok(Arc::clone(bound))
    }

    fn visit_dependent_member(
        &mut self,
        dm: &DependentMemberTypeRef,
    ) -> Result<TypeRefPtr, SubstError> {
        let base = self.visit(dm.base())?;
        let nominal = base.as_nominal_trait().unwrap_or_else(|| {
            panic!(
                "dependent member base resolved to non-nominal type `{}`",
                base
            )
        });

        log::debug!(
            "[subst] resolving witness for {}.{} in `{}`",
            dm.protocol(),
            dm.member(),
            base
        );
        let witness = self
            .resolver
            .resolve_witness(nominal.mangled_name(), dm.member(), dm.protocol())
            .map_err(|missing| {
                SubstError::missing_witness(base.clone(), dm.member(), dm.protocol(), missing)
            })?;

        // the witness is written in terms of the base's own generic parameters
        let substitutions = base.subst_map();
        log::debug!("[subst] witness `{}` with {}", witness, substitutions);
        let mut nested = TypeRefSubstitution {
            resolver: self.resolver,
            substitutions: &substitutions,
            options: self.options,
            depth: self.depth,
        };
        nested.visit(&witness)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        reflection::{MissingWitness, NoReflection},
        typeref::{
            substitute, substitute_with_options, GenericArgumentMap, NominalTypeTrait,
            ProtocolTypeRef, SubstErrorKind, SubstOptions, SubstTypeRef, TypeRef, TypeRefKind,
            TypeRefPtr,
        },
    };

    fn sequence() -> ProtocolTypeRef {
        ProtocolTypeRef::new("Swift", "Sequence")
    }

    fn bindings(tys: Vec<((u32, u32), TypeRefPtr)>) -> GenericArgumentMap {
        tys.into_iter().collect()
    }

    /// `Swift.Array<τ_0_0>: Sequence` with `Element == τ_0_0`.
    fn array_witnesses(
        name: &str,
        member: &str,
        protocol: &ProtocolTypeRef,
    ) -> Result<TypeRefPtr, MissingWitness> {
        if name != "Swift.Array" || protocol != &sequence() {
            return Err(MissingWitness::NotConforming);
        }
        match member {
            "Element" => Ok(TypeRef::generic_param(0, 0)),
            "Iterator" => Ok(TypeRef::bound_generic(
                "Swift.IndexingIterator",
                vec![TypeRef::bound_generic(
                    "Swift.Array",
                    vec![TypeRef::generic_param(0, 0)],
                    None,
                )],
                None,
            )),
            _ => Err(MissingWitness::UnknownMember),
        }
    }

    #[test]
    fn concrete_input_is_unchanged() {
        let tree = TypeRef::function(
            vec![TypeRef::bound_generic("Swift.Array", vec![TypeRef::builtin("Int")], None)],
            TypeRef::weak(TypeRef::nominal("M.View", None)),
        );
        let result = substitute(&tree, &GenericArgumentMap::new(), &NoReflection).unwrap();
        assert!(result.structurally_eq(&tree));
    }

    #[test]
    fn generic_param_returns_the_binding_itself() {
        let int = TypeRef::builtin("Int");
        let subs = bindings(vec![((0, 0), int.clone())]);
        let result = substitute(&TypeRef::generic_param(0, 0), &subs, &NoReflection).unwrap();
        assert!(Arc::ptr_eq(&result, &int));
    }

    #[test]
    fn bound_generic_arguments_are_substituted() {
        let tree = TypeRef::bound_generic("Array", vec![TypeRef::generic_param(0, 0)], None);
        let subs = bindings(vec![((0, 0), TypeRef::builtin("String"))]);
        let result = substitute(&tree, &subs, &NoReflection).unwrap();

        let expected = TypeRef::bound_generic("Array", vec![TypeRef::builtin("String")], None);
        assert!(result.structurally_eq(&expected));
    }

    #[test]
    fn tuple_keeps_variadic_flag() {
        let subs = bindings(vec![((0, 0), TypeRef::builtin("Bool"))]);

        let tree = TypeRef::tuple(vec![TypeRef::generic_param(0, 0), TypeRef::builtin("Int")], false);
        let result = substitute(&tree, &subs, &NoReflection).unwrap();
        let expected = TypeRef::tuple(vec![TypeRef::builtin("Bool"), TypeRef::builtin("Int")], false);
        assert!(result.structurally_eq(&expected));

        let tree = TypeRef::tuple(vec![TypeRef::generic_param(0, 0)], true);
        let result = substitute(&tree, &subs, &NoReflection).unwrap();
        assert!(result.as_tuple().unwrap().is_variadic());
    }

    #[test]
    fn function_metatype_and_storage_are_rebuilt() {
        let subs = bindings(vec![
            ((0, 0), TypeRef::builtin("Int")),
            ((0, 1), TypeRef::nominal("M.View", None)),
        ]);
        let tree = TypeRef::function(
            vec![TypeRef::metatype(TypeRef::generic_param(0, 0))],
            TypeRef::unowned(TypeRef::generic_param(0, 1)),
        );
        let result = substitute(&tree, &subs, &NoReflection).unwrap();
        assert_eq!(result.to_string(), "(Int.Type) -> unowned M.View");
        assert_eq!(
            result.as_function().unwrap().result().kind(),
            TypeRefKind::UnownedStorage
        );
    }

    #[test]
    fn bound_generic_parent_is_carried_and_substituted() {
        let parent = TypeRef::bound_generic("M.Outer", vec![TypeRef::generic_param(0, 0)], None);
        let tree = TypeRef::bound_generic(
            "M.Outer.Inner",
            vec![TypeRef::generic_param(1, 0)],
            Some(parent),
        );
        let subs = bindings(vec![
            ((0, 0), TypeRef::builtin("Int")),
            ((1, 0), TypeRef::builtin("Bool")),
        ]);
        let result = substitute(&tree, &subs, &NoReflection).unwrap();

        let parent = result.as_bound_generic().unwrap();
        let parent = parent.parent().unwrap();
        assert_eq!(parent.to_string(), "M.Outer<Int>");
        assert_eq!(result.depth(), Some(1));
    }

    #[test]
    fn missing_binding_is_reported() {
        let tree = TypeRef::tuple(vec![TypeRef::generic_param(1, 2)], false);
        let err = substitute(&tree, &GenericArgumentMap::new(), &NoReflection).unwrap_err();
        assert!(matches!(err.kind, SubstErrorKind::MissingBinding((1, 2))));
    }

    #[test]
    fn dependent_member_resolves_through_base_bindings() {
        // τ_0_0.Element with τ_0_0 := Array<Int>
        let tree = TypeRef::dependent_member("Element", TypeRef::generic_param(0, 0), sequence());
        let int = TypeRef::builtin("Int");
        let subs = bindings(vec![(
            (0, 0),
            TypeRef::bound_generic("Swift.Array", vec![int.clone()], None),
        )]);

        let result = substitute(&tree, &subs, &array_witnesses).unwrap();
        assert!(Arc::ptr_eq(&result, &int));
    }

    #[test]
    fn dependent_member_witness_uses_declaring_coordinates() {
        // the caller's τ_0_0 is not the array's τ_0_0
        let tree = TypeRef::dependent_member("Iterator", TypeRef::generic_param(0, 1), sequence());
        let subs = bindings(vec![
            ((0, 0), TypeRef::builtin("Bool")),
            (
                (0, 1),
                TypeRef::bound_generic("Swift.Array", vec![TypeRef::builtin("String")], None),
            ),
        ]);

        let result = tree.subst(&array_witnesses, &subs).unwrap();
        assert_eq!(
            result.to_string(),
            "Swift.IndexingIterator<Swift.Array<String>>"
        );
    }

    #[test]
    fn missing_witness_fails_the_whole_substitution() {
        let tree = TypeRef::tuple(
            vec![
                TypeRef::builtin("Int"),
                TypeRef::dependent_member("Index", TypeRef::generic_param(0, 0), sequence()),
            ],
            false,
        );
        let subs = bindings(vec![(
            (0, 0),
            TypeRef::bound_generic("Swift.Array", vec![TypeRef::builtin("Int")], None),
        )]);

        let err = substitute(&tree, &subs, &array_witnesses).unwrap_err();
        match err.kind {
            SubstErrorKind::MissingWitness { member, reason, .. } => {
                assert_eq!(member, "Index");
                assert_eq!(reason, MissingWitness::UnknownMember);
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let other = ProtocolTypeRef::new("Swift", "Hashable");
        let tree = TypeRef::dependent_member("Element", TypeRef::generic_param(0, 0), other);
        let err = substitute(&tree, &subs, &array_witnesses).unwrap_err();
        assert!(matches!(
            err.kind,
            SubstErrorKind::MissingWitness {
                reason: MissingWitness::NotConforming,
                ..
            }
        ));
    }

    #[test]
    #[should_panic(expected = "non-nominal type")]
    fn dependent_member_on_non_nominal_base_is_fatal() {
        let tree = TypeRef::dependent_member("Element", TypeRef::generic_param(0, 0), sequence());
        let subs = bindings(vec![((0, 0), TypeRef::builtin("Int"))]);
        let _ = substitute(&tree, &subs, &array_witnesses);
    }

    #[test]
    #[should_panic(expected = "is not concrete")]
    fn existential_metatype_over_placeholder_is_fatal() {
        let tree = TypeRef::existential_metatype(TypeRef::generic_param(0, 0));
        let subs = bindings(vec![((0, 0), TypeRef::builtin("Int"))]);
        let _ = substitute(&tree, &subs, &NoReflection);
    }

    #[test]
    #[should_panic(expected = "non-concrete type")]
    fn non_concrete_binding_is_fatal() {
        let subs = bindings(vec![((0, 0), TypeRef::generic_param(0, 0))]);
        let _ = substitute(&TypeRef::generic_param(0, 0), &subs, &NoReflection);
    }

    #[test]
    #[should_panic(expected = "produced non-concrete type")]
    fn nominal_with_generic_parent_violates_postcondition() {
        let parent = TypeRef::bound_generic("M.Outer", vec![TypeRef::generic_param(0, 0)], None);
        let tree = TypeRef::nominal("M.Outer.Inner", Some(parent));
        let subs = bindings(vec![((0, 0), TypeRef::builtin("Int"))]);
        let _ = substitute(&tree, &subs, &NoReflection);
    }

    #[test]
    fn self_referential_witness_hits_the_depth_limit() {
        // Node<T>.Next == Node<Node<T>>.Next, forever
        let recursive = |_: &str, _: &str, _: &ProtocolTypeRef| -> Result<TypeRefPtr, MissingWitness> {
            Ok(TypeRef::dependent_member(
                "Next",
                TypeRef::bound_generic(
                    "M.Node",
                    vec![TypeRef::bound_generic("M.Node", vec![TypeRef::generic_param(0, 0)], None)],
                    None,
                ),
                ProtocolTypeRef::new("M", "Linked"),
            ))
        };
        let tree = TypeRef::dependent_member(
            "Next",
            TypeRef::bound_generic("M.Node", vec![TypeRef::builtin("Int")], None),
            ProtocolTypeRef::new("M", "Linked"),
        );
        let options = SubstOptions { max_depth: 32 };
        let err = substitute_with_options(&tree, &GenericArgumentMap::new(), &recursive, &options)
            .unwrap_err();
        assert!(matches!(err.kind, SubstErrorKind::RecursionLimit { limit: 32, .. }));
    }

    #[test]
    fn leaves_are_shared_not_rebuilt() {
        let subs = bindings(vec![((0, 0), TypeRef::builtin("Int"))]);
        let leaves = vec![
            TypeRef::builtin("Bool"),
            TypeRef::nominal("M.View", None),
            TypeRef::protocol("Swift", "Error"),
            TypeRef::protocol_composition(vec![
                TypeRef::protocol("Swift", "Hashable"),
                TypeRef::protocol("M", "Shape"),
            ]),
            TypeRef::protocol_composition(vec![]),
            TypeRef::foreign_class("CFString"),
            TypeRef::unnamed_foreign_class(),
            TypeRef::objc_class("NSObject"),
            TypeRef::unnamed_objc_class(),
            TypeRef::opaque(),
        ];
        for leaf in leaves {
            let result = leaf.subst(&NoReflection, &subs).unwrap();
            assert!(Arc::ptr_eq(&result, &leaf), "`{}` was rebuilt", leaf);
        }
    }

    #[test]
    fn unmanaged_storage_keeps_its_kind() {
        let subs = bindings(vec![((0, 0), TypeRef::builtin("Int"))]);
        let tree = TypeRef::unmanaged(TypeRef::generic_param(0, 0));
        let result = tree.subst(&NoReflection, &subs).unwrap();
        assert_eq!(result.kind(), TypeRefKind::UnmanagedStorage);
        assert_eq!(result.to_string(), "unowned(unsafe) Int");
        let storage = result.as_reference_storage().unwrap();
        assert!(Arc::ptr_eq(storage.ty(), &subs[&(0, 0)]));
    }

    #[test]
    fn concrete_existential_metatype_is_passed_through() {
        let subs = bindings(vec![((0, 0), TypeRef::builtin("Int"))]);
        let tree = TypeRef::existential_metatype(TypeRef::protocol("Swift", "Error"));
        let result = tree.subst(&NoReflection, &subs).unwrap();
        assert_eq!(result.kind(), TypeRefKind::ExistentialMetatype);
        assert!(Arc::ptr_eq(&result, &tree));
    }

    #[test]
    fn deep_binding_is_not_counted_against_the_limit() {
        let mut deep = TypeRef::builtin("Int");
        for _ in 0..10 {
            deep = TypeRef::metatype(deep);
        }
        let subs = bindings(vec![((0, 0), deep.clone())]);
        let options = SubstOptions { max_depth: 2 };
        let result = substitute_with_options(
            &TypeRef::generic_param(0, 0),
            &subs,
            &NoReflection,
            &options,
        )
        .unwrap();
        assert!(Arc::ptr_eq(&result, &deep));
    }

    #[test]
    fn argument_map_debug_is_ordered() {
        let subs = GenericArgumentMap::new()
            .bind(1, 0, TypeRef::builtin("Bool"))
            .bind(0, 1, TypeRef::builtin("Int"))
            .bind(0, 0, TypeRef::builtin("String"));
        assert_eq!(
            format!("{:?}", subs),
            r#"{"τ_0_0": "String", "τ_0_1": "Int", "τ_1_0": "Bool"}"#
        );
    }
}
