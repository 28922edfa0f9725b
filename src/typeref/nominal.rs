use std::sync::Arc;

use crate::reflection::{NominalClassifier, NominalKind};

use super::{GenericArgumentMap, TypeRef, TypeRefPtr};

/// Behaviour shared by plain and bound-generic nominal types.
pub trait NominalTypeTrait {
    fn mangled_name(&self) -> &str;

    /// The lexically enclosing nominal type, if any.
    fn parent(&self) -> Option<&TypeRefPtr>;

    /// Levels of lexical generic nesting above this type: 0 without a parent,
    /// otherwise one more than the parent's depth.
    fn depth(&self) -> u32 {
        match self.parent() {
            Some(parent) => {
                let nominal = parent.as_nominal_trait().unwrap_or_else(|| {
                    panic!(
                        "parent of nominal type `{}` is not nominal: `{}`",
                        self.mangled_name(),
                        parent
                    )
                });
                1 + nominal.depth()
            }
            None => 0,
        }
    }

    fn classify(&self, classifier: &dyn NominalClassifier) -> NominalKind {
        classifier.classify(self.mangled_name())
    }

    fn is_struct(&self, classifier: &dyn NominalClassifier) -> bool {
        self.classify(classifier) == NominalKind::Struct
    }

    fn is_enum(&self, classifier: &dyn NominalClassifier) -> bool {
        self.classify(classifier) == NominalKind::Enum
    }

    fn is_class(&self, classifier: &dyn NominalClassifier) -> bool {
        self.classify(classifier) == NominalKind::Class
    }
}

#[derive(Clone, Debug)]
pub struct NominalTypeRef {
    mangled_name: String,
    parent: Option<TypeRefPtr>,
}

impl NominalTypeRef {
    pub fn new(mangled_name: impl Into<String>, parent: Option<TypeRefPtr>) -> Self {
        NominalTypeRef {
            mangled_name: mangled_name.into(),
            parent,
        }
    }
}

impl NominalTypeTrait for NominalTypeRef {
    fn mangled_name(&self) -> &str {
        &self.mangled_name
    }

    fn parent(&self) -> Option<&TypeRefPtr> {
        self.parent.as_ref()
    }
}

#[derive(Clone, Debug)]
pub struct BoundGenericTypeRef {
    mangled_name: String,
    generic_args: Vec<TypeRefPtr>,
    parent: Option<TypeRefPtr>,
}

impl BoundGenericTypeRef {
    pub fn new(
        mangled_name: impl Into<String>,
        generic_args: Vec<TypeRefPtr>,
        parent: Option<TypeRefPtr>,
    ) -> Self {
        BoundGenericTypeRef {
            mangled_name: mangled_name.into(),
            generic_args,
            parent,
        }
    }

    /// Arguments for this level's own generic parameters, in index order.
    pub fn generic_args(&self) -> &[TypeRefPtr] {
        &self.generic_args
    }
}

impl NominalTypeTrait for BoundGenericTypeRef {
    fn mangled_name(&self) -> &str {
        &self.mangled_name
    }

    fn parent(&self) -> Option<&TypeRefPtr> {
        self.parent.as_ref()
    }
}

/// Builds a nominal type reference with its parent already attached, so the
/// node never exists in an unlinked state.
#[derive(Debug)]
pub struct NominalBuilder {
    mangled_name: String,
    parent: Option<TypeRefPtr>,
    generic_args: Option<Vec<TypeRefPtr>>,
}

impl NominalBuilder {
    pub fn new(mangled_name: impl Into<String>) -> Self {
        NominalBuilder {
            mangled_name: mangled_name.into(),
            parent: None,
            generic_args: None,
        }
    }

    /// Accepts either a parent or an `Option` of one, so a translated
    /// context can be passed through as is.
    pub fn parent(mut self, parent: impl Into<Option<TypeRefPtr>>) -> Self {
        self.parent = parent.into();
        self
    }

    pub fn generic_args(mut self, generic_args: Vec<TypeRefPtr>) -> Self {
        self.generic_args = Some(generic_args);
        self
    }

    /// Yields a `BoundGeneric` when arguments were supplied, a plain `Nominal`
    /// otherwise.
    pub fn build(self) -> TypeRefPtr {
        match self.generic_args {
            Some(args) => TypeRef::bound_generic(self.mangled_name, args, self.parent),
            None => TypeRef::nominal(self.mangled_name, self.parent),
        }
    }
}

impl TypeRef {
    /// Derives the `(depth, index)` bindings a concrete nominal chain implies.
    ///
    /// Each bound-generic level contributes its own arguments at its own
    /// depth; plain nominal levels contribute nothing but still count towards
    /// the depth of the levels nested inside them. Any other kind yields an
    /// empty map.
    pub fn subst_map(&self) -> GenericArgumentMap {
        match self {
            TypeRef::Nominal(n) => n.parent().map(|p| p.subst_map()).unwrap_or_default(),
            TypeRef::BoundGeneric(bg) => {
                let depth = bg.depth();
                let mut subs = bg.parent().map(|p| p.subst_map()).unwrap_or_default();
                for (index, arg) in bg.generic_args().iter().enumerate() {
                    subs.insert((depth, index as u32), Arc::clone(arg));
                }
                subs
            }
            _ => GenericArgumentMap::new(),
        }
    }
}
