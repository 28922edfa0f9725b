#[macro_use]
extern crate lazy_static;

#[macro_use]
pub mod macros;

pub mod cli;
pub mod demangle;
pub mod errors;
pub mod logger;
pub mod reflection;
pub mod typeref;

pub use typeref::{
    substitute, substitute_with_options, GenericArgumentMap, SubstError, SubstOptions, TypeRef,
    TypeRefKind, TypeRefPtr,
};
