//! The metadata lookups substitution and classification depend on.
//!
//! A live reflection context answers these from the metadata sections of a
//! process image. [`ReflectionInfo`] answers them from an in-memory table,
//! and any closure of the right shape works as well.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::typeref::{ProtocolTypeRef, TypeRefPtr};

mod info;

pub use info::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NominalKind {
    Struct,
    Enum,
    Class,
    Protocol,
    Unknown,
}

impl fmt::Display for NominalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                NominalKind::Struct => "struct",
                NominalKind::Enum => "enum",
                NominalKind::Class => "class",
                NominalKind::Protocol => "protocol",
                NominalKind::Unknown => "unknown",
            }
        )
    }
}

/// Looks up what kind of declaration a mangled nominal name refers to.
pub trait NominalClassifier {
    fn classify(&self, mangled_name: &str) -> NominalKind;
}

impl<F> NominalClassifier for F
where
    F: Fn(&str) -> NominalKind,
{
    fn classify(&self, mangled_name: &str) -> NominalKind {
        self(mangled_name)
    }
}

/// Why a witness lookup came back empty.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MissingWitness {
    /// No conformance of the type to the protocol is recorded.
    NotConforming,
    /// The conformance exists but does not name the associated type.
    UnknownMember,
}

impl fmt::Display for MissingWitness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                MissingWitness::NotConforming => "no conformance",
                MissingWitness::UnknownMember => "no such associated type",
            }
        )
    }
}

/// Finds the type a nominal type uses for an associated type of a protocol
/// it conforms to.
///
/// The returned witness is written in terms of the conforming type's own
/// generic parameters; substitution specialises it.
pub trait WitnessResolver {
    fn resolve_witness(
        &self,
        mangled_name: &str,
        member: &str,
        protocol: &ProtocolTypeRef,
    ) -> Result<TypeRefPtr, MissingWitness>;
}

impl<F> WitnessResolver for F
where
    F: Fn(&str, &str, &ProtocolTypeRef) -> Result<TypeRefPtr, MissingWitness>,
{
    fn resolve_witness(
        &self,
        mangled_name: &str,
        member: &str,
        protocol: &ProtocolTypeRef,
    ) -> Result<TypeRefPtr, MissingWitness> {
        self(mangled_name, member, protocol)
    }
}

/// A context with no metadata at all: nothing is classified and nothing
/// conforms.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoReflection;

impl NominalClassifier for NoReflection {
    fn classify(&self, _: &str) -> NominalKind {
        NominalKind::Unknown
    }
}

impl WitnessResolver for NoReflection {
    fn resolve_witness(
        &self,
        _: &str,
        _: &str,
        _: &ProtocolTypeRef,
    ) -> Result<TypeRefPtr, MissingWitness> {
        Err(MissingWitness::NotConforming)
    }
}
