use std::fmt;

use crate::{
    errors::{ReflectError, ReflectErrorKind},
    reflection::MissingWitness,
};

use super::{DepthAndIndex, ProtocolTypeRef, TypeRefPtr};

#[derive(Clone, Debug)]
pub enum SubstErrorKind {
    MissingBinding(DepthAndIndex),
    MissingWitness {
        base: TypeRefPtr,
        member: String,
        protocol: ProtocolTypeRef,
        reason: MissingWitness,
    },
    RecursionLimit {
        limit: usize,
        ty: TypeRefPtr,
    },
}

/// A substitution that could not be completed. Nothing partial survives it.
#[derive(Clone, Debug)]
pub struct SubstError {
    pub kind: SubstErrorKind,
}

impl SubstError {
    pub fn missing_binding(depth_and_index: DepthAndIndex) -> Self {
        Self {
            kind: SubstErrorKind::MissingBinding(depth_and_index),
        }
    }

    pub fn missing_witness<M: Into<String>>(
        base: TypeRefPtr,
        member: M,
        protocol: &ProtocolTypeRef,
        reason: MissingWitness,
    ) -> Self {
        Self {
            kind: SubstErrorKind::MissingWitness {
                base,
                member: member.into(),
                protocol: protocol.clone(),
                reason,
            },
        }
    }

    pub fn recursion_limit(limit: usize, ty: TypeRefPtr) -> Self {
        Self {
            kind: SubstErrorKind::RecursionLimit { limit, ty },
        }
    }

    pub fn message(&self) -> String {
        match &self.kind {
            SubstErrorKind::MissingBinding((depth, index)) => {
                format!("no binding for generic parameter τ_{}_{}", depth, index)
            }
            SubstErrorKind::MissingWitness {
                base,
                member,
                protocol,
                reason,
            } => match reason {
                MissingWitness::NotConforming => {
                    format!("type `{}` does not conform to `{}`", base, protocol)
                }
                MissingWitness::UnknownMember => format!(
                    "conformance of `{}` to `{}` has no associated type `{}`",
                    base, protocol, member
                ),
            },
            SubstErrorKind::RecursionLimit { limit, ty } => format!(
                "substitution exceeded the nesting limit of {} at `{}`",
                limit, ty
            ),
        }
    }
}

impl fmt::Display for SubstError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for SubstError {}

impl From<SubstError> for ReflectError {
    fn from(err: SubstError) -> Self {
        ReflectError {
            msg: err.message(),
            kind: ReflectErrorKind::Substitution,
        }
    }
}
