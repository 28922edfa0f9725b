use std::{fs, path::Path};

use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};

use crate::{
    demangle::Node,
    errors::{ReflectError, ReflectResult},
    typeref::{ProtocolTypeRef, TypeRef, TypeRefPtr},
};

use super::{MissingWitness, NominalClassifier, NominalKind, WitnessResolver};

/// An associated type of a conformance and the type that implements it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociatedTypeRecord {
    pub name: String,
    pub witness: Node,
}

/// The record of one nominal type conforming to one protocol.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConformanceRecord {
    pub type_name: String,
    pub protocol: ProtocolTypeRef,
    #[serde(default)]
    pub associated_types: Vec<AssociatedTypeRecord>,
}

impl ConformanceRecord {
    pub fn new(type_name: impl Into<String>, protocol: ProtocolTypeRef) -> Self {
        ConformanceRecord {
            type_name: type_name.into(),
            protocol,
            associated_types: vec![],
        }
    }

    pub fn with_witness(mut self, name: impl Into<String>, witness: Node) -> Self {
        self.associated_types.push(AssociatedTypeRecord {
            name: name.into(),
            witness,
        });
        self
    }

    fn witness(&self, member: &str) -> Option<&Node> {
        self.associated_types
            .iter()
            .find(|record| record.name == member)
            .map(|record| &record.witness)
    }
}

/// Reflection metadata held in memory: the kind of each known nominal type
/// and the conformances recorded for them.
///
/// Witnesses are stored as demangle trees and translated on each lookup.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReflectionInfo {
    #[serde(default)]
    nominals: FnvHashMap<String, NominalKind>,
    #[serde(default)]
    conformances: Vec<ConformanceRecord>,
}

impl ReflectionInfo {
    pub fn new() -> ReflectionInfo {
        ReflectionInfo::default()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> ReflectResult<ReflectionInfo> {
        let path = path.as_ref();
        log::debug!("loading reflection info from {}", path.display());
        let src = fs::read_to_string(path)
            .map_err(|e| ReflectError::from(e).context(path.display()))?;
        ReflectionInfo::from_json(&src).map_err(|e| e.context(path.display()))
    }

    pub fn from_json(src: &str) -> ReflectResult<ReflectionInfo> {
        let info: ReflectionInfo = serde_json::from_str(src)?;
        log::debug!(
            "reflection info: {} nominal(s), {} conformance(s)",
            info.nominals.len(),
            info.conformances.len()
        );
        Ok(info)
    }

    pub fn add_nominal(&mut self, mangled_name: impl Into<String>, kind: NominalKind) {
        self.nominals.insert(mangled_name.into(), kind);
    }

    pub fn add_conformance(&mut self, record: ConformanceRecord) {
        self.conformances.push(record);
    }

    pub fn conformances(&self) -> &[ConformanceRecord] {
        &self.conformances
    }

    /// Finds the conformance of `mangled_name` to `protocol`. The first
    /// record wins if the same conformance is listed more than once.
    pub fn conformance(
        &self,
        mangled_name: &str,
        protocol: &ProtocolTypeRef,
    ) -> Option<&ConformanceRecord> {
        self.conformances
            .iter()
            .find(|record| record.type_name == mangled_name && &record.protocol == protocol)
    }
}

impl NominalClassifier for ReflectionInfo {
    fn classify(&self, mangled_name: &str) -> NominalKind {
        self.nominals
            .get(mangled_name)
            .copied()
            .unwrap_or(NominalKind::Unknown)
    }
}

impl WitnessResolver for ReflectionInfo {
    fn resolve_witness(
        &self,
        mangled_name: &str,
        member: &str,
        protocol: &ProtocolTypeRef,
    ) -> Result<TypeRefPtr, MissingWitness> {
        let record = self
            .conformance(mangled_name, protocol)
            .ok_or(MissingWitness::NotConforming)?;
        let witness = record
            .witness(member)
            .ok_or(MissingWitness::UnknownMember)?;
        let ty = TypeRef::from_demangle_node(witness);
        log::trace!(
            "[reflection] {}: {} witnesses {} as `{}`",
            mangled_name,
            protocol,
            member,
            ty
        );
        Ok(ty)
    }
}
