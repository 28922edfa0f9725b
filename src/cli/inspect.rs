use std::path::PathBuf;

use structopt::StructOpt;

use crate::{
    errors::ReflectResult,
    reflection::{NominalClassifier, ReflectionInfo},
    typeref::TypeRef,
};

use super::load_tree;

#[derive(Debug, StructOpt)]
pub struct InspectCommand {
    #[structopt(long, help = "JSON demangle tree of the type to inspect")]
    pub tree: PathBuf,

    #[structopt(long, help = "JSON reflection info used to classify nominal types")]
    pub reflection: Option<PathBuf>,
}

pub(super) fn action(cmd: InspectCommand) -> ReflectResult {
    let tree = load_tree(&cmd.tree)?;
    let info = match &cmd.reflection {
        Some(path) => ReflectionInfo::load(path)?,
        None => ReflectionInfo::new(),
    };

    for (label, value) in describe(&tree, &info) {
        println!("{:>12}: {}", label, value);
    }
    Ok(())
}

fn describe(ty: &TypeRef, classifier: &dyn NominalClassifier) -> Vec<(String, String)> {
    let mut lines = vec![
        (str!("type"), ty.to_string()),
        (str!("kind"), ty.kind().to_string()),
        (str!("concrete"), ty.is_concrete().to_string()),
    ];

    if let Some(nominal) = ty.as_nominal_trait() {
        lines.push((str!("depth"), nominal.depth().to_string()));
        lines.push((str!("declared as"), nominal.classify(classifier).to_string()));
        if let Some(parent) = nominal.parent() {
            lines.push((str!("parent"), parent.to_string()));
        }

        let subs = ty.subst_map();
        if !subs.is_empty() {
            lines.push((str!("generic args"), subs.to_string()));
        }
    }
    lines
}
