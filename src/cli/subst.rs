use std::{path::PathBuf, time::Instant};

use structopt::StructOpt;

use crate::{
    errors::ReflectResult,
    reflection::ReflectionInfo,
    typeref::{substitute_with_options, GenericArgumentMap, SubstOptions},
};

use super::{load_bindings, load_tree};

#[derive(Debug, StructOpt)]
pub struct SubstCommand {
    #[structopt(long, help = "JSON demangle tree of the type to specialize")]
    pub tree: PathBuf,

    #[structopt(
        long,
        help = "JSON reflection info",
        long_help = "JSON object with `nominals` (mangled name to kind) and `conformances` \
                     (type, protocol and associated type witnesses) used to resolve \
                     dependent member types"
    )]
    pub reflection: PathBuf,

    #[structopt(
        long,
        help = "JSON list of generic argument bindings",
        long_help = "JSON list of `{ \"depth\": D, \"index\": I, \"type\": <demangle tree> }`. \
                     Every bound type must be concrete."
    )]
    pub bindings: Option<PathBuf>,

    #[structopt(
        long,
        env = "TYPEREF_MAX_DEPTH",
        help = "Maximum nesting of the substitution, including witness resolution",
        default_value = "256"
    )]
    pub max_depth: usize,
}

pub(super) fn action(cmd: SubstCommand) -> ReflectResult {
    let tree = load_tree(&cmd.tree)?;
    let info = ReflectionInfo::load(&cmd.reflection)?;
    let bindings = match &cmd.bindings {
        Some(path) => load_bindings(path)?,
        None => GenericArgumentMap::new(),
    };

    log::info!("substituting `{}`", tree);
    let options = SubstOptions {
        max_depth: cmd.max_depth,
    };
    let start_time = Instant::now();
    let result = substitute_with_options(&tree, &bindings, &info, &options)?;
    log::debug!("substituted in {:?}", start_time.elapsed());

    println!("{}", result);
    Ok(())
}
