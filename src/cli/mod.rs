use std::{fs, path::Path, process};

use colored::Colorize;
use serde::{de::DeserializeOwned, Deserialize};
use structopt::StructOpt;

use crate::{
    demangle::Node,
    errors::{ReflectError, ReflectResult},
    logger,
    typeref::{GenericArgumentMap, TypeRef, TypeRefPtr},
};

mod inspect;
mod subst;

pub use inspect::InspectCommand;
pub use subst::SubstCommand;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "typeref",
    about = "Translates and specializes reflected Swift type references"
)]
pub struct Cli {
    #[structopt(
        long, env = "LOG_LEVEL",
        help = "Sets the log level",
        default_value = "info",
        possible_values = &["off", "error", "warn", "info", "debug", "trace"],
        global = true
    )]
    log_level: log::LevelFilter,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(Debug, StructOpt)]
pub enum Command {
    /// Substitutes generic arguments into a type and prints the result
    Subst(SubstCommand),
    /// Prints what is known about a type
    Inspect(InspectCommand),
}

pub fn run() {
    let cli: Cli = Cli::from_args();

    if let Err(err) = logger::init(cli.log_level) {
        eprintln!("{} {}", "logger error:".red(), err);
    }

    let result = match cli.cmd {
        Command::Subst(cmd) => subst::action(cmd),
        Command::Inspect(cmd) => inspect::action(cmd),
    };

    if let Err(err) = result {
        err.emit();
        process::exit(1);
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> ReflectResult<T> {
    log::debug!("reading {}", path.display());
    let src =
        fs::read_to_string(path).map_err(|e| ReflectError::from(e).context(path.display()))?;
    serde_json::from_str(&src).map_err(|e| ReflectError::from(e).context(path.display()))
}

fn load_tree(path: &Path) -> ReflectResult<TypeRefPtr> {
    let node: Node = read_json(path)?;
    let ty = TypeRef::from_demangle_node(&node);
    if ty.is_opaque() {
        log::warn!("{} does not describe a type this tool understands", path.display());
    }
    Ok(ty)
}

#[derive(Debug, Deserialize)]
struct BindingRecord {
    depth: u32,
    index: u32,
    #[serde(rename = "type")]
    ty: Node,
}

fn load_bindings(path: &Path) -> ReflectResult<GenericArgumentMap> {
    let records: Vec<BindingRecord> = read_json(path)?;
    bindings_from_records(records).map_err(|e| e.context(path.display()))
}

/// Bindings must be concrete and each coordinate may appear only once.
fn bindings_from_records(records: Vec<BindingRecord>) -> ReflectResult<GenericArgumentMap> {
    let mut bindings = GenericArgumentMap::new();
    for record in records {
        let ty = TypeRef::from_demangle_node(&record.ty);
        if !ty.is_concrete() {
            return Err(ReflectError::input(format!(
                "binding for τ_{}_{} is not concrete: `{}`",
                record.depth, record.index, ty
            )));
        }

        if let Some(prev) = bindings.insert((record.depth, record.index), ty) {
            return Err(ReflectError::input(format!(
                "τ_{}_{} is bound more than once (first to `{}`)",
                record.depth, record.index, prev
            )));
        }
    }
    Ok(bindings)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use structopt::StructOpt;

    use crate::{errors::ReflectErrorKind, typeref::DEFAULT_MAX_SUBST_DEPTH};

    use super::{bindings_from_records, BindingRecord, Cli, Command};

    fn records(src: &str) -> Vec<BindingRecord> {
        serde_json::from_str(src).unwrap()
    }

    #[test]
    fn bindings_are_keyed_by_coordinate() {
        let bindings = bindings_from_records(records(
            r#"[
                { "depth": 0, "index": 1, "type": { "kind": "BuiltinTypeName", "text": "Int" } },
                { "depth": 1, "index": 0, "type": { "kind": "BuiltinTypeName", "text": "Bool" } }
            ]"#,
        ))
        .unwrap();
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[&(0, 1)].to_string(), "Int");
        assert_eq!(bindings[&(1, 0)].to_string(), "Bool");
    }

    #[test]
    fn unreadable_binding_is_kept_as_opaque() {
        let bindings = bindings_from_records(records(
            r#"[{ "depth": 0, "index": 0, "type": { "kind": "SILBoxType" } }]"#,
        ))
        .unwrap();
        assert!(Arc::ptr_eq(&bindings[&(0, 0)], &crate::TypeRef::opaque()));
    }

    #[test]
    fn generic_binding_is_rejected() {
        let err = bindings_from_records(records(
            r#"[{
                "depth": 0, "index": 0,
                "type": {
                    "kind": "DependentGenericParamType",
                    "children": [{ "kind": "Index", "index": 0 }, { "kind": "Index", "index": 1 }]
                }
            }]"#,
        ))
        .unwrap_err();
        assert_eq!(err.kind, ReflectErrorKind::Input);
        assert_eq!(err.msg, "binding for τ_0_0 is not concrete: `τ_0_1`");
    }

    #[test]
    fn duplicate_binding_is_rejected() {
        let err = bindings_from_records(records(
            r#"[
                { "depth": 0, "index": 0, "type": { "kind": "BuiltinTypeName", "text": "Int" } },
                { "depth": 0, "index": 0, "type": { "kind": "BuiltinTypeName", "text": "Bool" } }
            ]"#,
        ))
        .unwrap_err();
        assert!(err.msg.contains("bound more than once"));
    }

    #[test]
    fn parses_subst_command_line() {
        let cli = Cli::from_iter_safe(&[
            "typeref",
            "--log-level",
            "debug",
            "subst",
            "--tree",
            "tree.json",
            "--reflection",
            "info.json",
        ])
        .unwrap();
        assert_eq!(cli.log_level, log::LevelFilter::Debug);
        match cli.cmd {
            Command::Subst(cmd) => {
                assert!(cmd.bindings.is_none());
                assert_eq!(cmd.max_depth, DEFAULT_MAX_SUBST_DEPTH);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn subst_requires_reflection_info() {
        assert!(Cli::from_iter_safe(&["typeref", "subst", "--tree", "tree.json"]).is_err());
    }
}
