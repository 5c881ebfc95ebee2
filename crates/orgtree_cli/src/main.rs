//! Command-line front end for `orgtree_core`.
//!
//! # Responsibility
//! - Verify core crate linkage (`ping`, version).
//! - Optionally open a directory database and print its menu forest.
//! - Optionally cascade-delete one menu, cleaning portraits under
//!   `ORGTREE_BLOB_ROOT` when it is set.
//!
//! Usage: `orgtree_cli [db_path] [--json] [--delete <menu_id>]`. Without
//! `db_path`, `ORGTREE_DB_PATH` is used only when set.

use orgtree_core::db::open_db;
use orgtree_core::{
    directory_json, init_logging, CoreConfig, MenuId, MenuService, SqliteMemberRepository,
    SqliteMenuRepository,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("orgtree_core ping={}", orgtree_core::ping());
    println!("orgtree_core version={}", orgtree_core::core_version());

    let args: Vec<String> = std::env::args().skip(1).collect();
    let as_json = args.iter().any(|arg| arg == "--json");
    let delete_target = match args.iter().position(|arg| arg == "--delete") {
        Some(index) => match args.get(index + 1).map(|value| MenuId::parse_str(value)) {
            Some(Ok(id)) => Some(id),
            _ => {
                eprintln!("--delete expects a menu id");
                return ExitCode::FAILURE;
            }
        },
        None => None,
    };
    let explicit_path = args
        .iter()
        .enumerate()
        .find(|(index, arg)| {
            !arg.starts_with("--") && (*index == 0 || args[index - 1] != "--delete")
        })
        .map(|(_, arg)| PathBuf::from(arg));

    let config = match CoreConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config error: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(log_dir) = config.log_dir.as_deref().and_then(|dir| dir.to_str()) {
        if let Err(err) = init_logging(config.log_level, log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let db_path = match explicit_path {
        Some(path) => path,
        None if std::env::var_os(orgtree_core::config::ENV_DB_PATH).is_some() => {
            config.db_path.clone()
        }
        None => return ExitCode::SUCCESS,
    };

    match run(&db_path, &config, delete_target, as_json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_run module=cli status=error error={err}");
            eprintln!("failed on `{}`: {err}", db_path.display());
            ExitCode::FAILURE
        }
    }
}

fn run(
    db_path: &Path,
    config: &CoreConfig,
    delete_target: Option<MenuId>,
    as_json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_db(db_path)?;
    let mut service = MenuService::new(
        SqliteMenuRepository::try_new(&conn)?,
        SqliteMemberRepository::try_new(&conn)?,
    );
    if let Some(store) = config.blob_store() {
        service = service.with_blob_store(store);
    }

    if let Some(id) = delete_target {
        let report = service.delete_node(id)?;
        println!(
            "deleted menus={} members={} images={}",
            report.deleted_nodes.len(),
            report.deleted_members.len(),
            report.removed_blobs.len()
        );
    }

    let forest = service.forest()?;
    if as_json {
        println!("{}", directory_json(&forest)?);
        return Ok(());
    }

    for row in forest.rows() {
        println!(
            "{}- {} [{} member(s)]",
            "  ".repeat(row.depth),
            row.node.title,
            row.member_count
        );
        for member in forest.members(row.node.id) {
            println!("{}  * {} ({})", "  ".repeat(row.depth), member.name, member.designation);
        }
    }
    Ok(())
}
