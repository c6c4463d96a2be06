//! Command dispatch: wires parsed arguments to the tree service.

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::application::diagnostics::{self, Diagnostic, Severity};
use crate::application::services::{OperationKind, OperationOutcome, TreeService};
use crate::application::{ApplicationError, IoResultExt};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{local_config_path, ConfigSources, Settings};
use crate::domain::{node_title, DomainError, Node, NodeId, ToTermTree};
use crate::infrastructure::ServiceContainer;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    execute_command_with(cli, &ConfigSources::system())
}

/// Run a command with settings layered from `sources`.
pub fn execute_command_with(cli: &Cli, sources: &ConfigSources) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Ok(());
    };

    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let container = build_container(cli, sources)?;

    match command {
        Commands::Tree => cmd_tree(cli, &container),
        Commands::Grid => cmd_grid(cli, &container),
        Commands::Get { id } => cmd_get(cli, &container, id),
        Commands::Children { id, all } => cmd_children(cli, &container, id, *all),
        Commands::Ancestors { id } => cmd_ancestors(cli, &container, id),
        Commands::Apply { operations } => cmd_apply(cli, &container, operations),
        Commands::Config { command } => cmd_config(cli, &container, sources, command),
        Commands::Completion { .. } => Ok(()),
    }
}

fn local_dir(cli: &Cli) -> CliResult<PathBuf> {
    match &cli.dir {
        Some(dir) => Ok(dir.clone()),
        None => Ok(std::env::current_dir()
            .with_path_context("resolve current directory", Path::new("."))?),
    }
}

fn build_container(cli: &Cli, sources: &ConfigSources) -> CliResult<ServiceContainer> {
    let dir = local_dir(cli)?;
    let settings = Settings::load_from(sources, Some(dir.as_path()))?;
    if !settings.output.color {
        colored::control::set_override(false);
    }
    debug!("settings: {:?}", settings);
    Ok(ServiceContainer::new(settings))
}

/// Seed file from `--file`, falling back to `seed_file` from config.
fn seed_path(cli: &Cli, container: &ServiceContainer) -> CliResult<PathBuf> {
    cli.file
        .clone()
        .or_else(|| container.settings.seed_file.clone())
        .ok_or_else(|| CliError::Usage("no nodes file: pass --file or set seed_file in config".into()))
}

fn load_service(cli: &Cli, container: &ServiceContainer) -> CliResult<TreeService> {
    let path = seed_path(cli, container)?;
    let mut service = container.tree_service();
    service.load(&path)?;
    Ok(service)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| ApplicationError::Parse {
        context: "serialize output".into(),
        source: e,
    })?;
    output::info(&text);
    Ok(())
}

fn print_nodes(cli: &Cli, nodes: &[Node]) -> CliResult<()> {
    if cli.json {
        return print_json(nodes);
    }
    for node in nodes {
        output::info(&node_title(node));
    }
    Ok(())
}

#[instrument(skip(cli, container))]
fn cmd_tree(cli: &Cli, container: &ServiceContainer) -> CliResult<()> {
    let service = load_service(cli, container)?;
    if cli.json {
        return print_json(&service.store().get_tree_data_for_grid());
    }
    let trees = service.store().to_term_trees();
    if trees.is_empty() {
        output::warning("tree is empty");
    }
    for tree in trees {
        output::info(tree.to_string().trim_end());
    }
    Ok(())
}

#[instrument(skip(cli, container))]
fn cmd_grid(cli: &Cli, container: &ServiceContainer) -> CliResult<()> {
    let service = load_service(cli, container)?;
    let grid = &container.settings.grid;
    let view = service.grid_view(&grid.columns, grid.default_column);
    if cli.json {
        return print_json(&view);
    }
    output::info(&view.render_text(container.settings.output.indent));
    Ok(())
}

#[instrument(skip(cli, container))]
fn cmd_get(cli: &Cli, container: &ServiceContainer, id: &str) -> CliResult<()> {
    let service = load_service(cli, container)?;
    let id = NodeId::from(id);
    let node = service
        .store()
        .get_item(&id)
        .ok_or_else(|| DomainError::NotFound(id.clone()))?;
    if cli.json {
        return print_json(node);
    }
    output::header(&node_title(node));
    output::detail(&format!(
        "parent: {}",
        node.parent.as_ref().map_or_else(|| "-".to_string(), ToString::to_string)
    ));
    output::detail(&format!("path: {}", itertools::join(service.store().get_path(&id), "/")));
    Ok(())
}

#[instrument(skip(cli, container))]
fn cmd_children(cli: &Cli, container: &ServiceContainer, id: &str, all: bool) -> CliResult<()> {
    let service = load_service(cli, container)?;
    let id = NodeId::from(id);
    let nodes = if all {
        service.store().get_all_children(&id)
    } else {
        service.store().get_children(&id)
    };
    print_nodes(cli, &nodes)
}

#[instrument(skip(cli, container))]
fn cmd_ancestors(cli: &Cli, container: &ServiceContainer, id: &str) -> CliResult<()> {
    let service = load_service(cli, container)?;
    let nodes = service.store().get_all_parents(&NodeId::from(id));
    print_nodes(cli, &nodes)
}

/// JSON shape of one operation outcome.
#[derive(Debug, Serialize)]
struct OutcomeReport {
    op: OperationKind,
    id: NodeId,
    ok: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    affected: Vec<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostic: Option<Diagnostic>,
}

impl From<&OperationOutcome> for OutcomeReport {
    fn from(outcome: &OperationOutcome) -> Self {
        Self {
            op: outcome.kind,
            id: outcome.id.clone(),
            ok: outcome.is_ok(),
            affected: outcome.result.as_ref().cloned().unwrap_or_default(),
            diagnostic: outcome.diagnostic(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ApplyReport<'a> {
    outcomes: Vec<OutcomeReport>,
    grid: &'a crate::application::GridView,
}

#[instrument(skip(cli, container))]
fn cmd_apply(cli: &Cli, container: &ServiceContainer, operations: &Path) -> CliResult<()> {
    let mut service = load_service(cli, container)?;
    let operations = service.read_operations(operations)?;
    let total = operations.len();
    let outcomes = service.apply_all(operations);
    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();

    let grid = &container.settings.grid;
    let view = service.grid_view(&grid.columns, grid.default_column);

    if cli.json {
        // stdout carries the report, failures go to the log on stderr
        for e in outcomes.iter().filter_map(|o| o.result.as_ref().err()) {
            diagnostics::report(e);
        }
        print_json(&ApplyReport {
            outcomes: outcomes.iter().map(OutcomeReport::from).collect(),
            grid: &view,
        })?;
    } else {
        for outcome in &outcomes {
            print_outcome(outcome);
        }
        output::header("Result");
        output::info(&view.render_text(container.settings.output.indent));
    }

    if failed > 0 {
        return Err(CliError::OperationsFailed { failed, total });
    }
    Ok(())
}

fn print_outcome(outcome: &OperationOutcome) {
    match &outcome.result {
        Ok(affected) if outcome.kind == OperationKind::Remove => {
            output::success(&format!(
                "{} {} ({})",
                outcome.kind,
                outcome.id,
                itertools::join(affected, ", ")
            ));
        }
        Ok(_) => output::success(&format!("{} {}", outcome.kind, outcome.id)),
        Err(e) => {
            let diagnostic = diagnostics::describe(e);
            let line = format!("{} {}: {}", outcome.kind, outcome.id, diagnostic.message);
            match diagnostic.severity {
                Severity::Warning => output::warning(&line),
                Severity::Error => output::failure(&line),
            }
        }
    }
}

#[instrument(skip(cli, container, sources))]
fn cmd_config(
    cli: &Cli,
    container: &ServiceContainer,
    sources: &ConfigSources,
    command: &ConfigCommands,
) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            let local = local_config_path(&local_dir(cli)?);
            match &sources.global {
                Some(global) => output::action("global", &describe_config_path(container, global)),
                None => output::action("global", &"(no config directory)"),
            }
            output::action("local", &describe_config_path(container, &local));
            Ok(())
        }
        ConfigCommands::Init { global } => {
            let path = if *global {
                sources
                    .global
                    .clone()
                    .ok_or_else(|| CliError::Usage("cannot determine global config directory".into()))?
            } else {
                local_config_path(&local_dir(cli)?)
            };
            if container.fs.exists(&path) {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    path.display()
                )));
            }
            container
                .fs
                .ensure_parent(&path)
                .with_path_context("create config directory", &path)?;
            container
                .fs
                .write(&path, &Settings::template())
                .with_path_context("write config", &path)?;
            output::action("Created", &path.display());
            Ok(())
        }
    }
}

fn describe_config_path(container: &ServiceContainer, path: &Path) -> String {
    if container.fs.exists(path) {
        path.display().to_string()
    } else {
        format!("{} (not found)", path.display())
    }
}
