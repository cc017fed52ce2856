//! Command dispatch: wires parsed arguments to the application layer.

use std::io::{self, Read};
use std::path::Path;

use clap::CommandFactory;
use tracing::{debug, info, instrument};

use crate::application::presets::Operation;
use crate::application::services::{Outcome, TreeSession};
use crate::application::{Aggregation, ApplicationError, Command, IoResultExt};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::UpdateMode;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Run {
            script,
            aggregation,
            eager,
            values,
        }) => {
            let settings = Settings::load(cli.config_dir.as_deref())?;
            cmd_run(&settings, script, *aggregation, *eager, values)
        }
        Some(Commands::Demo) => cmd_demo(),
        Some(Commands::Config { command }) => cmd_config(cli, command),
        Some(Commands::Completion { shell }) => {
            clap_complete::generate(*shell, &mut Cli::command(), "rangetree", &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage("no command given (see --help)".into())),
    }
}

fn read_script(script: &Path) -> CliResult<String> {
    if script == Path::new("-") {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .with_path_context("read script", script)?;
        Ok(source)
    } else {
        Ok(std::fs::read_to_string(script).with_path_context("read script", script)?)
    }
}

#[instrument(level = "debug", skip(settings, values))]
fn cmd_run(
    settings: &Settings,
    script: &Path,
    aggregation: Option<Aggregation>,
    eager: bool,
    values: &[i64],
) -> CliResult<()> {
    let aggregation = aggregation.unwrap_or(settings.aggregation);
    let mode = if eager {
        UpdateMode::Eager
    } else {
        settings.update_mode()
    };
    debug!("aggregation={aggregation} mode={mode}");

    let source = read_script(script)?;
    let mut session = if values.is_empty() {
        TreeSession::new(aggregation, mode)
    } else {
        TreeSession::with_values(aggregation, mode, values)?
    };

    for outcome in session.run_script(&source)? {
        match outcome {
            Outcome::Built { .. } | Outcome::Updated { .. } => info!("{outcome}"),
            _ => output::info(&outcome),
        }
    }
    Ok(())
}

/// Steps of the guided walkthrough: caption and the command it runs.
fn demo_steps() -> Vec<(&'static str, Command)> {
    vec![
        (
            "Start with ones (0 pads the tree and answers out-of-range queries):",
            Command::Build(vec![1; 9]),
        ),
        (
            "Updated from 0 to 2, add 1 (lazy):",
            Command::Update {
                left: 0,
                right: 2,
                operation: Operation::Add(1),
                mode: Some(UpdateMode::Lazy),
            },
        ),
        (
            "Updated from 1 to 7, times 3 (lazy, multiplication distributes over sums):",
            Command::Update {
                left: 1,
                right: 7,
                operation: Operation::Mul(3),
                mode: Some(UpdateMode::Lazy),
            },
        ),
        (
            "Updated from 5 to 7, cube (eager, a cube of a sum is not a sum of cubes):",
            Command::Update {
                left: 5,
                right: 7,
                operation: Operation::Pow(3),
                mode: Some(UpdateMode::Eager),
            },
        ),
        ("Query 4 to 8:", Command::Query { left: 4, right: 8 }),
        (
            "Query -5 to -2 (out of range):",
            Command::Query {
                left: -5,
                right: -2,
            },
        ),
        (
            "Query 0 to 1000 (past the padding):",
            Command::Query {
                left: 0,
                right: 1000,
            },
        ),
    ]
}

fn cmd_demo() -> CliResult<()> {
    let mut session = TreeSession::new(Aggregation::Sum, UpdateMode::Lazy);
    for (caption, command) in demo_steps() {
        output::header(caption);
        match session.execute(&command)? {
            value @ Outcome::Value(_) => output::info(&value),
            _ => output::info(&session.execute(&Command::Values)?),
        }
        println!();
    }
    Ok(())
}

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    let local_dir = match &cli.config_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()
            .map_err(|e| ApplicationError::OperationFailed {
                context: "determine current directory".into(),
                source: Box::new(e),
            })?,
    };

    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(Some(&local_dir))?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => print_config_path("global", &path),
                None => output::warning("no home directory, global config disabled"),
            }
            print_config_path("local", &local_config_path(&local_dir));
        }
        ConfigCommands::Init { global, force } => {
            let target = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("no home directory, cannot place global config".into())
                })?
            } else {
                local_config_path(&local_dir)
            };
            write_template(&target, *force)?;
            output::success(&format!("created {}", target.display()));
        }
    }
    Ok(())
}

fn print_config_path(label: &str, path: &Path) {
    let state = if path.exists() { "" } else { " (not found)" };
    output::action(label, &format!("{}{}", path.display(), state));
}

fn write_template(target: &Path, force: bool) -> CliResult<()> {
    if target.exists() && !force {
        return Err(CliError::InvalidArgs(format!(
            "{} already exists (use --force to overwrite)",
            target.display()
        )));
    }
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).with_path_context("create config dir", parent)?;
    }
    let template = Settings::default().to_toml()?;
    std::fs::write(target, template).with_path_context("write config", target)?;
    Ok(())
}
