//! Taskline CLI - pick the next task from a dependency-aware task list.

use clap::{CommandFactory, Parser};
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use taskline::{Config, NewTask, Priority, Status, Store, StoreError, Task, config, parse_id, scheduler};

mod cli;

use cli::{Cli, Command};

fn setup_logging() -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskline")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("taskline.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = Config::load(cli.config.as_deref())?
        .with_overrides(std::env::var_os(config::ENV_TASKS_FILE), cli.file.clone())
        .resolved(&cwd);

    info!("Using task file {}", config.tasks_file.display());
    Ok(config)
}

fn format_status(status: &Status) -> ColoredString {
    match status {
        Status::Pending => "pending".yellow(),
        Status::Done => "done".green(),
    }
}

fn format_priority(priority: &Priority) -> ColoredString {
    match priority {
        Priority::High => "high".red(),
        Priority::Medium => "medium".yellow(),
        Priority::Low => "low".blue(),
    }
}

/// Full record of a task, as printed by `show` and `next`.
fn render_task(task: &Task) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = writeln!(out, "{} {}: {}", "Task".bold(), task.id.to_string().cyan(), task.title);
    let _ = writeln!(out, "{}: {}", "Status".bold(), format_status(&task.status));
    let _ = writeln!(out, "{}: {}", "Priority".bold(), format_priority(&task.priority));
    let _ = writeln!(
        out,
        "{}: {}",
        "Dependencies".bold(),
        scheduler::format_dependencies(&task.dependencies)
    );
    let _ = writeln!(out, "\n{}:\n{}", "Description".bold(), task.description);
    let _ = writeln!(out, "\n{}:\n{}", "Details".bold(), task.details);
    let _ = writeln!(out, "\n{}:\n{}", "Test Strategy".bold(), task.test_strategy);
    out
}

fn print_task(task: &Task) {
    print!("{}", render_task(task));
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    match cli.command {
        Command::Init => {
            let store = Store::init(&config).context("Failed to initialize task file")?;
            println!("{} Task file ready at {}", "✓".green(), store.path().display());
        }

        Command::List => {
            let store = Store::open(&config).context("Failed to open store")?;
            let tasks = store.list().context("Failed to list tasks")?;

            if tasks.is_empty() {
                println!("{}", "No tasks found".dimmed());
            } else {
                for entry in scheduler::list(&tasks) {
                    println!(
                        "{} {}. {} ({}) {}",
                        entry.marker,
                        entry.task.id.to_string().cyan(),
                        entry.task.title,
                        format_priority(&entry.task.priority),
                        format!("[deps: {}]", entry.dependencies).dimmed()
                    );
                }
            }
        }

        Command::Show { id } => {
            let id = parse_id(id.as_deref()).map_err(StoreError::from)?;
            let store = Store::open(&config).context("Failed to open store")?;
            let task = store.get(id).context("Failed to get task")?;

            print_task(&task);
        }

        Command::SetStatus { id, status } => {
            let id = parse_id(id.as_deref()).map_err(StoreError::from)?;
            let status: Status = status
                .as_deref()
                .unwrap_or_default()
                .parse()
                .map_err(StoreError::from)?;

            let mut store = Store::open(&config).context("Failed to open store")?;
            let task = store.set_status(id, status)?;

            println!(
                "{} Task {} status updated to {}",
                "✓".green(),
                task.id.to_string().cyan(),
                format_status(&task.status)
            );
        }

        Command::Next => {
            let store = Store::open(&config).context("Failed to open store")?;

            match store.next().context("Failed to pick next task")? {
                Some(task) => {
                    println!("{} Next task to work on:", "→".blue());
                    print_task(&task);
                }
                None => {
                    println!(
                        "{}",
                        "No available tasks found. All tasks are either completed or blocked.".dimmed()
                    );
                }
            }
        }

        Command::Add {
            title,
            priority,
            description,
            details,
            test_strategy,
            deps,
        } => {
            let priority: Priority = priority.parse().map_err(StoreError::from)?;
            let dependencies = deps
                .unwrap_or_default()
                .iter()
                .map(|d| parse_id(Some(d.as_str())))
                .collect::<Result<Vec<_>, _>>()
                .map_err(StoreError::from)?;

            let mut new = NewTask::new(title, priority);
            new.description = description.unwrap_or_default();
            new.details = details.unwrap_or_default();
            new.test_strategy = test_strategy.unwrap_or_default();
            new.dependencies = dependencies;

            let mut store = Store::open(&config).context("Failed to open store")?;
            let task = store.create(new)?;

            println!("{} Created: {} {}", "✓".green(), task.id.to_string().cyan(), task.title);
        }

        Command::Ready => {
            let store = Store::open(&config).context("Failed to open store")?;
            let tasks = store.ready().context("Failed to get ready tasks")?;

            if tasks.is_empty() {
                println!("{}", "No ready tasks".dimmed());
            } else {
                println!("{} {} task(s) ready to work on:", "→".blue(), tasks.len());
                for task in tasks {
                    println!(
                        "  {} ({}) {}",
                        task.id.to_string().cyan(),
                        format_priority(&task.priority),
                        task.title
                    );
                }
            }
        }

        Command::Blocked => {
            let store = Store::open(&config).context("Failed to open store")?;
            let blocked = store.blocked().context("Failed to get blocked tasks")?;

            if blocked.is_empty() {
                println!("{}", "No blocked tasks".dimmed());
            } else {
                println!("{} {} task(s) blocked:", "⊘".red(), blocked.len());
                for (task, blockers) in blocked {
                    let waiting_on = blockers.iter().map(|b| b.to_string()).collect::<Vec<_>>().join(", ");
                    println!(
                        "  {} {} {}",
                        task.id.to_string().cyan(),
                        task.title,
                        format!("waiting on {}", waiting_on).dimmed()
                    );
                }
            }
        }

        Command::Validate => {
            let store = Store::open(&config).context("Failed to open store")?;
            let issues = store.validate().context("Failed to validate tasks")?;

            if issues.is_empty() {
                println!("{} No problems found", "✓".green());
            } else {
                for issue in &issues {
                    println!("{} {}", "✗".red(), issue);
                }
                eyre::bail!("{} problem(s) found in {}", issues.len(), store.path().display());
            }
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if cli::usage_only(e.kind()) => {
            Cli::command().print_help().context("Failed to print usage")?;
            return Ok(());
        }
        Err(e) => e.exit(),
    };
    info!("Command: {:?}", std::env::args().collect::<Vec<_>>());

    if let Err(e) = run(cli) {
        info!("Command failed: {:?}", e);
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
