//! AI To-Do CLI - personal task tracking with optional AI enrichment.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::disallowed_macros)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use ai_todo::config::{Config, ProviderKind};
use ai_todo::domain::{today, EnrichmentAdapter, TasksDomain};
use ai_todo::entities::{parse_due, parse_tags, TaskDraft, TaskFilter, TaskPriority, TaskUpdate};
use ai_todo::errors::TodoError;
use ai_todo::server::{run_server, AppState};
use ai_todo::storage::{FileStorage, MemoryStorage, Storage};
use ai_todo::ui;

#[derive(Parser)]
#[command(name = "ai-todo")]
#[command(about = "Personal to-do list with optional AI task enrichment", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Task store file (default: tasks.json, or $AI_TODO_DATA_FILE)
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    /// Keep tasks in memory only (nothing is written)
    #[arg(long, global = true)]
    in_memory: bool,

    /// AI provider (gemini, openai)
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Model override
    #[arg(long, global = true)]
    model: Option<String>,

    /// Never call the AI provider
    #[arg(long, global = true)]
    no_ai: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the web page and JSON API
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List tasks
    List {
        /// Hide completed tasks
        #[arg(long)]
        open: bool,

        /// Keep only these priorities (comma-separated)
        #[arg(short, long)]
        priority: Option<String>,

        /// Require a tag
        #[arg(short, long)]
        tag: Option<String>,

        /// Include subtasks
        #[arg(long)]
        with_subtasks: bool,
    },

    /// Add a task exactly as typed
    Add {
        /// Task title
        #[arg(required = true)]
        title: Vec<String>,

        /// Due date (YYYY-MM-DD, today, tomorrow, friday, ...)
        #[arg(short, long)]
        due: Option<String>,

        /// Priority (low, medium, high)
        #[arg(short, long)]
        priority: Option<String>,

        /// Tags (comma-separated)
        #[arg(short, long)]
        tags: Option<String>,
    },

    /// Add a task from free text, letting the AI fill in the fields
    AiAdd {
        /// Free-text description
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Show details of a task
    Show {
        /// Task ID or unique prefix
        id: String,
    },

    /// Mark a task done
    Done {
        /// Task ID or unique prefix
        id: String,
    },

    /// Mark a task open again
    Undone {
        /// Task ID or unique prefix
        id: String,
    },

    /// Change task fields
    Edit {
        /// Task ID or unique prefix
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New due date ("none" clears it)
        #[arg(short, long)]
        due: Option<String>,

        /// New priority ("none" clears it)
        #[arg(short, long)]
        priority: Option<String>,

        /// Replace tags (comma-separated, empty clears them)
        #[arg(short, long)]
        tags: Option<String>,
    },

    /// Remove a task
    Remove {
        /// Task ID or unique prefix
        id: String,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Manage subtasks
    #[command(subcommand)]
    Subtask(SubtaskCommands),

    /// Let the AI split a task into subtasks
    Breakdown {
        /// Task ID or unique prefix
        id: String,
    },

    /// Let the AI reassign priorities across all tasks
    Prioritize,

    /// Mark every task done
    CompleteAll,

    /// Show storage and AI status
    Status,
}

#[derive(Subcommand)]
enum SubtaskCommands {
    /// Append a subtask
    Add {
        /// Parent task ID or unique prefix
        id: String,

        /// Subtask title
        #[arg(required = true)]
        title: Vec<String>,
    },

    /// Mark a subtask done
    Done {
        /// Parent task ID or unique prefix
        id: String,

        /// Subtask position (from 0)
        index: usize,
    },

    /// Mark a subtask open again
    Undone {
        /// Parent task ID or unique prefix
        id: String,

        /// Subtask position (from 0)
        index: usize,
    },

    /// Remove a subtask
    Remove {
        /// Parent task ID or unique prefix
        id: String,

        /// Subtask position (from 0)
        index: usize,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // The server logs requests; one-shot commands stay quiet
    let level = if matches!(cli.command, Commands::Serve { .. }) {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    if let Err(e) = run(cli).await {
        ui::print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::default();
    if let Some(path) = &cli.data_file {
        config.data_file.clone_from(path);
    }
    if let Some(provider) = &cli.provider {
        let kind: ProviderKind = provider.parse()?;
        let model = config.ai.model.take();
        let timeout = config.ai.timeout;
        config.ai = ai_todo::config::AiConfig::for_provider(kind);
        config.ai.model = model;
        config.ai.timeout = timeout;
    }
    if let Some(model) = &cli.model {
        config.ai.model = Some(model.clone());
    }
    Ok(config)
}

fn parse_priority_arg(raw: &str) -> Result<Option<TaskPriority>, TodoError> {
    match raw.trim().to_lowercase().as_str() {
        "" | "none" | "clear" => Ok(None),
        other => other.parse().map(Some),
    }
}

fn parse_due_arg(raw: &str) -> Result<Option<chrono::NaiveDate>, TodoError> {
    match raw.trim().to_lowercase().as_str() {
        "" | "none" | "clear" => Ok(None),
        _ => parse_due(raw, today())
            .map(Some)
            .ok_or_else(|| TodoError::InvalidDate {
                value: raw.to_string(),
            }),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    let storage: Arc<dyn Storage> = if cli.in_memory {
        Arc::new(MemoryStorage::new())
    } else {
        Arc::new(FileStorage::new(&config.data_file))
    };
    let tasks_domain = TasksDomain::new(storage);
    let enrichment = if cli.no_ai {
        EnrichmentAdapter::disabled()
    } else {
        config.ai.build_adapter()
    };

    match cli.command {
        Commands::Serve { host, port } => {
            let mut server = config.server.clone();
            if let Some(host) = host {
                server.host = host;
            }
            if let Some(port) = port {
                server.port = port;
            }
            if !enrichment.is_available() {
                ui::print_warning(&format!(
                    "AI enrichment disabled{}",
                    enrichment
                        .key_env_var()
                        .map(|var| format!(": set {var} to enable it"))
                        .unwrap_or_default()
                ));
            }
            let state = Arc::new(AppState::new(tasks_domain, enrichment)?);
            ui::print_info(&format!("Serving on http://{}", server.bind_addr()));
            run_server(state, &server.bind_addr()).await?;
        }

        Commands::List {
            open,
            priority,
            tag,
            with_subtasks,
        } => {
            let priorities = priority
                .as_deref()
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::parse)
                .collect::<Result<Vec<TaskPriority>, _>>()?;
            let filter = TaskFilter {
                open_only: open,
                priorities,
                tag,
            };

            let tasks = tasks_domain.list_tasks(&filter).await?;
            if tasks.is_empty() {
                ui::print_info("No tasks found");
            } else {
                let table = ui::task_table(&tasks, with_subtasks, today());
                println!("{table}");
                println!();
                ui::print_info(&ui::stats_line(&tasks_domain.stats().await?));
            }
        }

        Commands::Add {
            title,
            due,
            priority,
            tags,
        } => {
            let draft = TaskDraft {
                title: title.join(" "),
                due: due.as_deref().map(parse_due_arg).transpose()?.flatten(),
                priority: priority
                    .as_deref()
                    .map(parse_priority_arg)
                    .transpose()?
                    .flatten(),
                tags: tags.as_deref().map(parse_tags).unwrap_or_default(),
            };
            let task = tasks_domain.add_task(draft).await?;
            ui::print_success(&format!(
                "Added task {}: {}",
                ui::short_id(&task.id),
                task.title
            ));
        }

        Commands::AiAdd { text } => {
            let text = text.join(" ");
            let (draft, failure) = if enrichment.is_available() {
                enrichment.parse_or_fallback(&text, today()).await
            } else {
                (TaskDraft::from_text(text.as_str()), None)
            };
            if !enrichment.is_available() {
                ui::print_warning("AI enrichment unavailable, adding the text as typed");
            } else if let Some(err) = failure {
                ui::print_warning(&format!("{err}; adding the text as typed"));
            }
            let task = tasks_domain.add_task(draft).await?;
            ui::print_success(&format!("Added task {}", ui::short_id(&task.id)));
            ui::display_task_details(&task);
        }

        Commands::Show { id } => {
            let id = tasks_domain.resolve_id(&id).await?;
            let task = tasks_domain.get_task(&id).await?;
            ui::display_task_details(&task);
        }

        Commands::Done { id } => {
            let id = tasks_domain.resolve_id(&id).await?;
            let task = tasks_domain.set_done(&id, true).await?;
            ui::print_success(&format!("Done: {}", task.title));
        }

        Commands::Undone { id } => {
            let id = tasks_domain.resolve_id(&id).await?;
            let task = tasks_domain.set_done(&id, false).await?;
            ui::print_success(&format!("Reopened: {}", task.title));
        }

        Commands::Edit {
            id,
            title,
            due,
            priority,
            tags,
        } => {
            let update = TaskUpdate {
                title,
                due: due.as_deref().map(parse_due_arg).transpose()?,
                priority: priority.as_deref().map(parse_priority_arg).transpose()?,
                tags: tags.as_deref().map(parse_tags),
            };
            if update.is_empty() {
                ui::print_warning("Nothing to change");
                return Ok(());
            }
            let id = tasks_domain.resolve_id(&id).await?;
            let task = tasks_domain.update_task(&id, update).await?;
            ui::print_success(&format!("Updated task {}", ui::short_id(&task.id)));
            ui::display_task_details(&task);
        }

        Commands::Remove { id, yes } => {
            let id = tasks_domain.resolve_id(&id).await?;
            if !yes {
                ui::print_warning(&format!(
                    "About to delete task {}. Use --yes to confirm.",
                    ui::short_id(&id)
                ));
                return Ok(());
            }
            let task = tasks_domain.delete_task(&id).await?;
            ui::print_success(&format!("Removed task: {}", task.title));
        }

        Commands::Subtask(subtask_cmd) => match subtask_cmd {
            SubtaskCommands::Add { id, title } => {
                let id = tasks_domain.resolve_id(&id).await?;
                let task = tasks_domain.add_subtask(&id, &title.join(" ")).await?;
                ui::print_success(&format!(
                    "Added subtask {} to {}",
                    task.subtasks.len() - 1,
                    task.title
                ));
            }
            SubtaskCommands::Done { id, index } => {
                let id = tasks_domain.resolve_id(&id).await?;
                tasks_domain.set_subtask_done(&id, index, true).await?;
                ui::print_success(&format!("Subtask {index} done"));
            }
            SubtaskCommands::Undone { id, index } => {
                let id = tasks_domain.resolve_id(&id).await?;
                tasks_domain.set_subtask_done(&id, index, false).await?;
                ui::print_success(&format!("Subtask {index} reopened"));
            }
            SubtaskCommands::Remove { id, index } => {
                let id = tasks_domain.resolve_id(&id).await?;
                tasks_domain.remove_subtask(&id, index).await?;
                ui::print_success(&format!("Removed subtask {index}"));
            }
        },

        Commands::Breakdown { id } => {
            let id = tasks_domain.resolve_id(&id).await?;
            let task = tasks_domain.get_task(&id).await?;
            if !enrichment.is_available() {
                ui::print_warning("AI enrichment unavailable, no subtasks generated");
                return Ok(());
            }
            match enrichment.breakdown(&task.title).await {
                Ok(subtasks) => {
                    let task = tasks_domain.add_subtasks(&id, &subtasks).await?;
                    ui::print_success(&format!("Added {} subtask(s)", subtasks.len()));
                    ui::display_task_details(&task);
                }
                Err(err) => ui::print_warning(&format!("{err}; no subtasks added")),
            }
        }

        Commands::Prioritize => {
            if !enrichment.is_available() {
                ui::print_warning("AI enrichment unavailable, priorities unchanged");
                return Ok(());
            }
            let tasks = tasks_domain.list_tasks(&TaskFilter::default()).await?;
            match enrichment.prioritize(&tasks).await {
                Ok(suggestions) => {
                    let changed = tasks_domain.apply_priorities(&suggestions).await?;
                    ui::print_success(&format!("Updated priorities on {changed} task(s)"));
                }
                Err(err) => ui::print_warning(&format!("{err}; priorities unchanged")),
            }
        }

        Commands::CompleteAll => {
            let changed = tasks_domain.mark_all_done().await?;
            ui::print_success(&format!("Marked {changed} task(s) done"));
        }

        Commands::Status => {
            let stats = tasks_domain.stats().await?;
            println!("{}: {}", "Tasks".bold(), ui::stats_line(&stats));
            let storage = if cli.in_memory {
                "memory".to_string()
            } else {
                config.data_file.display().to_string()
            };
            println!("{}: {}", "Storage".bold(), storage);
            if enrichment.is_available() {
                println!(
                    "{}: {} ({})",
                    "AI".bold(),
                    "enabled".green(),
                    format!(
                        "{} / {}",
                        enrichment.provider_name().unwrap_or("-"),
                        enrichment.model()
                    )
                    .dimmed()
                );
            } else {
                println!("{}: {}", "AI".bold(), "disabled".yellow());
                if let Some(var) = enrichment.key_env_var() {
                    ui::print_info(&format!("Set {var} to enable AI enrichment"));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_priority_arg() {
        assert_eq!(parse_priority_arg("High").unwrap(), Some(TaskPriority::High));
        assert_eq!(parse_priority_arg("none").unwrap(), None);
        assert!(parse_priority_arg("soon").is_err());
    }

    #[test]
    fn test_due_arg() {
        assert_eq!(parse_due_arg("clear").unwrap(), None);
        assert_eq!(
            parse_due_arg("2025-01-31").unwrap(),
            chrono::NaiveDate::from_ymd_opt(2025, 1, 31)
        );
        assert!(matches!(
            parse_due_arg("someday"),
            Err(TodoError::InvalidDate { .. })
        ));
    }
}
