//! Terminal output for the command line.
//!
//! This module uses println! for CLI output.

#![allow(clippy::disallowed_macros)]

use chrono::NaiveDate;
use colored::Colorize;
use comfy_table::{Cell, Color, ContentArrangement, Table};

use crate::entities::{Task, TaskPriority, TaskStats};

/// Length of the ID prefix shown in tables
pub const SHORT_ID_LEN: usize = 8;

/// Leading characters of a task ID
pub fn short_id(id: &str) -> &str {
    id.get(..SHORT_ID_LEN).unwrap_or(id)
}

/// Get colored priority string
pub fn priority_colored(priority: Option<TaskPriority>) -> String {
    match priority {
        None => "-".dimmed().to_string(),
        Some(TaskPriority::Low) => "low".green().to_string(),
        Some(TaskPriority::Medium) => "medium".yellow().to_string(),
        Some(TaskPriority::High) => "high".red().bold().to_string(),
    }
}

fn done_marker(done: bool) -> &'static str {
    if done {
        "✓"
    } else {
        "○"
    }
}

/// Create a table for displaying tasks
pub fn task_table(tasks: &[Task], show_subtasks: bool, today: NaiveDate) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::Cyan),
        Cell::new("").fg(Color::Cyan),
        Cell::new("Title").fg(Color::Cyan),
        Cell::new("Priority").fg(Color::Cyan),
        Cell::new("Due").fg(Color::Cyan),
        Cell::new("Tags").fg(Color::Cyan),
    ]);

    for task in tasks {
        let priority_color = match task.priority {
            None => Color::DarkGrey,
            Some(TaskPriority::Low) => Color::Green,
            Some(TaskPriority::Medium) => Color::Yellow,
            Some(TaskPriority::High) => Color::Red,
        };

        let due_cell = match task.due {
            None => Cell::new("-").fg(Color::DarkGrey),
            Some(due) if !task.done && due < today => Cell::new(due).fg(Color::Red),
            Some(due) => Cell::new(due),
        };

        let tags = if task.tags.is_empty() {
            "-".to_string()
        } else {
            task.tags
                .iter()
                .map(|t| format!("#{t}"))
                .collect::<Vec<_>>()
                .join(" ")
        };

        let title = if task.subtasks.is_empty() {
            task.title.clone()
        } else {
            format!(
                "{} ({}/{})",
                task.title,
                task.completed_subtasks(),
                task.subtasks.len()
            )
        };

        table.add_row(vec![
            Cell::new(short_id(&task.id)),
            Cell::new(done_marker(task.done)).fg(if task.done {
                Color::Green
            } else {
                Color::White
            }),
            Cell::new(title),
            Cell::new(task.priority.map_or("-", TaskPriority::label)).fg(priority_color),
            due_cell,
            Cell::new(tags),
        ]);

        if show_subtasks {
            for (index, subtask) in task.subtasks.iter().enumerate() {
                table.add_row(vec![
                    Cell::new(format!("  .{index}")).fg(Color::DarkGrey),
                    Cell::new(done_marker(subtask.done)).fg(Color::DarkGrey),
                    Cell::new(format!("  └─ {}", subtask.title)).fg(Color::DarkGrey),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                ]);
            }
        }
    }

    table
}

/// Display task details in a formatted way
pub fn display_task_details(task: &Task) {
    println!("{}", "═".repeat(60).dimmed());
    println!(
        "{} {} {}",
        "Task".cyan().bold(),
        short_id(&task.id).cyan().bold(),
        if task.done {
            "[done]".green()
        } else {
            "[open]".yellow()
        }
    );
    println!("{}", "═".repeat(60).dimmed());
    println!();

    println!("{}: {}", "Title".bold(), task.title);
    println!("{}: {}", "ID".bold(), task.id);
    println!("{}: {}", "Priority".bold(), priority_colored(task.priority));
    if let Some(due) = task.due {
        println!("{}: {}", "Due".bold(), due);
    }
    if !task.tags.is_empty() {
        println!(
            "{}: {}",
            "Tags".bold(),
            task.tags.iter().cloned().collect::<Vec<_>>().join(", ")
        );
    }
    println!(
        "{}: {}",
        "Created".bold(),
        task.created_at.format("%Y-%m-%d %H:%M")
    );

    if !task.subtasks.is_empty() {
        println!();
        println!(
            "{} ({}/{})",
            "Subtasks".bold().underline(),
            task.completed_subtasks(),
            task.subtasks.len()
        );
        for (index, subtask) in task.subtasks.iter().enumerate() {
            let marker = if subtask.done {
                "✓".green()
            } else {
                "○".dimmed()
            };
            println!("  {marker} {index}. {}", subtask.title);
        }
    }

    println!();
}

/// One-line summary of task counts
pub fn stats_line(stats: &TaskStats) -> String {
    format!(
        "{} open, {} done, {} total",
        stats.open.to_string().yellow(),
        stats.done.to_string().green(),
        stats.total
    )
}

/// Print success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn test_table_lists_subtasks() {
        let mut task = Task::new("Plan party");
        task.add_subtask("Book venue");
        task.tags.insert("home".to_string());
        let today = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();

        let rendered = task_table(&[task], true, today).to_string();
        assert!(rendered.contains("Plan party (0/1)"));
        assert!(rendered.contains("Book venue"));
        assert!(rendered.contains("#home"));
    }
}
