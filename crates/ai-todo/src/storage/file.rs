//! File-based storage implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use super::traits::Storage;
use crate::entities::Task;
use crate::errors::{TodoError, TodoResult};

/// Default store file name
pub const DEFAULT_DATA_FILE: &str = "tasks.json";

/// Stores the task list as a pretty-printed JSON array.
pub struct FileStorage {
    /// Path to the JSON file
    path: PathBuf,
}

impl FileStorage {
    /// Create a new file storage instance
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl Storage for FileStorage {
    fn storage_type(&self) -> &'static str {
        "file"
    }

    /// A missing file is an empty list. An unreadable or corrupt file is
    /// logged and also treated as empty.
    async fn load_tasks(&self) -> TodoResult<Vec<Task>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No task file yet");
                return Ok(Vec::new());
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read task file");
                return Ok(Vec::new());
            }
        };

        match serde_json::from_str::<Vec<Task>>(&content) {
            Ok(tasks) => Ok(tasks),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Task file is not valid JSON, starting empty");
                Ok(Vec::new())
            }
        }
    }

    async fn save_tasks(&self, tasks: &[Task]) -> TodoResult<()> {
        // Ensure directory exists
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(tasks)?;
        fs::write(&self.path, content)
            .await
            .map_err(|e| TodoError::FileWriteError {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;
        debug!(path = %self.path.display(), count = tasks.len(), "Saved tasks");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::TaskPriority;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path().join("tasks.json"));
        assert!(storage.load_tasks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_creates_parent_and_reloads() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path().join("nested/dir/tasks.json"));

        let mut task = Task::new("Pay rent");
        task.priority = Some(TaskPriority::High);
        task.add_subtask("Check balance");
        storage.save_tasks(std::slice::from_ref(&task)).await.unwrap();

        let loaded = storage.load_tasks().await.unwrap();
        assert_eq!(loaded, vec![task]);
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tasks.json");
        std::fs::write(&path, "{ not json").unwrap();

        let storage = FileStorage::new(&path);
        assert!(storage.load_tasks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reads_legacy_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tasks.json");
        std::fs::write(
            &path,
            r#"[{
                "id": "0b7c",
                "title": "Finish MAD project report",
                "done": false,
                "created_at": "2024-09-30T18:22:10.512345",
                "due": null,
                "priority": "Medium",
                "tags": ["school"],
                "subtasks": [{"title": "Draft intro", "done": true}]
            }]"#,
        )
        .unwrap();

        let tasks = FileStorage::new(&path).load_tasks().await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].priority, Some(TaskPriority::Medium));
        assert_eq!(tasks[0].completed_subtasks(), 1);
    }
}
