//! Tasks domain facade.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::entities::{
    normalize_tags, PrioritySuggestion, Task, TaskDraft, TaskFilter, TaskStats, TaskUpdate,
};
use crate::errors::{TodoError, TodoResult};
use crate::storage::Storage;

/// Tasks domain facade providing high-level task operations.
///
/// Every mutation is a load, modify, save cycle held under one lock, so
/// concurrent requests cannot lose each other's writes.
pub struct TasksDomain {
    storage: Arc<dyn Storage>,
    write_lock: Mutex<()>,
}

impl TasksDomain {
    /// Create a new tasks domain
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    /// Storage backend identifier
    pub fn storage_type(&self) -> &'static str {
        self.storage.storage_type()
    }

    /// List tasks in insertion order, keeping those that match `filter`
    pub async fn list_tasks(&self, filter: &TaskFilter) -> TodoResult<Vec<Task>> {
        let tasks = self.storage.load_tasks().await?;
        Ok(tasks.into_iter().filter(|t| filter.matches(t)).collect())
    }

    /// Get a specific task by ID
    pub async fn get_task(&self, task_id: &str) -> TodoResult<Task> {
        self.storage
            .load_tasks()
            .await?
            .into_iter()
            .find(|t| t.id == task_id)
            .ok_or_else(|| not_found(task_id))
    }

    /// Resolve a full ID or a unique ID prefix, as typed on the command line
    pub async fn resolve_id(&self, prefix: &str) -> TodoResult<String> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Err(not_found(prefix));
        }
        let tasks = self.storage.load_tasks().await?;
        if let Some(task) = tasks.iter().find(|t| t.id == prefix) {
            return Ok(task.id.clone());
        }
        let mut matches = tasks.iter().filter(|t| t.id.starts_with(prefix));
        match (matches.next(), matches.next()) {
            (Some(task), None) => Ok(task.id.clone()),
            (Some(_), Some(_)) => Err(TodoError::AmbiguousId {
                prefix: prefix.to_string(),
            }),
            (None, _) => Err(not_found(prefix)),
        }
    }

    /// Counts over all tasks
    pub async fn stats(&self) -> TodoResult<TaskStats> {
        let tasks = self.storage.load_tasks().await?;
        Ok(TaskStats::from_tasks(&tasks))
    }

    /// Add a new task from a draft
    pub async fn add_task(&self, mut draft: TaskDraft) -> TodoResult<Task> {
        if draft.title.trim().is_empty() {
            return Err(TodoError::EmptyTitle);
        }
        draft.tags = normalize_tags(&draft.tags);
        let task = Task::from_draft(draft);

        let _guard = self.write_lock.lock().await;
        let mut tasks = self.storage.load_tasks().await?;
        tasks.push(task.clone());
        self.storage.save_tasks(&tasks).await?;

        info!(task_id = %task.id, title = %task.title, "Task added");
        Ok(task)
    }

    /// Apply a partial update
    pub async fn update_task(&self, task_id: &str, update: TaskUpdate) -> TodoResult<Task> {
        if update
            .title
            .as_deref()
            .is_some_and(|title| title.trim().is_empty())
        {
            return Err(TodoError::EmptyTitle);
        }

        self.modify(task_id, |task| {
            if let Some(title) = update.title {
                task.title = title.trim().to_string();
            }
            if let Some(due) = update.due {
                task.due = due;
            }
            if let Some(priority) = update.priority {
                task.priority = priority;
            }
            if let Some(tags) = update.tags {
                task.tags = normalize_tags(&tags);
            }
            Ok(())
        })
        .await
    }

    /// Remove a task
    pub async fn delete_task(&self, task_id: &str) -> TodoResult<Task> {
        let _guard = self.write_lock.lock().await;
        let mut tasks = self.storage.load_tasks().await?;
        let idx = tasks
            .iter()
            .position(|t| t.id == task_id)
            .ok_or_else(|| not_found(task_id))?;
        let removed = tasks.remove(idx);
        self.storage.save_tasks(&tasks).await?;

        info!(task_id = %removed.id, "Task deleted");
        Ok(removed)
    }

    /// Set the completion flag. No other field changes.
    pub async fn set_done(&self, task_id: &str, done: bool) -> TodoResult<Task> {
        self.modify(task_id, |task| {
            task.done = done;
            Ok(())
        })
        .await
    }

    /// Flip the completion flag.
    pub async fn toggle_done(&self, task_id: &str) -> TodoResult<Task> {
        self.modify(task_id, |task| {
            task.done = !task.done;
            Ok(())
        })
        .await
    }

    /// Mark every task done, returning how many changed
    pub async fn mark_all_done(&self) -> TodoResult<usize> {
        let _guard = self.write_lock.lock().await;
        let mut tasks = self.storage.load_tasks().await?;
        let mut changed = 0;
        for task in tasks.iter_mut().filter(|t| !t.done) {
            task.done = true;
            changed += 1;
        }
        if changed > 0 {
            self.storage.save_tasks(&tasks).await?;
        }
        Ok(changed)
    }

    /// Append one subtask
    pub async fn add_subtask(&self, task_id: &str, title: &str) -> TodoResult<Task> {
        if title.trim().is_empty() {
            return Err(TodoError::EmptyTitle);
        }
        self.add_subtasks(task_id, &[title.to_string()]).await
    }

    /// Append several subtasks; blank titles are skipped
    pub async fn add_subtasks(&self, task_id: &str, titles: &[String]) -> TodoResult<Task> {
        self.modify(task_id, |task| {
            for title in titles.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
                task.add_subtask(title);
            }
            Ok(())
        })
        .await
    }

    /// Set a subtask's completion flag
    pub async fn set_subtask_done(
        &self,
        task_id: &str,
        index: usize,
        done: bool,
    ) -> TodoResult<Task> {
        self.modify(task_id, |task| {
            let subtask = task
                .get_subtask_mut(index)
                .ok_or_else(|| subtask_not_found(task_id, index))?;
            subtask.done = done;
            Ok(())
        })
        .await
    }

    /// Rename a subtask and/or set its completion flag in one save
    pub async fn update_subtask(
        &self,
        task_id: &str,
        index: usize,
        title: Option<&str>,
        done: Option<bool>,
    ) -> TodoResult<Task> {
        if title.is_some_and(|t| t.trim().is_empty()) {
            return Err(TodoError::EmptyTitle);
        }
        self.modify(task_id, |task| {
            let subtask = task
                .get_subtask_mut(index)
                .ok_or_else(|| subtask_not_found(task_id, index))?;
            if let Some(title) = title {
                subtask.title = title.trim().to_string();
            }
            if let Some(done) = done {
                subtask.done = done;
            }
            Ok(())
        })
        .await
    }

    /// Remove a subtask
    pub async fn remove_subtask(&self, task_id: &str, index: usize) -> TodoResult<Task> {
        self.modify(task_id, |task| {
            task.remove_subtask(index)
                .map(|_| ())
                .ok_or_else(|| subtask_not_found(task_id, index))
        })
        .await
    }

    /// Apply priority suggestions to tasks with an exactly matching title.
    /// Returns how many tasks changed.
    pub async fn apply_priorities(&self, suggestions: &[PrioritySuggestion]) -> TodoResult<usize> {
        let _guard = self.write_lock.lock().await;
        let mut tasks = self.storage.load_tasks().await?;
        let mut changed = 0;
        for task in &mut tasks {
            // Later suggestions for the same title win
            let Some(suggestion) = suggestions.iter().rev().find(|s| s.title == task.title) else {
                continue;
            };
            if task.priority != Some(suggestion.priority) {
                task.priority = Some(suggestion.priority);
                changed += 1;
            }
        }
        if changed > 0 {
            self.storage.save_tasks(&tasks).await?;
        }
        info!(changed, "Applied priority suggestions");
        Ok(changed)
    }

    /// Load, change one task, save.
    async fn modify<F>(&self, task_id: &str, change: F) -> TodoResult<Task>
    where
        F: FnOnce(&mut Task) -> TodoResult<()>,
    {
        let _guard = self.write_lock.lock().await;
        let mut tasks = self.storage.load_tasks().await?;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| not_found(task_id))?;
        change(task)?;
        let updated = task.clone();
        self.storage.save_tasks(&tasks).await?;
        Ok(updated)
    }
}

fn not_found(task_id: &str) -> TodoError {
    TodoError::TaskNotFound {
        task_id: task_id.to_string(),
    }
}

fn subtask_not_found(task_id: &str, index: usize) -> TodoError {
    TodoError::SubtaskNotFound {
        task_id: task_id.to_string(),
        index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::TaskPriority;
    use crate::storage::{FileStorage, MemoryStorage};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn domain() -> TasksDomain {
        TasksDomain::new(Arc::new(MemoryStorage::new()))
    }

    fn full_draft() -> TaskDraft {
        TaskDraft {
            title: "Draft report".to_string(),
            due: NaiveDate::from_ymd_opt(2025, 6, 6),
            priority: Some(TaskPriority::High),
            tags: ["project".to_string(), "work".to_string()].into(),
        }
    }

    #[tokio::test]
    async fn test_add_and_list_tasks() {
        let domain = domain();
        domain.add_task(TaskDraft::from_text("Task 1")).await.unwrap();
        domain.add_task(TaskDraft::from_text("Task 2")).await.unwrap();

        let tasks = domain.list_tasks(&TaskFilter::default()).await.unwrap();
        let titles: Vec<_> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["Task 1", "Task 2"]);
    }

    #[tokio::test]
    async fn test_resolve_id_prefix() {
        let domain = domain();
        let task = domain.add_task(TaskDraft::from_text("Only")).await.unwrap();

        assert_eq!(domain.resolve_id(&task.id[..8]).await.unwrap(), task.id);
        assert_eq!(domain.resolve_id(&task.id).await.unwrap(), task.id);
        assert!(matches!(
            domain.resolve_id("zzzz").await,
            Err(TodoError::TaskNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_blank_title_rejected() {
        let domain = domain();
        let result = domain.add_task(TaskDraft::from_text("   ")).await;
        assert!(matches!(result, Err(TodoError::EmptyTitle)));
    }

    #[tokio::test]
    async fn test_mark_complete_keeps_other_fields() {
        let domain = domain();
        let task = domain.add_task(full_draft()).await.unwrap();

        let done = domain.set_done(&task.id, true).await.unwrap();
        assert!(done.done);
        assert_eq!(
            Task {
                done: false,
                ..done.clone()
            },
            task
        );

        let reopened = domain.toggle_done(&task.id).await.unwrap();
        assert_eq!(reopened, task);
    }

    #[tokio::test]
    async fn test_update_clears_and_sets() {
        let domain = domain();
        let task = domain.add_task(full_draft()).await.unwrap();

        let update = TaskUpdate {
            title: Some("  Final report ".to_string()),
            due: Some(None),
            priority: Some(Some(TaskPriority::Low)),
            tags: None,
        };
        let updated = domain.update_task(&task.id, update).await.unwrap();
        assert_eq!(updated.title, "Final report");
        assert_eq!(updated.due, None);
        assert_eq!(updated.priority, Some(TaskPriority::Low));
        assert_eq!(updated.tags, task.tags);
    }

    #[tokio::test]
    async fn test_list_applies_filter_in_order() {
        let mut report = Task::new("Report");
        report.priority = Some(TaskPriority::High);
        report.tags.insert("work".to_string());
        let mut groceries = Task::new("Groceries");
        groceries.done = true;
        groceries.tags.insert("home".to_string());
        let mut slides = Task::new("Slides");
        slides.priority = Some(TaskPriority::Medium);
        slides.tags.insert("work".to_string());

        let domain = TasksDomain::new(Arc::new(MemoryStorage::with_tasks(vec![
            report, groceries, slides,
        ])));

        let work = TaskFilter {
            tag: Some("work".to_string()),
            ..TaskFilter::default()
        };
        let titles: Vec<_> = domain
            .list_tasks(&work)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, ["Report", "Slides"]);

        let open = TaskFilter {
            open_only: true,
            ..TaskFilter::default()
        };
        assert_eq!(domain.list_tasks(&open).await.unwrap().len(), 2);
        assert_eq!(domain.stats().await.unwrap().done, 1);
    }

    #[tokio::test]
    async fn test_delete_unknown_task() {
        let domain = domain();
        let err = domain.delete_task("missing").await.unwrap_err();
        assert!(matches!(err, TodoError::TaskNotFound { .. }));
    }

    #[tokio::test]
    async fn test_subtasks() {
        let domain = domain();
        let task = domain.add_task(TaskDraft::from_text("Move house")).await.unwrap();

        let titles = vec!["Book van".to_string(), "  ".to_string(), "Pack".to_string()];
        let task = domain.add_subtasks(&task.id, &titles).await.unwrap();
        assert_eq!(task.subtasks.len(), 2);

        let task = domain.set_subtask_done(&task.id, 1, true).await.unwrap();
        assert!(task.subtasks[1].done);

        let err = domain.set_subtask_done(&task.id, 5, true).await.unwrap_err();
        assert!(matches!(err, TodoError::SubtaskNotFound { index: 5, .. }));

        let task = domain.remove_subtask(&task.id, 0).await.unwrap();
        assert_eq!(task.subtasks[0].title, "Pack");
    }

    #[tokio::test]
    async fn test_update_subtask_title_and_done_together() {
        let domain = domain();
        let task = domain.add_task(TaskDraft::from_text("Trip")).await.unwrap();
        let task = domain.add_subtask(&task.id, "Book hotle").await.unwrap();

        let task = domain
            .update_subtask(&task.id, 0, Some(" Book hotel "), Some(true))
            .await
            .unwrap();
        assert_eq!(task.subtasks[0].title, "Book hotel");
        assert!(task.subtasks[0].done);

        let task = domain.update_subtask(&task.id, 0, None, Some(false)).await.unwrap();
        assert_eq!(task.subtasks[0].title, "Book hotel");
        assert!(!task.subtasks[0].done);

        let err = domain
            .update_subtask(&task.id, 0, Some("  "), Some(true))
            .await
            .unwrap_err();
        assert!(matches!(err, TodoError::EmptyTitle));
        let err = domain
            .update_subtask(&task.id, 3, Some("Pack"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, TodoError::SubtaskNotFound { index: 3, .. }));
        assert!(!domain.get_task(&task.id).await.unwrap().subtasks[0].done);
    }

    #[tokio::test]
    async fn test_tags_are_normalised_on_add_and_update() {
        let domain = domain();
        let draft = TaskDraft {
            tags: ["#work".to_string(), "  ".to_string(), " home ".to_string()].into(),
            ..TaskDraft::from_text("Tidy desk")
        };
        let task = domain.add_task(draft).await.unwrap();
        assert_eq!(
            task.tags.iter().map(String::as_str).collect::<Vec<_>>(),
            ["home", "work"]
        );

        let update = TaskUpdate {
            tags: Some(["#errand".to_string(), "errand".to_string(), String::new()].into()),
            ..TaskUpdate::default()
        };
        let task = domain.update_task(&task.id, update).await.unwrap();
        assert_eq!(task.tags.iter().map(String::as_str).collect::<Vec<_>>(), ["errand"]);
    }

    #[tokio::test]
    async fn test_mark_all_done() {
        let domain = domain();
        let first = domain.add_task(TaskDraft::from_text("One")).await.unwrap();
        domain.add_task(TaskDraft::from_text("Two")).await.unwrap();
        domain.set_done(&first.id, true).await.unwrap();

        assert_eq!(domain.mark_all_done().await.unwrap(), 1);
        let stats = domain.stats().await.unwrap();
        assert_eq!(stats, TaskStats { total: 2, open: 0, done: 2 });
    }

    #[tokio::test]
    async fn test_apply_priorities_matches_titles() {
        let domain = domain();
        domain.add_task(TaskDraft::from_text("Taxes")).await.unwrap();
        domain.add_task(TaskDraft::from_text("Laundry")).await.unwrap();

        let suggestions = vec![
            PrioritySuggestion {
                title: "Taxes".to_string(),
                priority: TaskPriority::High,
            },
            PrioritySuggestion {
                title: "Unknown".to_string(),
                priority: TaskPriority::Low,
            },
        ];
        assert_eq!(domain.apply_priorities(&suggestions).await.unwrap(), 1);

        let tasks = domain.list_tasks(&TaskFilter::default()).await.unwrap();
        assert_eq!(tasks[0].priority, Some(TaskPriority::High));
        assert_eq!(tasks[1].priority, None);
    }

    #[tokio::test]
    async fn test_loose_legacy_record_survives_a_save() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tasks.json");
        std::fs::write(
            &path,
            r#"[
                {"id": "a1", "title": "Pay rent", "created_at": "2024-05-01T10:00:00Z"},
                {"id": "b2", "title": "Plan launch", "created_at": "2024-05-01T10:00:00Z",
                 "priority": "Someday", "tags": "work, project"}
            ]"#,
        )
        .unwrap();

        let domain = TasksDomain::new(Arc::new(FileStorage::new(&path)));
        domain.add_task(TaskDraft::from_text("New one")).await.unwrap();

        let reloaded = TasksDomain::new(Arc::new(FileStorage::new(&path)));
        let tasks = reloaded.list_tasks(&TaskFilter::default()).await.unwrap();
        let titles: Vec<_> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["Pay rent", "Plan launch", "New one"]);
        assert_eq!(tasks[1].priority, None);
        assert!(tasks[1].has_tag("project"));
    }

    #[tokio::test]
    async fn test_persists_through_file_storage() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tasks.json");

        let task = {
            let domain = TasksDomain::new(Arc::new(FileStorage::new(&path)));
            domain.add_task(full_draft()).await.unwrap()
        };

        let domain = TasksDomain::new(Arc::new(FileStorage::new(&path)));
        assert_eq!(domain.get_task(&task.id).await.unwrap(), task);
    }
}
