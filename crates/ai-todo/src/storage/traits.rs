//! Storage trait definitions.

use async_trait::async_trait;

use crate::entities::Task;
use crate::errors::TodoResult;

/// Storage interface for task persistence.
///
/// The whole list is loaded and saved at once; callers serialise
/// read-modify-write cycles.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Get storage type identifier
    fn storage_type(&self) -> &'static str;

    /// Load all tasks in display order
    async fn load_tasks(&self) -> TodoResult<Vec<Task>>;

    /// Replace the stored list
    async fn save_tasks(&self, tasks: &[Task]) -> TodoResult<()>;
}
