//! In-process storage.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::traits::Storage;
use crate::entities::Task;
use crate::errors::TodoResult;

/// Keeps tasks in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tasks: RwLock<Vec<Task>>,
}

impl MemoryStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with tasks
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: RwLock::new(tasks),
        }
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    fn storage_type(&self) -> &'static str {
        "memory"
    }

    async fn load_tasks(&self) -> TodoResult<Vec<Task>> {
        Ok(self.tasks.read().await.clone())
    }

    async fn save_tasks(&self, tasks: &[Task]) -> TodoResult<()> {
        *self.tasks.write().await = tasks.to_vec();
        Ok(())
    }
}
