//! Task type registry.

use crate::error::TaskError;
use crate::task::{CopyTask, CreateVersion, TaskRunner};
use std::collections::BTreeMap;

pub type TaskFactory = fn() -> Box<dyn TaskRunner>;

/// Maps task type names to factories. Registering a name again replaces it.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    factories: BTreeMap<String, TaskFactory>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `copy` and `createVersion`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(CopyTask::TYPE_NAME, copy_task);
        registry.register(CreateVersion::TYPE_NAME, create_version_task);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, factory: TaskFactory) {
        let name = name.into();
        tracing::debug!(name = %name, "Registering task type");
        self.factories.insert(name, factory);
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn TaskRunner>, TaskError> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| TaskError::UnknownTaskType(name.to_string()))
    }

    pub fn registered_names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }
}

fn copy_task() -> Box<dyn TaskRunner> {
    Box::new(CopyTask::new())
}

fn create_version_task() -> Box<dyn TaskRunner> {
    Box::new(CreateVersion::new())
}

impl std::fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("names", &self.registered_names())
            .finish()
    }
}
