//! Linear task pipelines.
//!
//! Each stage receives the previous stage's output, filtered by the stage's
//! filter types. The first failing stage stops the pipeline; nothing already
//! written by earlier stages is rolled back.

use crate::config::TaskConfig;
use crate::crawler::{filter_crawlers, Classifier, PathCrawler};
use crate::error::ApiError;
use crate::task::{TaskRegistry, TaskRunner};
use std::rc::Rc;
use tracing::info;

#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn TaskRunner>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the stages described by configuration, in order.
    pub fn from_config(configs: &[TaskConfig], registry: &TaskRegistry) -> Result<Self, ApiError> {
        let mut pipeline = Self::new();
        for config in configs {
            let mut stage = registry.create(&config.task_type)?;
            let task = stage.task_mut();
            for (name, value) in &config.options {
                task.set_option(name.clone(), value.clone());
            }
            if let Some(target) = &config.target {
                task.set_target(target.clone());
            }
            task.set_filter_types(config.filter_types.iter().cloned());
            pipeline.push(stage);
        }
        Ok(pipeline)
    }

    pub fn push(&mut self, stage: Box<dyn TaskRunner>) {
        self.stages.push(stage);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage. Returns the last stage's output, or `inputs` when empty.
    pub fn run(
        &mut self,
        inputs: Vec<Rc<PathCrawler>>,
        classifier: &Classifier,
    ) -> Result<Vec<Rc<PathCrawler>>, ApiError> {
        let mut current = inputs;
        for (index, stage) in self.stages.iter_mut().enumerate() {
            let type_name = stage.task().type_name().to_string();
            let filter_types: Vec<String> = stage.task().filter_types().to_vec();
            let filter_refs: Vec<&str> = filter_types.iter().map(String::as_str).collect();

            let selected = filter_crawlers(classifier.registry(), current, &filter_refs).map_err(|e| {
                ApiError::TaskExecution {
                    task: type_name.clone(),
                    source: Box::new(e.into()),
                }
            })?;
            info!(stage = index, task = %type_name, inputs = selected.len(), "Running task");

            current = stage.run(selected, classifier)?;
            info!(stage = index, task = %type_name, outputs = current.len(), "Task finished");
        }
        Ok(current)
    }
}
