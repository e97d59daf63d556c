//! Copy task.

use crate::crawler::{Classifier, PathCrawler};
use crate::error::{ApiError, TaskError};
use crate::task::{Task, TaskRunner};
use std::fs;
use std::io;
use std::path::Path;
use std::rc::Rc;
use tracing::debug;

/// Copies each bound file to its resolved target path.
///
/// Directories are recreated rather than copied recursively. Each produced
/// crawler keeps the source's recognizer type and context variables.
///
/// Options:
/// - `create_directories` (default `true`): create missing parent folders
pub struct CopyTask {
    task: Task,
}

impl CopyTask {
    pub const TYPE_NAME: &'static str = "copy";

    pub fn new() -> Self {
        let mut task = Task::new(Self::TYPE_NAME);
        task.set_option("create_directories", true);
        Self { task }
    }

    fn copy_one(&self, source: &PathCrawler, target: &str) -> Result<(), TaskError> {
        let io_error = |e: std::io::Error| TaskError::Io {
            path: target.to_string(),
            source: e,
        };

        if source.path_holder().is_directory() {
            return fs::create_dir_all(target).map_err(io_error);
        }
        if self.task.flag("create_directories")? {
            if let Some(parent) = Path::new(target).parent() {
                fs::create_dir_all(parent).map_err(io_error)?;
            }
        }
        if is_same_file(source.file_path(), target) {
            return Err(io_error(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("target is the source file {}", source.file_path()),
            )));
        }
        fs::copy(source.file_path(), target).map_err(io_error)?;
        Ok(())
    }
}

/// Both paths exist and resolve to the same file.
fn is_same_file(source: &str, target: &str) -> bool {
    match (fs::canonicalize(source), fs::canonicalize(target)) {
        (Ok(source), Ok(target)) => source == target,
        _ => false,
    }
}

impl Default for CopyTask {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRunner for CopyTask {
    fn task(&self) -> &Task {
        &self.task
    }

    fn task_mut(&mut self) -> &mut Task {
        &mut self.task
    }

    fn perform(&mut self, classifier: &Classifier) -> Result<Vec<Rc<PathCrawler>>, ApiError> {
        let mut outputs = Vec::with_capacity(self.task.path_crawlers().len());
        for source in self.task.path_crawlers() {
            let target = self.task.file_path(source)?;
            debug!(from = %source.file_path(), to = %target, "Copying");
            self.copy_one(source, &target)?;

            let output = classifier.create_from_path(&target, Some(source.type_name()), None)?;
            source.with_state(|state| {
                for name in state.context_var_names() {
                    if let Ok(value) = state.var(&name) {
                        output.set_var(name, value.clone(), true);
                    }
                }
            });
            outputs.push(output);
        }
        Ok(outputs)
    }
}
