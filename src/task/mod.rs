//! Tasks
//!
//! A task is a configurable pipeline stage: it is bound to a set of path
//! crawlers, resolves target paths through a template, and produces zero or
//! more new crawlers. [`Pipeline`] chains tasks, feeding each stage's output
//! to the next.

pub mod copy;
pub mod pipeline;
pub mod registry;
pub mod template;
pub mod version;

pub use copy::CopyTask;
pub use pipeline::Pipeline;
pub use registry::TaskRegistry;
pub use template::{TemplateResolver, VarTemplate};
pub use version::CreateVersion;

use crate::crawler::{Classifier, PathCrawler};
use crate::error::{ApiError, TaskError};
use crate::types::{Value, VarMap};
use std::rc::Rc;
use std::sync::Arc;

/// State shared by every task: options, bound crawlers, target template.
pub struct Task {
    type_name: String,
    options: VarMap,
    crawlers: Vec<Rc<PathCrawler>>,
    target: Option<String>,
    filter_types: Vec<String>,
    resolver: Arc<dyn TemplateResolver>,
}

impl Task {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            options: VarMap::new(),
            crawlers: Vec::new(),
            target: None,
            filter_types: Vec::new(),
            resolver: Arc::new(VarTemplate),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn TemplateResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn set_resolver(&mut self, resolver: Arc<dyn TemplateResolver>) {
        self.resolver = resolver;
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn set_option(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.options.insert(name.into(), value.into());
    }

    pub fn option(&self, name: &str) -> Result<&Value, TaskError> {
        self.options.get(name).ok_or_else(|| TaskError::UnknownOption {
            task: self.type_name.clone(),
            option: name.to_string(),
        })
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    pub fn option_names(&self) -> Vec<String> {
        self.options.keys().cloned().collect()
    }

    /// Boolean option; non-boolean values count as `false`.
    pub fn flag(&self, name: &str) -> Result<bool, TaskError> {
        Ok(self.option(name)?.as_bool().unwrap_or(false))
    }

    pub fn set_target(&mut self, template: impl Into<String>) {
        self.target = Some(template.into());
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn set_filter_types<I, S>(&mut self, filter_types: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter_types = filter_types.into_iter().map(Into::into).collect();
    }

    pub fn filter_types(&self) -> &[String] {
        &self.filter_types
    }

    /// Bind the crawlers this invocation operates on, replacing any previous binding.
    pub fn bind(&mut self, crawlers: Vec<Rc<PathCrawler>>) {
        self.crawlers = crawlers;
    }

    pub fn add_crawler(&mut self, crawler: Rc<PathCrawler>) {
        self.crawlers.push(crawler);
    }

    pub fn path_crawlers(&self) -> &[Rc<PathCrawler>] {
        &self.crawlers
    }

    /// Resolve the target template against `crawler`'s variables.
    pub fn file_path(&self, crawler: &PathCrawler) -> Result<String, TaskError> {
        let template = self.target.as_deref().ok_or_else(|| TaskError::MissingTarget {
            task: self.type_name.clone(),
        })?;
        crawler.with_state(|state| {
            self.resolver
                .resolve(template, state.vars())
                .map_err(|source| TaskError::Template {
                    template: template.to_string(),
                    source,
                })
        })
    }
}

/// A runnable task.
pub trait TaskRunner {
    fn task(&self) -> &Task;

    fn task_mut(&mut self) -> &mut Task;

    /// Do the work over the bound crawlers and return the produced ones.
    fn perform(&mut self, classifier: &Classifier) -> Result<Vec<Rc<PathCrawler>>, ApiError>;

    /// Assign the inputs of the next invocation.
    ///
    /// Runners holding per-invocation state override this to drop it, so a
    /// runner can be invoked again with unrelated inputs.
    fn bind(&mut self, crawlers: Vec<Rc<PathCrawler>>) {
        self.task_mut().bind(crawlers);
    }

    /// Bind `crawlers`, perform, and attach the task name to any failure.
    fn run(
        &mut self,
        crawlers: Vec<Rc<PathCrawler>>,
        classifier: &Classifier,
    ) -> Result<Vec<Rc<PathCrawler>>, ApiError> {
        self.bind(crawlers);
        self.perform(classifier)
            .map_err(|source| ApiError::TaskExecution {
                task: self.task().type_name().to_string(),
                source: Box::new(source),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{PathHolder, Registry};
    use serde_json::json;

    #[test]
    fn test_options() {
        let mut task = Task::new("copy");
        task.set_option("overwrite", true);
        task.set_option("comment", "texture publish");

        assert_eq!(task.option("comment").unwrap(), &json!("texture publish"));
        assert!(task.flag("overwrite").unwrap());
        assert_eq!(task.option_names(), vec!["comment".to_string(), "overwrite".to_string()]);
        assert!(matches!(
            task.option("missing"),
            Err(TaskError::UnknownOption { .. })
        ));
    }

    #[test]
    fn test_file_path_resolution() {
        let classifier = Classifier::new(Registry::with_defaults());
        let crawler = classifier
            .create(PathHolder::with_kind("/plates/shot.1001.exr", false), None)
            .unwrap();

        let mut task = Task::new("copy");
        assert!(matches!(
            task.file_path(&crawler),
            Err(TaskError::MissingTarget { .. })
        ));

        task.set_target("/publish/{name}/{frame}.{ext}");
        let first = task.file_path(&crawler).unwrap();
        assert_eq!(first, "/publish/shot/1001.exr");
        assert_eq!(task.file_path(&crawler).unwrap(), first);

        task.set_target("/publish/{missing}");
        assert!(matches!(
            task.file_path(&crawler),
            Err(TaskError::Template { .. })
        ));
    }

    #[test]
    fn test_bind_replaces_inputs() {
        let classifier = Classifier::new(Registry::with_defaults());
        let a = classifier
            .create(PathHolder::with_kind("/a.txt", false), None)
            .unwrap();
        let b = classifier
            .create(PathHolder::with_kind("/b.txt", false), None)
            .unwrap();

        let mut task = Task::new("copy");
        task.bind(vec![a.clone()]);
        task.add_crawler(b);
        assert_eq!(task.path_crawlers().len(), 2);

        task.bind(vec![a]);
        assert_eq!(task.path_crawlers().len(), 1);
    }
}
