//! Centipede: Filesystem Crawling and Versioned Publishing
//!
//! Paths are classified into typed crawlers by a [`crawler::Registry`] of
//! recognizers, tried most-recently-registered first. Crawlers carry variables,
//! context variables and tags, expand lazily into their directory children and
//! flatten into filtered lists through `glob`. Tasks consume those lists; the
//! `createVersion` task publishes files as an immutable, numbered version.

pub mod config;
pub mod crawler;
pub mod error;
pub mod json;
pub mod logging;
pub mod task;
pub mod tooling;
pub mod types;

pub use crawler::{Classifier, Crawler, PathCrawler, PathHolder, Recognizer, RecognizerType, Registry};
pub use error::{ApiError, ClassificationError, PublishError, TaskError, VariableError};
pub use task::{CopyTask, CreateVersion, Pipeline, Task, TaskRegistry, TaskRunner};
