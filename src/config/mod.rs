//! Configuration
//!
//! Layered configuration for crawling, logging and task pipelines. Sources are
//! merged by [`ConfigLoader`]: serde defaults, then a TOML/JSON file, then
//! `CENTIPEDE__*` environment variables.

mod facade;
pub mod merge;
pub mod sources;

pub use facade::ConfigLoader;

use crate::logging::LoggingConfig;
use crate::types::VarMap;
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CentipedeConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub listing: ListingConfig,

    /// Pipeline stages, run in order.
    #[serde(default)]
    pub tasks: Vec<TaskConfig>,
}

/// Directory enumeration used while classifying children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Visit children sorted by file name instead of raw enumeration order
    #[serde(default = "default_true")]
    pub sort_entries: bool,

    /// Include entries whose name starts with a dot
    #[serde(default = "default_true")]
    pub include_hidden: bool,

    /// Follow symbolic links to directories found while listing. When off,
    /// such links are classified as plain entries and never listed. A linked
    /// crawl root is always resolved.
    #[serde(default)]
    pub follow_links: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            sort_entries: true,
            include_hidden: true,
            follow_links: false,
        }
    }
}

/// One pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Registered task type, e.g. `copy` or `createVersion`
    #[serde(rename = "type")]
    pub task_type: String,

    /// Option overrides applied on top of the task defaults
    #[serde(default)]
    pub options: VarMap,

    /// Target path template resolved per input crawler
    #[serde(default)]
    pub target: Option<String>,

    /// Recognizer types (or capabilities) the stage accepts; empty accepts everything
    #[serde(default, alias = "filterTypes")]
    pub filter_types: Vec<String>,
}

impl TaskConfig {
    pub fn new(task_type: impl Into<String>) -> Self {
        Self {
            task_type: task_type.into(),
            options: VarMap::new(),
            target: None,
            filter_types: Vec::new(),
        }
    }
}
