//! CLI Tooling
//!
//! Command-line interface for crawling directories and running the configured
//! task pipeline over them.

use crate::config::{CentipedeConfig, ConfigLoader};
use crate::crawler::{Classifier, PathCrawler, Registry};
use crate::error::ApiError;
use crate::json::to_pretty_string;
use crate::task::{Pipeline, TaskRegistry};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;
use tracing::info;

/// Centipede CLI - filesystem crawling, classification and publishing
#[derive(Parser)]
#[command(name = "centipede")]
#[command(about = "Classify filesystem trees and publish them through task pipelines")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Classify a path and list every crawler under it
    Crawl {
        /// Root path to crawl
        path: PathBuf,

        /// Keep only crawlers of these types (repeatable)
        #[arg(long = "filter")]
        filter: Vec<String>,

        /// Print crawler snapshots as JSON instead of a listing
        #[arg(long)]
        json: bool,
    },
    /// Crawl a path and run the configured task pipeline over it
    Run {
        /// Root path to crawl
        path: PathBuf,

        /// Keep only crawlers of these types before the first task (repeatable)
        #[arg(long = "filter")]
        filter: Vec<String>,
    },
    /// List registered recognizer and task types
    Types,
}

/// Loaded configuration plus the registries commands run against.
pub struct CliContext {
    config: CentipedeConfig,
    classifier: Classifier,
    tasks: TaskRegistry,
}

impl CliContext {
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = ConfigLoader::load(config_path.as_deref())
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: CentipedeConfig) -> Self {
        let classifier = Classifier::new(Registry::with_defaults()).with_listing(config.listing.clone());
        Self {
            config,
            classifier,
            tasks: TaskRegistry::with_defaults(),
        }
    }

    pub fn config(&self) -> &CentipedeConfig {
        &self.config
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let result = match command {
            Commands::Crawl { path, filter, json } => self.crawl(path, filter, *json),
            Commands::Run { path, filter } => self.run(path, filter),
            Commands::Types => Ok(self.types()),
        };
        info!(
            command = ?command,
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn collect(&self, path: &Path, filter: &[String]) -> Result<Vec<Rc<PathCrawler>>, ApiError> {
        let root = self.classifier.create_from_path(path, None, None)?;
        let filter: Vec<&str> = filter.iter().map(String::as_str).collect();
        Ok(root.glob(&filter, true)?)
    }

    fn crawl(&self, path: &Path, filter: &[String], json: bool) -> Result<String, ApiError> {
        let crawlers = self.collect(path, filter)?;
        if json {
            let snapshots: Vec<_> = crawlers
                .iter()
                .map(|c| c.with_state(|state| state.to_snapshot()))
                .collect();
            return Ok(to_pretty_string(&snapshots)?);
        }
        Ok(crawlers
            .iter()
            .map(|c| format!("{}\t{}", c.type_name(), c.file_path()))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn run(&self, path: &Path, filter: &[String]) -> Result<String, ApiError> {
        if self.config.tasks.is_empty() {
            return Err(ApiError::ConfigError("No tasks configured".to_string()));
        }
        let inputs = self.collect(path, filter)?;
        let mut pipeline = Pipeline::from_config(&self.config.tasks, &self.tasks)?;
        let outputs = pipeline.run(inputs, &self.classifier)?;
        Ok(outputs
            .iter()
            .map(|c| c.file_path().to_string())
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn types(&self) -> String {
        let mut lines = Vec::new();
        for recognizer in self.classifier.registry().precedence() {
            let capabilities = recognizer.capabilities().join(", ");
            if capabilities.is_empty() {
                lines.push(format!("recognizer\t{}", recognizer.name()));
            } else {
                lines.push(format!("recognizer\t{} ({})", recognizer.name(), capabilities));
            }
        }
        for name in self.tasks.registered_names() {
            lines.push(format!("task\t{}", name));
        }
        lines.join("\n")
    }
}
