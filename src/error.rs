//! Error types for classification, variables, tasks and publishing.

use thiserror::Error;

/// Access to a variable or tag that was never set on a crawler.
#[derive(Debug, Error)]
pub enum VariableError {
    #[error("Variable \"{name}\" is not defined on crawler \"{crawler}\"")]
    UndefinedVariable { crawler: String, name: String },

    #[error("Tag \"{name}\" is not defined on crawler \"{crawler}\"")]
    UndefinedTag { crawler: String, name: String },
}

/// Failures while deciding which recognizer handles a path.
///
/// Always fatal for the path being classified.
#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("Error on testing recognizer \"{type_name}\" for \"{path}\": {source}")]
    Test {
        type_name: String,
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Error on creating a crawler \"{type_name}\" for \"{path}\": {source}")]
    Construct {
        type_name: String,
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Don't know how to create a path crawler for \"{path}\"")]
    NoMatch { path: String },

    #[error("Path is not valid UTF-8: \"{path}\"")]
    NonUtf8Path { path: String },

    #[error("Recognizer type not registered: {type_name}")]
    UnknownType { type_name: String },

    #[error("Invalid crawler snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Failed to list directory \"{path}\": {source}")]
    Listing {
        path: String,
        #[source]
        source: walkdir::Error,
    },
}

/// Violations of the versioned publish protocol.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("File \"{file}\" is not under data directory \"{data_dir}\"")]
    FileNotUnderDataDirectory { file: String, data_dir: String },

    #[error("Could not find metadata for the file \"{file}\"")]
    MetadataNotFound { file: String },

    #[error("Version folder \"{path}\" does not follow the v<number> convention")]
    InvalidVersionFolder { path: String },

    #[error("No input crawlers bound to the version task")]
    NoInputs,

    #[error("No configuration path available for version \"{version_path}\"")]
    MissingConfigPath { version_path: String },

    #[error("Input \"{crawler}\" disagrees on {field}: expected {expected:?}, found {found:?}")]
    InconsistentInputs {
        crawler: String,
        field: String,
        expected: String,
        found: String,
    },

    #[error("I/O error on \"{path}\": {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize \"{path}\": {source}")]
    Serialization {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Task configuration and execution failures.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Task \"{task}\" has no option \"{option}\"")]
    UnknownOption { task: String, option: String },

    #[error("Task \"{task}\" has no target template")]
    MissingTarget { task: String },

    #[error("Failed to resolve template \"{template}\": {source}")]
    Template {
        template: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Task type not registered: {0}")]
    UnknownTaskType(String),

    #[error("I/O error on \"{path}\": {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Variable(#[from] VariableError),

    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error("Task \"{task}\" failed: {source}")]
    TaskExecution {
        task: String,
        #[source]
        source: Box<ApiError>,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error on \"{path}\": {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
