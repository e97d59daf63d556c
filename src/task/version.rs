//! Versioned publish.
//!
//! A version is a `v<number>` folder holding the published files under
//! `data/` plus four well-known artifacts written by [`CreateVersion`]:
//!
//! - `env.json`: snapshot of the process environment
//! - `info.json`: summary (`size`, `version`, `user`, `totalTime`, asset identity)
//! - `data.json`: manifest of added files, keyed relative to the version folder
//! - `ingestorConfig/`: copy of the configuration directory used for the publish
//!
//! The configuration directory and an unpublished version folder are checked
//! before the first write. The writes themselves are sequential and not
//! transactional: an I/O failure part way leaves a partially written version
//! folder behind, which callers must not promote.

use crate::crawler::{Classifier, PathCrawler};
use crate::error::{ApiError, PublishError};
use crate::json::to_pretty_string;
use crate::task::{Task, TaskRunner};
use crate::types::{value_to_string, FileMetadata, Value, VarMap};
use serde::Serialize;
use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, MAIN_SEPARATOR};
use std::rc::Rc;
use std::time::Instant;
use tracing::{debug, info};
use walkdir::WalkDir;

pub const ENV_FILE: &str = "env.json";
pub const INFO_FILE: &str = "info.json";
pub const DATA_FILE: &str = "data.json";
pub const CONFIG_DIR: &str = "ingestorConfig";

/// Identity of the version, resolved once per invocation from the first bound crawler.
#[derive(Debug, Clone)]
struct PublishData {
    version: u64,
    version_path: String,
    data_path: String,
    config_path: Option<String>,
    asset_name: Option<String>,
    variant: Option<String>,
}

/// Publishes the bound crawlers as one numbered version.
///
/// The task target resolves to a path directly inside the version folder;
/// its parent directory is the version folder.
///
/// Options:
/// - `verify_inputs` (default `false`): require every bound crawler to agree
///   on version folder, `assetName` and `variant`
/// - `config_path`: configuration directory, used when the first crawler has
///   no `configPath` variable
pub struct CreateVersion {
    task: Task,
    files: BTreeMap<String, FileMetadata>,
    info: VarMap,
    started: Instant,
    publish: OnceCell<PublishData>,
}

impl CreateVersion {
    pub const TYPE_NAME: &'static str = "createVersion";

    pub fn new() -> Self {
        let mut task = Task::new(Self::TYPE_NAME);
        task.set_option("verify_inputs", false);
        Self {
            task,
            files: BTreeMap::new(),
            info: VarMap::new(),
            started: Instant::now(),
            publish: OnceCell::new(),
        }
    }

    pub fn version(&self) -> Result<u64, ApiError> {
        Ok(self.publish_data()?.version)
    }

    pub fn version_path(&self) -> Result<&str, ApiError> {
        Ok(&self.publish_data()?.version_path)
    }

    pub fn data_path(&self) -> Result<&str, ApiError> {
        Ok(&self.publish_data()?.data_path)
    }

    pub fn config_path(&self) -> Result<Option<&str>, ApiError> {
        Ok(self.publish_data()?.config_path.as_deref())
    }

    pub fn asset_name(&self) -> Result<Option<&str>, ApiError> {
        Ok(self.publish_data()?.asset_name.as_deref())
    }

    pub fn variant(&self) -> Result<Option<&str>, ApiError> {
        Ok(self.publish_data()?.variant.as_deref())
    }

    /// Record a file living under the version's `data` folder.
    ///
    /// `size` always comes from disk; `type` defaults to the extension. The
    /// metadata is stored by value, so later changes to the caller's map are
    /// not seen. Adding the same path again replaces its metadata.
    pub fn add_file(&mut self, file_path: &str, metadata: Option<FileMetadata>) -> Result<(), ApiError> {
        let data_path = self.data_path()?.to_string();
        let prefix = format!("{}{}", data_path, MAIN_SEPARATOR);
        let under_data = file_path
            .strip_prefix(&prefix)
            .map_or(false, |rest| !rest.is_empty());
        if !under_data {
            return Err(PublishError::FileNotUnderDataDirectory {
                file: file_path.to_string(),
                data_dir: data_path,
            }
            .into());
        }

        let mut metadata = metadata.unwrap_or_default();
        let size = fs::metadata(file_path)
            .map_err(|source| PublishError::Io {
                path: file_path.to_string(),
                source,
            })?
            .len();
        metadata.insert("size".to_string(), Value::from(size));
        if !metadata.contains_key("type") {
            let ext = Path::new(file_path)
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default();
            metadata.insert("type".to_string(), Value::from(ext));
        }

        debug!(file = %file_path, size, "Adding file to version");
        self.files.insert(file_path.to_string(), metadata);
        Ok(())
    }

    pub fn files(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    pub fn file_metadata(&self, file_path: &str) -> Result<FileMetadata, PublishError> {
        self.files
            .get(file_path)
            .cloned()
            .ok_or_else(|| PublishError::MetadataNotFound {
                file: file_path.to_string(),
            })
    }

    /// Extra entry for `info.json`. Summary fields written at publish win.
    pub fn add_info(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.info.insert(key.into(), value.into());
    }

    fn publish_data(&self) -> Result<&PublishData, ApiError> {
        if let Some(data) = self.publish.get() {
            return Ok(data);
        }
        let data = self.load_publish_data()?;
        Ok(self.publish.get_or_init(|| data))
    }

    fn load_publish_data(&self) -> Result<PublishData, ApiError> {
        let first = self
            .task
            .path_crawlers()
            .first()
            .ok_or(PublishError::NoInputs)?;

        let version_path = self.version_path_for(first)?;
        let folder = Path::new(&version_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let version = parse_version_folder(&folder).ok_or_else(|| PublishError::InvalidVersionFolder {
            path: version_path.clone(),
        })?;

        let (asset_name, variant) = asset_identity(first);
        let config_path = match first.var("configPath") {
            Ok(value) => Some(value_to_string(&value)),
            Err(_) => self
                .task
                .option("config_path")
                .ok()
                .and_then(Value::as_str)
                .map(str::to_string),
        };

        let data_path = Path::new(&version_path)
            .join("data")
            .to_string_lossy()
            .into_owned();

        Ok(PublishData {
            version,
            version_path,
            data_path,
            config_path,
            asset_name,
            variant,
        })
    }

    fn version_path_for(&self, crawler: &PathCrawler) -> Result<String, ApiError> {
        let target = self.task.file_path(crawler)?;
        Ok(Path::new(&target)
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default())
    }

    fn verify_inputs(&self) -> Result<(), ApiError> {
        let data = self.publish_data()?;
        for crawler in self.task.path_crawlers() {
            let version_path = self.version_path_for(crawler)?;
            let (asset_name, variant) = asset_identity(crawler);
            let checks = [
                ("versionPath", Some(data.version_path.clone()), Some(version_path)),
                ("assetName", data.asset_name.clone(), asset_name),
                ("variant", data.variant.clone(), variant),
            ];
            for (field, expected, found) in checks {
                if expected != found {
                    return Err(PublishError::InconsistentInputs {
                        crawler: crawler.file_path().to_string(),
                        field: field.to_string(),
                        expected: expected.unwrap_or_default(),
                        found: found.unwrap_or_default(),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    fn add_bound_inputs(&mut self) -> Result<(), ApiError> {
        let prefix = format!("{}{}", self.data_path()?, MAIN_SEPARATOR);
        let inputs: Vec<String> = self
            .task
            .path_crawlers()
            .iter()
            .filter(|c| !c.path_holder().is_directory())
            .map(|c| c.file_path().to_string())
            .filter(|p| p.starts_with(&prefix) && !self.files.contains_key(p))
            .collect();
        for input in inputs {
            self.add_file(&input, None)?;
        }
        Ok(())
    }

    fn write_env(&self) -> Result<String, ApiError> {
        let env: BTreeMap<String, String> = std::env::vars_os()
            .map(|(k, v)| (k.to_string_lossy().into_owned(), v.to_string_lossy().into_owned()))
            .collect();
        self.write_json(ENV_FILE, &env)
    }

    fn write_info(&mut self) -> Result<String, ApiError> {
        let total_size: u64 = self
            .files
            .values()
            .filter_map(|metadata| metadata.get("size").and_then(Value::as_u64))
            .sum();
        let user = std::env::var("USERNAME")
            .or_else(|_| std::env::var("USER"))
            .unwrap_or_default();
        let version = self.version()?;
        let asset_name = self.asset_name()?.map(str::to_string);
        let variant = self.variant()?.map(str::to_string);

        self.add_info("size", total_size);
        self.add_info("version", version);
        self.add_info("user", user);
        self.add_info("totalTime", self.started.elapsed().as_secs());
        if let Some(asset_name) = asset_name {
            self.add_info("assetName", asset_name);
            if let Some(variant) = variant {
                self.add_info("variant", variant);
            }
        }
        self.write_json(INFO_FILE, &self.info)
    }

    fn write_data(&self) -> Result<String, ApiError> {
        let version_path = self.version_path()?;
        let manifest: BTreeMap<&str, &FileMetadata> = self
            .files
            .iter()
            .map(|(path, metadata)| {
                let relative = path
                    .strip_prefix(version_path)
                    .unwrap_or(path)
                    .trim_start_matches(MAIN_SEPARATOR);
                (relative, metadata)
            })
            .collect();
        self.write_json(DATA_FILE, &manifest)
    }

    /// Fail before anything is written when the configuration directory is
    /// unknown or the version already carries one. Returns the directory.
    fn check_publishable(&self) -> Result<String, ApiError> {
        let version_path = self.version_path()?;
        let source = self
            .config_path()?
            .ok_or_else(|| PublishError::MissingConfigPath {
                version_path: version_path.to_string(),
            })?;
        let destination = Path::new(version_path).join(CONFIG_DIR);
        if destination.exists() {
            return Err(PublishError::Io {
                path: destination.display().to_string(),
                source: io::Error::new(io::ErrorKind::AlreadyExists, "configuration already copied"),
            }
            .into());
        }
        Ok(source.to_string())
    }

    fn copy_config(&self, source: &str) -> Result<(), ApiError> {
        let destination = Path::new(self.version_path()?).join(CONFIG_DIR);
        for entry in WalkDir::new(source).sort_by_file_name() {
            let entry = entry.map_err(|e| PublishError::Io {
                path: source.to_string(),
                source: e.into(),
            })?;
            let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
            let target = destination.join(relative);
            let result = if entry.file_type().is_dir() {
                fs::create_dir_all(&target)
            } else {
                fs::copy(entry.path(), &target).map(|_| ())
            };
            result.map_err(|source| PublishError::Io {
                path: target.display().to_string(),
                source,
            })?;
        }
        debug!(from = %source, to = %destination.display(), "Copied configuration");
        Ok(())
    }

    fn write_json<T: Serialize + ?Sized>(&self, file_name: &str, value: &T) -> Result<String, ApiError> {
        let path = Path::new(self.version_path()?).join(file_name);
        let display = path.display().to_string();
        let text = to_pretty_string(value).map_err(|source| PublishError::Serialization {
            path: display.clone(),
            source,
        })?;
        fs::write(&path, text).map_err(|source| PublishError::Io {
            path: display.clone(),
            source,
        })?;
        Ok(display)
    }
}

impl Default for CreateVersion {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRunner for CreateVersion {
    fn task(&self) -> &Task {
        &self.task
    }

    fn task_mut(&mut self) -> &mut Task {
        &mut self.task
    }

    fn bind(&mut self, crawlers: Vec<Rc<PathCrawler>>) {
        self.task.bind(crawlers);
        self.files.clear();
        self.info.clear();
        self.started = Instant::now();
        self.publish = OnceCell::new();
    }

    fn perform(&mut self, classifier: &Classifier) -> Result<Vec<Rc<PathCrawler>>, ApiError> {
        self.add_bound_inputs()?;
        if self.task.flag("verify_inputs")? {
            self.verify_inputs()?;
        }

        let config_source = self.check_publishable()?;

        info!(
            version_path = %self.version_path()?,
            files = self.files.len(),
            "Publishing version"
        );
        self.write_env()?;
        let info_path = self.write_info()?;
        let data_path = self.write_data()?;
        self.copy_config(&config_source)?;

        Ok(vec![
            classifier.create_from_path(&info_path, None, None)?,
            classifier.create_from_path(&data_path, None, None)?,
        ])
    }
}

/// `v007` -> 7. The first character is the fixed prefix and must not be a digit.
fn parse_version_folder(name: &str) -> Option<u64> {
    let mut chars = name.chars();
    let prefix = chars.next()?;
    let digits = chars.as_str();
    if prefix.is_ascii_digit() || digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn asset_identity(crawler: &PathCrawler) -> (Option<String>, Option<String>) {
    let asset_name = crawler.var("assetName").ok().map(|v| value_to_string(&v));
    let variant = asset_name
        .as_ref()
        .and_then(|_| crawler.var("variant").ok())
        .map(|v| value_to_string(&v));
    (asset_name, variant)
}
