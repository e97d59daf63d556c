//! Classification: pick the recognizer that claims a path and build its crawler.

use crate::config::ListingConfig;
use crate::crawler::path::PathCrawler;
use crate::crawler::path_holder::PathHolder;
use crate::crawler::registry::{RecognizerType, Registry};
use crate::crawler::{Crawler, CrawlerSnapshot};
use crate::error::ClassificationError;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, trace};

/// Classifies paths against a registry of recognizers.
///
/// Cheap to clone; every crawler it creates keeps a copy so that children
/// are classified with the same registry and listing settings.
#[derive(Debug, Clone)]
pub struct Classifier {
    registry: Arc<Registry>,
    listing: ListingConfig,
}

impl Classifier {
    pub fn new(registry: Registry) -> Self {
        Self::from_shared(Arc::new(registry))
    }

    pub fn from_shared(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            listing: ListingConfig::default(),
        }
    }

    pub fn with_listing(mut self, listing: ListingConfig) -> Self {
        self.listing = listing;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn listing(&self) -> &ListingConfig {
        &self.listing
    }

    /// Create a crawler for `holder`, testing recognizers latest-registered first.
    pub fn create(
        &self,
        holder: PathHolder,
        parent: Option<&Rc<PathCrawler>>,
    ) -> Result<Rc<PathCrawler>, ClassificationError> {
        check_utf8(&holder)?;
        let parent_ref = parent.map(|p| p.as_ref());

        for recognizer_type in self.registry.precedence() {
            let passed = recognizer_type
                .recognizer()
                .test(&holder, parent_ref)
                .map_err(|source| ClassificationError::Test {
                    type_name: recognizer_type.name().to_string(),
                    path: holder.path().to_string(),
                    source,
                })?;

            if passed {
                debug!(
                    path = %holder.path(),
                    recognizer = %recognizer_type.name(),
                    "Classified path"
                );
                return self.instantiate(recognizer_type, holder, parent);
            }
            trace!(path = %holder.path(), recognizer = %recognizer_type.name(), "Recognizer declined");
        }

        Err(ClassificationError::NoMatch {
            path: holder.path().to_string(),
        })
    }

    /// Create a crawler from a path string, bypassing the tests when `explicit_type` is given.
    pub fn create_from_path(
        &self,
        path: impl AsRef<Path>,
        explicit_type: Option<&str>,
        parent: Option<&Rc<PathCrawler>>,
    ) -> Result<Rc<PathCrawler>, ClassificationError> {
        let holder = PathHolder::new(path);
        match explicit_type {
            Some(type_name) => {
                check_utf8(&holder)?;
                let recognizer_type = self.registry.get_or_error(type_name)?;
                self.instantiate(recognizer_type, holder, parent)
            }
            None => self.create(holder, parent),
        }
    }

    /// Rebuild a crawler from the JSON produced by [`PathCrawler::to_json`].
    ///
    /// The result has no parent and no cached children; its variables, context
    /// variable names and tags are exactly those of the snapshot.
    pub fn create_from_json(&self, text: &str) -> Result<Rc<PathCrawler>, ClassificationError> {
        let snapshot: CrawlerSnapshot = serde_json::from_str(text)
            .map_err(|e| ClassificationError::InvalidSnapshot(e.to_string()))?;

        let type_name = snapshot_string(&snapshot, "type")?;
        let file_path = snapshot_string(&snapshot, "filePath")?;

        let recognizer_type = self.registry.get_or_error(&type_name)?;
        let crawler = self.instantiate(recognizer_type, PathHolder::new(&file_path), None)?;
        crawler.restore(snapshot);
        Ok(crawler)
    }

    fn instantiate(
        &self,
        recognizer_type: &Arc<RecognizerType>,
        holder: PathHolder,
        parent: Option<&Rc<PathCrawler>>,
    ) -> Result<Rc<PathCrawler>, ClassificationError> {
        let mut state = Crawler::new(holder.base_name());
        if let Some(parent) = parent {
            parent.with_state(|parent_state| state.inherit_context(parent_state));
        }

        state.set_var("filePath", holder.path(), false);
        state.set_var("ext", holder.ext(), false);
        state.set_var("baseName", holder.base_name(), false);
        state.set_var("name", strip_extension(holder.base_name()), false);
        if !state.has_var("sourceDirectory") {
            let source_directory = if holder.is_directory() {
                holder.path().to_string()
            } else {
                holder
                    .as_path()
                    .parent()
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_default()
            };
            state.set_var("sourceDirectory", source_directory, false);
        }

        recognizer_type
            .recognizer()
            .construct(&mut state, &holder, parent.map(|p| p.as_ref()))
            .map_err(|source| ClassificationError::Construct {
                type_name: recognizer_type.name().to_string(),
                path: holder.path().to_string(),
                source,
            })?;

        state.set_var("type", recognizer_type.name(), false);

        Ok(PathCrawler::new(
            holder,
            Arc::clone(recognizer_type),
            self.clone(),
            parent.map(Rc::downgrade).unwrap_or_default(),
            state,
        ))
    }
}

fn check_utf8(holder: &PathHolder) -> Result<(), ClassificationError> {
    if holder.is_lossy() {
        return Err(ClassificationError::NonUtf8Path {
            path: holder.path().to_string(),
        });
    }
    Ok(())
}

fn strip_extension(base_name: &str) -> String {
    Path::new(base_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| base_name.to_string())
}

fn snapshot_string(snapshot: &CrawlerSnapshot, name: &str) -> Result<String, ClassificationError> {
    snapshot
        .vars
        .get(name)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            ClassificationError::InvalidSnapshot(format!("missing string variable \"{}\"", name))
        })
}
