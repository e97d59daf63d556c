//! Filesystem-backed crawlers with recursive discovery and serialization.

use crate::crawler::classifier::Classifier;
use crate::crawler::path_holder::PathHolder;
use crate::crawler::registry::{RecognizerType, Registry};
use crate::crawler::{Crawler, CrawlerSnapshot};
use crate::error::{ClassificationError, VariableError};
use crate::types::Value;
use std::cell::RefCell;
use std::path::Path;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use tracing::debug;
use walkdir::WalkDir;

/// A crawler backed by a filesystem path.
///
/// Path-derived variables (`filePath`, `ext`, `baseName`, `name`,
/// `sourceDirectory`, `type`) are set once by the [`Classifier`]. Children
/// are enumerated lazily and memoized; `glob` keeps its own flattened cache.
pub struct PathCrawler {
    holder: PathHolder,
    recognizer_type: Arc<RecognizerType>,
    classifier: Classifier,
    parent: Weak<PathCrawler>,
    state: RefCell<Crawler>,
    children: RefCell<Option<Vec<Rc<PathCrawler>>>>,
    // Descendants only, so the cache never holds a strong reference to its owner.
    glob_cache: RefCell<Option<Vec<Rc<PathCrawler>>>>,
}

impl PathCrawler {
    pub(crate) fn new(
        holder: PathHolder,
        recognizer_type: Arc<RecognizerType>,
        classifier: Classifier,
        parent: Weak<PathCrawler>,
        state: Crawler,
    ) -> Rc<Self> {
        Rc::new(Self {
            holder,
            recognizer_type,
            classifier,
            parent,
            state: RefCell::new(state),
            children: RefCell::new(None),
            glob_cache: RefCell::new(None),
        })
    }

    pub fn path_holder(&self) -> &PathHolder {
        &self.holder
    }

    pub fn file_path(&self) -> &str {
        self.holder.path()
    }

    /// Registered name of the recognizer that created this crawler.
    pub fn type_name(&self) -> &str {
        self.recognizer_type.name()
    }

    pub fn recognizer_type(&self) -> &Arc<RecognizerType> {
        &self.recognizer_type
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn id(&self) -> String {
        self.state.borrow().id().to_string()
    }

    pub fn parent(&self) -> Option<Rc<PathCrawler>> {
        self.parent.upgrade()
    }

    pub fn var(&self, name: &str) -> Result<Value, VariableError> {
        self.state.borrow().var(name).cloned()
    }

    pub fn set_var(&self, name: impl Into<String>, value: impl Into<Value>, is_context_var: bool) {
        self.state.borrow_mut().set_var(name, value, is_context_var);
    }

    pub fn has_var(&self, name: &str) -> bool {
        self.state.borrow().has_var(name)
    }

    pub fn var_names(&self) -> Vec<String> {
        self.state.borrow().var_names()
    }

    pub fn context_var_names(&self) -> Vec<String> {
        self.state.borrow().context_var_names()
    }

    pub fn tag(&self, name: &str) -> Result<Value, VariableError> {
        self.state.borrow().tag(name).cloned()
    }

    pub fn set_tag(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.state.borrow_mut().set_tag(name, value);
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.state.borrow().has_tag(name)
    }

    pub fn tag_names(&self) -> Vec<String> {
        self.state.borrow().tag_names()
    }

    /// Run `f` with read access to the variable store.
    pub fn with_state<R>(&self, f: impl FnOnce(&Crawler) -> R) -> R {
        f(&self.state.borrow())
    }

    pub(crate) fn restore(&self, snapshot: CrawlerSnapshot) {
        self.state.borrow_mut().restore(snapshot);
    }

    /// Child crawlers, enumerated and classified on first access.
    pub fn children(self: &Rc<Self>) -> Result<Vec<Rc<PathCrawler>>, ClassificationError> {
        if let Some(children) = self.children.borrow().as_ref() {
            return Ok(children.clone());
        }
        self.reload_children()
    }

    /// Re-enumerate the filesystem and replace the memoized children.
    pub fn reload_children(self: &Rc<Self>) -> Result<Vec<Rc<PathCrawler>>, ClassificationError> {
        let children = self.enumerate_children()?;
        *self.children.borrow_mut() = Some(children.clone());
        Ok(children)
    }

    pub fn is_leaf(self: &Rc<Self>) -> Result<bool, ClassificationError> {
        Ok(self.children()?.is_empty())
    }

    fn enumerate_children(self: &Rc<Self>) -> Result<Vec<Rc<PathCrawler>>, ClassificationError> {
        if !self
            .recognizer_type
            .recognizer()
            .lists_children(&self.holder)
        {
            return Ok(Vec::new());
        }

        let listing = self.classifier.listing();
        let mut walker = WalkDir::new(self.holder.as_path())
            .min_depth(1)
            .max_depth(1)
            .follow_links(listing.follow_links);
        if listing.sort_entries {
            walker = walker.sort_by_file_name();
        }

        let mut children = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|source| ClassificationError::Listing {
                path: self.holder.path().to_string(),
                source,
            })?;

            if !listing.include_hidden && entry.file_name().to_string_lossy().starts_with('.') {
                debug!(path = %entry.path().display(), "Skipping hidden entry");
                continue;
            }

            // Follows the link only when the walker does.
            let holder = PathHolder::with_kind(entry.path(), entry.file_type().is_dir());
            children.push(self.classifier.create(holder, Some(self))?);
        }
        Ok(children)
    }

    /// Every crawler in the subtree rooted here, depth-first, node before children.
    ///
    /// The flattened list is memoized; `use_cache = false` re-reads the
    /// filesystem and refreshes the memo. A non-empty `filter_types` keeps only
    /// crawlers whose recognizer is, or declares, one of the given types.
    pub fn glob(
        self: &Rc<Self>,
        filter_types: &[&str],
        use_cache: bool,
    ) -> Result<Vec<Rc<PathCrawler>>, ClassificationError> {
        let cached = self.glob_cache.borrow().clone();
        let descendants = match cached {
            Some(descendants) if use_cache => descendants,
            _ => {
                let mut descendants = Vec::new();
                for child in self.glob_children(!use_cache)? {
                    collect(&child, !use_cache, &mut descendants)?;
                }
                debug!(
                    path = %self.holder.path(),
                    count = descendants.len() + 1,
                    "Globbed crawlers"
                );
                *self.glob_cache.borrow_mut() = Some(descendants.clone());
                descendants
            }
        };

        let mut result = Vec::with_capacity(descendants.len() + 1);
        result.push(Rc::clone(self));
        result.extend(descendants);

        filter_crawlers(self.classifier.registry(), result, filter_types)
    }

    /// Classify the directory containing this crawler and glob from there.
    pub fn glob_from_parent(
        &self,
        filter_types: &[&str],
        use_cache: bool,
    ) -> Result<Vec<Rc<PathCrawler>>, ClassificationError> {
        let parent_dir = Path::new(self.holder.path())
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        self.classifier
            .create_from_path(parent_dir, None, None)?
            .glob(filter_types, use_cache)
    }

    /// Serialize this crawler's variables, context variable names and tags.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        crate::json::to_pretty_string(&self.state.borrow().to_snapshot())
    }

    /// A detached copy rebuilt from the JSON snapshot.
    pub fn duplicate(&self) -> Result<Rc<PathCrawler>, ClassificationError> {
        let json = self
            .to_json()
            .map_err(|e| ClassificationError::InvalidSnapshot(e.to_string()))?;
        self.classifier.create_from_json(&json)
    }

    fn glob_children(self: &Rc<Self>, refresh: bool) -> Result<Vec<Rc<PathCrawler>>, ClassificationError> {
        if refresh {
            self.reload_children()
        } else {
            self.children()
        }
    }
}

fn collect(
    crawler: &Rc<PathCrawler>,
    refresh: bool,
    out: &mut Vec<Rc<PathCrawler>>,
) -> Result<(), ClassificationError> {
    out.push(Rc::clone(crawler));
    for child in crawler.glob_children(refresh)? {
        collect(&child, refresh, out)?;
    }
    Ok(())
}

/// Keep the crawlers whose recognizer satisfies any of `filter_types`.
///
/// An empty filter keeps everything. Every filter must be known to the registry.
pub fn filter_crawlers(
    registry: &Registry,
    crawlers: Vec<Rc<PathCrawler>>,
    filter_types: &[&str],
) -> Result<Vec<Rc<PathCrawler>>, ClassificationError> {
    if filter_types.is_empty() {
        return Ok(crawlers);
    }
    for filter_type in filter_types {
        registry.check_known(filter_type)?;
    }
    Ok(crawlers
        .into_iter()
        .filter(|crawler| {
            filter_types
                .iter()
                .any(|filter_type| registry.satisfies(&crawler.recognizer_type, filter_type))
        })
        .collect())
}

impl std::fmt::Debug for PathCrawler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathCrawler")
            .field("path", &self.holder.path())
            .field("type", &self.type_name())
            .finish()
    }
}
