//! Recognizer registry.
//!
//! Recognizers are tried from the most recently registered to the least, so a
//! later registration acts as a more specific override of earlier, generic
//! ones. Re-registering a name replaces the recognizer in its original slot.

use crate::crawler::path::PathCrawler;
use crate::crawler::path_holder::PathHolder;
use crate::crawler::Crawler;
use crate::error::ClassificationError;
use std::collections::HashSet;
use std::sync::Arc;

/// A pluggable path recognizer.
pub trait Recognizer: Send + Sync {
    /// Tell whether this recognizer handles `path`.
    fn test(&self, path: &PathHolder, parent: Option<&PathCrawler>) -> anyhow::Result<bool>;

    /// Populate recognizer-specific variables on a freshly created crawler.
    ///
    /// Runs after `filePath`, `ext`, `baseName`, `name` and `sourceDirectory` are set.
    fn construct(
        &self,
        _crawler: &mut Crawler,
        _path: &PathHolder,
        _parent: Option<&PathCrawler>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Whether crawlers of this type enumerate child entries.
    fn lists_children(&self, path: &PathHolder) -> bool {
        path.is_directory()
    }
}

/// A named recognizer together with the capabilities it also satisfies.
///
/// Capabilities stand in for specialization: a `dpx` type declaring
/// `["image"]` is matched by filters on `dpx` and `image`, and through the
/// registered `image` type's own capabilities also by `file`.
pub struct RecognizerType {
    name: String,
    capabilities: Vec<String>,
    recognizer: Arc<dyn Recognizer>,
}

impl RecognizerType {
    pub fn new(name: impl Into<String>, recognizer: impl Recognizer + 'static) -> Self {
        Self {
            name: name.into(),
            capabilities: Vec::new(),
            recognizer: Arc::new(recognizer),
        }
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    pub fn recognizer(&self) -> &dyn Recognizer {
        self.recognizer.as_ref()
    }

    /// True if this type is `capability` or declares it directly.
    ///
    /// Use [`Registry::satisfies`] to include capabilities inherited through
    /// other registered types.
    pub fn satisfies(&self, capability: &str) -> bool {
        self.name == capability || self.capabilities.iter().any(|c| c == capability)
    }
}

impl std::fmt::Debug for RecognizerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognizerType")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

/// Ordered collection of recognizer types.
#[derive(Debug, Default)]
pub struct Registry {
    types: Vec<Arc<RecognizerType>>,
}

impl Registry {
    pub fn new() -> Self {
        Self { types: Vec::new() }
    }

    /// Registry holding the generic `file`, `directory`, `image` and `json` recognizers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        crate::crawler::fs::register_defaults(&mut registry);
        registry
    }

    /// Register a recognizer type, replacing an existing one of the same name in place.
    pub fn register(&mut self, recognizer_type: RecognizerType) {
        let recognizer_type = Arc::new(recognizer_type);
        match self
            .types
            .iter()
            .position(|t| t.name == recognizer_type.name)
        {
            Some(index) => {
                tracing::debug!(name = %recognizer_type.name, slot = index, "Replacing recognizer");
                self.types[index] = recognizer_type;
            }
            None => {
                tracing::debug!(name = %recognizer_type.name, "Registering recognizer");
                self.types.push(recognizer_type);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<RecognizerType>> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn get_or_error(&self, name: &str) -> Result<&Arc<RecognizerType>, ClassificationError> {
        self.get(name).ok_or_else(|| ClassificationError::UnknownType {
            type_name: name.to_string(),
        })
    }

    /// Registered names in registration order.
    pub fn registered_names(&self) -> Vec<&str> {
        self.types.iter().map(|t| t.name.as_str()).collect()
    }

    /// Types in the order they are tested: most recently registered first.
    pub fn precedence(&self) -> impl Iterator<Item = &Arc<RecognizerType>> {
        self.types.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// True if `recognizer_type` is `capability`, declares it, or declares a
    /// registered type that satisfies it. Declarations may form cycles.
    pub fn satisfies(&self, recognizer_type: &RecognizerType, capability: &str) -> bool {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut pending: Vec<&RecognizerType> = vec![recognizer_type];
        while let Some(current) = pending.pop() {
            if !seen.insert(current.name()) {
                continue;
            }
            if current.satisfies(capability) {
                return true;
            }
            pending.extend(
                current
                    .capabilities()
                    .iter()
                    .filter_map(|c| self.get(c))
                    .map(|t| &**t),
            );
        }
        false
    }

    /// Registered types compatible with `base`: its own type plus every type
    /// satisfying it directly or through other registered types.
    pub fn registered_subclasses(
        &self,
        base: &str,
    ) -> Result<Vec<Arc<RecognizerType>>, ClassificationError> {
        self.check_known(base)?;
        Ok(self
            .types
            .iter()
            .filter(|t| self.satisfies(t, base))
            .cloned()
            .collect())
    }

    /// Names of the registered types compatible with `base`.
    pub fn registered_sub_types(&self, base: &str) -> Result<Vec<String>, ClassificationError> {
        Ok(self
            .registered_subclasses(base)?
            .iter()
            .map(|t| t.name.clone())
            .collect())
    }

    /// A base is known when it is a registered name or a capability some type declares.
    pub(crate) fn check_known(&self, base: &str) -> Result<(), ClassificationError> {
        if self.types.iter().any(|t| self.satisfies(t, base)) {
            Ok(())
        } else {
            Err(ClassificationError::UnknownType {
                type_name: base.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Always(bool);

    impl Recognizer for Always {
        fn test(&self, _path: &PathHolder, _parent: Option<&PathCrawler>) -> anyhow::Result<bool> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_registration_order_is_preserved() {
        let mut registry = Registry::new();
        registry.register(RecognizerType::new("a", Always(true)));
        registry.register(RecognizerType::new("b", Always(true)));
        registry.register(RecognizerType::new("c", Always(true)));

        assert_eq!(registry.registered_names(), vec!["a", "b", "c"]);
        let tested: Vec<&str> = registry.precedence().map(|t| t.name()).collect();
        assert_eq!(tested, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_reregistering_keeps_slot() {
        let mut registry = Registry::new();
        registry.register(RecognizerType::new("a", Always(true)));
        registry.register(RecognizerType::new("b", Always(true)));
        registry.register(RecognizerType::new("c", Always(true)));
        registry.register(RecognizerType::new("b", Always(false)).with_capabilities(["file"]));

        assert_eq!(registry.registered_names(), vec!["a", "b", "c"]);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get("b").unwrap().capabilities(), &["file".to_string()]);
    }

    #[test]
    fn test_sub_types_follow_capabilities() {
        let mut registry = Registry::new();
        registry.register(RecognizerType::new("file", Always(true)));
        registry.register(RecognizerType::new("image", Always(true)).with_capabilities(["file"]));
        registry.register(
            RecognizerType::new("dpx", Always(true)).with_capabilities(["image", "file"]),
        );
        registry.register(RecognizerType::new("directory", Always(true)));

        let mut files = registry.registered_sub_types("file").unwrap();
        files.sort();
        assert_eq!(files, vec!["dpx", "file", "image"]);

        let mut images = registry.registered_sub_types("image").unwrap();
        images.sort();
        assert_eq!(images, vec!["dpx", "image"]);

        assert_eq!(registry.registered_subclasses("directory").unwrap().len(), 1);
    }

    #[test]
    fn test_capabilities_are_transitive() {
        let mut registry = Registry::new();
        registry.register(RecognizerType::new("file", Always(true)));
        registry.register(RecognizerType::new("image", Always(true)).with_capabilities(["file"]));
        registry.register(RecognizerType::new("dpx", Always(true)).with_capabilities(["image"]));
        registry.register(RecognizerType::new("loopA", Always(true)).with_capabilities(["loopB"]));
        registry.register(RecognizerType::new("loopB", Always(true)).with_capabilities(["loopA"]));

        let dpx = registry.get("dpx").unwrap();
        assert!(!dpx.satisfies("file"));
        assert!(registry.satisfies(dpx, "file"));
        assert!(registry.satisfies(dpx, "image"));
        assert!(!registry.satisfies(dpx, "directory"));

        let mut files = registry.registered_sub_types("file").unwrap();
        files.sort();
        assert_eq!(files, vec!["dpx", "file", "image"]);

        let looped = registry.get("loopA").unwrap();
        assert!(registry.satisfies(looped, "loopB"));
        assert!(!registry.satisfies(looped, "file"));
    }

    #[test]
    fn test_unknown_base_is_an_error() {
        let registry = Registry::with_defaults();
        assert!(matches!(
            registry.registered_sub_types("nope"),
            Err(ClassificationError::UnknownType { .. })
        ));
        assert!(registry.get_or_error("nope").is_err());
        assert!(registry.get_or_error("file").is_ok());
    }
}
