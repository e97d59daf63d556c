//! Crawlers
//!
//! A crawler is a classified filesystem entity: a path holder, the recognizer
//! type that claimed it, and a bag of variables and tags. Classification is
//! driven by a [`Registry`] of recognizers through a [`Classifier`], and the
//! resulting [`PathCrawler`] tree can be globbed, filtered and serialized.

pub mod classifier;
pub mod fs;
pub mod path;
pub mod path_holder;
pub mod registry;

pub use classifier::Classifier;
pub use fs::{json_contents, DirectoryRecognizer, FileRecognizer, ImageRecognizer, JsonRecognizer};
pub use path::{filter_crawlers, PathCrawler};
pub use path_holder::PathHolder;
pub use registry::{Recognizer, RecognizerType, Registry};

use crate::error::VariableError;
use crate::types::{Value, VarMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Variable and tag storage for a single crawler.
///
/// Variables and tags live in independent namespaces. A subset of the variable
/// names may be flagged as context variables; those are inherited by children
/// and recorded separately when serializing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Crawler {
    id: String,
    vars: VarMap,
    context_vars: BTreeSet<String>,
    tags: VarMap,
}

impl Crawler {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Display name, derived from the base name at creation.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Insert or overwrite a variable, flagging it as contextual when asked.
    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<Value>, is_context_var: bool) {
        let name = name.into();
        if is_context_var {
            self.context_vars.insert(name.clone());
        }
        self.vars.insert(name, value.into());
    }

    pub fn var(&self, name: &str) -> Result<&Value, VariableError> {
        self.vars
            .get(name)
            .ok_or_else(|| VariableError::UndefinedVariable {
                crawler: self.id.clone(),
                name: name.to_string(),
            })
    }

    pub fn has_var(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn var_names(&self) -> Vec<String> {
        self.vars.keys().cloned().collect()
    }

    pub fn context_var_names(&self) -> Vec<String> {
        self.context_vars.iter().cloned().collect()
    }

    pub fn is_context_var(&self, name: &str) -> bool {
        self.context_vars.contains(name)
    }

    pub fn vars(&self) -> &VarMap {
        &self.vars
    }

    pub fn set_tag(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.tags.insert(name.into(), value.into());
    }

    pub fn tag(&self, name: &str) -> Result<&Value, VariableError> {
        self.tags
            .get(name)
            .ok_or_else(|| VariableError::UndefinedTag {
                crawler: self.id.clone(),
                name: name.to_string(),
            })
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    pub fn tag_names(&self) -> Vec<String> {
        self.tags.keys().cloned().collect()
    }

    /// Copy every context variable of `other` into this crawler, still flagged as context.
    pub fn inherit_context(&mut self, other: &Crawler) {
        for name in &other.context_vars {
            if let Some(value) = other.vars.get(name) {
                self.set_var(name.clone(), value.clone(), true);
            }
        }
    }

    pub fn to_snapshot(&self) -> CrawlerSnapshot {
        CrawlerSnapshot {
            vars: self.vars.clone(),
            context_var_names: self.context_var_names(),
            tags: self.tags.clone(),
        }
    }

    /// Replace variables, context flags and tags with the snapshot contents.
    pub fn restore(&mut self, snapshot: CrawlerSnapshot) {
        self.vars = snapshot.vars;
        self.context_vars = snapshot
            .context_var_names
            .into_iter()
            .filter(|name| self.vars.contains_key(name))
            .collect();
        self.tags = snapshot.tags;
    }
}

/// Serialized crawler state: `{"vars": {...}, "contextVarNames": [...], "tags": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlerSnapshot {
    pub vars: VarMap,
    #[serde(rename = "contextVarNames", default)]
    pub context_var_names: Vec<String>,
    #[serde(default)]
    pub tags: VarMap,
}
