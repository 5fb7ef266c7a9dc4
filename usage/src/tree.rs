//! Usage trees that parallel a command tree.

use std::collections::BTreeMap;

use flagtree_core::{Command, Documentation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Documentation for a command and, by name, for its subcommands.
///
/// Serializes with the documentation keys inline:
///
/// ```yaml
/// short: file tool
/// commands:
///   cat:
///     short: print a file
///     use: <file>
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageTree {
    #[serde(flatten)]
    pub doc: Documentation,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub commands: BTreeMap<String, UsageTree>,
}

impl UsageTree {
    /// Parses a usage tree from YAML.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::Yaml`](crate::UsageError::Yaml) on malformed
    /// input.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Copies the documentation onto `cmd` and its subcommands.
    ///
    /// Only non-empty fields are copied, so an overlay may document part of
    /// a tree. Entries naming no existing subcommand are ignored.
    pub fn apply(&self, cmd: &mut Command) {
        let doc = cmd.documentation_mut();
        if !self.doc.short.is_empty() {
            doc.short.clone_from(&self.doc.short);
        }
        if !self.doc.usage_line.is_empty() {
            doc.usage_line.clone_from(&self.doc.usage_line);
        }
        if !self.doc.long.is_empty() {
            doc.long.clone_from(&self.doc.long);
        }
        if !self.doc.examples.is_empty() {
            doc.examples.clone_from(&self.doc.examples);
        }

        let children = cmd.commands_mut();
        for (name, usage) in &self.commands {
            match children.get_mut(name) {
                Some(child) => usage.apply(child),
                None => debug!(command = name.as_str(), "Usage for unknown command ignored"),
            }
        }
    }

    /// Collects the documentation of `cmd` and its subcommands.
    pub fn extract(cmd: &Command) -> Self {
        Self {
            doc: cmd.documentation().clone(),
            commands: cmd
                .commands()
                .iter()
                .map(|(name, child)| (name.clone(), Self::extract(child)))
                .collect(),
        }
    }

    /// Serializes the tree as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Serializes the tree as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
