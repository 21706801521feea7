//! Checks run against the files of an extension package

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{CheckError, Result};
use crate::manifest::GrammarStore;
use crate::report::ReportSink;

pub mod access_guard;
pub mod encoding;
pub mod manifest;
pub mod php_source;

pub use access_guard::AccessGuardRule;
pub use encoding::EncodingRule;
pub use manifest::ManifestRule;

/// Identifier of a built-in rule, as used in configuration and on the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleId {
    Manifest,
    Encoding,
    Jexec,
}

impl RuleId {
    pub const ALL: [RuleId; 3] = [RuleId::Manifest, RuleId::Encoding, RuleId::Jexec];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::Manifest => "manifest",
            RuleId::Encoding => "encoding",
            RuleId::Jexec => "jexec",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleId {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        RuleId::ALL
            .into_iter()
            .find(|id| id.as_str() == wanted)
            .ok_or_else(|| CheckError::UnknownRule(s.to_string()))
    }
}

/// A single check over one file
///
/// Implementations must not print: every finding goes to the sink.
pub trait Rule: Send + Sync {
    fn id(&self) -> RuleId;

    /// Short human-readable title
    fn title(&self) -> &'static str;

    /// Whether the file is a candidate for this rule, judged by its path
    fn applies_to(&self, path: &Path) -> bool;

    fn check(&self, path: &Path, content: &str, sink: &mut dyn ReportSink);
}

/// Settings the built-in rules are constructed from
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSettings {
    pub enabled: Vec<RuleId>,
    pub encodings: Vec<String>,
    pub constants: Vec<String>,
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            enabled: RuleId::ALL.to_vec(),
            encodings: encoding::DEFAULT_ENCODINGS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            constants: access_guard::DEFAULT_CONSTANTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Ordered set of enabled rules
#[derive(Clone, Default)]
pub struct RuleSet {
    rules: Vec<Arc<dyn Rule>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the enabled built-in rules. Duplicated ids are ignored.
    pub fn from_settings(settings: &RuleSettings, grammars: Arc<GrammarStore>) -> Result<Self> {
        let mut set = Self::new();
        let mut seen = Vec::new();
        for id in &settings.enabled {
            if seen.contains(id) {
                continue;
            }
            seen.push(*id);

            let rule: Arc<dyn Rule> = match id {
                RuleId::Manifest => Arc::new(ManifestRule::new(grammars.clone())),
                RuleId::Encoding => Arc::new(EncodingRule::new(&settings.encodings)?),
                RuleId::Jexec => Arc::new(AccessGuardRule::new(&settings.constants)),
            };
            set.register(rule);
        }
        Ok(set)
    }

    pub fn register(&mut self, rule: Arc<dyn Rule>) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }

    pub fn ids(&self) -> Vec<RuleId> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    /// Rules interested in `path`, in registration order
    pub fn applicable<'a>(&'a self, path: &'a Path) -> impl Iterator<Item = &'a Arc<dyn Rule>> {
        self.rules.iter().filter(move |r| r.applies_to(path))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet").field("rules", &self.ids()).finish()
    }
}

/// Case-insensitive extension match
pub(crate) fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}
