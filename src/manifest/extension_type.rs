use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of extension a manifest declares in its root `type` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionType {
    Component,
    File,
    Language,
    Library,
    Module,
    Package,
    Plugin,
    Template,
}

impl ExtensionType {
    pub const ALL: [ExtensionType; 8] = [
        ExtensionType::Component,
        ExtensionType::File,
        ExtensionType::Language,
        ExtensionType::Library,
        ExtensionType::Module,
        ExtensionType::Package,
        ExtensionType::Plugin,
        ExtensionType::Template,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtensionType::Component => "component",
            ExtensionType::File => "file",
            ExtensionType::Language => "language",
            ExtensionType::Library => "library",
            ExtensionType::Module => "module",
            ExtensionType::Package => "package",
            ExtensionType::Plugin => "plugin",
            ExtensionType::Template => "template",
        }
    }

    /// File name of the grammar document for this type
    pub fn grammar_file_name(&self) -> String {
        format!("dtd_{}.json", self.as_str())
    }

    /// Whether the manifest root must carry a `client` attribute
    pub fn requires_client(&self) -> bool {
        matches!(self, ExtensionType::Module | ExtensionType::Template)
    }
}

impl fmt::Display for ExtensionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `type` value is not one of the known extension types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownExtensionType(pub String);

impl FromStr for ExtensionType {
    type Err = UnknownExtensionType;

    /// Exact, case-sensitive match
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExtensionType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownExtensionType(s.to_string()))
    }
}
