//! Grammar lookup per extension type

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::cache::GrammarCache;
use crate::error::{GrammarError, GrammarResult};
use crate::manifest::{ExtensionType, Grammar};

/// Where grammar documents come from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GrammarSource {
    /// Documents compiled into the binary
    #[default]
    Bundled,
    /// `dtd_<type>.json` files in a directory. A missing file means the type
    /// has no grammar.
    Directory(PathBuf),
}

/// Loads and caches grammar documents for the lifetime of the process
pub struct GrammarStore {
    source: GrammarSource,
    cache: GrammarCache,
}

impl GrammarStore {
    pub fn new(source: GrammarSource) -> Self {
        Self {
            source,
            cache: GrammarCache::default(),
        }
    }

    pub fn bundled() -> Self {
        Self::new(GrammarSource::Bundled)
    }

    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(GrammarSource::Directory(dir.into()))
    }

    /// Store for a configured source. A grammar directory must exist up front,
    /// otherwise every type would silently end up without a grammar.
    pub fn open(source: GrammarSource) -> GrammarResult<Self> {
        if let GrammarSource::Directory(dir) = &source
            && !dir.is_dir()
        {
            return Err(GrammarError::Io {
                path: dir.clone(),
                details: "not an existing directory".to_string(),
            });
        }
        Ok(Self::new(source))
    }

    pub fn source(&self) -> &GrammarSource {
        &self.source
    }

    /// Grammar for `extension_type`, or `None` when no document exists
    pub fn load(&self, extension_type: ExtensionType) -> GrammarResult<Option<Arc<Grammar>>> {
        self.cache
            .get_or_load(extension_type, || self.read(extension_type))
    }

    fn read(&self, extension_type: ExtensionType) -> GrammarResult<Option<Arc<Grammar>>> {
        let name = extension_type.grammar_file_name();
        match &self.source {
            GrammarSource::Bundled => {
                debug!("Loading bundled grammar {}", name);
                let grammar = Grammar::from_json(&name, bundled_document(extension_type))?;
                Ok(Some(Arc::new(grammar)))
            }
            GrammarSource::Directory(dir) => {
                let path = dir.join(&name);
                debug!("Loading grammar from {}", path.display());
                match read_document(&path)? {
                    Some(source) => Ok(Some(Arc::new(Grammar::from_json(&name, &source)?))),
                    None => {
                        debug!("No grammar document for {}", extension_type);
                        Ok(None)
                    }
                }
            }
        }
    }
}

impl Default for GrammarStore {
    fn default() -> Self {
        Self::bundled()
    }
}

fn read_document(path: &Path) -> GrammarResult<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(source) => Ok(Some(source)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(GrammarError::Io {
            path: path.to_path_buf(),
            details: e.to_string(),
        }),
    }
}

fn bundled_document(extension_type: ExtensionType) -> &'static str {
    match extension_type {
        ExtensionType::Component => include_str!("../../grammars/dtd_component.json"),
        ExtensionType::File => include_str!("../../grammars/dtd_file.json"),
        ExtensionType::Language => include_str!("../../grammars/dtd_language.json"),
        ExtensionType::Library => include_str!("../../grammars/dtd_library.json"),
        ExtensionType::Module => include_str!("../../grammars/dtd_module.json"),
        ExtensionType::Package => include_str!("../../grammars/dtd_package.json"),
        ExtensionType::Plugin => include_str!("../../grammars/dtd_plugin.json"),
        ExtensionType::Template => include_str!("../../grammars/dtd_template.json"),
    }
}
