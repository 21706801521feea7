use crate::error::{CheckError, Result};
use crate::manifest::XmlElement;
use globset::{GlobSet, GlobSetBuilder};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tokio::fs;
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

/// Root elements that mark an XML file as an extension manifest
pub const MANIFEST_ROOTS: [&str; 2] = ["extension", "install"];

/// File extensions the built-in rules look at
pub const DEFAULT_EXTENSIONS: [&str; 2] = ["xml", "php"];

/// Bytes read from the head of an XML file to find its root element
const MANIFEST_HEAD_BYTES: usize = 4096;

/// Skips the XML declaration, processing instructions, comments and DOCTYPE
const PROLOG: &str = r"^(?:\s|<\?[\s\S]*?\?>|<!--[\s\S]*?-->|<![^>]*>)*";

/// Cached regex matching the first element of an XML document
static ROOT_ELEMENT_REGEX: OnceLock<Regex> = OnceLock::new();

/// Cached regex matching a prolog construct left open, e.g. a comment cut
/// off at the end of the head or a DOCTYPE with an internal subset
static OPEN_PROLOG_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_root_element_regex() -> &'static Regex {
    ROOT_ELEMENT_REGEX.get_or_init(|| {
        Regex::new(&format!(r"{PROLOG}<([A-Za-z_][\w.\-]*)"))
            .expect("Failed to compile root element regex")
    })
}

fn get_open_prolog_regex() -> &'static Regex {
    OPEN_PROLOG_REGEX.get_or_init(|| {
        Regex::new(&format!(r"{PROLOG}<[?!]")).expect("Failed to compile open prolog regex")
    })
}

/// What the head of an XML file says about its root element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestHead {
    Manifest,
    Other,
    /// The root element lies beyond a prolog construct the scan cannot close
    Undecided,
}

/// Classify the head of an XML document by its first element
pub fn scan_manifest_head(head: &str) -> ManifestHead {
    let head = head.strip_prefix('\u{feff}').unwrap_or(head);
    if let Some(caps) = get_root_element_regex().captures(head) {
        return if MANIFEST_ROOTS.contains(&&caps[1]) {
            ManifestHead::Manifest
        } else {
            ManifestHead::Other
        };
    }
    if get_open_prolog_regex().is_match(head) {
        ManifestHead::Undecided
    } else {
        ManifestHead::Other
    }
}

/// Whether the head of an XML document opens with a manifest root element
pub fn is_manifest_head(head: &str) -> bool {
    scan_manifest_head(head) == ManifestHead::Manifest
}

/// Async file discovery over an extension source tree
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    /// File extensions to include, lowercase (e.g., ["xml", "php"])
    extensions: Vec<String>,
    /// Include patterns set
    include_set: Option<GlobSet>,
    /// Exclude patterns set
    exclude_set: Option<GlobSet>,
    /// Maximum depth for directory traversal (None = unlimited)
    max_depth: Option<usize>,
    /// Follow symbolic links
    follow_symlinks: bool,
}

impl FileDiscovery {
    pub fn new() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            include_set: None,
            exclude_set: None,
            max_depth: None,
            follow_symlinks: false,
        }
    }

    /// Set file extensions to discover
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions.into_iter().map(|e| e.to_lowercase()).collect();
        self
    }

    /// Add include patterns
    pub fn with_include_patterns(mut self, patterns: Vec<String>) -> Result<Self> {
        self.include_set = build_glob_set(&patterns, "include")?;
        Ok(self)
    }

    /// Add exclude patterns
    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Result<Self> {
        self.exclude_set = build_glob_set(&patterns, "exclude")?;
        Ok(self)
    }

    /// Set maximum traversal depth
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set whether to follow symbolic links
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Discover files in the given path (file or directory), sorted by path
    pub async fn discover_files(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let metadata = fs::metadata(path).await.map_err(|e| traversal_error(path, e))?;

        if metadata.is_file() {
            if self.should_process(path) {
                return Ok(vec![path.to_path_buf()]);
            }
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let mut read_dir = fs::read_dir(path).await.map_err(|e| traversal_error(path, e))?;

        while let Some(entry) = read_dir.next_entry().await? {
            let entry_path = entry.path();

            if entry_path.is_symlink() && !self.follow_symlinks {
                continue;
            }

            // Entries of the root directory are at depth 0
            if let Err(e) = self
                .discover_files_recursive(&entry_path, 0, &mut files)
                .await
            {
                warn!("Error processing {}: {}", entry_path.display(), e);
            }
        }

        files.sort();
        debug!("Discovered {} files under {}", files.len(), path.display());
        Ok(files)
    }

    /// Recursive helper for discovering files
    fn discover_files_recursive<'a>(
        &'a self,
        path: &'a Path,
        depth: usize,
        files: &'a mut Vec<PathBuf>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if let Some(max_depth) = self.max_depth
                && depth > max_depth
            {
                return Ok(());
            }

            let metadata = fs::metadata(path).await?;

            if metadata.is_file() {
                if self.should_process(path) {
                    files.push(path.to_path_buf());
                }
            } else if metadata.is_dir() {
                // Only recurse into directories if we can still go deeper
                if let Some(max_depth) = self.max_depth
                    && depth >= max_depth
                {
                    return Ok(());
                }

                let mut read_dir = fs::read_dir(path).await?;

                while let Some(entry) = read_dir.next_entry().await? {
                    let entry_path = entry.path();

                    if entry_path.is_symlink() && !self.follow_symlinks {
                        continue;
                    }

                    if let Err(e) = self
                        .discover_files_recursive(&entry_path, depth + 1, files)
                        .await
                    {
                        warn!("Error processing {}: {}", entry_path.display(), e);
                    }
                }
            }

            Ok(())
        })
    }

    /// Check if a file should be processed based on extensions and patterns
    pub fn should_process(&self, path: &Path) -> bool {
        let Some(extension) = path.extension().and_then(|ext| ext.to_str()) else {
            return false;
        };
        if !self.extensions.contains(&extension.to_lowercase()) {
            return false;
        }

        // Exclude patterns win over include patterns
        if let Some(exclude_set) = &self.exclude_set
            && exclude_set.is_match(path)
        {
            return false;
        }

        // If include patterns are given, at least one must match
        if let Some(include_set) = &self.include_set {
            return include_set.is_match(path);
        }

        true
    }

    /// XML files under `base` whose root element is a manifest root
    pub async fn find_manifest_files(&self, base: &Path) -> Result<Vec<PathBuf>> {
        let xml_only = self.clone().with_extensions(vec!["xml".to_string()]);
        let mut manifests = Vec::new();

        for path in xml_only.discover_files(base).await? {
            let is_manifest = match read_head(&path).await.map(|head| scan_manifest_head(&head)) {
                Ok(ManifestHead::Manifest) => Ok(true),
                Ok(ManifestHead::Other) => Ok(false),
                Ok(ManifestHead::Undecided) => has_manifest_root(&path).await,
                Err(e) => Err(e),
            };
            match is_manifest {
                Ok(true) => manifests.push(path),
                Ok(false) => {}
                Err(e) => warn!("Cannot read {}: {}", path.display(), e),
            }
        }

        debug!("Found {} manifests under {}", manifests.len(), base.display());
        Ok(manifests)
    }

    /// Get statistics about discovered files
    pub async fn get_discovery_stats(&self, root: &Path) -> Result<DiscoveryStats> {
        let files = self.discover_files(root).await?;
        let manifests = self.find_manifest_files(root).await?;
        Ok(DiscoveryStats {
            files_found: files.len(),
            manifests_found: manifests.len(),
        })
    }
}

impl Default for FileDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about file discovery operation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiscoveryStats {
    pub files_found: usize,
    pub manifests_found: usize,
}

fn build_glob_set(patterns: &[String], kind: &str) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = globset::GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| CheckError::Config(format!("Invalid glob pattern '{}': {}", pattern, e)))?;
        builder.add(glob);
    }

    let set = builder
        .build()
        .map_err(|e| CheckError::Config(format!("Failed to build {} glob set: {}", kind, e)))?;
    Ok(Some(set))
}

fn traversal_error(path: &Path, e: std::io::Error) -> CheckError {
    CheckError::FileSystemTraversal {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

async fn read_head(path: &Path) -> std::io::Result<String> {
    let file = fs::File::open(path).await?;
    let mut buf = Vec::with_capacity(MANIFEST_HEAD_BYTES);
    file.take(MANIFEST_HEAD_BYTES as u64)
        .read_to_end(&mut buf)
        .await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Parse the whole document and look at its root element
async fn has_manifest_root(path: &Path) -> std::io::Result<bool> {
    debug!("Head of {} is inconclusive, parsing the whole file", path.display());
    let bytes = fs::read(path).await?;
    let source = String::from_utf8_lossy(&bytes);
    Ok(XmlElement::parse(&source).is_ok_and(|root| MANIFEST_ROOTS.contains(&root.name.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;
    use tokio::fs;

    const MANIFEST: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<extension type=\"module\"></extension>";

    async fn create_test_directory() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("site")).await.unwrap();
        fs::create_dir_all(root.join("admin/forms")).await.unwrap();

        fs::write(root.join("mod_demo.xml"), MANIFEST).await.unwrap();
        fs::write(root.join("mod_demo.php"), "<?php\n").await.unwrap();
        fs::write(root.join("README.txt"), "text file").await.unwrap();
        fs::write(root.join("site/helper.php"), "<?php\n").await.unwrap();
        fs::write(root.join("admin/forms/filter.xml"), "<form></form>")
            .await
            .unwrap();
        fs::write(root.join("admin/forms/legacy.xml"), "<install type=\"component\"/>")
            .await
            .unwrap();

        temp_dir
    }

    fn names(files: &[PathBuf]) -> HashSet<String> {
        files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_discover_default_extensions() {
        let temp_dir = create_test_directory().await;
        let files = FileDiscovery::new()
            .discover_files(temp_dir.path())
            .await
            .unwrap();

        assert_eq!(files.len(), 5);
        assert!(!names(&files).contains("README.txt"));

        let mut sorted = files.clone();
        sorted.sort();
        assert_eq!(files, sorted);
    }

    #[tokio::test]
    async fn test_discover_single_extension() {
        let temp_dir = create_test_directory().await;
        let files = FileDiscovery::new()
            .with_extensions(vec!["PHP".to_string()])
            .discover_files(temp_dir.path())
            .await
            .unwrap();

        assert_eq!(
            names(&files),
            HashSet::from(["mod_demo.php".to_string(), "helper.php".to_string()])
        );
    }

    #[tokio::test]
    async fn test_max_depth_limit() {
        let temp_dir = create_test_directory().await;
        let files = FileDiscovery::new()
            .with_max_depth(Some(1))
            .discover_files(temp_dir.path())
            .await
            .unwrap();

        // admin/forms/* sits at depth 2
        let found = names(&files);
        assert_eq!(files.len(), 3);
        assert!(found.contains("helper.php"));
        assert!(!found.contains("filter.xml"));
    }

    #[tokio::test]
    async fn test_include_and_exclude_patterns() {
        let temp_dir = create_test_directory().await;

        let included = FileDiscovery::new()
            .with_include_patterns(vec!["**/site/**".to_string()])
            .unwrap()
            .discover_files(temp_dir.path())
            .await
            .unwrap();
        assert_eq!(names(&included), HashSet::from(["helper.php".to_string()]));

        let excluded = FileDiscovery::new()
            .with_exclude_patterns(vec!["**/admin/**".to_string()])
            .unwrap()
            .discover_files(temp_dir.path())
            .await
            .unwrap();
        assert_eq!(excluded.len(), 3);
    }

    #[test]
    fn test_invalid_glob_is_config_error() {
        let result = FileDiscovery::new().with_include_patterns(vec!["a[".to_string()]);
        assert!(matches!(result, Err(CheckError::Config(_))));
    }

    #[test]
    fn test_should_process() {
        let discovery = FileDiscovery::new();

        assert!(discovery.should_process(Path::new("mod_demo.xml")));
        assert!(discovery.should_process(Path::new("helper.PHP")));
        assert!(!discovery.should_process(Path::new("notes.txt")));
        assert!(!discovery.should_process(Path::new("Makefile")));
    }

    #[tokio::test]
    async fn test_find_manifest_files() {
        let temp_dir = create_test_directory().await;
        let manifests = FileDiscovery::new()
            .find_manifest_files(temp_dir.path())
            .await
            .unwrap();

        assert_eq!(
            names(&manifests),
            HashSet::from(["mod_demo.xml".to_string(), "legacy.xml".to_string()])
        );
    }

    #[tokio::test]
    async fn test_discovery_stats() {
        let temp_dir = create_test_directory().await;
        let stats = FileDiscovery::new()
            .get_discovery_stats(temp_dir.path())
            .await
            .unwrap();

        assert_eq!(
            stats,
            DiscoveryStats {
                files_found: 5,
                manifests_found: 2,
            }
        );
    }

    #[test]
    fn test_manifest_head_detection() {
        assert!(is_manifest_head(MANIFEST));
        assert!(is_manifest_head("\u{feff}<?xml version=\"1.0\"?><!-- c --><!DOCTYPE install><install>"));
        assert!(!is_manifest_head("<?xml version=\"1.0\"?>\n<form><fields/></form>"));
        assert!(!is_manifest_head("<extensions/>"));
        assert!(!is_manifest_head("plain text <extension>"));
    }

    #[test]
    fn test_manifest_head_left_open() {
        let cut = format!("<?xml version=\"1.0\"?>\n<!-- {}", "x".repeat(200));
        assert_eq!(scan_manifest_head(&cut), ManifestHead::Undecided);
        assert_eq!(
            scan_manifest_head("<?xml version=\"1.0\"?>\n<!DOCTYPE install [ <!ENTITY a \"b\"> ]>\n<install>"),
            ManifestHead::Undecided
        );
        assert_eq!(scan_manifest_head("<?xml version=\"1.0\"?><form/>"), ManifestHead::Other);
        assert_eq!(scan_manifest_head(""), ManifestHead::Other);
    }

    #[tokio::test]
    async fn test_manifest_after_long_header() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let header = format!("<!-- {} -->", "x".repeat(MANIFEST_HEAD_BYTES + 1000));
        fs::write(
            root.join("mod_long.xml"),
            format!("<?xml version=\"1.0\"?>\n{header}\n<extension type=\"module\" client=\"site\"></extension>"),
        )
        .await
        .unwrap();
        fs::write(root.join("form_long.xml"), format!("{header}\n<form></form>"))
            .await
            .unwrap();
        fs::write(root.join("broken_long.xml"), format!("{header}\n<extension>"))
            .await
            .unwrap();

        let manifests = FileDiscovery::new().find_manifest_files(root).await.unwrap();
        assert_eq!(manifests, vec![root.join("mod_long.xml")]);
    }

    #[tokio::test]
    async fn test_nonexistent_directory() {
        let result = FileDiscovery::new()
            .discover_files(Path::new("/nonexistent/path"))
            .await;

        assert!(matches!(
            result,
            Err(CheckError::FileSystemTraversal { .. })
        ));
    }
}
