use std::path::Path;
use tempfile::TempDir;
use tokio::fs;

/// Module manifest that passes every check
pub const VALID_MODULE_MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<extension type="module" client="site" method="upgrade">
    <name>mod_hello</name>
    <author>Demo Team</author>
    <creationDate>2024-05</creationDate>
    <copyright>(C) Demo Team</copyright>
    <license>GNU General Public License version 2 or later</license>
    <authorEmail>team@example.org</authorEmail>
    <authorUrl>https://example.org</authorUrl>
    <version>1.0.0</version>
    <description>Says hello</description>
    <files>
        <filename module="mod_hello">mod_hello.php</filename>
        <folder>tmpl</folder>
    </files>
</extension>
"#;

/// Module manifest missing the root `client` attribute
pub const MODULE_WITHOUT_CLIENT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<extension type="module" method="upgrade">
    <name>mod_hello</name>
    <author>Demo Team</author>
    <creationDate>2024-05</creationDate>
    <copyright>(C) Demo Team</copyright>
    <license>GPL</license>
    <authorEmail>team@example.org</authorEmail>
    <authorUrl>https://example.org</authorUrl>
    <version>1.0.0</version>
    <description>Says hello</description>
    <files><filename module="mod_hello">mod_hello.php</filename></files>
</extension>
"#;

pub const GUARDED_PHP: &str = "<?php\n/**\n * @package Hello\n */\n\ndefined('_JEXEC') or die;\n\necho 'Hello';\n";

pub const UNGUARDED_PHP: &str = "<?php\n$payload = base64_decode($_GET['p']);\neval($payload);\n";

pub const CLASS_ONLY_PHP: &str = "<?php\nnamespace Demo\\Hello;\n\nuse Demo\\Base;\n\nclass Helper extends Base\n{\n    public function greet() { return 'hi'; }\n}\n";

/// Extension tree:
/// ```text
/// mod_hello.xml        valid manifest
/// mod_hello.php        guarded
/// helper.php           class declaration only
/// tmpl/default.php     no guard, encoded payload
/// media/readme.txt     ignored
/// ```
pub async fn create_extension_tree() -> std::io::Result<TempDir> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();

    create_test_file(&root.join("mod_hello.xml"), VALID_MODULE_MANIFEST).await?;
    create_test_file(&root.join("mod_hello.php"), GUARDED_PHP).await?;
    create_test_file(&root.join("helper.php"), CLASS_ONLY_PHP).await?;
    create_test_file(&root.join("tmpl/default.php"), UNGUARDED_PHP).await?;
    create_test_file(&root.join("media/readme.txt"), "Not checked").await?;

    Ok(temp_dir)
}

/// File system test utilities
pub async fn create_test_file(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, content).await
}

pub async fn file_exists(path: &Path) -> bool {
    fs::metadata(path).await.is_ok()
}
