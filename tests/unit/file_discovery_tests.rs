use extcheck::FileDiscovery;
use extcheck::file_discovery::is_manifest_head;

use crate::common::test_helpers::{create_extension_tree, create_test_file};

#[tokio::test]
async fn test_discovers_xml_and_php_only() {
    let tree = create_extension_tree().await.unwrap();
    let files = FileDiscovery::new().discover_files(tree.path()).await.unwrap();

    let names: Vec<String> = files
        .iter()
        .map(|p| p.strip_prefix(tree.path()).unwrap().display().to_string())
        .collect();
    assert_eq!(
        names,
        vec!["helper.php", "mod_hello.php", "mod_hello.xml", "tmpl/default.php"]
    );
}

#[tokio::test]
async fn test_exclude_pattern() {
    let tree = create_extension_tree().await.unwrap();
    let discovery = FileDiscovery::new()
        .with_exclude_patterns(vec!["**/tmpl/**".to_string()])
        .unwrap();
    let files = discovery.discover_files(tree.path()).await.unwrap();
    assert_eq!(files.len(), 3);
    assert!(files.iter().all(|f| !f.to_string_lossy().contains("tmpl")));
}

#[tokio::test]
async fn test_max_depth_zero_keeps_top_level() {
    let tree = create_extension_tree().await.unwrap();
    let files = FileDiscovery::new()
        .with_max_depth(Some(0))
        .discover_files(tree.path())
        .await
        .unwrap();
    assert_eq!(files.len(), 3);
}

#[tokio::test]
async fn test_manifest_detection() {
    let tree = create_extension_tree().await.unwrap();
    create_test_file(
        &tree.path().join("language/en-GB/en-GB.mod_hello.ini.xml"),
        "<?xml version=\"1.0\"?>\n<metafile><name>x</name></metafile>",
    )
    .await
    .unwrap();
    create_test_file(
        &tree.path().join("legacy.xml"),
        "<?xml version=\"1.0\"?>\n<!DOCTYPE install SYSTEM \"x.dtd\">\n<install type=\"component\"/>",
    )
    .await
    .unwrap();

    let manifests = FileDiscovery::new()
        .find_manifest_files(tree.path())
        .await
        .unwrap();
    let names: Vec<_> = manifests
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["legacy.xml", "mod_hello.xml"]);
}

#[test]
fn test_manifest_head_detection() {
    assert!(is_manifest_head("\u{feff}<?xml version=\"1.0\"?>\n<!-- c -->\n<extension type=\"module\">"));
    assert!(!is_manifest_head("<?xml version=\"1.0\"?><form><fieldset/></form>"));
    assert!(!is_manifest_head("plain text <extension>"));
}
