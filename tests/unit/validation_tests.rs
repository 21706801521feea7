//! Grammar-driven manifest validation, exercised through the public API
use extcheck::manifest::{
    ChildMode, DiagnosticBucket, Finding, Grammar, HookRegistry, ManifestValidator, XmlElement,
    check_attributes, check_children,
};
use extcheck::{Diagnostic, Severity};
use pretty_assertions::assert_eq;

fn grammar(json: &str) -> Grammar {
    Grammar::from_json("test", json).unwrap()
}

fn validate(grammar: &Grammar, xml: &str) -> DiagnosticBucket {
    let hooks = HookRegistry::with_defaults();
    let root = XmlElement::parse(xml).unwrap();
    ManifestValidator::new(grammar, &hooks).validate_document(&root)
}

fn node_with(children: &[&str]) -> XmlElement {
    children.iter().fold(XmlElement::new("extension"), |node, name| {
        node.with_child(XmlElement::new(*name).with_text("x"))
    })
}

#[test]
fn test_allowed_attributes_are_never_reported() {
    let g = grammar(r#"{ "attributes": { "extension": ["type", "method", "client"] } }"#);
    let node = XmlElement::new("extension")
        .with_attr("type", "module")
        .with_attr("method", "upgrade")
        .with_attr("client", "site");
    assert!(check_attributes(&node, "extension", &g).is_empty());

    let node = node.with_attr("folder", "x");
    assert_eq!(
        check_attributes(&node, "extension", &g),
        vec![Diagnostic::notice(Finding::UnknownAttribute {
            node: "extension".to_string(),
            attribute: "folder".to_string(),
        })]
    );
}

#[test]
fn test_wildcards_silence_structural_checks() {
    let g = grammar(r#"{ "nodes": { "fields": { "*": "*" } }, "attributes": { "fields": ["*"] } }"#);
    let node = XmlElement::new("fields")
        .with_attr("name", "params")
        .with_attr("addfieldpath", "/x")
        .with_child(XmlElement::new("fieldset"))
        .with_child(XmlElement::new("fieldset"))
        .with_child(XmlElement::new("field").with_attr("name", "a"));

    assert!(check_attributes(&node, "fields", &g).is_empty());
    assert!(check_children(&node, "fields", &g).is_empty());
}

#[test]
fn test_required_single_missing_is_one_error() {
    let g = grammar(r#"{ "nodes": { "extension": { "name": "!" } } }"#);
    let diagnostics = check_children(&node_with(&[]), "extension", &g);
    assert_eq!(
        diagnostics,
        vec![Diagnostic::error(Finding::MissingRequired {
            node: "extension".to_string(),
            child: "name".to_string(),
        })]
    );
}

#[test]
fn test_required_single_duplicated_is_one_error() {
    let g = grammar(r#"{ "nodes": { "extension": { "name": "!" } } }"#);
    let diagnostics = check_children(&node_with(&["name", "name"]), "extension", &g);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Error);
    assert!(matches!(diagnostics[0].finding, Finding::MultipleFound { .. }));
}

#[test]
fn test_recommended_single_present_once_is_silent() {
    let g = grammar(r#"{ "nodes": { "extension": { "author": "=" } } }"#);
    assert!(check_children(&node_with(&["author"]), "extension", &g).is_empty());

    let twice = check_children(&node_with(&["author", "author"]), "extension", &g);
    assert_eq!(twice.len(), 1);
    assert_eq!(twice[0].severity, Severity::Warning);
}

#[test]
fn test_optional_single_mode() {
    let g = grammar(r#"{ "nodes": { "extension": { "scriptfile": "?" } } }"#);
    let rules = g.child_rules("extension").unwrap();
    assert_eq!(rules.resolve("scriptfile").unwrap().mode, ChildMode::OptionalSingle);

    // Absent or single: nothing. Several: one error, no notice.
    assert!(check_children(&node_with(&[]), "extension", &g).is_empty());
    assert!(check_children(&node_with(&["scriptfile"]), "extension", &g).is_empty());
    let diagnostics = check_children(&node_with(&["scriptfile", "scriptfile"]), "extension", &g);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Error);
}

#[test]
fn test_empty_leaf_is_one_notice_whatever_its_name() {
    for name in ["description", "x", "files"] {
        let g = grammar(&format!(r#"{{ "nodes": {{ "extension": {{ "{name}": "*" }} }} }}"#));
        let node = XmlElement::new("extension").with_child(XmlElement::new(name));
        assert_eq!(
            check_children(&node, "extension", &g),
            vec![Diagnostic::notice(Finding::EmptyChild {
                child: name.to_string(),
            })]
        );
    }
    // Wildcard rulesets skip every child check, empty elements included
    let g = grammar(r#"{ "nodes": { "extension": { "*": "*" } } }"#);
    let node = XmlElement::new("extension").with_child(XmlElement::new("x"));
    assert!(check_children(&node, "extension", &g).is_empty());
}

#[test]
fn test_recursion_uses_contextual_rulesets() {
    let g = grammar(
        r#"{
        "nodes": {
            "extension": { "administration": "?", "files": "?" },
            "administration": { "administration:files": "?" },
            "files": { "filename": "*" },
            "administration:files": { "folder": "*" }
        }
    }"#,
    );

    let bucket = validate(
        &g,
        r#"<extension>
            <files><filename>a.php</filename><folder>x</folder></files>
            <administration><files><folder>x</folder><filename>b.php</filename></files></administration>
        </extension>"#,
    );

    let notices: Vec<String> = bucket.notices().iter().map(Diagnostic::message).collect();
    assert_eq!(
        notices,
        vec![
            "<files>: unknown child <folder>".to_string(),
            "<files>: unknown child <filename>".to_string(),
        ]
    );
}

#[test]
fn test_menu_hook_runs_inside_validation() {
    let g = grammar(
        r#"{
        "nodes": { "extension": { "administration": "?" }, "administration": { "menu": "?" } },
        "attributes": { "menu": ["link", "task", "view", "img"] }
    }"#,
    );
    let bucket = validate(
        &g,
        r#"<extension><administration><menu link="option=com_demo" view="items" img="x">Demo</menu></administration></extension>"#,
    );
    assert_eq!(
        bucket.warnings().to_vec(),
        vec![Diagnostic::warning(Finding::MenuUnusedAttribute {
            attribute: "view".to_string(),
        })]
    );
    assert!(bucket.errors().is_empty());
}

#[test]
fn test_unknown_mode_rejected_at_load() {
    let result = Grammar::from_json("bad", r#"{ "nodes": { "extension": { "name": "+" } } }"#);
    assert!(result.is_err());
}
