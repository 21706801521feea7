//! Manifest rule: parses XML manifests, runs the checks that depend on the
//! extension type and hands the document to the grammar validator.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::file_discovery::MANIFEST_ROOTS;
use crate::manifest::{
    Diagnostic, ExtensionType, Finding, GrammarStore, HookRegistry, ManifestValidator, XmlElement,
};
use crate::report::{ReportEntry, ReportSink};
use crate::rules::{Rule, RuleId, has_extension};

const CLIENTS: [&str; 2] = ["site", "administrator"];

pub struct ManifestRule {
    grammars: Arc<GrammarStore>,
    hooks: HookRegistry,
}

impl ManifestRule {
    pub fn new(grammars: Arc<GrammarStore>) -> Self {
        Self {
            grammars,
            hooks: HookRegistry::with_defaults(),
        }
    }

    pub fn with_hooks(grammars: Arc<GrammarStore>, hooks: HookRegistry) -> Self {
        Self { grammars, hooks }
    }
}

impl Rule for ManifestRule {
    fn id(&self) -> RuleId {
        RuleId::Manifest
    }

    fn title(&self) -> &'static str {
        "XML manifest"
    }

    fn applies_to(&self, path: &Path) -> bool {
        has_extension(path, "xml")
    }

    fn check(&self, path: &Path, content: &str, sink: &mut dyn ReportSink) {
        let root = match XmlElement::parse(content) {
            Ok(root) => root,
            Err(e) => {
                debug!("Skipping {}: not parseable as XML ({})", path.display(), e);
                return;
            }
        };
        if !MANIFEST_ROOTS.contains(&root.name.as_str()) {
            debug!("Skipping {}: root element <{}>", path.display(), root.name);
            return;
        }

        let type_value = root.attr("type").unwrap_or_default();
        let Ok(extension_type) = type_value.parse::<ExtensionType>() else {
            sink.add_error(
                path,
                Finding::UnknownType {
                    value: type_value.to_string(),
                }
                .to_string(),
            );
            return;
        };

        let grammar = match self.grammars.load(extension_type) {
            Ok(grammar) => grammar,
            Err(e) => {
                sink.add_error(
                    path,
                    Finding::GrammarUnavailable {
                        details: e.to_string(),
                    }
                    .to_string(),
                );
                None
            }
        };

        for diagnostic in top_level_checks(&root, extension_type) {
            sink.add_entry(ReportEntry::new(
                path,
                diagnostic.severity,
                diagnostic.message(),
            ));
        }

        if let Some(grammar) = grammar {
            ManifestValidator::new(&grammar, &self.hooks)
                .validate_document(&root)
                .flush(path, sink);
        }
    }
}

/// Checks on the root element that depend on the extension type
pub fn top_level_checks(root: &XmlElement, extension_type: ExtensionType) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    if root.attr("method") != Some("upgrade") {
        diagnostics.push(Diagnostic::warning(Finding::MissingMethodUpgrade));
    }

    match extension_type {
        ExtensionType::Module | ExtensionType::Template => {
            diagnostics.extend(check_client(root));
        }
        ExtensionType::Package => {
            if let Some(files) = root.child("files") {
                for item in files.children_named("file") {
                    diagnostics.extend(check_package_item(item));
                }
            }
        }
        _ => {}
    }

    diagnostics
}

fn check_client(node: &XmlElement) -> Option<Diagnostic> {
    match node.attr("client") {
        None => Some(Diagnostic::error(Finding::MissingAttribute {
            node: node.name.clone(),
            attribute: "client".to_string(),
        })),
        Some(client) if !CLIENTS.contains(&client) => {
            Some(Diagnostic::error(Finding::UnknownAttributeValue {
                node: node.name.clone(),
                attribute: "client".to_string(),
                value: client.to_string(),
            }))
        }
        Some(_) => None,
    }
}

fn check_package_item(item: &XmlElement) -> Option<Diagnostic> {
    let item_type = item.attr("type").unwrap_or_default();
    match item_type.parse::<ExtensionType>() {
        Ok(ExtensionType::Plugin) if !item.has_attr("group") => {
            Some(Diagnostic::error(Finding::MissingAttribute {
                node: item.name.clone(),
                attribute: "group".to_string(),
            }))
        }
        Ok(ty) if ty.requires_client() => check_client(item),
        Ok(ExtensionType::Package) | Err(_) => Some(Diagnostic::error(Finding::UnknownType {
            value: item_type.to_string(),
        })),
        Ok(_) => None,
    }
}
