//! Per-node attribute and child checks

use crate::manifest::diagnostics::{Diagnostic, Finding};
use crate::manifest::grammar::{AttributeRules, ChildMode, ChildRules, Grammar};
use crate::manifest::xml::XmlElement;

/// Flag attributes of `node` not allowed by `ruleset`
pub fn check_attributes(node: &XmlElement, ruleset: &str, grammar: &Grammar) -> Vec<Diagnostic> {
    let unknown = |attribute: &str| {
        Diagnostic::notice(Finding::UnknownAttribute {
            node: node.name.clone(),
            attribute: attribute.to_string(),
        })
    };

    match grammar.attribute_rules(ruleset) {
        None => node.attributes.iter().map(|(name, _)| unknown(name)).collect(),
        Some(AttributeRules::Any) => Vec::new(),
        Some(rules) => node
            .attributes
            .iter()
            .filter(|(name, _)| !rules.allows(name))
            .map(|(name, _)| unknown(name))
            .collect(),
    }
}

/// Multiplicity, unknown-child and empty-child checks for the children of `node`
pub fn check_children(node: &XmlElement, ruleset: &str, grammar: &Grammar) -> Vec<Diagnostic> {
    let rules = match grammar.child_rules(ruleset) {
        None => {
            if node.children.is_empty() {
                return Vec::new();
            }
            return vec![Diagnostic::notice(Finding::UnknownChildren {
                node: node.name.clone(),
            })];
        }
        Some(rules) => rules,
    };
    let ChildRules::Declared(declared) = rules else {
        return Vec::new();
    };

    let mut diagnostics = Vec::new();
    let multiple = |child: &str| Finding::MultipleFound {
        node: node.name.clone(),
        child: child.to_string(),
    };

    for rule in declared {
        let child = rule.key.element.as_str();
        let count = node.count_children(child);
        match rule.mode {
            ChildMode::RequiredSingle if count == 0 => {
                diagnostics.push(Diagnostic::error(Finding::MissingRequired {
                    node: node.name.clone(),
                    child: child.to_string(),
                }));
            }
            ChildMode::RequiredSingle if count > 1 => {
                diagnostics.push(Diagnostic::error(multiple(child)));
            }
            ChildMode::RecommendedSingle if count == 0 => {
                diagnostics.push(Diagnostic::notice(Finding::MissingOptional {
                    node: node.name.clone(),
                    child: child.to_string(),
                }));
            }
            ChildMode::RecommendedSingle if count > 1 => {
                diagnostics.push(Diagnostic::warning(multiple(child)));
            }
            _ => {}
        }
    }

    for child in distinct_child_names(node) {
        match rules.resolve(child) {
            None => diagnostics.push(Diagnostic::notice(Finding::UnknownChild {
                node: node.name.clone(),
                child: child.to_string(),
            })),
            Some(rule) if rule.mode == ChildMode::OptionalSingle && node.count_children(child) > 1 => {
                diagnostics.push(Diagnostic::error(multiple(child)));
            }
            Some(_) => {}
        }
    }

    diagnostics.extend(
        node.children
            .iter()
            .filter(|child| child.is_empty())
            .map(|child| {
                Diagnostic::notice(Finding::EmptyChild {
                    child: child.name.clone(),
                })
            }),
    );

    diagnostics
}

/// Child element names in order of first appearance
fn distinct_child_names(node: &XmlElement) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for child in &node.children {
        if !names.contains(&child.name.as_str()) {
            names.push(&child.name);
        }
    }
    names
}
