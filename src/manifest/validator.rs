use crate::manifest::checks::{check_attributes, check_children};
use crate::manifest::diagnostics::DiagnosticBucket;
use crate::manifest::grammar::Grammar;
use crate::manifest::hooks::HookRegistry;
use crate::manifest::xml::XmlElement;

/// Ruleset applied to the document root
pub const ROOT_RULESET: &str = "extension";

/// Recursive grammar-driven validator for one manifest document
///
/// Holds no state between documents: every call writes only into the
/// bucket it is given, so the same validator can be reused and shared.
#[derive(Debug, Clone, Copy)]
pub struct ManifestValidator<'a> {
    grammar: &'a Grammar,
    hooks: &'a HookRegistry,
}

impl<'a> ManifestValidator<'a> {
    pub fn new(grammar: &'a Grammar, hooks: &'a HookRegistry) -> Self {
        Self { grammar, hooks }
    }

    /// Validate `node` against `ruleset`, then descend into every child the
    /// ruleset knows about
    pub fn validate(&self, node: &XmlElement, ruleset: &str, bucket: &mut DiagnosticBucket) {
        bucket.extend(check_attributes(node, ruleset, self.grammar));
        bucket.extend(check_children(node, ruleset, self.grammar));
        bucket.extend(self.hooks.run(node));

        for child in &node.children {
            if let Some(child_ruleset) = self.grammar.resolve_child(ruleset, &child.name) {
                self.validate(child, &child_ruleset, bucket);
            }
        }
    }

    pub fn validate_document(&self, root: &XmlElement) -> DiagnosticBucket {
        let mut bucket = DiagnosticBucket::new();
        self.validate(root, ROOT_RULESET, &mut bucket);
        bucket
    }
}
