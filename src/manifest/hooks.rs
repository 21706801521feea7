//! Element-specific extra checks, dispatched by tag name

use std::collections::HashMap;

use crate::manifest::diagnostics::{Diagnostic, Finding};
use crate::manifest::xml::XmlElement;

pub type NodeHook = fn(&XmlElement) -> Vec<Diagnostic>;

/// Attributes made redundant by `link` on a `<menu>`
const MENU_LINK_OVERRIDES: [&str; 6] = ["act", "controller", "layout", "sub", "task", "view"];

#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: HashMap<&'static str, NodeHook>,
}

impl HookRegistry {
    /// Registry without any hooks
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("menu", check_menu);
        registry
    }

    /// Register a hook, replacing any previous one for the same element
    pub fn register(&mut self, element: &'static str, hook: NodeHook) {
        self.hooks.insert(element, hook);
    }

    pub fn get(&self, element: &str) -> Option<NodeHook> {
        self.hooks.get(element).copied()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run the hook registered for the node's tag, if any
    pub fn run(&self, node: &XmlElement) -> Vec<Diagnostic> {
        self.get(&node.name)
            .map(|hook| hook(node))
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&&str> = self.hooks.keys().collect();
        names.sort();
        f.debug_struct("HookRegistry").field("hooks", &names).finish()
    }
}

fn check_menu(node: &XmlElement) -> Vec<Diagnostic> {
    if !node.has_attr("link") {
        return Vec::new();
    }

    node.attributes
        .iter()
        .filter(|(name, _)| MENU_LINK_OVERRIDES.contains(&name.as_str()))
        .map(|(name, _)| {
            Diagnostic::warning(Finding::MenuUnusedAttribute {
                attribute: name.clone(),
            })
        })
        .collect()
}
