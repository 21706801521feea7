//! Declarative manifest validation
//!
//! A manifest is checked node by node against a [`Grammar`] loaded for its
//! extension type. Findings are collected into a [`DiagnosticBucket`] and
//! flushed to a report sink once the whole document has been walked.

pub mod checks;
pub mod diagnostics;
pub mod extension_type;
pub mod grammar;
pub mod grammar_store;
pub mod hooks;
pub mod validator;
pub mod xml;

pub use checks::{check_attributes, check_children};
pub use diagnostics::{Diagnostic, DiagnosticBucket, Finding};
pub use extension_type::{ExtensionType, UnknownExtensionType};
pub use grammar::{AttributeRules, ChildKey, ChildMode, ChildRule, ChildRules, Grammar};
pub use grammar_store::{GrammarSource, GrammarStore};
pub use hooks::{HookRegistry, NodeHook};
pub use validator::{ManifestValidator, ROOT_RULESET};
pub use xml::XmlElement;
