//! Grammar documents
//!
//! A grammar document is JSON of the form
//!
//! ```json
//! {
//!   "nodes": {
//!     "extension": { "name": "!", "files": "!", "description": "=", "sql:file": "*" },
//!     "fields": { "*": "*" }
//!   },
//!   "attributes": {
//!     "extension": ["type", "version", "method", "client"],
//!     "field": ["*"]
//!   }
//! }
//! ```
//!
//! `nodes` maps a ruleset name to its child rules, `attributes` maps a
//! ruleset name to the attributes it may carry. Keys under a ruleset are
//! either a bare element name or `context:element`; the full key is the
//! ruleset name used when descending into that child.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{GrammarError, GrammarResult};

/// Key marking a wildcard child ruleset or an "any attribute" list
pub const WILDCARD: &str = "*";

/// Cardinality of a declared child
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildMode {
    /// `!`: exactly one
    RequiredSingle,
    /// `=`: at most one, absence is a notice and duplicates a warning
    RecommendedSingle,
    /// `?`: at most one, duplicates are an error and absence is fine
    OptionalSingle,
    /// `*`: any number
    Multiple,
}

impl ChildMode {
    pub fn symbol(&self) -> &'static str {
        match self {
            ChildMode::RequiredSingle => "!",
            ChildMode::RecommendedSingle => "=",
            ChildMode::OptionalSingle => "?",
            ChildMode::Multiple => "*",
        }
    }
}

impl FromStr for ChildMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "!" => Ok(ChildMode::RequiredSingle),
            "=" => Ok(ChildMode::RecommendedSingle),
            "?" => Ok(ChildMode::OptionalSingle),
            "*" => Ok(ChildMode::Multiple),
            other => Err(other.to_string()),
        }
    }
}

/// A child key, `element` or `context:element`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChildKey {
    pub context: Option<String>,
    pub element: String,
}

impl ChildKey {
    pub fn new(element: impl Into<String>) -> Self {
        Self {
            context: None,
            element: element.into(),
        }
    }

    pub fn in_context(context: impl Into<String>, element: impl Into<String>) -> Self {
        Self {
            context: Some(context.into()),
            element: element.into(),
        }
    }

    /// Parse a raw key. Returns `None` when either half is empty.
    pub fn parse(raw: &str) -> Option<Self> {
        let key = match raw.split_once(':') {
            Some((context, element)) => Self::in_context(context, element),
            None => Self::new(raw),
        };
        let context_ok = key.context.as_deref().is_none_or(|c| !c.is_empty());
        (context_ok && !key.element.is_empty()).then_some(key)
    }

    /// Ruleset name used for the child's own rules
    pub fn ruleset(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ChildKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(context) => write!(f, "{}:{}", context, self.element),
            None => f.write_str(&self.element),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildRule {
    pub key: ChildKey,
    pub mode: ChildMode,
}

/// Child rules of one ruleset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildRules {
    /// Any children, unchecked and not descended into
    Wildcard,
    /// Declared children in document order
    Declared(Vec<ChildRule>),
}

impl ChildRules {
    /// Rule covering `element`. When several keys share an element the last
    /// declared one wins.
    pub fn resolve(&self, element: &str) -> Option<&ChildRule> {
        match self {
            ChildRules::Wildcard => None,
            ChildRules::Declared(rules) => rules.iter().rev().find(|r| r.key.element == element),
        }
    }
}

/// Attribute rules of one ruleset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeRules {
    Any,
    Allowed(Vec<String>),
}

impl AttributeRules {
    pub fn allows(&self, attribute: &str) -> bool {
        match self {
            AttributeRules::Any => true,
            AttributeRules::Allowed(names) => names.iter().any(|n| n == attribute),
        }
    }
}

#[derive(Deserialize)]
struct RawGrammar {
    #[serde(default)]
    nodes: HashMap<String, Map<String, Value>>,
    #[serde(default)]
    attributes: HashMap<String, Vec<String>>,
}

/// Parsed grammar document. Read-only once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grammar {
    children: HashMap<String, ChildRules>,
    attributes: HashMap<String, AttributeRules>,
}

impl Grammar {
    /// Parse a grammar document. `name` only labels errors.
    pub fn from_json(name: &str, source: &str) -> GrammarResult<Self> {
        let raw: RawGrammar = serde_json::from_str(source).map_err(|e| GrammarError::Json {
            name: name.to_string(),
            details: e.to_string(),
        })?;

        let mut children = HashMap::with_capacity(raw.nodes.len());
        for (ruleset, entries) in raw.nodes {
            if let Some(rules) = Self::parse_child_rules(name, &ruleset, entries)? {
                children.insert(ruleset, rules);
            }
        }

        let attributes = raw
            .attributes
            .into_iter()
            .filter_map(|(ruleset, names)| {
                let rules = match names.first().map(String::as_str) {
                    None => return None,
                    Some(WILDCARD) => AttributeRules::Any,
                    Some(_) => AttributeRules::Allowed(names),
                };
                Some((ruleset, rules))
            })
            .collect();

        Ok(Self {
            children,
            attributes,
        })
    }

    fn parse_child_rules(
        name: &str,
        ruleset: &str,
        entries: Map<String, Value>,
    ) -> GrammarResult<Option<ChildRules>> {
        if entries.is_empty() {
            return Ok(None);
        }

        let mut rules = Vec::with_capacity(entries.len());
        let mut wildcard = false;
        for (raw_key, value) in entries {
            let Some(symbol) = value.as_str() else {
                return Err(GrammarError::InvalidDocument {
                    name: name.to_string(),
                    details: format!("mode of '{raw_key}' in ruleset '{ruleset}' is not a string"),
                });
            };
            let mode = symbol.parse::<ChildMode>().map_err(|mode| GrammarError::UnknownMode {
                ruleset: ruleset.to_string(),
                child: raw_key.clone(),
                mode,
            })?;

            if raw_key == WILDCARD {
                wildcard = true;
                continue;
            }

            let key = ChildKey::parse(&raw_key).ok_or_else(|| GrammarError::InvalidDocument {
                name: name.to_string(),
                details: format!("malformed child key '{raw_key}' in ruleset '{ruleset}'"),
            })?;
            rules.push(ChildRule { key, mode });
        }

        Ok(Some(if wildcard {
            ChildRules::Wildcard
        } else {
            ChildRules::Declared(rules)
        }))
    }

    pub fn child_rules(&self, ruleset: &str) -> Option<&ChildRules> {
        self.children.get(ruleset)
    }

    pub fn attribute_rules(&self, ruleset: &str) -> Option<&AttributeRules> {
        self.attributes.get(ruleset)
    }

    /// Ruleset name for a child `element` found under `ruleset`, if the
    /// grammar lets the validator descend into it
    pub fn resolve_child(&self, ruleset: &str, element: &str) -> Option<String> {
        self.child_rules(ruleset)?
            .resolve(element)
            .map(|rule| rule.key.ruleset())
    }

    pub fn ruleset_count(&self) -> usize {
        self.children.len()
    }
}
