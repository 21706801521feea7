use std::path::Path;

use crate::report::ReportSink;
use crate::rules::php_source::is_declaration_only;
use crate::rules::{Rule, RuleId, has_extension};

pub const DEFAULT_CONSTANTS: [&str; 5] =
    ["_JEXEC", "JPATH_PLATFORM", "JPATH_BASE", "AKEEBAENGINE", "WPINC"];

/// Requires PHP files to stop when requested directly, i.e. to carry a
/// `defined('_JEXEC') or die;` style guard before any code
#[derive(Debug, Clone)]
pub struct AccessGuardRule {
    constants: Vec<String>,
}

impl AccessGuardRule {
    pub fn new<S: AsRef<str>>(constants: &[S]) -> Self {
        Self {
            constants: constants
                .iter()
                .map(|c| c.as_ref().trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(&DEFAULT_CONSTANTS)
    }

    pub fn constants(&self) -> &[String] {
        &self.constants
    }

    /// True when a guard line is found, or when the file has no code at all
    pub fn is_guarded(&self, content: &str) -> bool {
        let mut has_code = false;

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed == "<?php" || trimmed == "?>" {
                continue;
            }
            if !trimmed.starts_with('/') && !trimmed.starts_with('*') {
                has_code = true;
            }
            if self.is_guard_line(line) {
                return true;
            }
        }

        !has_code
    }

    /// `defined` (any case), then a constant (exact case), then `die` (any case)
    fn is_guard_line(&self, line: &str) -> bool {
        let lower = line.to_ascii_lowercase();
        let (Some(defined_at), Some(die_at)) = (lower.find("defined"), lower.find("die")) else {
            return false;
        };

        self.constants.iter().any(|constant| {
            line.find(constant.as_str())
                .is_some_and(|constant_at| constant_at > defined_at && die_at > constant_at)
        })
    }
}

impl Rule for AccessGuardRule {
    fn id(&self) -> RuleId {
        RuleId::Jexec
    }

    fn title(&self) -> &'static str {
        "Direct access guard"
    }

    fn applies_to(&self, path: &Path) -> bool {
        has_extension(path, "php")
    }

    fn check(&self, path: &Path, content: &str, sink: &mut dyn ReportSink) {
        if self.is_guarded(content) || is_declaration_only(content) {
            return;
        }

        let example = self
            .constants
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_CONSTANTS[0]);
        sink.add_error(
            path,
            format!("Direct access guard not found, expected defined('{example}') or die"),
        );
    }
}
