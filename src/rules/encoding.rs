use std::path::Path;

use regex::{Regex, RegexBuilder};

use crate::error::{CheckError, Result};
use crate::report::{ReportEntry, ReportSink, Severity};
use crate::rules::php_source::{CleanOptions, clean_php, split_lines};
use crate::rules::{Rule, RuleId, has_extension};

pub const DEFAULT_ENCODINGS: [&str; 9] = [
    "base64_decode",
    "base64_encode",
    "gzinflate",
    "gzdeflate",
    "gzuncompress",
    "gzcompress",
    "str_rot13",
    "convert_uudecode",
    "convert_uuencode",
];

/// Flags lines of PHP code calling encoding/obfuscation functions
#[derive(Debug, Clone)]
pub struct EncodingRule {
    /// `None` when no function names are configured
    pattern: Option<Regex>,
}

impl EncodingRule {
    pub fn new<S: AsRef<str>>(functions: &[S]) -> Result<Self> {
        let alternatives: Vec<String> = functions
            .iter()
            .map(|f| f.as_ref().trim())
            .filter(|f| !f.is_empty())
            .map(regex::escape)
            .collect();

        if alternatives.is_empty() {
            return Ok(Self { pattern: None });
        }

        let pattern = RegexBuilder::new(&alternatives.join("|"))
            .case_insensitive(true)
            .build()
            .map_err(|e| CheckError::Config(format!("Invalid encoding function list: {e}")))?;

        Ok(Self {
            pattern: Some(pattern),
        })
    }

    pub fn with_defaults() -> Self {
        Self::new(&DEFAULT_ENCODINGS).unwrap_or(Self { pattern: None })
    }
}

impl Rule for EncodingRule {
    fn id(&self) -> RuleId {
        RuleId::Encoding
    }

    fn title(&self) -> &'static str {
        "Encoding functions"
    }

    fn applies_to(&self, path: &Path) -> bool {
        has_extension(path, "php")
    }

    fn check(&self, path: &Path, content: &str, sink: &mut dyn ReportSink) {
        let Some(pattern) = &self.pattern else {
            return;
        };

        let original = split_lines(content);
        let cleaned = clean_php(content, CleanOptions::COMMENTS_AND_HTML);

        for (index, line) in split_lines(&cleaned).into_iter().enumerate() {
            let Some(found) = pattern.find(line) else {
                continue;
            };
            let code = original.get(index).copied().unwrap_or(line);
            sink.add_entry(
                ReportEntry::new(
                    path,
                    Severity::Warning,
                    format!("Encoding function {} found", found.as_str()),
                )
                .at_line(index + 1, code),
            );
        }
    }
}
