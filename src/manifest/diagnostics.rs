//! Manifest findings and the per-document diagnostic bucket

use std::path::Path;

use thiserror::Error;

use crate::report::{ReportSink, Severity};

/// What a manifest check found. `Display` renders the user-facing message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    #[error("<{node}>: unknown attribute '{attribute}'")]
    UnknownAttribute { node: String, attribute: String },

    #[error("<{node}>: child elements are not expected here")]
    UnknownChildren { node: String },

    #[error("<{node}>: unknown child <{child}>")]
    UnknownChild { node: String, child: String },

    #[error("<{node}>: missing required child <{child}>")]
    MissingRequired { node: String, child: String },

    #[error("<{node}>: missing optional child <{child}>")]
    MissingOptional { node: String, child: String },

    #[error("<{node}>: multiple <{child}> found when a single one is expected")]
    MultipleFound { node: String, child: String },

    #[error("<{child}>: empty element")]
    EmptyChild { child: String },

    #[error("<menu>: attribute '{attribute}' is unused because 'link' overrides it")]
    MenuUnusedAttribute { attribute: String },

    #[error("unknown extension type '{value}'")]
    UnknownType { value: String },

    #[error("<{node}>: missing attribute {attribute}")]
    MissingAttribute { node: String, attribute: String },

    #[error("<{node}>: unknown value '{value}' of attribute {attribute}")]
    UnknownAttributeValue {
        node: String,
        attribute: String,
        value: String,
    },

    #[error("<extension>: method=\"upgrade\" is not set, updates will fail")]
    MissingMethodUpgrade,

    #[error("manifest grammar could not be loaded: {details}")]
    GrammarUnavailable { details: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub finding: Finding,
}

impl Diagnostic {
    pub fn error(finding: Finding) -> Self {
        Self {
            severity: Severity::Error,
            finding,
        }
    }

    pub fn warning(finding: Finding) -> Self {
        Self {
            severity: Severity::Warning,
            finding,
        }
    }

    pub fn notice(finding: Finding) -> Self {
        Self {
            severity: Severity::Notice,
            finding,
        }
    }

    pub fn message(&self) -> String {
        self.finding.to_string()
    }
}

/// Errors, warnings and notices collected while validating one manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticBucket {
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
    notices: Vec<Diagnostic>,
}

impl DiagnosticBucket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.errors.push(diagnostic),
            Severity::Warning => self.warnings.push(diagnostic),
            Severity::Notice => self.notices.push(diagnostic),
        }
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn notices(&self) -> &[Diagnostic] {
        &self.notices
    }

    pub fn len(&self) -> usize {
        self.errors.len() + self.warnings.len() + self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hand the bucket to the sink: one joined message per non-empty severity
    pub fn flush(self, file: &Path, sink: &mut dyn ReportSink) {
        if !self.errors.is_empty() {
            sink.add_error(file, join_messages(&self.errors));
        }
        if !self.warnings.is_empty() {
            sink.add_warning(file, join_messages(&self.warnings));
        }
        if !self.notices.is_empty() {
            sink.add_notice(file, join_messages(&self.notices));
        }
    }
}

impl Extend<Diagnostic> for DiagnosticBucket {
    fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, iter: I) {
        for diagnostic in iter {
            self.push(diagnostic);
        }
    }
}

fn join_messages(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(Diagnostic::message)
        .collect::<Vec<_>>()
        .join("\n")
}
