use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use extcheck::{ReportEntry, ReportSink, Rule, RuleId, Severity};

/// Sink that records entries behind a shared handle, so a test can keep
/// reading after handing the sink away
#[derive(Clone, Default)]
pub struct RecordingSink {
    entries: Arc<Mutex<Vec<ReportEntry>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<ReportEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.severity == severity)
            .map(|e| e.message)
            .collect()
    }
}

impl ReportSink for RecordingSink {
    fn add_entry(&mut self, entry: ReportEntry) {
        self.entries.lock().unwrap().push(entry);
    }
}

/// Rule that reports one fixed finding for every file with a given extension
pub struct MockRule {
    extension: &'static str,
    severity: Severity,
    message: &'static str,
    calls: Arc<AtomicUsize>,
}

impl MockRule {
    pub fn new(extension: &'static str, severity: Severity, message: &'static str) -> Self {
        Self {
            extension,
            severity,
            message,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared call counter, valid after the rule is moved into a rule set
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl Rule for MockRule {
    fn id(&self) -> RuleId {
        RuleId::Encoding
    }

    fn title(&self) -> &'static str {
        "mock"
    }

    fn applies_to(&self, path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()) == Some(self.extension)
    }

    fn check(&self, path: &Path, _content: &str, sink: &mut dyn ReportSink) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        sink.add_entry(ReportEntry::new(path, self.severity, self.message));
    }
}
