// tollgate-core/src/domain/ports/sink.rs

use tracing::{info, warn};

use crate::domain::quality::{Finding, Severity};
use crate::domain::routing::RoutingSummary;

/// Receives what the orchestrator and router observe. Each run gets its own sink.
pub trait ReportSink: Send {
    fn on_finding(&mut self, finding: &Finding);

    fn on_routed(&mut self, _summary: &RoutingSummary) {}
}

/// Keeps everything in memory. Used by tests and by callers that persist reports themselves.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub findings: Vec<Finding>,
    pub routed: Vec<RoutingSummary>,
}

impl ReportSink for MemorySink {
    fn on_finding(&mut self, finding: &Finding) {
        self.findings.push(finding.clone());
    }

    fn on_routed(&mut self, summary: &RoutingSummary) {
        self.routed.push(*summary);
    }
}

/// Forwards to `tracing`, tagged with the batch name.
#[derive(Debug, Clone)]
pub struct TracingSink {
    batch: String,
}

impl TracingSink {
    pub fn new(batch: impl Into<String>) -> Self {
        Self {
            batch: batch.into(),
        }
    }
}

impl ReportSink for TracingSink {
    fn on_finding(&mut self, finding: &Finding) {
        match finding.severity() {
            Severity::Error | Severity::Warning => warn!(
                batch = %self.batch,
                rule = finding.rule_id(),
                severity = %finding.severity(),
                "{}",
                finding.message()
            ),
            Severity::Info => info!(batch = %self.batch, rule = finding.rule_id(), "{}", finding.message()),
        }
    }

    fn on_routed(&mut self, summary: &RoutingSummary) {
        info!(
            batch = %self.batch,
            clean = summary.clean_rows,
            quarantine = summary.quarantine_rows,
            duplicates = summary.duplicates_removed,
            "Batch routed"
        );
    }
}
