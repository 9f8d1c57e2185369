pub mod business;
pub mod metrics;
pub mod schema;

pub use metrics::ValidationMetrics;

/// Severity of a single finding. Critical findings reject the record;
/// everything below rides along as a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    AcceptWithWarning,
    Reject,
}

#[derive(Debug, Clone)]
pub struct Finding {
    pub code: &'static str,
    pub severity: Severity,
    pub field: String,
    pub message: String,
}

/// Accumulated findings for one record or event.
#[derive(Debug, Default)]
pub struct ValidationReport {
    findings: Vec<Finding>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        code: &'static str,
        severity: Severity,
        field: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.findings.push(Finding {
            code,
            severity,
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn decision(&self) -> Decision {
        if self.findings.iter().any(|f| f.severity == Severity::Critical) {
            Decision::Reject
        } else if self.findings.is_empty() {
            Decision::Accept
        } else {
            Decision::AcceptWithWarning
        }
    }

    /// Warning payload stored alongside accepted records.
    pub fn warnings(&self) -> Vec<String> {
        self.findings
            .iter()
            .filter(|f| f.severity < Severity::Critical)
            .map(|f| format!("[{}] {}: {}", f.code, f.field, f.message))
            .collect()
    }

    pub fn rejection_reasons(&self) -> Vec<String> {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Critical)
            .map(|f| format!("[{}] {}: {}", f.code, f.field, f.message))
            .collect()
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.findings.extend(other.findings);
    }

    pub fn log(&self, subject: &str) {
        for finding in &self.findings {
            match finding.severity {
                Severity::Critical | Severity::High => log::warn!(
                    "{subject}: [{}/{}] {}: {}",
                    finding.code,
                    finding.severity.as_str(),
                    finding.field,
                    finding.message
                ),
                _ => log::info!(
                    "{subject}: [{}/{}] {}: {}",
                    finding.code,
                    finding.severity.as_str(),
                    finding.field,
                    finding.message
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_tracks_worst_severity() {
        let mut report = ValidationReport::new();
        assert_eq!(report.decision(), Decision::Accept);

        report.add("X1", Severity::Low, "name", "looks odd");
        assert_eq!(report.decision(), Decision::AcceptWithWarning);
        assert_eq!(report.warnings().len(), 1);

        report.add("X2", Severity::Critical, "rank", "missing");
        assert_eq!(report.decision(), Decision::Reject);
        assert_eq!(report.rejection_reasons().len(), 1);
    }
}
