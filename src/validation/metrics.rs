use log::info;

use crate::validation::{Decision, ValidationReport};

/// Per-batch validation counters, logged at the end of a run so pass
/// rates can be alerted on externally.
#[derive(Debug, Default, Clone)]
pub struct ValidationMetrics {
    pub schema_checked: u64,
    pub schema_rejected: u64,
    pub business_checked: u64,
    pub business_rejected: u64,
    pub warnings: u64,
}

impl ValidationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_schema(&mut self, report: &ValidationReport) {
        self.schema_checked += 1;
        self.record(report, true);
    }

    pub fn record_business(&mut self, report: &ValidationReport) {
        self.business_checked += 1;
        self.record(report, false);
    }

    fn record(&mut self, report: &ValidationReport, schema: bool) {
        match report.decision() {
            Decision::Reject => {
                if schema {
                    self.schema_rejected += 1;
                } else {
                    self.business_rejected += 1;
                }
            }
            Decision::AcceptWithWarning => self.warnings += report.warnings().len() as u64,
            Decision::Accept => {}
        }
    }

    pub fn schema_pass_rate(&self) -> f64 {
        pass_rate(self.schema_checked, self.schema_rejected)
    }

    pub fn business_pass_rate(&self) -> f64 {
        pass_rate(self.business_checked, self.business_rejected)
    }

    pub fn log_summary(&self) {
        info!(
            "validation: schema {}/{} passed ({:.1}%), business {}/{} passed ({:.1}%), {} warnings",
            self.schema_checked - self.schema_rejected,
            self.schema_checked,
            self.schema_pass_rate() * 100.0,
            self.business_checked - self.business_rejected,
            self.business_checked,
            self.business_pass_rate() * 100.0,
            self.warnings
        );
    }
}

fn pass_rate(checked: u64, rejected: u64) -> f64 {
    if checked == 0 {
        1.0
    } else {
        (checked - rejected) as f64 / checked as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Severity;

    #[test]
    fn rates_count_rejects_only() {
        let mut metrics = ValidationMetrics::new();

        let clean = ValidationReport::new();
        metrics.record_schema(&clean);

        let mut warned = ValidationReport::new();
        warned.add("S021", Severity::Low, "name", "digits");
        metrics.record_schema(&warned);

        let mut rejected = ValidationReport::new();
        rejected.add("S003", Severity::Critical, "date", "future");
        metrics.record_schema(&rejected);

        assert_eq!(metrics.schema_checked, 3);
        assert_eq!(metrics.schema_rejected, 1);
        assert_eq!(metrics.warnings, 1);
        assert!((metrics.schema_pass_rate() - 2.0 / 3.0).abs() < 1e-9);
    }
}
