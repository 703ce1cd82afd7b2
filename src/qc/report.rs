//! Check outcomes and the printable report.

use std::cmp::Reverse;
use std::fmt;

#[cfg(feature = "colorized_output")]
use console::style;

/// How bad a check outcome is.
///
/// The order of the variants is meaningful: later variants outrank earlier
/// ones when the report computes its verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// The check found nothing wrong
    Pass,
    /// The check found something worth flagging, but the dataset is usable
    Warning,
    /// The check found a defect that invalidates the dataset
    Failure,
}

impl Severity {
    /// Fixed-width tag used in rendered report lines
    fn label(self) -> &'static str {
        match self {
            Severity::Pass => "pass",
            Severity::Warning => "WARN",
            Severity::Failure => "FAIL",
        }
    }
}

/// Which half of the check suite produced an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckCategory {
    /// Presence checks: is everything the format expects actually there?
    Completeness,
    /// Agreement checks: do the parts of the dataset match each other?
    Consistency,
}

impl CheckCategory {
    fn label(self) -> &'static str {
        match self {
            CheckCategory::Completeness => "completeness",
            CheckCategory::Consistency => "consistency",
        }
    }
}

/// One recorded check outcome
#[derive(Debug, Clone)]
pub struct QcCheck {
    /// Which half of the check suite ran the check
    pub category: CheckCategory,
    /// Fixed name of the check
    pub name: &'static str,
    /// Outcome severity
    pub severity: Severity,
    /// What the check found, absent for passes
    pub detail: Option<String>,
}

impl fmt::Display for QcCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:<12} {}",
            self.severity.label(),
            self.category.label(),
            self.name
        )?;
        if let Some(detail) = &self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

/// Collected check outcomes for one dataset.
///
/// Check functions record outcomes through the `pass`, `warn` and `fail`
/// recorders; the rendered report lists findings before passes so problems
/// are visible first, and closes with a verdict derived from the worst
/// outcome.
#[derive(Debug)]
pub struct QcReport {
    /// What was checked (a path, or a description of in-memory data)
    pub subject: String,
    /// Outcomes in the order the checks ran
    pub checks: Vec<QcCheck>,
}

impl QcReport {
    /// Start an empty report for the given subject
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            checks: Vec::new(),
        }
    }

    /// Record a passed check
    pub(crate) fn pass(&mut self, category: CheckCategory, name: &'static str) {
        self.checks.push(QcCheck {
            category,
            name,
            severity: Severity::Pass,
            detail: None,
        });
    }

    /// Record a finding that does not invalidate the dataset
    pub(crate) fn warn(
        &mut self,
        category: CheckCategory,
        name: &'static str,
        detail: impl Into<String>,
    ) {
        self.checks.push(QcCheck {
            category,
            name,
            severity: Severity::Warning,
            detail: Some(detail.into()),
        });
    }

    /// Record a finding that invalidates the dataset
    pub(crate) fn fail(
        &mut self,
        category: CheckCategory,
        name: &'static str,
        detail: impl Into<String>,
    ) {
        self.checks.push(QcCheck {
            category,
            name,
            severity: Severity::Failure,
            detail: Some(detail.into()),
        });
    }

    /// The worst severity among all recorded outcomes.
    ///
    /// An empty report counts as passed.
    pub fn worst(&self) -> Severity {
        self.checks
            .iter()
            .map(|check| check.severity)
            .max()
            .unwrap_or(Severity::Pass)
    }

    /// Whether any check failed
    pub fn has_failures(&self) -> bool {
        self.worst() == Severity::Failure
    }

    /// Whether any check produced a warning
    pub fn has_warnings(&self) -> bool {
        self.count(Severity::Warning) > 0
    }

    /// Number of passed checks
    pub fn success_count(&self) -> usize {
        self.count(Severity::Pass)
    }

    /// Number of warnings
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// Number of failures
    pub fn failure_count(&self) -> usize {
        self.count(Severity::Failure)
    }

    fn count(&self, severity: Severity) -> usize {
        self.checks
            .iter()
            .filter(|check| check.severity == severity)
            .count()
    }

    /// Checks in rendering order: failures, then warnings, then passes,
    /// keeping run order within each band.
    fn render_order(&self) -> Vec<&QcCheck> {
        let mut ordered: Vec<&QcCheck> = self.checks.iter().collect();
        ordered.sort_by_key(|check| Reverse(check.severity));
        ordered
    }

    fn verdict(&self) -> &'static str {
        match self.worst() {
            Severity::Pass => "passed",
            Severity::Warning => "passed with warnings",
            Severity::Failure => "FAILED",
        }
    }

    /// Render with ANSI colors when the `colorized_output` feature is on.
    ///
    /// Identical to the [`Display`](fmt::Display) rendering otherwise, so
    /// callers need not branch on the feature themselves.
    pub fn format_colored(&self) -> String {
        #[cfg(feature = "colorized_output")]
        {
            use std::fmt::Write;

            let mut out = String::new();
            let _ = writeln!(out, "Quality control for {}", style(&self.subject).bold());
            for check in self.render_order() {
                let line = match check.severity {
                    Severity::Pass => style(check.to_string()).dim(),
                    Severity::Warning => style(check.to_string()).yellow(),
                    Severity::Failure => style(check.to_string()).red(),
                };
                let _ = writeln!(out, "  {}", line);
            }
            let verdict = match self.worst() {
                Severity::Pass => style(self.verdict()).green(),
                Severity::Warning => style(self.verdict()).yellow(),
                Severity::Failure => style(self.verdict()).red().bold(),
            };
            let _ = write!(
                out,
                "Result: {} ({} failed, {} warned, {} passed)",
                verdict,
                self.failure_count(),
                self.warning_count(),
                self.success_count()
            );
            out
        }

        #[cfg(not(feature = "colorized_output"))]
        {
            self.to_string()
        }
    }
}

impl fmt::Display for QcReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Quality control for {}", self.subject)?;
        for check in self.render_order() {
            writeln!(f, "  {}", check)?;
        }
        write!(
            f,
            "Result: {} ({} failed, {} warned, {} passed)",
            self.verdict(),
            self.failure_count(),
            self.warning_count(),
            self.success_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> QcReport {
        let mut report = QcReport::new("scan.padata");
        report.pass(CheckCategory::Completeness, "Detection elements");
        report.pass(CheckCategory::Consistency, "Field of view");
        report.warn(
            CheckCategory::Completeness,
            "Illumination elements",
            "device description lists no illumination elements",
        );
        report.fail(
            CheckCategory::Consistency,
            "Binary row count",
            "binary data has 2 rows but the device lists 4 detection elements",
        );
        report
    }

    #[test]
    fn test_findings_render_before_passes() {
        let text = sample_report().to_string();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Quality control for scan.padata");
        assert!(lines[1].trim_start().starts_with("FAIL consistency"));
        assert!(lines[2].trim_start().starts_with("WARN completeness"));
        assert!(lines[3].trim_start().starts_with("pass completeness"));
        assert!(lines[4].trim_start().starts_with("pass consistency"));
    }

    #[test]
    fn test_detail_is_appended_to_finding_lines() {
        let text = sample_report().to_string();
        assert!(text.contains("Binary row count: binary data has 2 rows"));
        // Passes carry no detail
        assert!(text.contains("Detection elements\n"));
    }

    #[test]
    fn test_verdict_line_counts_outcomes() {
        let text = sample_report().to_string();
        assert!(text.ends_with("Result: FAILED (1 failed, 1 warned, 2 passed)"));
    }

    #[test]
    fn test_worst_tracks_the_severest_outcome() {
        let mut report = QcReport::new("in-memory data");
        assert_eq!(report.worst(), Severity::Pass);
        assert!(!report.has_failures());

        report.pass(CheckCategory::Consistency, "Field of view");
        assert_eq!(report.worst(), Severity::Pass);

        report.warn(CheckCategory::Completeness, "Illumination elements", "none");
        assert_eq!(report.worst(), Severity::Warning);
        assert!(report.has_warnings());
        assert!(!report.has_failures());

        report.fail(CheckCategory::Consistency, "Sizes tag", "mismatch");
        assert_eq!(report.worst(), Severity::Failure);
        assert!(report.has_failures());
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.success_count(), 1);
    }

    #[test]
    fn test_colored_output_carries_the_same_findings() {
        let report = sample_report();
        let colored = report.format_colored();
        assert!(colored.contains("Binary row count"));
        assert!(colored.contains("Illumination elements"));
        assert!(colored.contains("Result:"));
    }
}
