//! # Standard Suite
//!
//! The reference scenario, replayed against any [`EaFs`] backend as a list
//! of named steps.
//!
//! | Phase | File | Request |
//! |-------|------|---------|
//! | 1 | `ea1` (created) | read (no EAs), then `hello=world` |
//! | 2 | `ea1` | `fOo=bar` |
//! | 3 | `ea1` | `HeLlO=baz` |
//! | 4 | `ea1` | `HELlo=""` |
//! | 5 | `ea1` | `foo=""` |
//! | 6 | `ea2` (created) | `qux=xyzzy`, `y2=plugh` in one request |
//!
//! After every write the suite reads the EAs back, checks both per-handle
//! sizes, closes the file, and checks every configured directory-entry
//! shape. A phase whose open fails is skipped.

use std::path::Path;

use crate::{CheckOptions, Disposition, EaChecker, EaError, EaFs, Handle, oracle};

/// Result of one named step.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepOutcome {
    /// Step name, unique within a report, e.g. `Write EA` or
    /// `Check directory entry (FILE_ID_BOTH_DIR_INFORMATION) after Add two EAs`.
    pub name: String,
    /// The failure, rendered. `None` if the step passed.
    pub error: Option<String>,
}

impl StepOutcome {
    /// Returns `true` if the step passed.
    #[inline]
    pub fn passed(&self) -> bool {
        self.error.is_none()
    }
}

/// Every step of a suite run, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SuiteReport {
    /// Executed steps.
    pub steps: Vec<StepOutcome>,
}

impl SuiteReport {
    /// Returns `true` if every step passed.
    pub fn passed(&self) -> bool {
        self.steps.iter().all(StepOutcome::passed)
    }

    /// The steps that failed.
    pub fn failures(&self) -> impl Iterator<Item = &StepOutcome> {
        self.steps.iter().filter(|s| !s.passed())
    }

    /// Look up a step by name.
    pub fn step(&self, name: &str) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Render the report as pretty-printed JSON.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    fn record(&mut self, name: String, result: Result<(), EaError>) -> bool {
        let error = match result {
            Ok(()) => {
                log::info!("{name}: passed");
                None
            }
            Err(e) => {
                log::warn!("{name}: {e}");
                Some(e.to_string())
            }
        };
        let passed = error.is_none();
        self.steps.push(StepOutcome { name, error });
        passed
    }
}

struct Phase {
    file: &'static str,
    disposition: Disposition,
    expect_empty_first: bool,
    label: &'static str,
    request: &'static [(&'static str, &'static str)],
}

const EA1_PHASES: [Phase; 5] = [
    Phase {
        file: "ea1",
        disposition: Disposition::Create,
        expect_empty_first: true,
        label: "Write EA",
        request: &[("hello", "world")],
    },
    Phase {
        file: "ea1",
        disposition: Disposition::Open,
        expect_empty_first: false,
        label: "Add second EA",
        request: &[("fOo", "bar")],
    },
    Phase {
        file: "ea1",
        disposition: Disposition::Open,
        expect_empty_first: false,
        label: "Replace first EA",
        request: &[("HeLlO", "baz")],
    },
    Phase {
        file: "ea1",
        disposition: Disposition::Open,
        expect_empty_first: false,
        label: "Delete first EA",
        request: &[("HELlo", "")],
    },
    Phase {
        file: "ea1",
        disposition: Disposition::Open,
        expect_empty_first: false,
        label: "Delete second EA",
        request: &[("foo", "")],
    },
];

const EA2_PHASE: Phase = Phase {
    file: "ea2",
    disposition: Disposition::Create,
    expect_empty_first: false,
    label: "Add two EAs",
    request: &[("qux", "xyzzy"), ("y2", "plugh")],
};

/// Replay the reference scenario in `dir`, which must not already contain
/// `ea1` or `ea2`.
///
/// Never fails as a whole: each check becomes a [`StepOutcome`].
///
/// # Example
///
/// ```rust
/// use ea_oracle::{run_standard_suite, CheckOptions, EaFs};
/// use std::path::Path;
///
/// fn conforms<B: EaFs>(fs: &B) -> bool {
///     let report = run_standard_suite(fs, Path::new("/test"), &CheckOptions::default());
///     for failure in report.failures() {
///         eprintln!("{}: {}", failure.name, failure.error.as_deref().unwrap_or(""));
///     }
///     report.passed()
/// }
/// ```
pub fn run_standard_suite<B: EaFs + ?Sized>(
    fs: &B,
    dir: &Path,
    options: &CheckOptions,
) -> SuiteReport {
    let mut report = SuiteReport::default();

    let mut checker = EaChecker::new(fs, options.clone());
    for phase in &EA1_PHASES {
        run_phase(&mut report, &mut checker, dir, phase);
    }

    let mut checker = EaChecker::new(fs, options.clone());
    run_phase(&mut report, &mut checker, dir, &EA2_PHASE);

    log::info!(
        "suite finished: {} step(s), {} failed",
        report.steps.len(),
        report.failures().count()
    );
    report
}

fn run_phase<B: EaFs + ?Sized>(
    report: &mut SuiteReport,
    checker: &mut EaChecker<'_, B>,
    dir: &Path,
    phase: &Phase,
) {
    let path = dir.join(phase.file);
    let open_step = match phase.disposition {
        Disposition::Create => format!("Create {}", phase.file),
        Disposition::Open => format!("Open {} for {}", phase.file, phase.label),
    };
    let opened = checker.open(&path, phase.disposition);
    let handle = match opened {
        Ok(h) => {
            report.record(open_step, Ok(()));
            h
        }
        Err(e) => {
            report.record(open_step, Err(e));
            return;
        }
    };

    if phase.expect_empty_first {
        report.record(
            format!("Read EA before {}", phase.label),
            checker.verify_read(handle),
        );
    }
    report.record(phase.label.into(), checker.write(handle, phase.request));

    let after = format!("after {}", phase.label);
    report.record(format!("Read EA {after}"), checker.verify_read(handle));
    handle_size_steps(report, checker, handle, &after);

    let close_step = format!("Close {} {after}", phase.file);
    if checker.options().reopen_before_dir_query {
        report.record(close_step, checker.close(handle));
        dir_entry_steps(report, checker, dir, phase.file, &after);
    } else {
        dir_entry_steps(report, checker, dir, phase.file, &after);
        report.record(close_step, checker.close(handle));
    }
}

fn handle_size_steps<B: EaFs + ?Sized>(
    report: &mut SuiteReport,
    checker: &EaChecker<'_, B>,
    handle: Handle,
    after: &str,
) {
    match checker.reported_sizes(handle) {
        Ok(sizes) => {
            let expected = checker.expected_size();
            for (source, size) in sizes {
                report.record(
                    format!("Query {source} {after}"),
                    oracle::verify_size_consistency(expected, [(source, size)]),
                );
            }
        }
        Err(e) => {
            report.record(format!("Query EA sizes {after}"), Err(e));
        }
    }
}

fn dir_entry_steps<B: EaFs + ?Sized>(
    report: &mut SuiteReport,
    checker: &EaChecker<'_, B>,
    dir: &Path,
    file: &str,
    after: &str,
) {
    for &class in &checker.options().dir_classes {
        report.record(
            format!("Check directory entry ({class}) {after}"),
            checker.verify_dir_entry(dir, file, class),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, error: Option<&str>) -> StepOutcome {
        StepOutcome {
            name: name.into(),
            error: error.map(Into::into),
        }
    }

    #[test]
    fn report_passes_only_without_failures() {
        let mut report = SuiteReport::default();
        assert!(report.passed());

        report.steps.push(outcome("Create ea1", None));
        assert!(report.passed());

        report
            .steps
            .push(outcome("Read EA", Some("EA 0: value was \"x\", expected \"world\"")));
        assert!(!report.passed());
        let failed: Vec<_> = report.failures().map(|s| s.name.as_str()).collect();
        assert_eq!(failed, ["Read EA"]);
        assert!(report.step("Create ea1").unwrap().passed());
    }

    #[test]
    fn record_renders_error() {
        let mut report = SuiteReport::default();
        let passed = report.record(
            "Open ea1".into(),
            Err(EaError::ExternalOperationFailed {
                operation: "open",
                status: crate::NtStatus::OBJECT_NAME_NOT_FOUND,
            }),
        );
        assert!(!passed);
        let error = report.steps[0].error.as_deref().unwrap();
        assert!(error.starts_with("open failed: STATUS_OBJECT_NAME_NOT_FOUND"));
    }

    #[test]
    fn phases_follow_reference_order() {
        let labels: Vec<_> = EA1_PHASES.iter().map(|p| p.label).collect();
        assert_eq!(
            labels,
            [
                "Write EA",
                "Add second EA",
                "Replace first EA",
                "Delete first EA",
                "Delete second EA"
            ]
        );
        assert_eq!(EA2_PHASE.request.len(), 2);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn report_to_json() {
        let report = SuiteReport {
            steps: vec![outcome("Create ea1", None)],
        };
        let json = report.to_json().unwrap();
        assert!(json.contains("\"Create ea1\""));
        let back: SuiteReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
