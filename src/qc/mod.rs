//! # Quality Control
//!
//! Quality checks over a converted dataset, run before anything is written
//! to disk or after a bundle is loaded back. The checks catch the drift a
//! format specification alone cannot: converters that answer tags with the
//! wrong value shape, device descriptions that disagree with the binary
//! data, geometry that came out degenerate.
//!
//! ## Checklist
//!
//! 1. **Completeness**: mandatory acquisition tags, value shapes, presence
//!    of detection and illumination elements
//! 2. **Consistency**: binary shape against the device description, unit
//!    orientations, positive sizes and rates, sizes tag against the data
//!
//! ## Usage
//!
//! ```rust,no_run
//! use padata::qc::check_pa_data;
//! # fn example(data: &padata::pa_data::PaData) {
//! let report = check_pa_data(data, "scan_2021_03.padata");
//! println!("{}", report);
//! # }
//! ```

mod completeness;
mod consistency;
mod report;

pub use report::{CheckCategory, QcCheck, QcReport, Severity};

use crate::pa_data::PaData;

/// Run all quality checks over a dataset.
///
/// `subject` names the dataset in the report, typically its path.
pub fn check_pa_data(data: &PaData, subject: &str) -> QcReport {
    let mut report = QcReport::new(subject);
    completeness::check_completeness(data, &mut report);
    consistency::check_consistency(data, &mut report);
    report
}
