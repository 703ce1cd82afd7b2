//! Consistency checks: do the parts of a dataset agree with each other?

use super::report::{CheckCategory, QcReport};
use crate::geometry::norm;
use crate::pa_data::PaData;
use crate::vocabulary::AcquisitionTag;

const CATEGORY: CheckCategory = CheckCategory::Consistency;

/// Orientation vectors may deviate from unit length by this much
const UNIT_LENGTH_TOLERANCE: f64 = 1e-6;

pub(crate) fn check_consistency(data: &PaData, report: &mut QcReport) {
    check_binary_shape(data, report);
    check_detector_orientations(data, report);
    check_illuminator_orientations(data, report);
    check_detector_sizes(data, report);
    check_field_of_view(data, report);
    check_element_counts(data, report);
    check_sampling_rate(data, report);
    check_wavelengths(data, report);
    check_sizes_tag(data, report);
    check_binary_values(data, report);
}

fn check_binary_shape(data: &PaData, report: &mut QcReport) {
    let rows = data.binary_data.nrows();
    let elements = data.device.detectors.len();
    if rows == elements {
        report.pass(CATEGORY, "Binary row count");
    } else {
        report.fail(
            CATEGORY,
            "Binary row count",
            format!(
                "binary data has {} rows but the device lists {} detection elements",
                rows, elements
            ),
        );
    }
}

fn check_detector_orientations(data: &PaData, report: &mut QcReport) {
    let off_unit = data
        .device
        .detectors
        .elements()
        .filter(|e| (norm(&e.orientation) - 1.0).abs() > UNIT_LENGTH_TOLERANCE)
        .count();
    if off_unit == 0 {
        report.pass(CATEGORY, "Detector orientations");
    } else {
        report.fail(
            CATEGORY,
            "Detector orientations",
            format!("{} orientation vectors are not unit length", off_unit),
        );
    }
}

fn check_illuminator_orientations(data: &PaData, report: &mut QcReport) {
    if data.device.illuminators.is_empty() {
        return;
    }
    let off_unit = data
        .device
        .illuminators
        .elements()
        .filter(|e| (norm(&e.orientation) - 1.0).abs() > UNIT_LENGTH_TOLERANCE)
        .count();
    if off_unit == 0 {
        report.pass(CATEGORY, "Illuminator orientations");
    } else {
        report.fail(
            CATEGORY,
            "Illuminator orientations",
            format!("{} orientation vectors are not unit length", off_unit),
        );
    }
}

fn check_detector_sizes(data: &PaData, report: &mut QcReport) {
    let bad = data
        .device
        .detectors
        .elements()
        .filter(|e| e.size.iter().any(|s| *s <= 0.0))
        .count();
    if bad == 0 {
        report.pass(CATEGORY, "Detector sizes");
    } else {
        report.fail(
            CATEGORY,
            "Detector sizes",
            format!("{} elements have a non-positive extent", bad),
        );
    }
}

fn check_field_of_view(data: &PaData, report: &mut QcReport) {
    if data
        .device
        .general
        .field_of_view
        .iter()
        .any(|extent| *extent < 0.0)
    {
        report.fail(
            CATEGORY,
            "Field of view",
            "field of view has a negative extent",
        );
    } else {
        report.pass(CATEGORY, "Field of view");
    }
}

fn check_element_counts(data: &PaData, report: &mut QcReport) {
    let general = &data.device.general;
    if general.num_detection_elements == data.device.detectors.len()
        && general.num_illumination_elements == data.device.illuminators.len()
    {
        report.pass(CATEGORY, "Element counts");
    } else {
        report.fail(
            CATEGORY,
            "Element counts",
            format!(
                "general info counts {}/{} but the maps hold {}/{}",
                general.num_detection_elements,
                general.num_illumination_elements,
                data.device.detectors.len(),
                data.device.illuminators.len()
            ),
        );
    }
}

fn check_sampling_rate(data: &PaData, report: &mut QcReport) {
    match data.acquisition.get(AcquisitionTag::AdSamplingRate) {
        None => {}
        Some(value) => match value.as_float() {
            Some(rate) if rate.is_finite() && rate > 0.0 => {
                report.pass(CATEGORY, "A/D sampling rate");
            }
            _ => {
                report.fail(
                    CATEGORY,
                    "A/D sampling rate",
                    format!("sampling rate must be a positive number, got {}", value),
                );
            }
        },
    }
}

fn check_wavelengths(data: &PaData, report: &mut QcReport) {
    match data.wavelengths() {
        None => {}
        Some(wavelengths) => {
            if wavelengths.iter().all(|w| w.is_finite() && *w > 0.0) {
                report.pass(CATEGORY, "Acquisition wavelengths");
            } else {
                report.fail(
                    CATEGORY,
                    "Acquisition wavelengths",
                    "wavelengths must be positive numbers",
                );
            }
        }
    }
}

fn check_sizes_tag(data: &PaData, report: &mut QcReport) {
    let sizes = match data.sizes() {
        Some(sizes) => sizes,
        None => return,
    };
    if sizes.len() != 3 {
        report.fail(
            CATEGORY,
            "Sizes tag",
            format!(
                "expected 3 extents [steps, detectors, samples], got {}",
                sizes.len()
            ),
        );
        return;
    }
    // The tag holds arbitrary i64s; the implied product may be negative or
    // exceed usize
    let implied_rows = sizes[0]
        .checked_mul(sizes[1])
        .and_then(|rows| usize::try_from(rows).ok());
    let implied_cols = usize::try_from(sizes[2]).ok();
    let (rows, cols) = (data.binary_data.nrows(), data.binary_data.ncols());
    if implied_rows == Some(rows) && implied_cols == Some(cols) {
        report.pass(CATEGORY, "Sizes tag");
    } else {
        report.fail(
            CATEGORY,
            "Sizes tag",
            format!(
                "sizes {:?} do not match binary data of {} x {}",
                sizes, rows, cols
            ),
        );
    }
}

fn check_binary_values(data: &PaData, report: &mut QcReport) {
    let non_finite = data.binary_data.iter().filter(|v| !v.is_finite()).count();
    if non_finite == 0 {
        report.pass(CATEGORY, "Binary sample values");
    } else {
        report.fail(
            CATEGORY,
            "Binary sample values",
            format!("{} samples are NaN or infinite", non_finite),
        );
    }
}
