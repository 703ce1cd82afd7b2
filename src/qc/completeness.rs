//! Completeness checks: is everything the format expects actually there?

use super::report::{CheckCategory, QcReport};
use crate::pa_data::PaData;

const CATEGORY: CheckCategory = CheckCategory::Completeness;

pub(crate) fn check_completeness(data: &PaData, report: &mut QcReport) {
    check_mandatory_tags(data, report);
    check_value_kinds(data, report);
    check_detection_elements(data, report);
    check_illumination_elements(data, report);
}

fn check_mandatory_tags(data: &PaData, report: &mut QcReport) {
    let missing = data.acquisition.missing_mandatory();
    if missing.is_empty() {
        report.pass(CATEGORY, "Mandatory acquisition tags");
    } else {
        let keys: Vec<_> = missing.iter().map(|t| t.key()).collect();
        report.fail(
            CATEGORY,
            "Mandatory acquisition tags",
            format!("missing: {}", keys.join(", ")),
        );
    }
}

fn check_value_kinds(data: &PaData, report: &mut QcReport) {
    let mismatched: Vec<_> = data
        .acquisition
        .iter()
        .filter(|(tag, value)| value.kind() != tag.metadatum().kind)
        .map(|(tag, _)| tag.key())
        .collect();
    if mismatched.is_empty() {
        report.pass(CATEGORY, "Acquisition value types");
    } else {
        report.fail(
            CATEGORY,
            "Acquisition value types",
            format!("wrong value shape for: {}", mismatched.join(", ")),
        );
    }
}

fn check_detection_elements(data: &PaData, report: &mut QcReport) {
    if data.device.detectors.is_empty() {
        report.fail(
            CATEGORY,
            "Detection elements",
            "device description lists no detection elements",
        );
    } else {
        report.pass(CATEGORY, "Detection elements");
    }
}

fn check_illumination_elements(data: &PaData, report: &mut QcReport) {
    if data.device.illuminators.is_empty() {
        report.warn(
            CATEGORY,
            "Illumination elements",
            "device description lists no illumination elements",
        );
    } else {
        report.pass(CATEGORY, "Illumination elements");
    }
}
