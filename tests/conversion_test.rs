//! Integration tests for padata
//!
//! These tests verify the full pipeline from synthetic scan generation
//! through conversion to standardized output bundles.

use padata::adapter::run_conversion;
use padata::geometry::norm;
use padata::io::{load_bundle, read_manifest, write_bundle, FORMAT_VERSION};
use padata::lawson::synthetic::SyntheticScan;
use padata::lawson::{LawsonConverter, LawsonError, LAWSON_DEVICE_UUID};
use padata::metadata::MetadataValue;
use padata::pa_data::PaData;
use padata::qc::{check_pa_data, Severity};
use padata::vocabulary::AcquisitionTag;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

// ============================================================================
// Helper Functions
// ============================================================================

/// Write a synthetic scan under `dir` and convert it
fn convert_scan(scan: &SyntheticScan, dir: &Path) -> PaData {
    let paths = scan.write(dir).unwrap();
    let converter =
        LawsonConverter::load(&paths.scan_log, &paths.raw_data, &scan.config()).unwrap();
    run_conversion(&converter).unwrap()
}

// ============================================================================
// End-to-End Conversion
// ============================================================================

/// Test the complete scan-to-dataset cycle on the default synthetic scan
#[test]
fn test_synthetic_conversion_cycle() {
    let dir = tempdir().unwrap();
    let scan = SyntheticScan::default();
    let data = convert_scan(&scan, dir.path());

    // 8 detectors x 5 steps, 256 samples with 80 removed from the end
    assert_eq!(data.binary_data.dim(), (40, 176));
    assert_eq!(data.num_detection_elements(), 40);
    assert_eq!(data.samples_per_element(), 176);

    // Elements are registered step-major, matching the binary row order
    let identifiers: Vec<_> = data.device.detectors.identifiers().collect();
    assert_eq!(identifiers[0], "detection_element_scan0_detector0");
    assert_eq!(identifiers[7], "detection_element_scan0_detector7");
    assert_eq!(identifiers[8], "detection_element_scan1_detector0");
    assert_eq!(identifiers[39], "detection_element_scan4_detector7");

    assert_eq!(data.device.general.unique_identifier, LAWSON_DEVICE_UUID);
    assert_eq!(data.device.general.field_of_view, [0.0, 0.0500, 0.0500]);
    assert_eq!(data.device.general.num_detection_elements, 40);
    assert_eq!(data.device.general.num_illumination_elements, 0);
}

/// Test that converted element geometry matches the scan log
#[test]
fn test_converted_geometry_matches_scan_log() {
    let dir = tempdir().unwrap();
    let scan = SyntheticScan::default();
    let data = convert_scan(&scan, dir.path());

    // Detector 0 at step 0 sits on the +x side of the ring, 40 mm out,
    // facing the ring axis
    let first = data
        .device
        .detectors
        .get("detection_element_scan0_detector0")
        .unwrap();
    assert!((first.position[0] - 0.040).abs() < 1e-9);
    assert!(first.position[1].abs() < 1e-9);
    assert!(first.position[2].abs() < 1e-9);
    assert!((first.orientation[0] + 1.0).abs() < 1e-9);
    assert!(first.orientation[1].abs() < 1e-9);
    assert!(first.orientation[2].abs() < 1e-9);

    // Each scan step advances the ring 1 mm along z
    let stepped = data
        .device
        .detectors
        .get("detection_element_scan3_detector0")
        .unwrap();
    assert!((stepped.position[2] - 0.003).abs() < 1e-9);

    // Every orientation is unit length and every size is the transducer spec
    for element in data.device.detectors.elements() {
        assert!((norm(&element.orientation) - 1.0).abs() < 1e-9);
        assert_eq!(element.size, [0.0127, 0.0127, 0.0001]);
    }
}

/// Test the acquisition tag answers of the adapter
#[test]
fn test_acquisition_answers() {
    let dir = tempdir().unwrap();
    let scan = SyntheticScan::default();
    let data = convert_scan(&scan, dir.path());

    assert!(data.acquisition.missing_mandatory().is_empty());

    assert_eq!(
        data.acquisition.get(AcquisitionTag::UniqueIdentifier),
        Some(&MetadataValue::Text("TestUUID".to_string()))
    );
    assert_eq!(
        data.acquisition.get(AcquisitionTag::DataType),
        Some(&MetadataValue::Text("float".to_string()))
    );
    assert_eq!(
        data.acquisition
            .get(AcquisitionTag::PhotoacousticImagingDeviceReference),
        Some(&MetadataValue::Text(LAWSON_DEVICE_UUID.to_string()))
    );
    assert_eq!(
        data.acquisition.get(AcquisitionTag::AcousticCouplingAgent),
        Some(&MetadataValue::Text("Water".to_string()))
    );
    assert_eq!(
        data.acquisition.get(AcquisitionTag::Dimensionality),
        Some(&MetadataValue::Text("3D".to_string()))
    );
    assert_eq!(data.encoding(), Some("raw"));
    assert_eq!(data.compression(), Some("None"));
    assert_eq!(
        data.acquisition.get(AcquisitionTag::ScanningMethod),
        Some(&MetadataValue::Text("Robotic".to_string()))
    );

    // Sampling rate is the header clock step over the card's scale factor
    let rate = data.sampling_rate().unwrap();
    assert!((rate - 2.5e-8 / 50_000_000.0).abs() < 1e-30);

    assert_eq!(data.wavelengths(), Some(&[700.0][..]));
    assert_eq!(data.sizes(), Some(&[5, 8, 176][..]));

    // Tags the format does not record stay unanswered
    assert_eq!(data.acquisition.get(AcquisitionTag::PulseEnergy), None);
    assert_eq!(data.acquisition.get(AcquisitionTag::OverallGain), None);
}

/// Test that a converted scan passes quality control
#[test]
fn test_quality_control_on_converted_scan() {
    let dir = tempdir().unwrap();
    let scan = SyntheticScan::default();
    let data = convert_scan(&scan, dir.path());

    let report = check_pa_data(&data, "synthetic scan");
    assert!(!report.has_failures(), "{}", report);

    // The device lists no illumination elements, which warns but passes
    assert_eq!(report.failure_count(), 0);
    assert_eq!(report.warning_count(), 1);
    let warning = report
        .checks
        .iter()
        .find(|c| c.severity == Severity::Warning)
        .unwrap();
    assert_eq!(warning.name, "Illumination elements");
}

// ============================================================================
// Bundle Output
// ============================================================================

/// Test that a converted dataset survives the write-load cycle unchanged
#[test]
fn test_bundle_roundtrip_through_disk() {
    let dir = tempdir().unwrap();
    let scan = SyntheticScan::default();
    let data = convert_scan(&scan, &dir.path().join("scan"));

    let bundle = dir.path().join("scan.padata");
    write_bundle(&data, &bundle).unwrap();

    let manifest = read_manifest(&bundle).unwrap();
    assert_eq!(manifest.format_version, FORMAT_VERSION);
    assert!(manifest.converter.starts_with("padata v"));
    assert_eq!(manifest.binary_shape, [40, 176]);

    let loaded = load_bundle(&bundle).unwrap();
    assert_eq!(loaded.binary_data, data.binary_data);
    assert_eq!(loaded.device, data.device);
    assert_eq!(loaded.acquisition, data.acquisition);
}

// ============================================================================
// Input Validation
// ============================================================================

/// Test that a missing recording file is caught before conversion
#[test]
fn test_missing_recording_detected() {
    let dir = tempdir().unwrap();
    let scan = SyntheticScan::default();
    let paths = scan.write(dir.path()).unwrap();

    fs::remove_file(paths.raw_data.join("scan_0002.bin")).unwrap();

    let err = LawsonConverter::load(&paths.scan_log, &paths.raw_data, &scan.config())
        .expect_err("expected a step count mismatch");
    assert!(matches!(
        err,
        LawsonError::StepCountMismatch {
            log_steps: 5,
            recordings: 4
        }
    ));
}

/// Test that the scan log and recordings must agree on the detector count
#[test]
fn test_log_and_recordings_must_agree_on_detectors() {
    let dir = tempdir().unwrap();
    let full = SyntheticScan::default();
    let full_paths = full.write(&dir.path().join("full")).unwrap();

    let narrow = SyntheticScan {
        num_detectors: 6,
        ..SyntheticScan::default()
    };
    let narrow_paths = narrow.write(&dir.path().join("narrow")).unwrap();

    // Narrow scan log against the 8-detector recordings
    let err = LawsonConverter::load(&narrow_paths.scan_log, &full_paths.raw_data, &full.config())
        .expect_err("expected a detector count mismatch");
    assert!(matches!(
        err,
        LawsonError::DetectorCountMismatch {
            log_detectors: 6,
            channels: 8
        }
    ));
}

// ============================================================================
// Preprocessing Settings
// ============================================================================

/// Test that averaging identical shots reproduces a single shot
#[test]
fn test_first_shot_matches_average_for_identical_shots() {
    let dir = tempdir().unwrap();
    let scan = SyntheticScan::default();
    let paths = scan.write(dir.path()).unwrap();

    let averaged = {
        let converter =
            LawsonConverter::load(&paths.scan_log, &paths.raw_data, &scan.config()).unwrap();
        run_conversion(&converter).unwrap()
    };

    let first_shot = {
        let mut config = scan.config();
        config.average_shots = false;
        let converter = LawsonConverter::load(&paths.scan_log, &paths.raw_data, &config).unwrap();
        run_conversion(&converter).unwrap()
    };

    // The synthetic generator writes identical shots
    assert_eq!(averaged.binary_data, first_shot.binary_data);
}

/// Test that signal inversion negates every detection sample
#[test]
fn test_signal_inversion_flips_sign() {
    let dir = tempdir().unwrap();
    let scan = SyntheticScan::default();
    let paths = scan.write(dir.path()).unwrap();

    let inverted = {
        let converter =
            LawsonConverter::load(&paths.scan_log, &paths.raw_data, &scan.config()).unwrap();
        run_conversion(&converter).unwrap()
    };

    let plain = {
        let mut config = scan.config();
        config.signal_inversion = false;
        let converter = LawsonConverter::load(&paths.scan_log, &paths.raw_data, &config).unwrap();
        run_conversion(&converter).unwrap()
    };

    for (a, b) in inverted.binary_data.iter().zip(plain.binary_data.iter()) {
        assert_eq!(*a, -*b);
    }
}

// ============================================================================
// Scan Dimensions
// ============================================================================

/// Test that two-digit scan steps keep their registration order
#[test]
fn test_two_digit_scan_steps_stay_ordered() {
    let dir = tempdir().unwrap();
    let scan = SyntheticScan {
        num_detectors: 3,
        num_steps: 12,
        ..SyntheticScan::default()
    };
    let data = convert_scan(&scan, dir.path());

    assert_eq!(data.binary_data.dim(), (36, 176));
    let identifiers: Vec<_> = data.device.detectors.identifiers().collect();
    assert_eq!(identifiers[9], "detection_element_scan3_detector0");
    assert_eq!(identifiers[30], "detection_element_scan10_detector0");
    assert_eq!(identifiers[35], "detection_element_scan11_detector2");
    assert_eq!(data.sizes(), Some(&[12, 3, 176][..]));
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod property_tests {
    use padata::geometry::{mm_to_m, norm, point_mm_to_m, unit_orientation};
    use proptest::prelude::*;

    proptest! {
        /// Orientations are unit length and point from the element toward
        /// the reference
        #[test]
        fn test_orientation_normalized_and_directed(
            px in -500.0f64..500.0,
            py in -500.0f64..500.0,
            pz in -500.0f64..500.0,
            dx in -100.0f64..100.0,
            dy in -100.0f64..100.0,
            dz in -100.0f64..100.0,
        ) {
            prop_assume!(dx.abs().max(dy.abs()).max(dz.abs()) > 1e-3);

            let position = [px, py, pz];
            let reference = [px + dx, py + dy, pz + dz];
            let orientation = unit_orientation(position, reference).unwrap();

            prop_assert!((norm(&orientation) - 1.0).abs() < 1e-9);

            // Positive projection onto the offset that produced it
            let dot = orientation[0] * dx + orientation[1] * dy + orientation[2] * dz;
            prop_assert!(dot > 0.0);
        }

        /// Millimetre-to-metre conversion scales by exactly one thousand
        #[test]
        fn test_mm_conversion_scales(value in -1.0e6f64..1.0e6) {
            let converted = mm_to_m(value);
            prop_assert!((converted * 1000.0 - value).abs() <= 1e-9 * value.abs().max(1.0));
        }

        /// Point conversion applies the scalar conversion per component
        #[test]
        fn test_point_conversion_componentwise(
            x in -1.0e4f64..1.0e4,
            y in -1.0e4f64..1.0e4,
            z in -1.0e4f64..1.0e4,
        ) {
            let point = point_mm_to_m([x, y, z]);
            prop_assert_eq!(point, [mm_to_m(x), mm_to_m(y), mm_to_m(z)]);
        }
    }
}
