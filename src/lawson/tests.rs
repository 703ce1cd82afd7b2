use std::fs;

use tempfile::tempdir;

use super::synthetic::SyntheticScan;
use super::*;
use crate::adapter::{run_conversion, ConversionAdapter};
use crate::geometry::{norm, point_mm_to_m};
use crate::vocabulary::AcquisitionTag;

fn small_scan() -> SyntheticScan {
    SyntheticScan {
        num_detectors: 4,
        num_steps: 3,
        num_samples: 128,
        num_shots: 2,
        ..SyntheticScan::default()
    }
}

#[test]
fn test_scan_log_round_trip() {
    let dir = tempdir().unwrap();
    let scan = small_scan();
    let paths = scan.write(dir.path()).unwrap();

    let log = load_scan_log(&paths.scan_log).unwrap();
    assert_eq!(log.num_detectors(), 4);
    assert_eq!(log.num_scan_steps(), 3);
    assert!(log.elapsed_seconds().is_some());

    // Coordinates survive the text round trip at the precision they were
    // written with
    let written = scan.position_mm(2, 1);
    let parsed = log.position_mm(2, 1);
    for axis in 0..3 {
        assert!((written[axis] - parsed[axis]).abs() < 1e-6);
    }
}

#[test]
fn test_conversion_produces_one_element_per_pair() {
    let dir = tempdir().unwrap();
    let scan = small_scan();
    let paths = scan.write(dir.path()).unwrap();

    let converter =
        LawsonConverter::load(&paths.scan_log, &paths.raw_data, &scan.config()).unwrap();
    let data = run_conversion(&converter).unwrap();

    assert_eq!(data.num_detection_elements(), 4 * 3);
    assert_eq!(data.binary_data.nrows(), 4 * 3);
    assert_eq!(
        data.samples_per_element(),
        scan.num_samples - scan.config().end_remove
    );

    // Step-major element keys, in registration order
    let ids: Vec<_> = data.device.detectors.identifiers().collect();
    assert_eq!(ids[0], "detection_element_scan0_detector0");
    assert_eq!(ids[1], "detection_element_scan0_detector1");
    assert_eq!(ids[4], "detection_element_scan1_detector0");
    assert_eq!(ids.last().copied(), Some("detection_element_scan2_detector3"));
}

#[test]
fn test_element_geometry() {
    let dir = tempdir().unwrap();
    let scan = small_scan();
    let paths = scan.write(dir.path()).unwrap();

    let converter =
        LawsonConverter::load(&paths.scan_log, &paths.raw_data, &scan.config()).unwrap();
    let device = converter.device_metadata().unwrap();

    assert_eq!(device.general.unique_identifier, LAWSON_DEVICE_UUID);
    assert_eq!(device.general.field_of_view, [0.0, 0.05, 0.05]);

    // Detector 0 at step 0 sits on the x axis and faces the ring center
    let element = device
        .detectors
        .get("detection_element_scan0_detector0")
        .unwrap();
    assert_eq!(element.position, [0.04, 0.0, 0.0]);
    assert_eq!(element.orientation, [-1.0, 0.0, 0.0]);
    assert_eq!(element.size, [0.0127, 0.0127, 0.0001]);

    // All orientations are unit length; positions match the log within
    // the log's printed precision
    for (step, detector) in (0..3).flat_map(|s| (0..4).map(move |d| (s, d))) {
        let id = format!("detection_element_scan{}_detector{}", step, detector);
        let element = device.detectors.get(&id).unwrap();
        assert!((norm(&element.orientation) - 1.0).abs() < 1e-12);
        let expected = point_mm_to_m(scan.position_mm(detector, step));
        for axis in 0..3 {
            assert!((element.position[axis] - expected[axis]).abs() < 1e-9);
        }
    }
}

#[test]
fn test_acquisition_tag_answers() {
    let dir = tempdir().unwrap();
    let scan = small_scan();
    let paths = scan.write(dir.path()).unwrap();
    let converter =
        LawsonConverter::load(&paths.scan_log, &paths.raw_data, &scan.config()).unwrap();

    let text = |tag| {
        converter
            .acquisition_value(tag)
            .and_then(|v| v.as_text().map(str::to_string))
    };

    assert_eq!(
        text(AcquisitionTag::UniqueIdentifier).as_deref(),
        Some("TestUUID")
    );
    assert_eq!(text(AcquisitionTag::DataType).as_deref(), Some("float"));
    assert_eq!(
        text(AcquisitionTag::AcousticCouplingAgent).as_deref(),
        Some("Water")
    );
    assert_eq!(text(AcquisitionTag::Compression).as_deref(), Some("None"));
    assert_eq!(text(AcquisitionTag::Dimensionality).as_deref(), Some("3D"));
    assert_eq!(text(AcquisitionTag::Encoding).as_deref(), Some("raw"));
    assert_eq!(
        text(AcquisitionTag::ScanningMethod).as_deref(),
        Some("Robotic")
    );
    assert_eq!(
        text(AcquisitionTag::PhotoacousticImagingDeviceReference).as_deref(),
        Some(LAWSON_DEVICE_UUID.to_string().as_str())
    );

    let rate = converter
        .acquisition_value(AcquisitionTag::AdSamplingRate)
        .and_then(|v| v.as_float())
        .unwrap();
    assert!((rate - scan.sample_spacing / 50_000_000.0).abs() < 1e-30);

    let wavelengths = converter
        .acquisition_value(AcquisitionTag::AcquisitionOpticalWavelengths)
        .unwrap();
    assert_eq!(wavelengths.as_float_array(), Some(&[700.0][..]));

    let sizes = converter
        .acquisition_value(AcquisitionTag::Sizes)
        .unwrap();
    assert_eq!(sizes.as_int_array(), Some(&[3i64, 4, 48][..]));

    // Tags this device knows nothing about answer None, never an error
    assert!(converter
        .acquisition_value(AcquisitionTag::PulseEnergy)
        .is_none());
    assert!(converter
        .acquisition_value(AcquisitionTag::TemperatureControl)
        .is_none());
    assert!(converter
        .acquisition_value(AcquisitionTag::FrequencyDomainFilter)
        .is_none());
}

#[test]
fn test_preprocessing_inversion_and_shift() {
    let dir = tempdir().unwrap();
    let scan = small_scan();
    let paths = scan.write(dir.path()).unwrap();

    let plain = LawsonConfig {
        signal_inversion: false,
        left_shift: 0,
        end_remove: 0,
        ..scan.config()
    };
    let processed = LawsonConfig {
        signal_inversion: true,
        left_shift: 12,
        end_remove: 0,
        ..scan.config()
    };

    let raw = load_recording_folder(&paths.raw_data, scan.num_steps, &plain).unwrap();
    let cooked = load_recording_folder(&paths.raw_data, scan.num_steps, &processed).unwrap();

    // Averaging identical shots reproduces the written waveform exactly
    assert_eq!(
        raw.detection[[0, 40]],
        f64::from(scan.detection_sample(0, 0, 40)) as f32
    );

    // Inversion flips the sign, the shift rolls circularly
    let n = scan.num_samples;
    for sample in 0..n {
        let expected = -raw.detection[[0, (sample + 12) % n]];
        assert_eq!(cooked.detection[[0, sample]], expected);
    }
}

#[test]
fn test_end_removal_trims_tail() {
    let dir = tempdir().unwrap();
    let scan = small_scan();
    let paths = scan.write(dir.path()).unwrap();

    let config = scan.config();
    let set = load_recording_folder(&paths.raw_data, scan.num_steps, &config).unwrap();
    assert_eq!(set.detection.ncols(), scan.num_samples - config.end_remove);
    assert_eq!(set.meta.sizes()[2], (scan.num_samples - config.end_remove) as i64);
}

#[test]
fn test_pulse_energies_come_from_the_photodiode() {
    let dir = tempdir().unwrap();
    let scan = small_scan();
    let paths = scan.write(dir.path()).unwrap();

    let converter =
        LawsonConverter::load(&paths.scan_log, &paths.raw_data, &scan.config()).unwrap();
    let energies = converter.pulse_energies();
    assert_eq!(energies.len(), scan.num_steps);
    for (step, energy) in energies.iter().enumerate() {
        assert_eq!(*energy, 1000.0 + 10.0 * step as f64);
    }
}

#[test]
fn test_malformed_log_lines() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scan_log.txt");

    // Wrong field count
    fs::write(&path, "detectors\t2\nscan_points\t1\n0\t0\t1.0\n").unwrap();
    assert!(matches!(
        load_scan_log(&path),
        Err(LawsonError::MalformedLog { line: 3, .. })
    ));

    // Sample row before the preamble
    fs::write(&path, "0\t0\t1\t2\t3\t4\t5\t6\n").unwrap();
    assert!(matches!(
        load_scan_log(&path),
        Err(LawsonError::MalformedLog { line: 1, .. })
    ));

    // Detector index outside the declared dimensions
    fs::write(
        &path,
        "detectors\t1\nscan_points\t1\n0\t4\t1\t2\t3\t4\t5\t6\n",
    )
    .unwrap();
    assert!(matches!(
        load_scan_log(&path),
        Err(LawsonError::MalformedLog { line: 3, .. })
    ));

    // Duplicate sample
    fs::write(
        &path,
        "detectors\t1\nscan_points\t1\n0\t0\t1\t2\t3\t4\t5\t6\n0\t0\t1\t2\t3\t4\t5\t6\n",
    )
    .unwrap();
    assert!(matches!(
        load_scan_log(&path),
        Err(LawsonError::MalformedLog { line: 4, .. })
    ));

    // Unparseable coordinate
    fs::write(
        &path,
        "detectors\t1\nscan_points\t1\n0\t0\t1\tx\t3\t4\t5\t6\n",
    )
    .unwrap();
    assert!(matches!(
        load_scan_log(&path),
        Err(LawsonError::MalformedLog { line: 3, .. })
    ));
}

#[test]
fn test_incomplete_log() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scan_log.txt");

    // Missing sample for one pair
    fs::write(
        &path,
        "detectors\t2\nscan_points\t1\n0\t0\t1\t2\t3\t4\t5\t6\n",
    )
    .unwrap();
    assert!(matches!(
        load_scan_log(&path),
        Err(LawsonError::IncompleteLog(_))
    ));

    // No preamble at all
    fs::write(&path, "# empty scan\n").unwrap();
    assert!(matches!(
        load_scan_log(&path),
        Err(LawsonError::IncompleteLog(_))
    ));
}

#[test]
fn test_malformed_recordings() {
    let dir = tempdir().unwrap();
    let scan = small_scan();
    let paths = scan.write(dir.path()).unwrap();
    let config = scan.config();

    // Truncate one recording mid-payload
    let victim = paths.raw_data.join("scan_0001.bin");
    let bytes = fs::read(&victim).unwrap();
    fs::write(&victim, &bytes[..bytes.len() / 2]).unwrap();
    assert!(matches!(
        load_recording_folder(&paths.raw_data, scan.num_steps, &config),
        Err(LawsonError::MalformedRecording { .. })
    ));

    // Corrupt the magic of the first recording
    let mut bytes = fs::read(paths.raw_data.join("scan_0000.bin")).unwrap();
    bytes[0] = b'X';
    fs::write(paths.raw_data.join("scan_0000.bin"), &bytes).unwrap();
    assert!(matches!(
        load_recording_folder(&paths.raw_data, scan.num_steps, &config),
        Err(LawsonError::MalformedRecording { .. })
    ));
}

#[test]
fn test_absurd_header_counts_are_malformed() {
    let dir = tempdir().unwrap();
    let scan = small_scan();
    let paths = scan.write(dir.path()).unwrap();

    // Max out the channel, sample and shot counts of one recording
    let victim = paths.raw_data.join("scan_0000.bin");
    let mut bytes = fs::read(&victim).unwrap();
    for offset in [8usize, 12, 16] {
        bytes[offset..offset + 4].copy_from_slice(&u32::MAX.to_le_bytes());
    }
    fs::write(&victim, &bytes).unwrap();

    assert!(matches!(
        load_recording_folder(&paths.raw_data, scan.num_steps, &scan.config()),
        Err(LawsonError::MalformedRecording { .. })
    ));
}

#[test]
fn test_step_count_mismatch() {
    let dir = tempdir().unwrap();
    let scan = small_scan();
    let paths = scan.write(dir.path()).unwrap();

    fs::remove_file(paths.raw_data.join("scan_0002.bin")).unwrap();
    let err = LawsonConverter::load(&paths.scan_log, &paths.raw_data, &scan.config());
    assert!(matches!(
        err,
        Err(LawsonError::StepCountMismatch {
            log_steps: 3,
            recordings: 2
        })
    ));
}

#[test]
fn test_detector_count_mismatch() {
    let dir = tempdir().unwrap();
    let scan = small_scan();
    let paths = scan.write(dir.path()).unwrap();

    // A log that claims fewer detectors than the recordings hold
    let mut log = String::new();
    log.push_str("detectors\t2\nscan_points\t3\n");
    for step in 0..3 {
        for detector in 0..2 {
            log.push_str(&format!(
                "{}\t{}\t1.0\t2.0\t3.0\t4.0\t5.0\t6.0\n",
                step, detector
            ));
        }
    }
    fs::write(&paths.scan_log, log).unwrap();

    let err = LawsonConverter::load(&paths.scan_log, &paths.raw_data, &scan.config());
    assert!(matches!(
        err,
        Err(LawsonError::DetectorCountMismatch {
            log_detectors: 2,
            channels: 4
        })
    ));
}

#[test]
fn test_degenerate_orientation_surfaces_as_error() {
    let dir = tempdir().unwrap();
    let scan = SyntheticScan {
        num_detectors: 1,
        num_steps: 1,
        num_samples: 128,
        num_shots: 1,
        ..SyntheticScan::default()
    };
    let paths = scan.write(dir.path()).unwrap();

    // Position and reference point coincide
    fs::write(
        &paths.scan_log,
        "detectors\t1\nscan_points\t1\n0\t0\t5.0\t5.0\t5.0\t5.0\t5.0\t5.0\n",
    )
    .unwrap();

    let converter =
        LawsonConverter::load(&paths.scan_log, &paths.raw_data, &scan.config()).unwrap();
    assert!(matches!(
        converter.device_metadata(),
        Err(LawsonError::Geometry(_))
    ));
}

#[test]
fn test_missing_scan_log_is_an_io_error() {
    let dir = tempdir().unwrap();
    let err = load_scan_log(&dir.path().join("nope.txt"));
    assert!(matches!(err, Err(LawsonError::Io(_))));
}
