//! The LOL-360 conversion adapter.

use std::path::Path;

use log::info;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use uuid::{uuid, Uuid};

use super::raw_data::{load_recording_folder, RecordingSet};
use super::scan_log::{load_scan_log, ScanLog};
use super::LawsonError;
use crate::adapter::ConversionAdapter;
use crate::geometry::{point_mm_to_m, unit_orientation};
use crate::metadata::{
    DetectionElementBuilder, DeviceMetadata, DeviceMetadataBuilder, MetadataValue,
};
use crate::vocabulary::AcquisitionTag;

/// UUID of the LOL-360 device description
pub const LAWSON_DEVICE_UUID: Uuid = uuid!("97cc5c0d-2a83-4935-9820-2aa2161ff703");

/// Placeholder answered for the acquisition UUID tag.
///
/// The vendor software never assigned per-acquisition identifiers, so the
/// acquisition UUID stays a placeholder while the device block carries the
/// real device UUID. Downstream tooling relies on the placeholder to spot
/// recordings that predate per-acquisition identifiers.
pub const ACQUISITION_UUID_PLACEHOLDER: &str = "TestUUID";

/// Physical extent of one transducer element in metres
const DETECTOR_SIZE_M: [f64; 3] = [0.0127, 0.0127, 0.0001];

/// Imaged volume extent in metres
const FIELD_OF_VIEW_M: [f64; 3] = [0.0, 0.0500, 0.0500];

/// Acquisition clock step to Hz scale factor of the acquisition card
const SAMPLING_RATE_SCALE: f64 = 50_000_000.0;

/// Excitation wavelengths of the fixed-wavelength laser, nanometres
const WAVELENGTHS_NM: [f64; 1] = [700.0];

/// Preprocessing settings for the raw recordings.
///
/// Defaults match the acquisition software the recordings were made with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LawsonConfig {
    /// Multiply detection channels by -1
    pub signal_inversion: bool,
    /// Circular left shift applied to every detection channel, in samples
    pub left_shift: usize,
    /// Zero out samples below this absolute amplitude; 0 disables
    pub threshold: f64,
    /// Channel index of the photodiode reference
    pub photodiode_channel: usize,
    /// Average all shots of a recording; otherwise keep the first shot
    pub average_shots: bool,
    /// Samples to drop from the end of every channel
    pub end_remove: usize,
}

impl Default for LawsonConfig {
    fn default() -> Self {
        Self {
            signal_inversion: true,
            left_shift: 12,
            threshold: 0.0,
            photodiode_channel: 65,
            average_shots: true,
            end_remove: 80,
        }
    }
}

/// Conversion adapter for LOL-360 scans.
///
/// Loads the scan log and the recording folder up front; the lifecycle
/// calls answer from that state.
#[derive(Debug)]
pub struct LawsonConverter {
    scan_log: ScanLog,
    recordings: RecordingSet,
}

impl LawsonConverter {
    /// Load a scan from its log file and recording folder.
    ///
    /// Fails when either input is malformed or when the two disagree on the
    /// scan dimensions.
    pub fn load(
        scan_log_path: &Path,
        raw_data_folder: &Path,
        config: &LawsonConfig,
    ) -> Result<Self, LawsonError> {
        let scan_log = load_scan_log(scan_log_path)?;
        info!(
            "scan log: {} detectors, {} scan steps{}",
            scan_log.num_detectors(),
            scan_log.num_scan_steps(),
            match scan_log.elapsed_seconds() {
                Some(secs) => format!(", acquired in {:.1} s", secs),
                None => String::new(),
            }
        );

        let recordings =
            load_recording_folder(raw_data_folder, scan_log.num_scan_steps(), config)?;
        if recordings.num_detection_channels() != scan_log.num_detectors() {
            return Err(LawsonError::DetectorCountMismatch {
                log_detectors: scan_log.num_detectors(),
                channels: recordings.num_detection_channels(),
            });
        }

        Ok(Self {
            scan_log,
            recordings,
        })
    }

    /// The parsed scan log
    pub fn scan_log(&self) -> &ScanLog {
        &self.scan_log
    }

    /// Peak photodiode amplitude per scan step
    pub fn pulse_energies(&self) -> &[f64] {
        &self.recordings.pulse_energies
    }
}

impl ConversionAdapter for LawsonConverter {
    type Error = LawsonError;

    fn name(&self) -> &str {
        "lawson_360"
    }

    fn binary_data(&self) -> Result<Array2<f32>, LawsonError> {
        Ok(self.recordings.detection.clone())
    }

    /// Build the device description from the scan log.
    ///
    /// One detection element per (scan step, detector) pair, keyed
    /// `detection_element_scan{s}_detector{d}`, registered step-major so
    /// element order matches the binary data's row order.
    fn device_metadata(&self) -> Result<DeviceMetadata, LawsonError> {
        let mut builder =
            DeviceMetadataBuilder::new(LAWSON_DEVICE_UUID).field_of_view(FIELD_OF_VIEW_M);

        for step in 0..self.scan_log.num_scan_steps() {
            for detector in 0..self.scan_log.num_detectors() {
                let position = point_mm_to_m(self.scan_log.position_mm(detector, step));
                let reference = point_mm_to_m(self.scan_log.reference_mm(detector, step));
                let orientation = unit_orientation(position, reference)?;

                let element = DetectionElementBuilder::new()
                    .position(position)
                    .orientation(orientation)
                    .size(DETECTOR_SIZE_M)
                    .build()?;
                builder.add_detection_element(
                    format!("detection_element_scan{}_detector{}", step, detector),
                    element,
                )?;
            }
        }

        Ok(builder.finalize())
    }

    fn acquisition_value(&self, tag: AcquisitionTag) -> Option<MetadataValue> {
        match tag {
            AcquisitionTag::UniqueIdentifier => Some(ACQUISITION_UUID_PLACEHOLDER.into()),
            AcquisitionTag::DataType => Some(self.recordings.meta.data_type().into()),
            AcquisitionTag::AdSamplingRate => {
                Some((self.recordings.meta.sample_spacing() / SAMPLING_RATE_SCALE).into())
            }
            AcquisitionTag::AcousticCouplingAgent => Some("Water".into()),
            AcquisitionTag::AcquisitionOpticalWavelengths => Some(WAVELENGTHS_NM.to_vec().into()),
            AcquisitionTag::Compression => Some("None".into()),
            AcquisitionTag::Dimensionality => Some("3D".into()),
            AcquisitionTag::Encoding => Some("raw".into()),
            AcquisitionTag::ScanningMethod => Some("Robotic".into()),
            AcquisitionTag::PhotoacousticImagingDeviceReference => {
                Some(LAWSON_DEVICE_UUID.to_string().into())
            }
            AcquisitionTag::Sizes => Some(self.recordings.meta.sizes().to_vec().into()),
            _ => None,
        }
    }
}
