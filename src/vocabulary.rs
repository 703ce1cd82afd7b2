//! # IPASC Acquisition Metadata Vocabulary
//!
//! This module provides type-safe access to the fixed vocabulary of
//! acquisition metadata tags defined by the International Photoacoustic
//! Standardisation Consortium (IPASC) data format. Using the closed tag set
//! ensures converted datasets remain interoperable across institutions.
//!
//! ## Reference
//! - Consortium: https://www.ipasc.science/
//! - Format documentation: https://github.com/IPASC/PACFISH

use serde::{Deserialize, Serialize};
use std::fmt;

/// The value shape a metadata tag carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    /// Free-form or controlled text
    Text,
    /// Single floating point number
    Float,
    /// One-dimensional array of floating point numbers
    FloatArray,
    /// One-dimensional array of integers
    IntArray,
}

/// Descriptor for one acquisition metadata tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaDatum {
    /// Canonical string key used in serialized output (e.g. "ad_sampling_rate")
    pub key: &'static str,
    /// Whether the IPASC minimal metadata set requires this tag
    pub mandatory: bool,
    /// Expected value shape
    pub kind: ValueKind,
    /// Unit of the stored value, if the tag carries one
    pub unit: Option<&'static str>,
}

/// Closed enumeration of acquisition-level metadata tags.
///
/// The set is fixed by the format definition; converters answer queries for
/// these tags and for nothing else. Tags a device cannot answer are simply
/// absent from the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionTag {
    /// Unique identifier of this acquisition
    #[serde(rename = "uuid")]
    UniqueIdentifier,
    /// Data type of the stored time series (e.g. "float" or "short")
    DataType,
    /// Sampling rate of the analog-to-digital converter in Hz
    AdSamplingRate,
    /// Medium coupling the transducer to the sample (e.g. "Water")
    AcousticCouplingAgent,
    /// Optical excitation wavelengths used during acquisition
    AcquisitionOpticalWavelengths,
    /// Compression applied to the binary data ("None" for raw storage)
    Compression,
    /// Dimensionality of one acquired frame (e.g. "2D", "3D")
    Dimensionality,
    /// Encoding of the binary data (e.g. "raw")
    Encoding,
    /// How the detector was moved over the sample (e.g. "Robotic")
    ScanningMethod,
    /// Reference to the device description that produced the data
    PhotoacousticImagingDeviceReference,
    /// Shape of the time series array, slowest axis first
    Sizes,
    /// Laser pulse energy per frame in Joules
    PulseEnergy,
    /// Acquisition timestamp per frame in seconds
    MeasurementTimeStamps,
    /// Time gain compensation curve applied by the acquisition electronics
    TimeGainCompensation,
    /// Overall gain factor applied to all elements
    OverallGain,
    /// Per-element gain factors
    ElementDependentGain,
    /// Setpoint of the temperature control unit in Kelvin
    TemperatureControl,
    /// Frequency domain filter applied before digitization
    FrequencyDomainFilter,
    /// Number of raw measurements averaged into one stored frame
    MeasurementsPerImage,
}

impl AcquisitionTag {
    /// All tags in declaration order.
    pub const ALL: [AcquisitionTag; 19] = [
        AcquisitionTag::UniqueIdentifier,
        AcquisitionTag::DataType,
        AcquisitionTag::AdSamplingRate,
        AcquisitionTag::AcousticCouplingAgent,
        AcquisitionTag::AcquisitionOpticalWavelengths,
        AcquisitionTag::Compression,
        AcquisitionTag::Dimensionality,
        AcquisitionTag::Encoding,
        AcquisitionTag::ScanningMethod,
        AcquisitionTag::PhotoacousticImagingDeviceReference,
        AcquisitionTag::Sizes,
        AcquisitionTag::PulseEnergy,
        AcquisitionTag::MeasurementTimeStamps,
        AcquisitionTag::TimeGainCompensation,
        AcquisitionTag::OverallGain,
        AcquisitionTag::ElementDependentGain,
        AcquisitionTag::TemperatureControl,
        AcquisitionTag::FrequencyDomainFilter,
        AcquisitionTag::MeasurementsPerImage,
    ];

    /// The descriptor for this tag
    pub const fn metadatum(&self) -> MetaDatum {
        match self {
            AcquisitionTag::UniqueIdentifier => MetaDatum {
                key: "uuid",
                mandatory: true,
                kind: ValueKind::Text,
                unit: None,
            },
            AcquisitionTag::DataType => MetaDatum {
                key: "data_type",
                mandatory: true,
                kind: ValueKind::Text,
                unit: None,
            },
            AcquisitionTag::AdSamplingRate => MetaDatum {
                key: "ad_sampling_rate",
                mandatory: true,
                kind: ValueKind::Float,
                unit: Some("Hz"),
            },
            AcquisitionTag::AcousticCouplingAgent => MetaDatum {
                key: "acoustic_coupling_agent",
                mandatory: true,
                kind: ValueKind::Text,
                unit: None,
            },
            AcquisitionTag::AcquisitionOpticalWavelengths => MetaDatum {
                key: "acquisition_optical_wavelengths",
                mandatory: true,
                kind: ValueKind::FloatArray,
                unit: Some("nm"),
            },
            AcquisitionTag::Compression => MetaDatum {
                key: "compression",
                mandatory: true,
                kind: ValueKind::Text,
                unit: None,
            },
            AcquisitionTag::Dimensionality => MetaDatum {
                key: "dimensionality",
                mandatory: true,
                kind: ValueKind::Text,
                unit: None,
            },
            AcquisitionTag::Encoding => MetaDatum {
                key: "encoding",
                mandatory: true,
                kind: ValueKind::Text,
                unit: None,
            },
            AcquisitionTag::ScanningMethod => MetaDatum {
                key: "scanning_method",
                mandatory: true,
                kind: ValueKind::Text,
                unit: None,
            },
            AcquisitionTag::PhotoacousticImagingDeviceReference => MetaDatum {
                key: "photoacoustic_imaging_device_reference",
                mandatory: true,
                kind: ValueKind::Text,
                unit: None,
            },
            AcquisitionTag::Sizes => MetaDatum {
                key: "sizes",
                mandatory: true,
                kind: ValueKind::IntArray,
                unit: None,
            },
            AcquisitionTag::PulseEnergy => MetaDatum {
                key: "pulse_energy",
                mandatory: false,
                kind: ValueKind::FloatArray,
                unit: Some("J"),
            },
            AcquisitionTag::MeasurementTimeStamps => MetaDatum {
                key: "measurement_time_stamps",
                mandatory: false,
                kind: ValueKind::FloatArray,
                unit: Some("s"),
            },
            AcquisitionTag::TimeGainCompensation => MetaDatum {
                key: "time_gain_compensation",
                mandatory: false,
                kind: ValueKind::FloatArray,
                unit: None,
            },
            AcquisitionTag::OverallGain => MetaDatum {
                key: "overall_gain",
                mandatory: false,
                kind: ValueKind::Float,
                unit: None,
            },
            AcquisitionTag::ElementDependentGain => MetaDatum {
                key: "element_dependent_gain",
                mandatory: false,
                kind: ValueKind::FloatArray,
                unit: None,
            },
            AcquisitionTag::TemperatureControl => MetaDatum {
                key: "temperature_control",
                mandatory: false,
                kind: ValueKind::Float,
                unit: Some("K"),
            },
            AcquisitionTag::FrequencyDomainFilter => MetaDatum {
                key: "frequency_domain_filter",
                mandatory: false,
                kind: ValueKind::FloatArray,
                unit: Some("Hz"),
            },
            AcquisitionTag::MeasurementsPerImage => MetaDatum {
                key: "measurements_per_image",
                mandatory: false,
                kind: ValueKind::Float,
                unit: None,
            },
        }
    }

    /// Canonical string key of this tag
    pub const fn key(&self) -> &'static str {
        self.metadatum().key
    }

    /// Whether the minimal metadata set requires this tag
    pub const fn is_mandatory(&self) -> bool {
        self.metadatum().mandatory
    }

    /// Look up a tag by its canonical string key
    pub fn from_key(key: &str) -> Option<AcquisitionTag> {
        AcquisitionTag::ALL.iter().copied().find(|t| t.key() == key)
    }
}

impl fmt::Display for AcquisitionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Canonical group and field names used by device metadata serialization
pub mod device_tags {
    // =========================================================================
    // Group names
    // =========================================================================

    /// Top-level group holding device-wide fields
    pub const GENERAL: &str = "general";
    /// Group holding one subgroup per detection element
    pub const DETECTORS: &str = "detectors";
    /// Group holding one subgroup per illumination element
    pub const ILLUMINATORS: &str = "illuminators";

    // =========================================================================
    // General fields
    // =========================================================================

    /// UUID of the device description
    pub const UNIQUE_IDENTIFIER: &str = "unique_identifier";
    /// Extent of the imaged volume in metres
    pub const FIELD_OF_VIEW: &str = "field_of_view";
    /// Number of detection elements
    pub const NUM_DETECTION_ELEMENTS: &str = "num_detection_elements";
    /// Number of illumination elements
    pub const NUM_ILLUMINATION_ELEMENTS: &str = "num_illumination_elements";

    // =========================================================================
    // Detection element fields
    // =========================================================================

    /// Element position in metres, device coordinate system
    pub const DETECTOR_POSITION: &str = "detector_position";
    /// Unit vector the element faces
    pub const DETECTOR_ORIENTATION: &str = "detector_orientation";
    /// Element extent in metres
    pub const DETECTOR_SIZE: &str = "detector_size";
    /// Frequency response curve [center Hz, bandwidth Hz]
    pub const FREQUENCY_RESPONSE: &str = "frequency_response";
    /// Angular sensitivity curve [angle rad, relative sensitivity]
    pub const ANGULAR_RESPONSE: &str = "angular_response";

    // =========================================================================
    // Illumination element fields
    // =========================================================================

    /// Element position in metres, device coordinate system
    pub const ILLUMINATOR_POSITION: &str = "illuminator_position";
    /// Unit vector along the optical axis
    pub const ILLUMINATOR_ORIENTATION: &str = "illuminator_orientation";
    /// Emitting surface extent in metres
    pub const ILLUMINATOR_SHAPE: &str = "illuminator_shape";
    /// Tunable range [min nm, max nm, step nm]
    pub const WAVELENGTH_RANGE: &str = "wavelength_range";
    /// Laser pulse width in seconds
    pub const PULSE_WIDTH: &str = "pulse_width";
    /// Beam divergence half-angle in radians
    pub const BEAM_DIVERGENCE_ANGLES: &str = "beam_divergence_angles";
}
