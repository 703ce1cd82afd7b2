//! # Metadata Model
//!
//! This module holds the standardized metadata model that converters fill:
//! acquisition-level tag values, the device description with its detection
//! and illumination elements, and the typed recording description vendor
//! readers extract from raw file headers.
//!
//! ## Structure
//!
//! 1. **Acquisition metadata**: values for the closed tag vocabulary in
//!    [`crate::vocabulary`], stored sparsely; converters answer what their
//!    format knows and leave the rest absent
//!
//! 2. **Device metadata**: general device info plus ordered, uniquely
//!    identified detection and illumination elements, assembled through
//!    builders and frozen by `finalize`
//!
//! 3. **Recording description**: the validated subset of a vendor raw file
//!    header the converter needs (data type, sample spacing, array shape)

mod acquisition;
mod device;
mod error;
mod recording;
mod value;


pub use acquisition::AcquisitionMetadata;
pub use device::{
    DetectionElement, DetectionElementBuilder, DeviceMetadata, DeviceMetadataBuilder, ElementMap,
    GeneralInfo, IlluminationElement, IlluminationElementBuilder,
};
pub use error::MetadataError;
pub use recording::RecordingMeta;
pub use value::MetadataValue;
