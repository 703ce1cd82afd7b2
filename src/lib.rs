//! # padata - Standardized Photoacoustic Data Conversion
//!
//! `padata` converts vendor-specific photoacoustic scan recordings into the
//! standardized data model defined by the International Photoacoustic
//! Standardisation Consortium (IPASC), so reconstruction and analysis
//! pipelines no longer need to understand each scanner's private formats.
//!
//! ## Key Features
//!
//! - **Closed Metadata Vocabulary**: Acquisition metadata is restricted to
//!   the fixed IPASC tag set, keeping converted datasets interoperable
//!   across institutions.
//!
//! - **Typed Device Descriptions**: Detection and illumination elements are
//!   assembled through builders that reject incomplete descriptions and
//!   duplicate identifiers at construction time.
//!
//! - **Geometric Standardisation**: Scanner coordinates in millimetres become
//!   SI positions and unit-length orientation vectors, with degenerate
//!   geometry surfaced as a typed error instead of NaN output.
//!
//! - **Pluggable Vendor Adapters**: Each device family implements one trait;
//!   a shared harness drives the conversion lifecycle and assembles the
//!   dataset. The Lawson LOL-360 rotating-ring tomograph adapter ships with
//!   the crate.
//!
//! - **Quality Control**: Converted datasets can be checked for metadata
//!   completeness and internal consistency before they leave the machine.
//!
//! - **Portable Output**: A plain directory bundle readable with nothing but
//!   the standard library, or a single HDF5 container behind the `hdf5`
//!   feature.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use padata::adapter::run_conversion;
//! use padata::io::write_bundle;
//! use padata::lawson::{LawsonConfig, LawsonConverter};
//!
//! let config = LawsonConfig::default();
//! let converter = LawsonConverter::load(
//!     Path::new("scan/scan_log.txt"),
//!     Path::new("scan/raw"),
//!     &config,
//! )?;
//!
//! let data = run_conversion(&converter)?;
//! write_bundle(&data, "scan.padata")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! This creates a directory structure:
//! ```text
//! scan.padata/
//! ├── metadata.json             # Acquisition and device metadata
//! └── time_series.bin           # Raw little-endian f32 samples, row-major
//! ```
//!
//! ## Checking a Converted Dataset
//!
//! ```rust,no_run
//! use padata::io::load_bundle;
//! use padata::qc::check_pa_data;
//!
//! let data = load_bundle("scan.padata")?;
//! let report = check_pa_data(&data, "scan.padata");
//! println!("{}", report);
//! # Ok::<(), padata::io::DatasetError>(())
//! ```
//!
//! ## Reading Bundles Without This Crate
//!
//! The time series payload is raw little-endian `f32`, row-major, with its
//! shape recorded in `metadata.json`:
//!
//! ```python
//! # Python
//! import json, numpy as np
//! meta = json.load(open("scan.padata/metadata.json"))
//! data = np.fromfile("scan.padata/time_series.bin", dtype="<f4")
//! data = data.reshape(meta["binary_shape"])
//! ```
//!
//! ## Architecture
//!
//! The library is organized into the following modules:
//!
//! - [`vocabulary`]: the closed IPASC acquisition metadata tag set
//! - [`metadata`]: acquisition values and typed device descriptions
//! - [`geometry`]: coordinate and orientation conversion helpers
//! - [`adapter`]: the conversion lifecycle shared by all vendor adapters
//! - [`lawson`]: the LOL-360 scan log and recording formats, and their adapter
//! - [`pa_data`]: the in-memory converted dataset
//! - [`qc`]: completeness and consistency checks with a printable report
//! - [`io`]: directory bundle and HDF5 container persistence

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod adapter;
pub mod geometry;
pub mod io;
pub mod lawson;
pub mod metadata;
pub mod pa_data;
pub mod qc;
pub mod vocabulary;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::adapter::{run_conversion, ConversionAdapter};
    pub use crate::geometry::{mm_to_m, point_mm_to_m, unit_orientation, GeometryError};
    pub use crate::io::{load_bundle, write_bundle, BundleManifest, DatasetError, FORMAT_VERSION};
    pub use crate::lawson::{LawsonConfig, LawsonConverter, LawsonError, LAWSON_DEVICE_UUID};
    pub use crate::metadata::{
        AcquisitionMetadata, DetectionElement, DetectionElementBuilder, DeviceMetadata,
        DeviceMetadataBuilder, ElementMap, IlluminationElement, IlluminationElementBuilder,
        MetadataError, MetadataValue, RecordingMeta,
    };
    pub use crate::pa_data::PaData;
    pub use crate::qc::{check_pa_data, CheckCategory, QcCheck, QcReport, Severity};
    pub use crate::vocabulary::{AcquisitionTag, MetaDatum, ValueKind};
}
