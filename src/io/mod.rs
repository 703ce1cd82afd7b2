//! # Dataset I/O
//!
//! This module persists converted [`PaData`](crate::pa_data::PaData) in two
//! interchange layouts:
//!
//! ## Directory Bundle (default)
//!
//! A plain directory holding the metadata next to the raw time series.
//!
//! ```text
//! {name}.padata/
//! ├── metadata.json             # Format version, acquisition and device metadata
//! └── time_series.bin           # Raw little-endian f32 samples, row-major
//! ```
//!
//! The bundle needs nothing beyond the standard library to read back, which
//! makes it the format of choice for pipelines that post-process the samples
//! with their own tooling.
//!
//! ## HDF5 Container (`hdf5` feature)
//!
//! A single HDF5 file laid out the way photoacoustic reconstruction toolboxes
//! expect their input:
//!
//! ```text
//! {name}.hdf5
//! ├── binary_time_series_data           # 2D f32 dataset
//! ├── meta_data_acquisition/            # One dataset per answered tag
//! └── meta_data_device/
//!     ├── general/
//!     ├── detectors/{identifier}/
//!     └── illuminators/{identifier}/
//! ```
//!
//! Requires libhdf5 on the build machine, so it is off by default.

mod bundle;
#[cfg(feature = "hdf5")]
mod container;

pub use bundle::{load_bundle, read_manifest, write_bundle, BundleManifest};
#[cfg(feature = "hdf5")]
pub use container::{load_hdf5, write_hdf5};

/// Format version stamped into every written dataset.
///
/// Loaders accept any version with the same major number.
pub const FORMAT_VERSION: &str = "1.0.0";

/// Errors that can occur while writing or loading a dataset
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Metadata error: {0}")]
    MetadataError(#[from] crate::metadata::MetadataError),

    #[error("JSON serialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("Invalid dataset path: {0}")]
    InvalidPath(String),

    #[error("Invalid dataset format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported format version: {0}")]
    UnsupportedVersion(String),

    #[cfg(feature = "hdf5")]
    #[error("HDF5 error: {0}")]
    Hdf5Error(#[from] hdf5::Error),
}
