//! Vendor adapter interface and the conversion harness.
//!
//! Each supported device family implements [`ConversionAdapter`]; the
//! harness drives the fixed lifecycle and assembles the converted dataset.
//! The pipeline is a single synchronous pass: binary data, then the device
//! description, then one query per vocabulary tag.

use log::{debug, info, warn};
use ndarray::Array2;

use crate::metadata::{AcquisitionMetadata, DeviceMetadata, MetadataValue};
use crate::pa_data::PaData;
use crate::vocabulary::AcquisitionTag;

/// A converter from one vendor's raw recordings to the standardized model.
///
/// Implementations load their inputs up front and answer the three lifecycle
/// calls from that state. Tag queries are total: a tag the format knows
/// nothing about answers `None`, never an error.
pub trait ConversionAdapter {
    /// Error type surfaced by the fallible lifecycle steps
    type Error: std::error::Error + Send + Sync + 'static;

    /// Short name of this adapter, for logs and provenance
    fn name(&self) -> &str;

    /// Produce the binary time series, one row per detection element
    fn binary_data(&self) -> Result<Array2<f32>, Self::Error>;

    /// Produce the device description
    fn device_metadata(&self) -> Result<DeviceMetadata, Self::Error>;

    /// Answer one acquisition metadata tag, or `None` if the format does
    /// not carry it
    fn acquisition_value(&self, tag: AcquisitionTag) -> Option<MetadataValue>;
}

/// Run the conversion lifecycle of an adapter and assemble the dataset.
pub fn run_conversion<A: ConversionAdapter>(adapter: &A) -> Result<PaData, A::Error> {
    info!("{}: extracting binary data", adapter.name());
    let binary_data = adapter.binary_data()?;
    debug!(
        "{}: binary data is {} x {}",
        adapter.name(),
        binary_data.nrows(),
        binary_data.ncols()
    );

    info!("{}: building device metadata", adapter.name());
    let device = adapter.device_metadata()?;
    debug!(
        "{}: device has {} detection and {} illumination elements",
        adapter.name(),
        device.general.num_detection_elements,
        device.general.num_illumination_elements
    );

    info!("{}: querying acquisition metadata", adapter.name());
    let mut acquisition = AcquisitionMetadata::new();
    for tag in AcquisitionTag::ALL {
        match adapter.acquisition_value(tag) {
            Some(value) => acquisition.set(tag, value),
            None => debug!("{}: no value for tag '{}'", adapter.name(), tag),
        }
    }

    let missing = acquisition.missing_mandatory();
    if !missing.is_empty() {
        let keys: Vec<_> = missing.iter().map(|t| t.key()).collect();
        warn!(
            "{}: missing mandatory acquisition tags: {}",
            adapter.name(),
            keys.join(", ")
        );
    }

    Ok(PaData::new(binary_data, device, acquisition))
}
