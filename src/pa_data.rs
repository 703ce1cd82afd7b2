//! The in-memory representation of a converted dataset.

use ndarray::Array2;

use crate::metadata::{AcquisitionMetadata, DeviceMetadata, MetadataValue};
use crate::vocabulary::AcquisitionTag;

/// A converted photoacoustic dataset.
///
/// Binary rows correspond one-to-one with the device's detection elements in
/// registration order; columns are time samples.
#[derive(Debug, Clone)]
pub struct PaData {
    /// Time series data, one row per detection element
    pub binary_data: Array2<f32>,
    /// Device description
    pub device: DeviceMetadata,
    /// Acquisition-level metadata
    pub acquisition: AcquisitionMetadata,
}

impl PaData {
    /// Assemble a dataset from its three parts
    pub fn new(
        binary_data: Array2<f32>,
        device: DeviceMetadata,
        acquisition: AcquisitionMetadata,
    ) -> Self {
        Self {
            binary_data,
            device,
            acquisition,
        }
    }

    /// Number of detection elements in the device description
    pub fn num_detection_elements(&self) -> usize {
        self.device.detectors.len()
    }

    /// Number of time samples per detection element
    pub fn samples_per_element(&self) -> usize {
        self.binary_data.ncols()
    }

    /// A/D sampling rate in Hz, if answered
    pub fn sampling_rate(&self) -> Option<f64> {
        self.acquisition
            .get(AcquisitionTag::AdSamplingRate)?
            .as_float()
    }

    /// Acquisition wavelengths, if answered
    pub fn wavelengths(&self) -> Option<&[f64]> {
        self.acquisition
            .get(AcquisitionTag::AcquisitionOpticalWavelengths)?
            .as_float_array()
    }

    /// Shape of the original recording, if answered
    pub fn sizes(&self) -> Option<&[i64]> {
        self.acquisition.get(AcquisitionTag::Sizes)?.as_int_array()
    }

    /// Binary data encoding, if answered
    pub fn encoding(&self) -> Option<&str> {
        self.acquisition.get(AcquisitionTag::Encoding)?.as_text()
    }

    /// Binary data compression, if answered
    pub fn compression(&self) -> Option<&str> {
        self.acquisition.get(AcquisitionTag::Compression)?.as_text()
    }

    /// Time series of one detection element by row index
    pub fn element_series(&self, row: usize) -> Option<ndarray::ArrayView1<'_, f32>> {
        if row < self.binary_data.nrows() {
            Some(self.binary_data.row(row))
        } else {
            None
        }
    }
}
