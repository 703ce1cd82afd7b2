use serde::{Deserialize, Serialize};

use super::MetadataError;

/// Typed description of a raw recording.
///
/// Vendor readers fill this from whatever header their format carries; the
/// converter answers the data type, sampling and shape tags from it. Fields
/// are validated once at construction and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMeta {
    data_type: String,
    sample_spacing: f64,
    sizes: Vec<i64>,
}

impl RecordingMeta {
    /// Describe a recording.
    ///
    /// `sample_spacing` is the per-sample step of the acquisition clock and
    /// must be finite and positive; `sizes` is the stored array shape,
    /// slowest axis first, and must be non-empty with positive extents.
    pub fn new(
        data_type: impl Into<String>,
        sample_spacing: f64,
        sizes: Vec<i64>,
    ) -> Result<Self, MetadataError> {
        if !sample_spacing.is_finite() || sample_spacing <= 0.0 {
            return Err(MetadataError::InvalidRecording(format!(
                "sample spacing must be finite and positive, got {}",
                sample_spacing
            )));
        }
        if sizes.is_empty() {
            return Err(MetadataError::InvalidRecording(
                "sizes must not be empty".to_string(),
            ));
        }
        if let Some(bad) = sizes.iter().find(|s| **s <= 0) {
            return Err(MetadataError::InvalidRecording(format!(
                "sizes must be positive, got {}",
                bad
            )));
        }
        Ok(Self {
            data_type: data_type.into(),
            sample_spacing,
            sizes,
        })
    }

    /// Data type of the stored samples (e.g. "float")
    pub fn data_type(&self) -> &str {
        &self.data_type
    }

    /// Per-sample step of the acquisition clock
    pub fn sample_spacing(&self) -> f64 {
        self.sample_spacing
    }

    /// Stored array shape, slowest axis first
    pub fn sizes(&self) -> &[i64] {
        &self.sizes
    }
}
