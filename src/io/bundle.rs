//! Directory bundle reading and writing.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, info};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::{DatasetError, FORMAT_VERSION};
use crate::metadata::{AcquisitionMetadata, DeviceMetadata};
use crate::pa_data::PaData;

const METADATA_FILE: &str = "metadata.json";
const TIME_SERIES_FILE: &str = "time_series.bin";

/// Contents of the `metadata.json` file at the bundle root.
///
/// Everything except the raw samples lives here; the binary shape is the
/// loader's only way to know how to slice `time_series.bin`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleManifest {
    /// Bundle format version
    pub format_version: String,
    /// RFC 3339 timestamp of when the bundle was written
    pub created: String,
    /// Name and version of the tool that wrote the bundle
    pub converter: String,
    /// Rows and columns of the time series payload
    pub binary_shape: [usize; 2],
    /// Acquisition-level metadata
    pub acquisition: AcquisitionMetadata,
    /// Device description
    pub device: DeviceMetadata,
}

/// Write a converted dataset as a directory bundle.
///
/// Creates the directory if necessary and overwrites any previous bundle
/// content at the same path.
pub fn write_bundle<P: AsRef<Path>>(data: &PaData, path: P) -> Result<(), DatasetError> {
    let root = path.as_ref();
    if root.exists() && !root.is_dir() {
        return Err(DatasetError::InvalidPath(format!(
            "{} exists and is not a directory",
            root.display()
        )));
    }
    fs::create_dir_all(root)?;

    let (rows, cols) = data.binary_data.dim();
    let manifest = BundleManifest {
        format_version: FORMAT_VERSION.to_string(),
        created: chrono::Utc::now().to_rfc3339(),
        converter: format!("padata v{}", env!("CARGO_PKG_VERSION")),
        binary_shape: [rows, cols],
        acquisition: data.acquisition.clone(),
        device: data.device.clone(),
    };
    let json_string = serde_json::to_string_pretty(&manifest)?;

    let mut metadata_file = File::create(root.join(METADATA_FILE))?;
    metadata_file.write_all(json_string.as_bytes())?;
    metadata_file.flush()?;

    let mut series = BufWriter::new(File::create(root.join(TIME_SERIES_FILE))?);
    for &value in data.binary_data.iter() {
        series.write_f32::<LittleEndian>(value)?;
    }
    series.flush()?;

    info!(
        "Wrote bundle {} ({} series of {} samples)",
        root.display(),
        rows,
        cols
    );
    Ok(())
}

/// Read and version-check the manifest of a bundle without touching the
/// time series payload.
pub fn read_manifest<P: AsRef<Path>>(path: P) -> Result<BundleManifest, DatasetError> {
    let json = fs::read_to_string(path.as_ref().join(METADATA_FILE))?;
    let manifest: BundleManifest = serde_json::from_str(&json)?;

    let major = manifest.format_version.split('.').next().unwrap_or("");
    let supported_major = FORMAT_VERSION.split('.').next().unwrap_or("");
    if major != supported_major {
        return Err(DatasetError::UnsupportedVersion(manifest.format_version));
    }
    Ok(manifest)
}

/// Load a directory bundle back into memory.
pub fn load_bundle<P: AsRef<Path>>(path: P) -> Result<PaData, DatasetError> {
    let root = path.as_ref();
    if !root.is_dir() {
        return Err(DatasetError::InvalidPath(format!(
            "{} is not a bundle directory",
            root.display()
        )));
    }
    debug!("Loading bundle {}", root.display());

    let manifest = read_manifest(root)?;
    let [rows, cols] = manifest.binary_shape;

    // The manifest is untrusted; the shape product can exceed usize
    let expected = rows
        .checked_mul(cols)
        .and_then(|cells| cells.checked_mul(std::mem::size_of::<f32>()))
        .ok_or_else(|| {
            DatasetError::InvalidFormat(format!(
                "{}: shape {}x{} overflows the payload size",
                TIME_SERIES_FILE, rows, cols
            ))
        })?;
    let payload = fs::read(root.join(TIME_SERIES_FILE))?;
    if payload.len() != expected {
        return Err(DatasetError::InvalidFormat(format!(
            "{}: expected {} bytes for shape {}x{}, found {}",
            TIME_SERIES_FILE,
            expected,
            rows,
            cols,
            payload.len()
        )));
    }

    let mut samples = vec![0.0f32; expected / std::mem::size_of::<f32>()];
    let mut reader = &payload[..];
    reader.read_f32_into::<LittleEndian>(&mut samples)?;
    let binary_data = Array2::from_shape_vec((rows, cols), samples)
        .map_err(|e| DatasetError::InvalidFormat(e.to_string()))?;

    Ok(PaData::new(binary_data, manifest.device, manifest.acquisition))
}

#[cfg(test)]
mod tests {
    use ndarray::Array2;
    use tempfile::tempdir;
    use uuid::Uuid;

    use super::*;
    use crate::metadata::{DetectionElementBuilder, DeviceMetadataBuilder, MetadataValue};
    use crate::vocabulary::AcquisitionTag;

    fn sample_data() -> PaData {
        let mut builder =
            DeviceMetadataBuilder::new(Uuid::nil()).field_of_view([0.0, 0.05, 0.05]);
        for i in 0..2 {
            let element = DetectionElementBuilder::new()
                .position([0.01 * i as f64, 0.0, 0.0])
                .orientation([-1.0, 0.0, 0.0])
                .size([0.0127, 0.0127, 0.0001])
                .build()
                .unwrap();
            builder
                .add_detection_element(format!("detection_element_{}", i), element)
                .unwrap();
        }
        let device = builder.finalize();

        let mut acquisition = AcquisitionMetadata::new();
        acquisition.set(AcquisitionTag::UniqueIdentifier, "TestUUID".into());
        acquisition.set(AcquisitionTag::AdSamplingRate, MetadataValue::Float(4.0e7));
        acquisition.set(AcquisitionTag::Sizes, MetadataValue::IntArray(vec![1, 2, 4]));

        let binary_data =
            Array2::from_shape_vec((2, 4), (0..8).map(|x| x as f32).collect()).unwrap();
        PaData::new(binary_data, device, acquisition)
    }

    #[test]
    fn test_bundle_roundtrip() {
        let dir = tempdir().unwrap();
        let bundle_path = dir.path().join("scan.padata");

        let data = sample_data();
        write_bundle(&data, &bundle_path).unwrap();
        let loaded = load_bundle(&bundle_path).unwrap();

        assert_eq!(loaded.binary_data, data.binary_data);
        assert_eq!(loaded.device, data.device);
        assert_eq!(loaded.acquisition, data.acquisition);
        assert_eq!(
            loaded.device.detectors.identifiers().collect::<Vec<_>>(),
            vec!["detection_element_0", "detection_element_1"]
        );
    }

    #[test]
    fn test_metadata_json_is_valid() {
        let dir = tempdir().unwrap();
        let bundle_path = dir.path().join("scan.padata");
        write_bundle(&sample_data(), &bundle_path).unwrap();

        let json = fs::read_to_string(bundle_path.join("metadata.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["format_version"], FORMAT_VERSION);
        assert!(value["created"].is_string());
        assert!(value["converter"]
            .as_str()
            .unwrap()
            .starts_with("padata v"));
        assert_eq!(value["binary_shape"][0], 2);
        assert_eq!(value["acquisition"]["uuid"], "TestUUID");
    }

    #[test]
    fn test_truncated_payload_rejected() {
        let dir = tempdir().unwrap();
        let bundle_path = dir.path().join("scan.padata");
        write_bundle(&sample_data(), &bundle_path).unwrap();

        let series_path = bundle_path.join("time_series.bin");
        let payload = fs::read(&series_path).unwrap();
        fs::write(&series_path, &payload[..payload.len() - 4]).unwrap();

        let err = load_bundle(&bundle_path).unwrap_err();
        assert!(matches!(err, DatasetError::InvalidFormat(_)));
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let dir = tempdir().unwrap();
        let bundle_path = dir.path().join("scan.padata");
        write_bundle(&sample_data(), &bundle_path).unwrap();

        let metadata_path = bundle_path.join("metadata.json");
        let json = fs::read_to_string(&metadata_path).unwrap();
        fs::write(&metadata_path, json.replace("\"1.0.0\"", "\"2.0.0\"")).unwrap();

        let err = load_bundle(&bundle_path).unwrap_err();
        assert!(matches!(err, DatasetError::UnsupportedVersion(v) if v == "2.0.0"));
    }

    #[test]
    fn test_oversized_manifest_shape_rejected() {
        let dir = tempdir().unwrap();
        let bundle_path = dir.path().join("scan.padata");
        write_bundle(&sample_data(), &bundle_path).unwrap();

        let metadata_path = bundle_path.join("metadata.json");
        let json = fs::read_to_string(&metadata_path).unwrap();
        let mut manifest: serde_json::Value = serde_json::from_str(&json).unwrap();
        manifest["binary_shape"] = serde_json::json!([usize::MAX / 2, 8]);
        fs::write(&metadata_path, manifest.to_string()).unwrap();

        let err = load_bundle(&bundle_path).unwrap_err();
        assert!(matches!(err, DatasetError::InvalidFormat(_)));
    }

    #[test]
    fn test_load_missing_bundle() {
        let dir = tempdir().unwrap();
        let err = load_bundle(dir.path().join("nope.padata")).unwrap_err();
        assert!(matches!(err, DatasetError::InvalidPath(_)));
    }
}
