//! HDF5 container reading and writing.
//!
//! Element groups carry a `row_index` attribute because HDF5 iterates group
//! members in name order, which would scramble the detector-to-row mapping
//! for any device with more than nine elements.

use std::path::Path;
use std::str::FromStr;

use hdf5::types::VarLenUnicode;
use hdf5::{File, Group};
use log::{debug, info};
use ndarray::ArrayView1;
use uuid::Uuid;

use super::{DatasetError, FORMAT_VERSION};
use crate::metadata::{
    AcquisitionMetadata, DetectionElement, DeviceMetadata, DeviceMetadataBuilder,
    IlluminationElement, MetadataValue,
};
use crate::pa_data::PaData;
use crate::vocabulary::{device_tags, AcquisitionTag, ValueKind};

const BINARY_DATASET: &str = "binary_time_series_data";
const ACQUISITION_GROUP: &str = "meta_data_acquisition";
const DEVICE_GROUP: &str = "meta_data_device";
const VERSION_ATTR: &str = "format_version";
const ROW_INDEX_ATTR: &str = "row_index";

/// Write a converted dataset as a single HDF5 container file.
pub fn write_hdf5<P: AsRef<Path>>(data: &PaData, path: P) -> Result<(), DatasetError> {
    let file = File::create(path.as_ref())?;
    set_str_attr(&file, VERSION_ATTR, FORMAT_VERSION)?;

    let (rows, cols) = data.binary_data.dim();
    let binary = file
        .new_dataset::<f32>()
        .shape((rows, cols))
        .create(BINARY_DATASET)?;
    binary.write(data.binary_data.view())?;

    let acquisition = file.create_group(ACQUISITION_GROUP)?;
    for (tag, value) in data.acquisition.iter() {
        let key = tag.key();
        match value {
            MetadataValue::Text(text) => write_str(&acquisition, key, text)?,
            MetadataValue::Float(number) => write_f64_scalar(&acquisition, key, *number)?,
            MetadataValue::IntArray(values) => write_i64_slice(&acquisition, key, values)?,
            MetadataValue::FloatArray(values) => write_f64_slice(&acquisition, key, values)?,
        }
    }

    write_device(&file, &data.device)?;

    info!(
        "Wrote HDF5 container {} ({} series of {} samples)",
        path.as_ref().display(),
        rows,
        cols
    );
    Ok(())
}

/// Load an HDF5 container back into memory.
pub fn load_hdf5<P: AsRef<Path>>(path: P) -> Result<PaData, DatasetError> {
    let file = File::open(path.as_ref())?;
    debug!("Loading HDF5 container {}", path.as_ref().display());

    if let Ok(attr) = file.attr(VERSION_ATTR) {
        let version: VarLenUnicode = attr.read_scalar()?;
        let major = version.as_str().split('.').next().unwrap_or("");
        if major != FORMAT_VERSION.split('.').next().unwrap_or("") {
            return Err(DatasetError::UnsupportedVersion(version.to_string()));
        }
    }

    let binary_data = file.dataset(BINARY_DATASET)?.read_2d::<f32>()?;

    let group = file.group(ACQUISITION_GROUP)?;
    let mut acquisition = AcquisitionMetadata::new();
    for tag in AcquisitionTag::ALL {
        let key = tag.key();
        if !group.link_exists(key) {
            continue;
        }
        let value = match tag.metadatum().kind {
            ValueKind::Text => MetadataValue::Text(read_str(&group, key)?),
            ValueKind::Float => MetadataValue::Float(group.dataset(key)?.read_scalar::<f64>()?),
            ValueKind::IntArray => MetadataValue::IntArray(group.dataset(key)?.read_raw::<i64>()?),
            ValueKind::FloatArray => {
                MetadataValue::FloatArray(group.dataset(key)?.read_raw::<f64>()?)
            }
        };
        acquisition.set(tag, value);
    }

    let device = read_device(&file)?;
    Ok(PaData::new(binary_data, device, acquisition))
}

fn write_device(file: &File, device: &DeviceMetadata) -> Result<(), DatasetError> {
    let root = file.create_group(DEVICE_GROUP)?;

    let general = root.create_group(device_tags::GENERAL)?;
    write_str(
        &general,
        device_tags::UNIQUE_IDENTIFIER,
        &device.general.unique_identifier.to_string(),
    )?;
    write_f64_slice(
        &general,
        device_tags::FIELD_OF_VIEW,
        &device.general.field_of_view,
    )?;
    write_u64_scalar(
        &general,
        device_tags::NUM_DETECTION_ELEMENTS,
        device.general.num_detection_elements as u64,
    )?;
    write_u64_scalar(
        &general,
        device_tags::NUM_ILLUMINATION_ELEMENTS,
        device.general.num_illumination_elements as u64,
    )?;

    let detectors = root.create_group(device_tags::DETECTORS)?;
    for (row, (identifier, element)) in device.detectors.iter().enumerate() {
        let child = detectors.create_group(identifier)?;
        child
            .new_attr::<u64>()
            .create(ROW_INDEX_ATTR)?
            .write_scalar(&(row as u64))?;
        write_f64_slice(&child, device_tags::DETECTOR_POSITION, &element.position)?;
        write_f64_slice(&child, device_tags::DETECTOR_ORIENTATION, &element.orientation)?;
        write_f64_slice(&child, device_tags::DETECTOR_SIZE, &element.size)?;
        if let Some(curve) = &element.frequency_response {
            write_f64_slice(&child, device_tags::FREQUENCY_RESPONSE, curve)?;
        }
        if let Some(curve) = &element.angular_response {
            write_f64_slice(&child, device_tags::ANGULAR_RESPONSE, curve)?;
        }
    }

    let illuminators = root.create_group(device_tags::ILLUMINATORS)?;
    for (row, (identifier, element)) in device.illuminators.iter().enumerate() {
        let child = illuminators.create_group(identifier)?;
        child
            .new_attr::<u64>()
            .create(ROW_INDEX_ATTR)?
            .write_scalar(&(row as u64))?;
        write_f64_slice(&child, device_tags::ILLUMINATOR_POSITION, &element.position)?;
        write_f64_slice(
            &child,
            device_tags::ILLUMINATOR_ORIENTATION,
            &element.orientation,
        )?;
        if let Some(shape) = &element.shape {
            write_f64_slice(&child, device_tags::ILLUMINATOR_SHAPE, shape)?;
        }
        if let Some(range) = &element.wavelength_range {
            write_f64_slice(&child, device_tags::WAVELENGTH_RANGE, range)?;
        }
        if let Some(angle) = element.beam_divergence {
            write_f64_scalar(&child, device_tags::BEAM_DIVERGENCE_ANGLES, angle)?;
        }
        if let Some(width) = element.pulse_width {
            write_f64_scalar(&child, device_tags::PULSE_WIDTH, width)?;
        }
    }

    Ok(())
}

fn read_device(file: &File) -> Result<DeviceMetadata, DatasetError> {
    let root = file.group(DEVICE_GROUP)?;

    let general = root.group(device_tags::GENERAL)?;
    let identifier_text = read_str(&general, device_tags::UNIQUE_IDENTIFIER)?;
    let unique_identifier = Uuid::parse_str(&identifier_text)
        .map_err(|e| DatasetError::InvalidFormat(format!("device identifier: {}", e)))?;
    let field_of_view = read_triplet(&general, device_tags::FIELD_OF_VIEW)?;

    // Element counts are recomputed by the builder rather than trusted.
    let mut builder = DeviceMetadataBuilder::new(unique_identifier).field_of_view(field_of_view);

    for (identifier, child) in ordered_members(&root.group(device_tags::DETECTORS)?)? {
        builder.add_detection_element(identifier, read_detection_element(&child)?)?;
    }
    for (identifier, child) in ordered_members(&root.group(device_tags::ILLUMINATORS)?)? {
        builder.add_illumination_element(identifier, read_illumination_element(&child)?)?;
    }

    Ok(builder.finalize())
}

fn read_detection_element(group: &Group) -> Result<DetectionElement, DatasetError> {
    Ok(DetectionElement {
        position: read_triplet(group, device_tags::DETECTOR_POSITION)?,
        orientation: read_triplet(group, device_tags::DETECTOR_ORIENTATION)?,
        size: read_triplet(group, device_tags::DETECTOR_SIZE)?,
        frequency_response: read_f64_vec_opt(group, device_tags::FREQUENCY_RESPONSE)?,
        angular_response: read_f64_vec_opt(group, device_tags::ANGULAR_RESPONSE)?,
    })
}

fn read_illumination_element(group: &Group) -> Result<IlluminationElement, DatasetError> {
    let beam_divergence = if group.link_exists(device_tags::BEAM_DIVERGENCE_ANGLES) {
        Some(
            group
                .dataset(device_tags::BEAM_DIVERGENCE_ANGLES)?
                .read_scalar::<f64>()?,
        )
    } else {
        None
    };
    let pulse_width = if group.link_exists(device_tags::PULSE_WIDTH) {
        Some(group.dataset(device_tags::PULSE_WIDTH)?.read_scalar::<f64>()?)
    } else {
        None
    };

    Ok(IlluminationElement {
        position: read_triplet(group, device_tags::ILLUMINATOR_POSITION)?,
        orientation: read_triplet(group, device_tags::ILLUMINATOR_ORIENTATION)?,
        shape: read_triplet_opt(group, device_tags::ILLUMINATOR_SHAPE)?,
        wavelength_range: read_triplet_opt(group, device_tags::WAVELENGTH_RANGE)?,
        beam_divergence,
        pulse_width,
    })
}

/// Child groups sorted by their `row_index` attribute, falling back to name
/// order for files written by other tools.
fn ordered_members(group: &Group) -> Result<Vec<(String, Group)>, DatasetError> {
    let mut members = Vec::new();
    for (fallback, name) in group.member_names()?.into_iter().enumerate() {
        let child = group.group(&name)?;
        let order = match child.attr(ROW_INDEX_ATTR) {
            Ok(attr) => attr.read_scalar::<u64>()?,
            Err(_) => fallback as u64,
        };
        members.push((order, name, child));
    }
    members.sort_by_key(|(order, _, _)| *order);
    Ok(members
        .into_iter()
        .map(|(_, name, child)| (name, child))
        .collect())
}

fn write_str(group: &Group, name: &str, value: &str) -> Result<(), DatasetError> {
    let value = to_var_len_unicode(value)?;
    group
        .new_dataset::<VarLenUnicode>()
        .create(name)?
        .write_scalar(&value)?;
    Ok(())
}

fn write_f64_scalar(group: &Group, name: &str, value: f64) -> Result<(), DatasetError> {
    group
        .new_dataset::<f64>()
        .create(name)?
        .write_scalar(&value)?;
    Ok(())
}

fn write_u64_scalar(group: &Group, name: &str, value: u64) -> Result<(), DatasetError> {
    group
        .new_dataset::<u64>()
        .create(name)?
        .write_scalar(&value)?;
    Ok(())
}

fn write_f64_slice(group: &Group, name: &str, values: &[f64]) -> Result<(), DatasetError> {
    let dataset = group
        .new_dataset::<f64>()
        .shape((values.len(),))
        .create(name)?;
    dataset.write(ArrayView1::from(values))?;
    Ok(())
}

fn write_i64_slice(group: &Group, name: &str, values: &[i64]) -> Result<(), DatasetError> {
    let dataset = group
        .new_dataset::<i64>()
        .shape((values.len(),))
        .create(name)?;
    dataset.write(ArrayView1::from(values))?;
    Ok(())
}

fn read_str(group: &Group, name: &str) -> Result<String, DatasetError> {
    let value: VarLenUnicode = group.dataset(name)?.read_scalar()?;
    Ok(value.to_string())
}

fn read_triplet(group: &Group, name: &str) -> Result<[f64; 3], DatasetError> {
    let values = group.dataset(name)?.read_raw::<f64>()?;
    <[f64; 3]>::try_from(values).map_err(|values: Vec<f64>| {
        DatasetError::InvalidFormat(format!(
            "{}: expected 3 values, found {}",
            name,
            values.len()
        ))
    })
}

fn read_triplet_opt(group: &Group, name: &str) -> Result<Option<[f64; 3]>, DatasetError> {
    if group.link_exists(name) {
        Ok(Some(read_triplet(group, name)?))
    } else {
        Ok(None)
    }
}

fn read_f64_vec_opt(group: &Group, name: &str) -> Result<Option<Vec<f64>>, DatasetError> {
    if group.link_exists(name) {
        Ok(Some(group.dataset(name)?.read_raw::<f64>()?))
    } else {
        Ok(None)
    }
}

fn set_str_attr(file: &File, name: &str, value: &str) -> Result<(), DatasetError> {
    let value = to_var_len_unicode(value)?;
    file.new_attr::<VarLenUnicode>()
        .create(name)?
        .write_scalar(&value)?;
    Ok(())
}

fn to_var_len_unicode(value: &str) -> Result<VarLenUnicode, DatasetError> {
    VarLenUnicode::from_str(value)
        .map_err(|e| DatasetError::InvalidFormat(format!("string not storable in HDF5: {}", e)))
}
