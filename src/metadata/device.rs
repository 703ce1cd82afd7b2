use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use super::MetadataError;

/// Ordered map of element identifiers to elements.
///
/// Element order must match the row order of the binary time series, so this
/// map preserves insertion order and rejects duplicate identifiers instead of
/// silently replacing an element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementMap<T> {
    entries: Vec<(String, T)>,
}

impl<T> ElementMap<T> {
    /// Create an empty map
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register an element under an identifier.
    ///
    /// Fails if the identifier is already taken.
    pub fn insert(&mut self, identifier: impl Into<String>, element: T) -> Result<(), MetadataError> {
        let identifier = identifier.into();
        if self.entries.iter().any(|(id, _)| *id == identifier) {
            return Err(MetadataError::DuplicateElement(identifier));
        }
        self.entries.push((identifier, element));
        Ok(())
    }

    /// Look up an element by identifier
    pub fn get(&self, identifier: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|(id, _)| id == identifier)
            .map(|(_, e)| e)
    }

    /// Iterate (identifier, element) pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(id, e)| (id.as_str(), e))
    }

    /// Iterate identifiers in insertion order
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    /// Iterate elements in insertion order
    pub fn elements(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, e)| e)
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map holds no elements
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Serialize> Serialize for ElementMap<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (identifier, element) in &self.entries {
            map.serialize_entry(identifier, element)?;
        }
        map.end()
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for ElementMap<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ElementMapVisitor<T> {
            marker: std::marker::PhantomData<T>,
        }

        impl<'de, T: Deserialize<'de>> Visitor<'de> for ElementMapVisitor<T> {
            type Value = ElementMap<T>;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a map of element identifiers to elements")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut result = ElementMap::new();
                while let Some((identifier, element)) = access.next_entry::<String, T>()? {
                    result
                        .insert(identifier, element)
                        .map_err(serde::de::Error::custom)?;
                }
                Ok(result)
            }
        }

        deserializer.deserialize_map(ElementMapVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

/// One ultrasound detection element of the device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionElement {
    /// Position in metres, device coordinate system
    pub position: [f64; 3],
    /// Unit vector the element faces
    pub orientation: [f64; 3],
    /// Element extent in metres
    pub size: [f64; 3],
    /// Frequency response curve, if characterized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_response: Option<Vec<f64>>,
    /// Angular sensitivity curve, if characterized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angular_response: Option<Vec<f64>>,
}

/// Assembles one [`DetectionElement`] field by field.
///
/// Position, orientation and size are required; `build` fails when one of
/// them was never set.
#[derive(Debug, Clone, Default)]
pub struct DetectionElementBuilder {
    position: Option<[f64; 3]>,
    orientation: Option<[f64; 3]>,
    size: Option<[f64; 3]>,
    frequency_response: Option<Vec<f64>>,
    angular_response: Option<Vec<f64>>,
}

impl DetectionElementBuilder {
    /// Start an empty element description
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the element position in metres
    pub fn position(mut self, position: [f64; 3]) -> Self {
        self.position = Some(position);
        self
    }

    /// Set the unit vector the element faces
    pub fn orientation(mut self, orientation: [f64; 3]) -> Self {
        self.orientation = Some(orientation);
        self
    }

    /// Set the element extent in metres
    pub fn size(mut self, size: [f64; 3]) -> Self {
        self.size = Some(size);
        self
    }

    /// Attach a frequency response curve
    pub fn frequency_response(mut self, curve: Vec<f64>) -> Self {
        self.frequency_response = Some(curve);
        self
    }

    /// Attach an angular sensitivity curve
    pub fn angular_response(mut self, curve: Vec<f64>) -> Self {
        self.angular_response = Some(curve);
        self
    }

    /// Finish the element description
    pub fn build(self) -> Result<DetectionElement, MetadataError> {
        Ok(DetectionElement {
            position: self
                .position
                .ok_or(MetadataError::IncompleteElement("detector_position"))?,
            orientation: self
                .orientation
                .ok_or(MetadataError::IncompleteElement("detector_orientation"))?,
            size: self
                .size
                .ok_or(MetadataError::IncompleteElement("detector_size"))?,
            frequency_response: self.frequency_response,
            angular_response: self.angular_response,
        })
    }
}

/// One illumination element of the device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IlluminationElement {
    /// Position in metres, device coordinate system
    pub position: [f64; 3],
    /// Unit vector along the optical axis
    pub orientation: [f64; 3],
    /// Emitting surface extent in metres, if characterized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<[f64; 3]>,
    /// Tunable wavelength range [min nm, max nm, step nm], if characterized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wavelength_range: Option<[f64; 3]>,
    /// Beam divergence half-angle in radians, if characterized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beam_divergence: Option<f64>,
    /// Laser pulse width in seconds, if characterized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pulse_width: Option<f64>,
}

/// Assembles one [`IlluminationElement`] field by field.
///
/// Position and orientation are required, the optical characterization
/// fields are optional.
#[derive(Debug, Clone, Default)]
pub struct IlluminationElementBuilder {
    position: Option<[f64; 3]>,
    orientation: Option<[f64; 3]>,
    shape: Option<[f64; 3]>,
    wavelength_range: Option<[f64; 3]>,
    beam_divergence: Option<f64>,
    pulse_width: Option<f64>,
}

impl IlluminationElementBuilder {
    /// Start an empty element description
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the element position in metres
    pub fn position(mut self, position: [f64; 3]) -> Self {
        self.position = Some(position);
        self
    }

    /// Set the unit vector along the optical axis
    pub fn orientation(mut self, orientation: [f64; 3]) -> Self {
        self.orientation = Some(orientation);
        self
    }

    /// Set the emitting surface extent in metres
    pub fn shape(mut self, shape: [f64; 3]) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Set the tunable wavelength range [min nm, max nm, step nm]
    pub fn wavelength_range(mut self, range: [f64; 3]) -> Self {
        self.wavelength_range = Some(range);
        self
    }

    /// Set the beam divergence half-angle in radians
    pub fn beam_divergence(mut self, angle: f64) -> Self {
        self.beam_divergence = Some(angle);
        self
    }

    /// Set the laser pulse width in seconds
    pub fn pulse_width(mut self, width: f64) -> Self {
        self.pulse_width = Some(width);
        self
    }

    /// Finish the element description
    pub fn build(self) -> Result<IlluminationElement, MetadataError> {
        Ok(IlluminationElement {
            position: self
                .position
                .ok_or(MetadataError::IncompleteElement("illuminator_position"))?,
            orientation: self
                .orientation
                .ok_or(MetadataError::IncompleteElement("illuminator_orientation"))?,
            shape: self.shape,
            wavelength_range: self.wavelength_range,
            beam_divergence: self.beam_divergence,
            pulse_width: self.pulse_width,
        })
    }
}

/// Device-wide fields of the device description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralInfo {
    /// UUID identifying this device description
    pub unique_identifier: Uuid,
    /// Extent of the imaged volume in metres
    pub field_of_view: [f64; 3],
    /// Number of detection elements
    pub num_detection_elements: usize,
    /// Number of illumination elements
    pub num_illumination_elements: usize,
}

/// Complete device description: general info plus per-element descriptions.
///
/// Assembled through [`DeviceMetadataBuilder`]; `finalize` computes the
/// element counts, and nothing mutates the description afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceMetadata {
    /// Device-wide fields
    pub general: GeneralInfo,
    /// Detection elements keyed by identifier, in binary-data row order
    pub detectors: ElementMap<DetectionElement>,
    /// Illumination elements keyed by identifier
    pub illuminators: ElementMap<IlluminationElement>,
}

impl DeviceMetadata {
    /// Serialize the device description to JSON
    pub fn to_json(&self) -> Result<String, MetadataError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize a device description from JSON
    pub fn from_json(json: &str) -> Result<Self, MetadataError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Accumulates a device description element by element
#[derive(Debug, Clone)]
pub struct DeviceMetadataBuilder {
    unique_identifier: Uuid,
    field_of_view: [f64; 3],
    detectors: ElementMap<DetectionElement>,
    illuminators: ElementMap<IlluminationElement>,
}

impl DeviceMetadataBuilder {
    /// Start a device description for the device with the given UUID
    pub fn new(unique_identifier: Uuid) -> Self {
        Self {
            unique_identifier,
            field_of_view: [0.0; 3],
            detectors: ElementMap::new(),
            illuminators: ElementMap::new(),
        }
    }

    /// Set the extent of the imaged volume in metres
    pub fn field_of_view(mut self, field_of_view: [f64; 3]) -> Self {
        self.field_of_view = field_of_view;
        self
    }

    /// Register a detection element.
    ///
    /// Identifiers must be unique; registration order becomes the row order
    /// of the binary time series.
    pub fn add_detection_element(
        &mut self,
        identifier: impl Into<String>,
        element: DetectionElement,
    ) -> Result<(), MetadataError> {
        self.detectors.insert(identifier, element)
    }

    /// Register an illumination element under a unique identifier
    pub fn add_illumination_element(
        &mut self,
        identifier: impl Into<String>,
        element: IlluminationElement,
    ) -> Result<(), MetadataError> {
        self.illuminators.insert(identifier, element)
    }

    /// Compute the element counts and freeze the description
    pub fn finalize(self) -> DeviceMetadata {
        DeviceMetadata {
            general: GeneralInfo {
                unique_identifier: self.unique_identifier,
                field_of_view: self.field_of_view,
                num_detection_elements: self.detectors.len(),
                num_illumination_elements: self.illuminators.len(),
            },
            detectors: self.detectors,
            illuminators: self.illuminators,
        }
    }
}
