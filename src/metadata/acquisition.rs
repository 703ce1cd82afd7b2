use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::value::MetadataValue;
use super::MetadataError;
use crate::vocabulary::AcquisitionTag;

/// Acquisition-level metadata: the answered subset of the tag vocabulary.
///
/// Iteration and serialization follow the vocabulary's declaration order, so
/// output files list tags in a stable order regardless of when a converter
/// answered them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcquisitionMetadata {
    values: HashMap<AcquisitionTag, MetadataValue>,
}

impl AcquisitionMetadata {
    /// Create an empty metadata set
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value for a tag, replacing any previous value
    pub fn set(&mut self, tag: AcquisitionTag, value: MetadataValue) {
        self.values.insert(tag, value);
    }

    /// Look up the value stored for a tag
    pub fn get(&self, tag: AcquisitionTag) -> Option<&MetadataValue> {
        self.values.get(&tag)
    }

    /// Whether a value is stored for a tag
    pub fn contains(&self, tag: AcquisitionTag) -> bool {
        self.values.contains_key(&tag)
    }

    /// Number of answered tags
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no tags have been answered
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate answered tags in vocabulary declaration order
    pub fn iter(&self) -> impl Iterator<Item = (AcquisitionTag, &MetadataValue)> {
        AcquisitionTag::ALL
            .iter()
            .filter_map(move |tag| self.values.get(tag).map(|v| (*tag, v)))
    }

    /// Mandatory tags of the vocabulary that have no stored value
    pub fn missing_mandatory(&self) -> Vec<AcquisitionTag> {
        AcquisitionTag::ALL
            .iter()
            .filter(|tag| tag.is_mandatory() && !self.values.contains_key(tag))
            .copied()
            .collect()
    }

    /// Serialize to a JSON object keyed by canonical tag strings
    pub fn to_json(&self) -> Result<String, MetadataError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from a JSON object keyed by canonical tag strings
    pub fn from_json(json: &str) -> Result<Self, MetadataError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Serialize for AcquisitionMetadata {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (tag, value) in self.iter() {
            map.serialize_entry(tag.key(), value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AcquisitionMetadata {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TagMapVisitor;

        impl<'de> Visitor<'de> for TagMapVisitor {
            type Value = AcquisitionMetadata;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a map of acquisition tag keys to values")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut result = AcquisitionMetadata::new();
                while let Some((key, value)) = access.next_entry::<String, MetadataValue>()? {
                    let tag = AcquisitionTag::from_key(&key).ok_or_else(|| {
                        serde::de::Error::custom(format!("unknown acquisition tag key: {}", key))
                    })?;
                    result.set(tag, value);
                }
                Ok(result)
            }
        }

        deserializer.deserialize_map(TagMapVisitor)
    }
}
