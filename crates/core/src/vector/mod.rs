//! Vector results: features with attributes and GeoJSON export

use crate::crs::CRS;
use crate::error::{Error, Result};
use geo_types::Geometry;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map as JsonMap, Value as JsonValue};
use std::collections::BTreeMap;

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(v) => Some(*v as f64),
            AttributeValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    fn to_json(&self) -> JsonValue {
        match self {
            AttributeValue::Null => JsonValue::Null,
            AttributeValue::Bool(b) => json!(b),
            AttributeValue::Int(i) => json!(i),
            // Non-finite floats have no JSON form
            AttributeValue::Float(f) if f.is_finite() => json!(f),
            AttributeValue::Float(_) => JsonValue::Null,
            AttributeValue::String(s) => json!(s),
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<usize> for AttributeValue {
    fn from(v: usize) -> Self {
        AttributeValue::Int(v as i64)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::String(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::String(v)
    }
}

impl<T: Into<AttributeValue>> From<Option<T>> for AttributeValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(AttributeValue::Null, Into::into)
    }
}

/// A geographic feature with geometry and attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Feature geometry
    pub geometry: Option<Geometry<f64>>,
    /// Feature attributes, in key order
    pub properties: BTreeMap<String, AttributeValue>,
    /// Optional feature ID
    pub id: Option<String>,
}

impl Feature {
    /// Create a new feature with geometry
    pub fn new(geometry: impl Into<Geometry<f64>>) -> Self {
        Self {
            geometry: Some(geometry.into()),
            properties: BTreeMap::new(),
            id: None,
        }
    }

    /// Builder: set the feature ID
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Builder: set an attribute
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.set_property(key, value);
        self
    }

    /// Set an attribute
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Get an attribute
    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }

    /// Convert to a `geojson::Feature`
    pub fn to_geojson(&self) -> geojson::Feature {
        let properties: JsonMap<String, JsonValue> = self
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();

        geojson::Feature {
            bbox: None,
            geometry: self
                .geometry
                .as_ref()
                .map(|g| geojson::Geometry::new(geojson::Value::from(g))),
            id: self.id.clone().map(geojson::feature::Id::String),
            properties: Some(properties),
            foreign_members: None,
        }
    }

    /// Build from a `geojson::Feature`.
    ///
    /// Property values without a scalar form (objects, arrays) become null.
    pub fn from_geojson(feature: &geojson::Feature) -> Result<Self> {
        let geometry = feature
            .geometry
            .as_ref()
            .map(|g| Geometry::<f64>::try_from(g.clone()))
            .transpose()
            .map_err(|e| Error::Other(format!("unsupported geometry: {e}")))?;

        let properties = feature
            .properties
            .iter()
            .flatten()
            .map(|(k, v)| {
                let value = serde_json::from_value(v.clone()).unwrap_or(AttributeValue::Null);
                (k.clone(), value)
            })
            .collect();

        let id = feature.id.as_ref().map(|id| match id {
            geojson::feature::Id::String(s) => s.clone(),
            geojson::feature::Id::Number(n) => n.to_string(),
        });

        Ok(Self {
            geometry,
            properties,
            id,
        })
    }
}

/// Collection of features
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self { features: Vec::new() }
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    /// Convert to a `geojson::FeatureCollection`.
    ///
    /// A known EPSG code is recorded as a legacy named `crs` member.
    pub fn to_geojson(&self, crs: Option<&CRS>) -> geojson::FeatureCollection {
        let foreign_members = crs.and_then(CRS::epsg).map(|code| {
            let mut members = JsonMap::new();
            members.insert(
                "crs".to_string(),
                json!({
                    "type": "name",
                    "properties": { "name": format!("urn:ogc:def:crs:EPSG::{}", code) }
                }),
            );
            members
        });

        geojson::FeatureCollection {
            bbox: None,
            features: self.features.iter().map(Feature::to_geojson).collect(),
            foreign_members,
        }
    }

    /// GeoJSON text of the collection
    pub fn to_geojson_string(&self, crs: Option<&CRS>) -> String {
        geojson::GeoJson::FeatureCollection(self.to_geojson(crs)).to_string()
    }

    /// Parse GeoJSON text: a collection, a single feature or a bare geometry
    pub fn from_geojson_str(text: &str) -> Result<Self> {
        let parsed: geojson::GeoJson = text
            .parse()
            .map_err(|e: geojson::Error| Error::Other(format!("invalid GeoJSON: {e}")))?;

        match parsed {
            geojson::GeoJson::FeatureCollection(fc) => fc.features.iter().map(Feature::from_geojson).collect(),
            geojson::GeoJson::Feature(f) => Ok(std::iter::once(Feature::from_geojson(&f)?).collect()),
            geojson::GeoJson::Geometry(g) => {
                let geometry = Geometry::<f64>::try_from(g)
                    .map_err(|e| Error::Other(format!("unsupported geometry: {e}")))?;
                Ok(std::iter::once(Feature::new(geometry)).collect())
            }
        }
    }
}

impl Serialize for FeatureCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_geojson(None).serialize(serializer)
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}
