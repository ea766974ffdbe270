//! Hyperparameter values and grids

use crate::error::{CvError, Result};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A single hyperparameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl ParamValue {
    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Get as int
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            ParamValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Null => f.write_str("null"),
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::String(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::String(v.to_string())
    }
}

/// One point of a grid: parameter name to value, in grid order
///
/// Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSet(Vec<(String, ParamValue)>);

impl Serialize for ParamSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ParamSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let map = BTreeMap::<String, ParamValue>::deserialize(deserializer)?;
        Ok(ParamSet(map.into_iter().collect()))
    }
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        f.write_str("}")
    }
}

/// Ordered mapping from parameter name to candidate values
///
/// The search space is the cross product of all candidate lists; the last
/// parameter varies fastest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    params: Vec<(String, Vec<ParamValue>)>,
}

impl ParamGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter with its candidate values
    pub fn add(mut self, name: impl Into<String>, values: Vec<ParamValue>) -> Self {
        self.params.push((name.into(), values));
        self
    }

    /// Add a float parameter with evenly spaced candidates
    pub fn linspace(self, name: impl Into<String>, low: f64, high: f64, num: usize) -> Self {
        let values = linspace(low, high, num).into_iter().map(ParamValue::Float).collect();
        self.add(name, values)
    }

    pub fn names(&self) -> Vec<&str> {
        self.params.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn values(&self, name: &str) -> Option<&[ParamValue]> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_slice())
    }

    /// Number of candidate configurations
    pub fn n_candidates(&self) -> usize {
        if self.params.is_empty() {
            return 0;
        }
        self.params.iter().map(|(_, v)| v.len()).product()
    }

    pub fn is_empty(&self) -> bool {
        self.n_candidates() == 0
    }

    /// Every configuration of the cross product, row-major
    pub fn candidates(&self) -> Vec<ParamSet> {
        let total = self.n_candidates();
        (0..total)
            .map(|mut flat| {
                let mut point = vec![ParamValue::Null; self.params.len()];
                for (slot, (_, values)) in point.iter_mut().zip(self.params.iter()).rev() {
                    *slot = values[flat % values.len()].clone();
                    flat /= values.len();
                }
                ParamSet(
                    self.params
                        .iter()
                        .map(|(n, _)| n.clone())
                        .zip(point)
                        .collect(),
                )
            })
            .collect()
    }

    /// Fail if any parameter has no candidates
    pub fn validate(&self) -> Result<()> {
        if self.params.is_empty() {
            return Err(CvError::ConfigError("parameter grid is empty".to_string()));
        }
        if let Some((name, _)) = self.params.iter().find(|(_, v)| v.is_empty()) {
            return Err(CvError::ConfigError(format!(
                "parameter {} has no candidate values",
                name
            )));
        }
        Ok(())
    }
}

/// Evenly spaced values over `[low, high]`, endpoints included
pub fn linspace(low: f64, high: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![low],
        _ => {
            let step = (high - low) / (num - 1) as f64;
            (0..num)
                .map(|i| if i == num - 1 { high } else { low + step * i as f64 })
                .collect()
        }
    }
}
