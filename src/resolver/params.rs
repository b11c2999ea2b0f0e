//! Validated `axis -> value` maps in supply order.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use super::error::ValidationError;
use crate::library::StyleLibrary;

/// Axis values in [0, 1], in the order the client supplied them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParameterSet(IndexMap<String, f64>);

impl ParameterSet {
    /// Validate a JSON object against the library's axes.
    ///
    /// `field` names the request field in error messages (e.g. `params`,
    /// `p_0`). An empty object is accepted; callers that require values
    /// check [`ParameterSet::is_empty`].
    pub fn from_json(
        library: &StyleLibrary,
        field: &str,
        value: &Value,
    ) -> Result<Self, ValidationError> {
        let object = value
            .as_object()
            .ok_or_else(|| ValidationError::new(format!("'{}' must be an object", field)))?;

        let mut values = IndexMap::with_capacity(object.len());
        for (axis, raw) in object {
            if !library.has_axis(axis) {
                return Err(ValidationError::new(format!(
                    "unknown axis '{}' in '{}'",
                    axis, field
                )));
            }
            let number = raw.as_f64().ok_or_else(|| {
                ValidationError::new(format!("'{}.{}' must be a number", field, axis))
            })?;
            if !number.is_finite() || !(0.0..=1.0).contains(&number) {
                return Err(ValidationError::new(format!(
                    "'{}.{}' must be within [0, 1], got {}",
                    field, axis, number
                )));
            }
            values.insert(axis.clone(), number);
        }
        Ok(Self(values))
    }

    pub fn get(&self, axis: &str) -> Option<f64> {
        self.0.get(axis).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(axis, value)| (axis.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
