//! Operation keys and query parameters.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{StreamError, StreamResult};

/// Identifies one streaming endpoint: a name for logging plus a path template
/// with its bound path parameters.
///
/// Templates use `{name}` placeholders, e.g.
/// `/enclaves/{enclave_identifier}/logs`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationKey {
    name: Cow<'static, str>,
    path_template: Cow<'static, str>,
    path_params: BTreeMap<String, String>,
}

impl OperationKey {
    /// Create an operation key with no bound path parameters.
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        path_template: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            name: name.into(),
            path_template: path_template.into(),
            path_params: BTreeMap::new(),
        }
    }

    /// Bind a path parameter
    pub fn with_path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    /// Operation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unrendered path template.
    pub fn path_template(&self) -> &str {
        &self.path_template
    }

    /// Bound path parameters.
    pub fn path_params(&self) -> &BTreeMap<String, String> {
        &self.path_params
    }

    /// Substitute every `{name}` placeholder, passing each value through `encode`.
    pub fn render_path(&self, encode: impl Fn(&str) -> String) -> StreamResult<String> {
        let template = self.path_template.as_ref();
        let mut rendered = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            rendered.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| {
                StreamError::Configuration(format!(
                    "Unterminated placeholder in path template '{template}'"
                ))
            })?;
            let name = &after[..close];
            let value = self.path_params.get(name).ok_or_else(|| {
                StreamError::Configuration(format!(
                    "Missing path parameter '{name}' for operation '{}'",
                    self.name
                ))
            })?;
            rendered.push_str(&encode(value));
            rest = &after[close + 1..];
        }
        rendered.push_str(rest);

        if !rendered.starts_with('/') {
            rendered.insert(0, '/');
        }
        Ok(rendered)
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.path_template)
    }
}

/// A single query parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Boolean, rendered as `true` / `false`.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Text.
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for Scalar {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A query parameter: one scalar or a sequence exploded into repeated keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Single value.
    Scalar(Scalar),
    /// Repeated values (`key=a&key=b`).
    Sequence(Vec<Scalar>),
}

macro_rules! impl_param_value_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ParamValue {
                fn from(value: $ty) -> Self {
                    Self::Scalar(value.into())
                }
            }

            impl From<Vec<$ty>> for ParamValue {
                fn from(values: Vec<$ty>) -> Self {
                    Self::Sequence(values.into_iter().map(Into::into).collect())
                }
            }
        )*
    };
}

impl_param_value_from!(bool, i64, i32, u32, f64, &str, String);

impl From<Scalar> for ParamValue {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<Scalar>> for ParamValue {
    fn from(values: Vec<Scalar>) -> Self {
        Self::Sequence(values)
    }
}

/// Query parameters for one request, kept in key order so resolved URLs are
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams(BTreeMap<String, ParamValue>);

impl QueryParams {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a parameter
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add a parameter only when `value` is present
    pub fn with_opt<V: Into<ParamValue>>(
        mut self,
        key: impl Into<String>,
        value: Option<V>,
    ) -> Self {
        if let Some(value) = value {
            self.insert(key, value);
        }
        self
    }

    /// Insert a parameter, replacing any previous value for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Look up a parameter.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    /// Returns `true` when no parameters are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flatten into `(key, value)` pairs, exploding sequences.
    pub fn pairs(&self) -> Vec<(&str, String)> {
        let mut pairs = Vec::with_capacity(self.0.len());
        for (key, value) in &self.0 {
            match value {
                ParamValue::Scalar(scalar) => pairs.push((key.as_str(), scalar.to_string())),
                ParamValue::Sequence(values) => {
                    pairs.extend(values.iter().map(|v| (key.as_str(), v.to_string())));
                }
            }
        }
        pairs
    }
}
