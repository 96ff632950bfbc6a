use std::str::FromStr;

use crate::{
    error::FilterError, filter::kernels, narrow::Narrowing, parallel::ExecutionStrategy,
};

/// Name of the parallel-dispatch toggle. Nonzero enables row-parallel execution.
pub const OPEN_MP: &str = "openMP";

/// Name of the kernel radius parameter.
pub const RADIUS: &str = "radius";

/// Name of the threshold fraction parameter.
pub const THRESHOLD: &str = "threshold";

/// Name of the narrowing toggle. Nonzero switches to saturating narrowing.
pub const SATURATE: &str = "saturate";

/// Default threshold fraction.
pub const DEFAULT_THRESHOLD: f64 = 0.75;

/// A named numeric parameter.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Parameter {
    /// The parameter name, e.g. `radius`.
    pub key: String,
    /// The parameter value.
    pub value: f64,
}

impl Parameter {
    /// Create a new parameter.
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

impl FromStr for Parameter {
    type Err = FilterError;

    /// Parse a `key=value` pair.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| FilterError::InvalidParameter(s.to_string()))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(FilterError::InvalidParameter(s.to_string()));
        }
        let value = value
            .trim()
            .parse::<f64>()
            .map_err(|_| FilterError::InvalidParameter(s.to_string()))?;
        Ok(Parameter::new(key, value))
    }
}

/// An ordered list of named parameters, read-only for one filter invocation.
///
/// Lookup returns the first parameter whose name matches exactly, or the
/// caller's default when none does.
///
/// # Examples
///
/// ```
/// use bgrafx_imgproc::params::ParameterSet;
///
/// let params = ParameterSet::new()
///     .with("radius", 3.0)
///     .with("radius", 5.0);
///
/// assert_eq!(params.get("radius", 2.0), 3.0);
/// assert_eq!(params.get("threshold", 0.75), 0.75);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ParameterSet(Vec<Parameter>);

impl ParameterSet {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter and return the set.
    pub fn with(mut self, key: impl Into<String>, value: f64) -> Self {
        self.push(Parameter::new(key, value));
        self
    }

    /// Append a parameter.
    pub fn push(&mut self, param: Parameter) {
        self.0.push(param);
    }

    /// Look up `name`, falling back to `default`.
    pub fn get(&self, name: &str, default: f64) -> f64 {
        self.0
            .iter()
            .find(|p| p.key == name)
            .map_or(default, |p| p.value)
    }

    /// The number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set holds no parameter.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the parameters in order.
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.0.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| Parameter::new(k, v)).collect())
    }
}

impl FromIterator<Parameter> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = Parameter>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Parameter> for ParameterSet {
    fn extend<I: IntoIterator<Item = Parameter>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

/// The typed parameters of one filter invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    /// How rows are dispatched.
    pub execution: ExecutionStrategy,
    /// Kernel radius, for the filters that take one.
    pub radius: usize,
    /// Threshold fraction of 255.
    pub threshold: f64,
    /// How accumulators are narrowed to bytes.
    pub narrowing: Narrowing,
}

impl FilterParams {
    /// Resolve the typed parameters from a set, with `default_radius` as the
    /// fallback radius of the calling filter.
    ///
    /// The radius is truncated toward zero.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidRadius`] for a negative or non-finite
    /// radius, and for one whose kernel side `2 * radius + 1` overflows.
    pub fn resolve(params: &ParameterSet, default_radius: usize) -> Result<Self, FilterError> {
        let value = params.get(RADIUS, default_radius as f64);
        let radius = (value.is_finite() && value >= 0.0)
            .then(|| value.trunc() as usize)
            .filter(|&radius| kernels::kernel_size(radius).is_ok());
        let Some(radius) = radius else {
            log::warn!("rejecting radius parameter {value}");
            return Err(FilterError::InvalidRadius(value));
        };

        Ok(Self {
            execution: ExecutionStrategy::from_flag(params.get(OPEN_MP, 1.0) != 0.0),
            radius,
            threshold: params.get(THRESHOLD, DEFAULT_THRESHOLD),
            narrowing: Narrowing::from_flag(params.get(SATURATE, 0.0) != 0.0),
        })
    }
}
