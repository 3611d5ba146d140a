//! Motorized delay line control.

use crate::connector::HarpiaConnector;
use crate::error::HarpiaResult;
use serde_json::Value;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use tracing::info;

const TARGET_DELAY: &str = "DelayLine/TargetDelay";

/// A delay value as understood by the instrument.
///
/// Forwarded verbatim; no unit conversion or range check happens locally.
#[derive(Debug, Clone, PartialEq)]
pub enum DelayValue {
    /// Numeric delay.
    Number(serde_json::Number),
    /// Delay in the instrument's textual form.
    Text(String),
}

impl DelayValue {
    /// JSON form used as a request body.
    pub fn to_json(&self) -> Value {
        match self {
            DelayValue::Number(n) => Value::Number(n.clone()),
            DelayValue::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for DelayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DelayValue::Number(n) => write!(f, "{n}"),
            DelayValue::Text(s) => f.write_str(s),
        }
    }
}

macro_rules! delay_from_integer {
    ($($t:ty),*) => {
        $(impl From<$t> for DelayValue {
            fn from(value: $t) -> Self {
                DelayValue::Number(value.into())
            }
        })*
    };
}

delay_from_integer!(i32, i64, u32, u64);

impl From<f64> for DelayValue {
    /// Non-finite values have no JSON number form and are forwarded as text.
    fn from(value: f64) -> Self {
        match serde_json::Number::from_f64(value) {
            Some(n) => DelayValue::Number(n),
            None => DelayValue::Text(value.to_string()),
        }
    }
}

impl From<&str> for DelayValue {
    fn from(value: &str) -> Self {
        DelayValue::Text(value.to_string())
    }
}

impl From<String> for DelayValue {
    fn from(value: String) -> Self {
        DelayValue::Text(value)
    }
}

impl FromStr for DelayValue {
    type Err = Infallible;

    /// Numeric text becomes a number; anything else is kept as text.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(n) = s.parse::<i64>() {
            return Ok(n.into());
        }
        match s.parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(f.into()),
            _ => Ok(DelayValue::Text(s.to_string())),
        }
    }
}

/// Delay line controller.
#[derive(Debug, Clone)]
pub struct DelayLine {
    connector: HarpiaConnector,
}

impl DelayLine {
    /// Create a controller over `connector`.
    pub fn new(connector: HarpiaConnector) -> Self {
        Self { connector }
    }

    /// Move the delay line to `delay`.
    pub fn set(&self, delay: impl Into<DelayValue>) -> HarpiaResult<()> {
        let delay = delay.into();
        self.connector
            .put(TARGET_DELAY, &delay.to_json(), Some("Failed to set delay"))?;
        info!(%delay, "Delay line target set");
        Ok(())
    }
}
