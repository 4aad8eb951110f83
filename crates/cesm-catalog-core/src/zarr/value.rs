//! Scalar element values read from numeric arrays.

use std::fmt;

use serde_json::Value;

/// One element of a numeric array, widened to 64 bits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericValue {
    /// Floating point element.
    Float(f64),
    /// Signed integer element.
    Int(i64),
    /// Unsigned integer element.
    UInt(u64),
}

impl NumericValue {
    /// The value as `f64` (lossy for very large integers).
    pub fn as_f64(self) -> f64 {
        match self {
            NumericValue::Float(v) => v,
            NumericValue::Int(v) => v as f64,
            NumericValue::UInt(v) => v as f64,
        }
    }

    /// Interpret the JSON form of an element.
    ///
    /// Integers keep their signedness. Non-finite floats arrive as the
    /// strings `"NaN"`, `"Infinity"` and `"-Infinity"`.
    pub fn from_json(value: &Value) -> Option<NumericValue> {
        match value {
            Value::Number(n) => n
                .as_u64()
                .map(NumericValue::UInt)
                .or_else(|| n.as_i64().map(NumericValue::Int))
                .or_else(|| n.as_f64().map(NumericValue::Float)),
            Value::String(s) => s.parse::<f64>().ok().map(NumericValue::Float),
            _ => None,
        }
    }
}

impl fmt::Display for NumericValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // `{:?}` keeps a trailing `.0` on integral floats.
            NumericValue::Float(v) => write!(f, "{v:?}"),
            NumericValue::Int(v) => write!(f, "{v}"),
            NumericValue::UInt(v) => write!(f, "{v}"),
        }
    }
}
