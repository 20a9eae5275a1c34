//! Field codecs for values older clients wrote loosely.
//!
//! Form inputs that were left blank were stored as `null` (an unparsed number is `NaN`, and
//! JSON encodes that as `null`). A field that cannot be read decodes to its default so the
//! rest of the record survives, and non-finite floats are written as `0`.

use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

pub fn u32_or_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(as_number)
        .map_or(0, |n| n.round().clamp(0.0, f64::from(u32::MAX)) as u32))
}

pub fn f64_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(as_number).unwrap_or(0.0))
}

/// Strings pass through, numbers are rendered, anything else is empty.
pub fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

pub fn finite_or_zero<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(if value.is_finite() { *value } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize, Serialize)]
    #[serde(default)]
    struct Reading {
        #[serde(deserialize_with = "u32_or_zero")]
        count: u32,
        #[serde(deserialize_with = "f64_or_zero", serialize_with = "finite_or_zero")]
        amount: f64,
        #[serde(deserialize_with = "string_or_empty")]
        label: String,
    }

    #[test]
    fn test_null_fields_decode_to_defaults() {
        let reading: Reading =
            serde_json::from_value(json!({"count": null, "amount": null, "label": null})).unwrap();

        assert_eq!(reading.count, 0);
        assert_eq!(reading.amount, 0.0);
        assert_eq!(reading.label, "");
    }

    #[test]
    fn test_loose_numbers_are_coerced() {
        let reading: Reading =
            serde_json::from_value(json!({"count": "72", "amount": "58.5", "label": 120})).unwrap();

        assert_eq!(reading.count, 72);
        assert_eq!(reading.amount, 58.5);
        assert_eq!(reading.label, "120");

        let reading: Reading = serde_json::from_value(json!({"count": 71.6})).unwrap();
        assert_eq!(reading.count, 72);
        let reading: Reading = serde_json::from_value(json!({"count": -3})).unwrap();
        assert_eq!(reading.count, 0);
    }

    #[test]
    fn test_non_finite_float_is_written_as_zero() {
        let reading = Reading {
            amount: f64::NAN,
            ..Reading::default()
        };
        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["amount"], 0.0);
    }
}
