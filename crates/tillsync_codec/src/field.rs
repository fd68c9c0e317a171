//! Typed access to wire record fields.

use crate::decimal::{Money, Rate};
use crate::error::{CodecError, CodecResult};
use crate::time::{format_date, format_datetime, parse_date, parse_datetime};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A record on the wire: a flat JSON object of column name to value.
pub type WireRecord = Map<String, Value>;

/// A value that can be written to and read from a wire record field.
pub trait WireField: Sized {
    /// Encodes the value.
    fn to_wire(&self) -> Value;

    /// Decodes the value.
    fn from_wire(value: &Value) -> CodecResult<Self>;
}

fn expected(what: &str, got: &Value) -> CodecError {
    CodecError::invalid_value(format!("expected {what}, got {got}"))
}

impl WireField for String {
    fn to_wire(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_wire(value: &Value) -> CodecResult<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(expected("text", other)),
        }
    }
}

impl WireField for bool {
    fn to_wire(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_wire(value: &Value) -> CodecResult<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            // SQLite-backed peers send booleans as 0/1
            Value::Number(n) if n.as_i64() == Some(0) => Ok(false),
            Value::Number(n) if n.as_i64() == Some(1) => Ok(true),
            other => Err(expected("boolean", other)),
        }
    }
}

impl WireField for i64 {
    fn to_wire(&self) -> Value {
        Value::from(*self)
    }

    fn from_wire(value: &Value) -> CodecResult<Self> {
        match value {
            Value::Number(n) => n.as_i64().ok_or_else(|| expected("integer", value)),
            Value::String(s) => s.trim().parse().map_err(|_| expected("integer", value)),
            other => Err(expected("integer", other)),
        }
    }
}

impl WireField for i32 {
    fn to_wire(&self) -> Value {
        Value::from(*self)
    }

    fn from_wire(value: &Value) -> CodecResult<Self> {
        let wide = i64::from_wire(value)?;
        i32::try_from(wide).map_err(|_| expected("32-bit integer", value))
    }
}

impl WireField for Uuid {
    fn to_wire(&self) -> Value {
        Value::String(self.to_string())
    }

    fn from_wire(value: &Value) -> CodecResult<Self> {
        match value {
            Value::String(s) => Uuid::parse_str(s.trim()).map_err(|_| expected("UUID", value)),
            other => Err(expected("UUID", other)),
        }
    }
}

impl WireField for DateTime<Utc> {
    fn to_wire(&self) -> Value {
        Value::String(format_datetime(self))
    }

    fn from_wire(value: &Value) -> CodecResult<Self> {
        match value {
            Value::String(s) => parse_datetime(s),
            other => Err(expected("timestamp", other)),
        }
    }
}

impl WireField for NaiveDate {
    fn to_wire(&self) -> Value {
        Value::String(format_date(self))
    }

    fn from_wire(value: &Value) -> CodecResult<Self> {
        match value {
            Value::String(s) => parse_date(s),
            other => Err(expected("date", other)),
        }
    }
}

impl WireField for Money {
    fn to_wire(&self) -> Value {
        Money::to_wire(self)
    }

    fn from_wire(value: &Value) -> CodecResult<Self> {
        Money::from_wire(value)
    }
}

impl WireField for Rate {
    fn to_wire(&self) -> Value {
        Rate::to_wire(self)
    }

    fn from_wire(value: &Value) -> CodecResult<Self> {
        Rate::from_wire(value)
    }
}

impl<T: WireField> WireField for Option<T> {
    fn to_wire(&self) -> Value {
        match self {
            Some(v) => v.to_wire(),
            None => Value::Null,
        }
    }

    fn from_wire(value: &Value) -> CodecResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_wire(other).map(Some),
        }
    }
}

/// Writes a field into a record.
pub fn put<T: WireField>(record: &mut WireRecord, key: &str, value: &T) {
    record.insert(key.to_string(), value.to_wire());
}

/// Overwrites `target` with the record's field, if the field is present.
///
/// Absent keys leave `target` untouched; present keys must decode.
pub fn take<T: WireField>(record: &WireRecord, key: &str, target: &mut T) -> CodecResult<()> {
    if let Some(value) = record.get(key) {
        *target = T::from_wire(value).map_err(|e| e.in_field(key))?;
    }
    Ok(())
}

/// Reads an optional field; absent and `null` both yield `None`.
pub fn get<T: WireField>(record: &WireRecord, key: &str) -> CodecResult<Option<T>> {
    match record.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => T::from_wire(value).map(Some).map_err(|e| e.in_field(key)),
    }
}

/// Reads a required field.
pub fn require<T: WireField>(record: &WireRecord, key: &str) -> CodecResult<T> {
    get(record, key)?.ok_or_else(|| CodecError::missing_field(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> WireRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn take_only_touches_present_keys() {
        let rec = record(json!({"name": "Drinks"}));
        let mut name = String::from("old");
        let mut notes: Option<String> = Some("kept".into());

        take(&rec, "name", &mut name).unwrap();
        take(&rec, "notes", &mut notes).unwrap();

        assert_eq!(name, "Drinks");
        assert_eq!(notes.as_deref(), Some("kept"));
    }

    #[test]
    fn null_clears_optional_fields() {
        let rec = record(json!({"notes": null}));
        let mut notes: Option<String> = Some("old".into());
        take(&rec, "notes", &mut notes).unwrap();
        assert!(notes.is_none());
    }

    #[test]
    fn null_into_required_field_fails_with_context() {
        let rec = record(json!({"quantity": null}));
        let mut quantity = 3i32;
        let err = take(&rec, "quantity", &mut quantity).unwrap_err();
        assert!(matches!(err, CodecError::InvalidField { ref field, .. } if field == "quantity"));
        assert_eq!(quantity, 3);
    }

    #[test]
    fn lenient_scalars() {
        assert!(bool::from_wire(&json!(1)).unwrap());
        assert!(!bool::from_wire(&json!(0)).unwrap());
        assert!(bool::from_wire(&json!(2)).is_err());
        assert_eq!(i64::from_wire(&json!("42")).unwrap(), 42);
        assert!(i32::from_wire(&json!(i64::MAX)).is_err());
    }

    #[test]
    fn require_reports_missing() {
        let rec = record(json!({}));
        let err = require::<Uuid>(&rec, "external_id").unwrap_err();
        assert_eq!(err, CodecError::missing_field("external_id"));
    }

    #[test]
    fn uuid_round_trip() {
        let id = Uuid::new_v4();
        let mut rec = WireRecord::new();
        put(&mut rec, "external_id", &id);
        assert_eq!(require::<Uuid>(&rec, "external_id").unwrap(), id);
    }
}
