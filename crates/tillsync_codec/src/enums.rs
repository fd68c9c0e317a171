//! Wire codec for closed enumerations.

use crate::error::{CodecError, CodecResult};
use serde_json::Value;

/// An enumeration with a fixed set of canonical wire strings.
///
/// Decoding never coerces: anything outside [`WireEnum::VARIANTS`] is an
/// [`CodecError::UnknownEnumValue`]. Matching ignores ASCII case because
/// older Edge builds wrote enum names in upper case.
pub trait WireEnum: Sized + Copy + 'static {
    /// Name used in error messages.
    const TYPE_NAME: &'static str;

    /// Every value of the enumeration.
    const VARIANTS: &'static [Self];

    /// Canonical wire string of this value.
    fn as_wire(&self) -> &'static str;

    /// Parses a wire string.
    fn from_wire(text: &str) -> CodecResult<Self> {
        let text = text.trim();
        Self::VARIANTS
            .iter()
            .copied()
            .find(|v| v.as_wire().eq_ignore_ascii_case(text))
            .ok_or_else(|| CodecError::unknown_enum(Self::TYPE_NAME, text))
    }
}

/// Encodes an enum value as a JSON string.
pub fn enum_to_wire<E: WireEnum>(value: &E) -> Value {
    Value::String(value.as_wire().to_string())
}

/// Decodes an enum value from a JSON string.
pub fn enum_from_wire<E: WireEnum>(value: &Value) -> CodecResult<E> {
    match value {
        Value::String(s) => E::from_wire(s),
        other => Err(CodecError::invalid_value(format!(
            "expected {} string, got {other}",
            E::TYPE_NAME
        ))),
    }
}
