//! Small accessors over [`rmpv::Value`] maps shared by the payload and envelope codecs.
//!
//! MessagePack maps decode to a `Vec<(Value, Value)>` in wire order; the
//! protocol only ever uses string keys, so lookups are a linear scan comparing
//! string keys.  Maps here have at most six entries.

use rmpv::Value;

use crate::protocol::codec::ProtocolError;

/// Returns the value stored under the string key `key`, if any.
pub(crate) fn map_get<'a>(map: &'a [(Value, Value)], key: &str) -> Option<&'a Value> {
    map.iter()
        .find(|(k, _)| k.as_str() == Some(key))
        .map(|(_, v)| v)
}

/// Builds a map value from string keys, preserving insertion order.
pub(crate) fn string_map<I>(entries: I) -> Value
where
    I: IntoIterator<Item = (&'static str, Value)>,
{
    Value::Map(
        entries
            .into_iter()
            .map(|(k, v)| (Value::from(k), v))
            .collect(),
    )
}

/// Reads a required integer field.
///
/// # Errors
///
/// [`ProtocolError::MissingField`] if absent, [`ProtocolError::InvalidField`]
/// if present but not an integer that fits in `i64`.
pub(crate) fn require_i64(map: &[(Value, Value)], key: &'static str) -> Result<i64, ProtocolError> {
    let value = map_get(map, key).ok_or(ProtocolError::MissingField(key))?;
    value.as_i64().ok_or(ProtocolError::InvalidField {
        field: key,
        expected: "integer",
    })
}

/// Reads a required string field.
pub(crate) fn require_str<'a>(
    map: &'a [(Value, Value)],
    key: &'static str,
) -> Result<&'a str, ProtocolError> {
    let value = map_get(map, key).ok_or(ProtocolError::MissingField(key))?;
    value.as_str().ok_or(ProtocolError::InvalidField {
        field: key,
        expected: "string",
    })
}

/// Converts an array of strings; `None` if the value is not an array or any
/// element is not a string.
pub(crate) fn as_string_vec(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_owned))
        .collect()
}

/// Encodes a slice of strings as a MessagePack array.
pub(crate) fn string_vec_value<S: AsRef<str>>(items: &[S]) -> Value {
    Value::Array(items.iter().map(|s| Value::from(s.as_ref())).collect())
}
