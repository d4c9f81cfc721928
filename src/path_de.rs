use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::SchemaError;

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, SchemaError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| {
        let path = err.path().to_string();
        SchemaError::Decode(format!("at JSON path {path} → {}", err.into_inner()))
    })
}

/// Same as [`from_str_with_path`] for an already-parsed document.
pub fn from_value_with_path<T: DeserializeOwned>(value: Value) -> Result<T, SchemaError> {
    serde_path_to_error::deserialize::<_, T>(value).map_err(|err| {
        let path = err.path().to_string();
        SchemaError::Decode(format!("at JSON path {path} → {}", err.into_inner()))
    })
}

/// `deserialize_with` for fields where an explicit `null` means the same as
/// a missing key. Pair it with `#[serde(default)]`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::TypeStruct;

    #[test]
    fn decode_errors_name_the_offending_path() {
        let src = r#"{"name": "Page", "fields": [{"name": "items", "type": {"typeName": "list"}}]}"#;
        let err = from_str_with_path::<TypeStruct>(src).unwrap_err().to_string();
        assert!(err.contains("fields[0]"), "{err}");
        assert!(err.contains("expects 1 type argument"), "{err}");
    }
}
