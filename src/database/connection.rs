use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

use crate::shared::error::StorageError;

/// Opens a capture database read-only.
pub fn open_database(path: &Path) -> Result<Connection, StorageError> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|source| StorageError::Open {
        path: path.display().to_string(),
        source,
    })?;
    log::debug!("Opened database {}", path.display());
    Ok(conn)
}

/// Table names are spliced into SQL text, so only plain identifiers pass.
pub fn checked_identifier(name: &str) -> Result<&str, StorageError> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(name)
    } else {
        Err(StorageError::InvalidTable(name.to_string()))
    }
}

pub(crate) fn query_error(table: &str) -> impl FnOnce(rusqlite::Error) -> StorageError + '_ {
    move |source| StorageError::Query {
        table: table.to_string(),
        source,
    }
}

/// Text content of a cell; anything that is not TEXT reads as missing.
pub fn text_value(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
}

/// Cell value as JSON, keeping SQLite's dynamic type.
pub fn json_value(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => serde_json::Value::Null,
        ValueRef::Integer(v) => serde_json::Value::from(v),
        ValueRef::Real(v) => serde_json::Number::from_f64(v)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(bytes) => serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_checked() {
        assert!(checked_identifier("hl2_rgb").is_ok());
        assert!(checked_identifier("_t2").is_ok());
        assert!(checked_identifier("2rgb").is_err());
        assert!(checked_identifier("rgb; DROP TABLE x").is_err());
        assert!(checked_identifier("").is_err());
    }

    #[test]
    fn cell_values_convert_to_json() {
        assert_eq!(json_value(ValueRef::Integer(3)), serde_json::json!(3));
        assert_eq!(json_value(ValueRef::Text(b"step 1")), serde_json::json!("step 1"));
        assert_eq!(json_value(ValueRef::Null), serde_json::Value::Null);
        assert_eq!(text_value(ValueRef::Integer(3)), None);
    }

    #[test]
    fn missing_database_is_an_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_database(&dir.path().join("nope.sqlite")).unwrap_err();
        assert!(matches!(err, StorageError::Open { .. }));
    }
}
