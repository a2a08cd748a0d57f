//! SQLite conversions for incident column types.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

use crate::types::{IncidentSeverity, IncidentStatus, Metadata};

impl ToSql for IncidentStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for IncidentStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for IncidentSeverity {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for IncidentSeverity {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// Decode the `metadata` JSON column. NULL decodes to an empty document.
pub(crate) fn metadata_from_sql(column: usize, raw: Option<String>) -> rusqlite::Result<Metadata> {
    match raw {
        None => Ok(Metadata::new()),
        Some(text) => serde_json::from_str(&text).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
        }),
    }
}

/// Encode a metadata document for the `metadata` JSON column.
pub(crate) fn metadata_to_sql(metadata: &Metadata) -> crate::Result<String> {
    Ok(serde_json::to_string(metadata)?)
}
