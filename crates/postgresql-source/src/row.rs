//! Conversion from PostgreSQL rows to [`RawRecord`]s.

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sync_core::{RawRecord, RawValue};
use tokio_postgres::types::Type;
use tokio_postgres::Row;
use tracing::warn;

/// Convert one row of the extraction query into a [`RawRecord`].
///
/// Absent or NULL columns become [`RawValue::Null`]; only `modified` is
/// required, since it drives the cursor.
pub fn row_to_raw_record(row: &Row) -> Result<RawRecord> {
    let column = |name: &str| -> Result<RawValue> {
        match row.columns().iter().position(|c| c.name() == name) {
            Some(index) => convert_postgres_value(row, index),
            None => Ok(RawValue::Null),
        }
    };

    Ok(RawRecord {
        id: column("id")?,
        title: column("title")?,
        description: column("description")?,
        rating: column("imdb_rating")?,
        modified: modified_timestamp(row)?,
        genres: column("genres")?,
        actors: column("actors")?,
        writers: column("writers")?,
        directors: column("directors")?,
    })
}

fn modified_timestamp(row: &Row) -> Result<DateTime<Utc>> {
    let index = row
        .columns()
        .iter()
        .position(|c| c.name() == "modified")
        .ok_or_else(|| anyhow!("Extraction row has no 'modified' column"))?;

    let timestamp = match *row.columns()[index].type_() {
        Type::TIMESTAMPTZ => row.try_get::<_, Option<DateTime<Utc>>>(index)?,
        Type::TIMESTAMP => row
            .try_get::<_, Option<NaiveDateTime>>(index)?
            .map(|naive| naive.and_utc()),
        ref other => return Err(anyhow!("Unsupported type for 'modified' column: {other}")),
    };

    timestamp.ok_or_else(|| anyhow!("Extraction row has NULL 'modified' value"))
}

/// Convert a PostgreSQL value to a [`RawValue`]
fn convert_postgres_value(row: &Row, index: usize) -> Result<RawValue> {
    let column = &row.columns()[index];
    let pg_type = column.type_();

    let value = match *pg_type {
        Type::BOOL => row.try_get::<_, Option<bool>>(index)?.map(RawValue::Bool),
        Type::INT2 => row
            .try_get::<_, Option<i16>>(index)?
            .map(|i| RawValue::Int(i64::from(i))),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(index)?
            .map(|i| RawValue::Int(i64::from(i))),
        Type::INT8 => row.try_get::<_, Option<i64>>(index)?.map(RawValue::Int),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(index)?
            .map(|f| RawValue::Float(f64::from(f))),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(index)?.map(RawValue::Float),
        Type::NUMERIC => row
            .try_get::<_, Option<Decimal>>(index)?
            .map(numeric_value),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
            row.try_get::<_, Option<String>>(index)?.map(RawValue::Text)
        }
        Type::UUID => row.try_get::<_, Option<uuid::Uuid>>(index)?.map(RawValue::Uuid),
        Type::TEXT_ARRAY | Type::VARCHAR_ARRAY | Type::BPCHAR_ARRAY | Type::NAME_ARRAY => row
            .try_get::<_, Option<Vec<Option<String>>>>(index)?
            .map(|items| RawValue::Array(items.into_iter().map(RawValue::from).collect())),
        Type::UUID_ARRAY => row
            .try_get::<_, Option<Vec<Option<uuid::Uuid>>>>(index)?
            .map(|items| RawValue::Array(items.into_iter().map(RawValue::from).collect())),
        ref other => {
            warn!(
                "Unsupported PostgreSQL type {} for column '{}', reading as NULL",
                other,
                column.name()
            );
            None
        }
    };

    Ok(value.unwrap_or(RawValue::Null))
}

/// NUMERIC as a float; values outside `f64` range fall back to their text form.
fn numeric_value(value: Decimal) -> RawValue {
    match value.to_f64() {
        Some(f) if f.is_finite() => RawValue::Float(f),
        _ => RawValue::Text(value.to_string()),
    }
}
