//! Tabular ingestion: DataFrame rows into label records.

use std::io::Cursor;

use polars::prelude::{AnyValue, DataFrame, IpcReader, SerReader};
use tracing::debug;

use crate::spec::{EnumRecordValue, LabelError, SpecRecord};
use crate::util::validate_unique_columns;

fn derive_record_value_from_any_value(value: AnyValue<'_>) -> EnumRecordValue {
    match value {
        AnyValue::Null => EnumRecordValue::None,
        AnyValue::String(val) => EnumRecordValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumRecordValue::String(val.to_string()),
        AnyValue::Boolean(val) => {
            EnumRecordValue::String(if val { "True" } else { "False" }.to_string())
        }
        AnyValue::UInt8(val) => EnumRecordValue::Number(val as f64),
        AnyValue::UInt16(val) => EnumRecordValue::Number(val as f64),
        AnyValue::UInt32(val) => EnumRecordValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumRecordValue::Number(val as f64),
        AnyValue::Int8(val) => EnumRecordValue::Number(val as f64),
        AnyValue::Int16(val) => EnumRecordValue::Number(val as f64),
        AnyValue::Int32(val) => EnumRecordValue::Number(val as f64),
        AnyValue::Int64(val) => EnumRecordValue::Number(val as f64),
        AnyValue::Float32(val) if val.is_finite() => EnumRecordValue::Number(val as f64),
        AnyValue::Float64(val) if val.is_finite() => EnumRecordValue::Number(val),
        AnyValue::Float32(_) | AnyValue::Float64(_) => EnumRecordValue::None,
        _ => EnumRecordValue::String(value.to_string()),
    }
}

/// Convert every DataFrame row into a record keyed by column name.
///
/// Nulls and non-finite floats become [`EnumRecordValue::None`].
pub fn derive_records_from_dataframe(df: &DataFrame) -> Result<Vec<SpecRecord>, LabelError> {
    let l_colnames: Vec<String> = df
        .get_column_names_str()
        .into_iter()
        .map(ToString::to_string)
        .collect();
    validate_unique_columns(&l_colnames).map_err(LabelError::Ingest)?;

    let l_cols = df.get_columns();
    let mut l_records = Vec::with_capacity(df.height());
    for idx_row in 0..df.height() {
        let mut record = SpecRecord::default();
        for (c_name, col) in l_colnames.iter().zip(l_cols) {
            let value = col.get(idx_row).map_err(|err| {
                LabelError::Ingest(format!("Failed to read {c_name:?} at row {idx_row}: {err}"))
            })?;
            record
                .dict_fields
                .insert(c_name.clone(), derive_record_value_from_any_value(value));
        }
        l_records.push(record);
    }
    debug!(
        n_rows = l_records.len(),
        n_cols = l_colnames.len(),
        "records ingested"
    );
    Ok(l_records)
}

/// Decode Arrow IPC bytes and convert every row into a record.
pub fn derive_records_from_ipc_bytes(v_ipc_df: &[u8]) -> Result<Vec<SpecRecord>, LabelError> {
    let df = IpcReader::new(Cursor::new(v_ipc_df))
        .finish()
        .map_err(|err| LabelError::Ingest(format!("Failed to read IPC DataFrame bytes: {err}")))?;
    derive_records_from_dataframe(&df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{IpcWriter, NamedFrom, SerWriter, Series};

    fn derive_dataframe() -> DataFrame {
        DataFrame::new(vec![
            Series::new(
                "Product Name*".into(),
                &[Some("Blue Dream Flower"), None],
            )
            .into(),
            Series::new("Price".into(), &[25.0_f64, f64::NAN]).into(),
            Series::new("Weight*".into(), &[3_i64, 1]).into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_derive_records_from_dataframe_maps_values() {
        let l_records = derive_records_from_dataframe(&derive_dataframe()).unwrap();
        assert_eq!(l_records.len(), 2);
        assert_eq!(
            l_records[0].dict_fields["Product Name*"],
            EnumRecordValue::String("Blue Dream Flower".to_string())
        );
        assert_eq!(
            l_records[0].dict_fields["Price"],
            EnumRecordValue::Number(25.0)
        );
        assert_eq!(l_records[1].dict_fields["Product Name*"], EnumRecordValue::None);
        assert_eq!(l_records[1].dict_fields["Price"], EnumRecordValue::None);
        assert_eq!(
            l_records[1].dict_fields["Weight*"],
            EnumRecordValue::Number(1.0)
        );
    }

    #[test]
    fn test_derive_records_from_ipc_bytes_roundtrips_dataframe() {
        let mut df = derive_dataframe();
        let mut v_bytes = Vec::new();
        IpcWriter::new(&mut v_bytes).finish(&mut df).unwrap();

        let l_records = derive_records_from_ipc_bytes(&v_bytes).unwrap();
        assert_eq!(l_records.len(), 2);
        assert_eq!(
            l_records[0].dict_fields["Weight*"],
            EnumRecordValue::Number(3.0)
        );
    }

    #[test]
    fn test_derive_records_from_ipc_bytes_rejects_garbage() {
        assert!(matches!(
            derive_records_from_ipc_bytes(b"nope"),
            Err(LabelError::Ingest(_))
        ));
    }
}
