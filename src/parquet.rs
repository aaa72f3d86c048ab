//! Parquet output format support.

use crate::compute::{EventRow, Report};
use crate::config::Parameters;
use crate::types::{DayRecord, Location};
use arrow::array::{
    ArrayRef, Date32Builder, Float64Builder, StringBuilder, TimestampMillisecondBuilder,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::io::Write;
use std::sync::Arc;

const SECONDS_PER_DAY: i64 = 86_400;

pub fn write_parquet<W: Write + Send>(
    report: &Report,
    params: &Parameters,
    writer: W,
) -> std::io::Result<usize> {
    let show_inputs = params.output.show_inputs;
    let (schema, columns) = match report {
        Report::Series(_) | Report::Day { .. } => {
            let schema = build_series_schema(show_inputs);
            let columns =
                series_columns(report.location(), report.day_records(), show_inputs);
            (schema, columns)
        }
        Report::Events { location, rows } => {
            let schema = build_events_schema(show_inputs);
            (schema, events_columns(location, rows, show_inputs))
        }
    };

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut parquet_writer = ArrowWriter::try_new(writer, schema.clone(), Some(props))
        .map_err(|e| std::io::Error::other(format!("Parquet writer error: {}", e)))?;

    let batch = RecordBatch::try_new(schema, columns)
        .map_err(|e| std::io::Error::other(format!("Failed to create batch: {}", e)))?;
    parquet_writer
        .write(&batch)
        .map_err(|e| std::io::Error::other(format!("Failed to write batch: {}", e)))?;
    parquet_writer
        .close()
        .map_err(|e| std::io::Error::other(format!("Failed to close parquet: {}", e)))?;

    Ok(report.len())
}

fn days_since_epoch(date: NaiveDate) -> i32 {
    date.and_time(NaiveTime::MIN)
        .and_utc()
        .timestamp()
        .div_euclid(SECONDS_PER_DAY) as i32
}

fn input_columns(location: &Location, rows: usize) -> Vec<ArrayRef> {
    let mut lat_builder = Float64Builder::with_capacity(rows);
    let mut lon_builder = Float64Builder::with_capacity(rows);
    for _ in 0..rows {
        lat_builder.append_value(location.latitude);
        lon_builder.append_value(location.longitude);
    }
    vec![
        Arc::new(lat_builder.finish()) as ArrayRef,
        Arc::new(lon_builder.finish()) as ArrayRef,
    ]
}

fn input_fields() -> Vec<Field> {
    vec![
        Field::new("latitude", DataType::Float64, false),
        Field::new("longitude", DataType::Float64, false),
    ]
}

fn build_series_schema(show_inputs: bool) -> Arc<Schema> {
    let mut fields = if show_inputs { input_fields() } else { Vec::new() };
    fields.push(Field::new("date", DataType::Date32, false));
    fields.push(Field::new("type", DataType::Utf8, false));
    fields.push(Field::new("sunrise", DataType::Float64, true));
    fields.push(Field::new("sunset", DataType::Float64, true));
    fields.push(Field::new("dayLength", DataType::Float64, false));
    Arc::new(Schema::new(fields))
}

fn series_columns(location: &Location, records: &[DayRecord], show_inputs: bool) -> Vec<ArrayRef> {
    let mut date_builder = Date32Builder::with_capacity(records.len());
    let mut type_builder = StringBuilder::with_capacity(records.len(), records.len() * 10);
    let mut sunrise_builder = Float64Builder::with_capacity(records.len());
    let mut sunset_builder = Float64Builder::with_capacity(records.len());
    let mut length_builder = Float64Builder::with_capacity(records.len());

    for record in records {
        date_builder.append_value(days_since_epoch(record.date));
        type_builder.append_value(record.kind.label());
        sunrise_builder.append_option(record.sunrise_local_hour);
        sunset_builder.append_option(record.sunset_local_hour);
        length_builder.append_value(record.day_length_hours);
    }

    let mut columns = if show_inputs {
        input_columns(location, records.len())
    } else {
        Vec::new()
    };
    columns.push(Arc::new(date_builder.finish()) as ArrayRef);
    columns.push(Arc::new(type_builder.finish()) as ArrayRef);
    columns.push(Arc::new(sunrise_builder.finish()) as ArrayRef);
    columns.push(Arc::new(sunset_builder.finish()) as ArrayRef);
    columns.push(Arc::new(length_builder.finish()) as ArrayRef);
    columns
}

fn build_events_schema(show_inputs: bool) -> Arc<Schema> {
    let timestamp = |name: &str, nullable: bool| {
        Field::new(
            name,
            DataType::Timestamp(TimeUnit::Millisecond, None),
            nullable,
        )
    };
    let mut fields = if show_inputs { input_fields() } else { Vec::new() };
    fields.push(Field::new("date", DataType::Date32, false));
    fields.push(Field::new("type", DataType::Utf8, false));
    fields.push(timestamp("sunrise", true));
    fields.push(timestamp("transit", false));
    fields.push(timestamp("sunset", true));
    Arc::new(Schema::new(fields))
}

fn events_columns(location: &Location, rows: &[EventRow], show_inputs: bool) -> Vec<ArrayRef> {
    let millis = |instant: Option<&DateTime<Utc>>| instant.map(DateTime::timestamp_millis);

    let mut date_builder = Date32Builder::with_capacity(rows.len());
    let mut type_builder = StringBuilder::with_capacity(rows.len(), rows.len() * 10);
    let mut sunrise_builder = TimestampMillisecondBuilder::with_capacity(rows.len());
    let mut transit_builder = TimestampMillisecondBuilder::with_capacity(rows.len());
    let mut sunset_builder = TimestampMillisecondBuilder::with_capacity(rows.len());

    for row in rows {
        let event = &row.event;
        date_builder.append_value(days_since_epoch(event.date));
        type_builder.append_value(row.kind.label());
        sunrise_builder.append_option(millis(event.sunrise_utc.as_ref()));
        transit_builder.append_value(event.transit_utc.timestamp_millis());
        sunset_builder.append_option(millis(event.sunset_utc.as_ref()));
    }

    let mut columns = if show_inputs {
        input_columns(location, rows.len())
    } else {
        Vec::new()
    };
    columns.push(Arc::new(date_builder.finish()) as ArrayRef);
    columns.push(Arc::new(type_builder.finish()) as ArrayRef);
    columns.push(Arc::new(sunrise_builder.finish()) as ArrayRef);
    columns.push(Arc::new(transit_builder.finish()) as ArrayRef);
    columns.push(Arc::new(sunset_builder.finish()) as ArrayRef);
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_since_epoch() {
        assert_eq!(days_since_epoch(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()), 0);
        assert_eq!(days_since_epoch(NaiveDate::from_ymd_opt(1969, 12, 31).unwrap()), -1);
        assert_eq!(days_since_epoch(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()), 19_723);
    }

    #[test]
    fn test_schemas() {
        let names = |schema: Arc<Schema>| -> Vec<String> {
            schema.fields().iter().map(|f| f.name().clone()).collect()
        };
        assert_eq!(
            names(build_series_schema(false)),
            ["date", "type", "sunrise", "sunset", "dayLength"]
        );
        assert_eq!(
            names(build_events_schema(true)),
            ["latitude", "longitude", "date", "type", "sunrise", "transit", "sunset"]
        );
    }
}
