//! Output formatting for CSV, JSON, and text table formats.

use crate::compute::{EventRow, Report};
use crate::config::{OutputFormat, Parameters};
use crate::error::OutputError;
use crate::series::AnnualSeries;
use crate::solar::Horizon;
use crate::types::{DayRecord, Location, format_duration, format_hour};
use chrono::{DateTime, Utc};
use std::io::Write;
use unicode_width::UnicodeWidthStr;

const MISSING: &str = "--";

/// Writes the report in the configured format and returns the number of rows.
pub fn dispatch_output(report: &Report, params: &Parameters) -> Result<usize, OutputError> {
    #[cfg(feature = "parquet")]
    if params.output.format == OutputFormat::Parquet {
        return crate::parquet::write_parquet(report, params, std::io::stdout())
            .map_err(OutputError::from);
    }

    let stdout = std::io::stdout();
    let mut writer = std::io::BufWriter::new(stdout.lock());
    let count = write_report(report, params, &mut writer)?;
    writer.flush()?;
    Ok(count)
}

/// Writes the report as text, CSV or JSON lines.
pub fn write_report<W: Write>(
    report: &Report,
    params: &Parameters,
    writer: &mut W,
) -> Result<usize, OutputError> {
    let show_inputs = params.output.show_inputs;
    let headers = params.output.headers;

    let lines: Vec<String> = match (report, params.output.format) {
        (Report::Series(series), OutputFormat::Text) => format_text_series(series),
        (
            Report::Day {
                location,
                rule_name,
                horizon,
                record,
            },
            OutputFormat::Text,
        ) => format_text_day(location, rule_name, *horizon, record),
        (Report::Series(_) | Report::Day { .. }, OutputFormat::Csv) => format_csv_series(
            report.location(),
            report.day_records(),
            show_inputs,
            headers,
        ),
        (Report::Series(_) | Report::Day { .. }, OutputFormat::Json) => report
            .day_records()
            .iter()
            .map(|record| format_json_record(report.location(), record, show_inputs))
            .collect(),
        (Report::Events { location, rows }, OutputFormat::Text) => {
            format_text_events(location, rows)
        }
        (Report::Events { location, rows }, OutputFormat::Csv) => {
            format_csv_events(location, rows, show_inputs, headers)
        }
        (Report::Events { location, rows }, OutputFormat::Json) => rows
            .iter()
            .map(|row| format_json_event(location, row, show_inputs))
            .collect(),
        #[cfg(feature = "parquet")]
        (_, OutputFormat::Parquet) => {
            return Err(OutputError::from("Parquet output needs a binary writer"));
        }
    };

    for line in &lines {
        writer.write_all(line.as_bytes())?;
    }
    Ok(report.len())
}

fn format_fraction(value: Option<f64>) -> String {
    value.map(|v| format!("{:.4}", v)).unwrap_or_default()
}

fn format_instant(instant: Option<&DateTime<Utc>>) -> String {
    instant
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_default()
}

fn format_csv_series(
    location: &Location,
    records: &[DayRecord],
    show_inputs: bool,
    headers: bool,
) -> Vec<String> {
    let mut lines = Vec::with_capacity(records.len() + 1);
    if headers {
        if show_inputs {
            lines.push("latitude,longitude,date,type,sunrise,sunset,dayLength\n".to_string());
        } else {
            lines.push("date,type,sunrise,sunset,dayLength\n".to_string());
        }
    }

    for record in records {
        let row = format!(
            "{},{},{},{},{:.4}\n",
            record.date.format("%Y-%m-%d"),
            record.kind.label(),
            format_fraction(record.sunrise_local_hour),
            format_fraction(record.sunset_local_hour),
            record.day_length_hours
        );
        if show_inputs {
            lines.push(format!(
                "{:.5},{:.5},{}",
                location.latitude, location.longitude, row
            ));
        } else {
            lines.push(row);
        }
    }
    lines
}

fn format_csv_events(
    location: &Location,
    rows: &[EventRow],
    show_inputs: bool,
    headers: bool,
) -> Vec<String> {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    if headers {
        if show_inputs {
            lines.push("latitude,longitude,date,type,sunrise,transit,sunset\n".to_string());
        } else {
            lines.push("date,type,sunrise,transit,sunset\n".to_string());
        }
    }

    for row in rows {
        let event = &row.event;
        let line = format!(
            "{},{},{},{},{}\n",
            event.date.format("%Y-%m-%d"),
            row.kind.label(),
            format_instant(event.sunrise_utc.as_ref()),
            format_instant(Some(&event.transit_utc)),
            format_instant(event.sunset_utc.as_ref())
        );
        if show_inputs {
            lines.push(format!(
                "{:.5},{:.5},{}",
                location.latitude, location.longitude, line
            ));
        } else {
            lines.push(line);
        }
    }
    lines
}

fn json_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn json_number(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.4}", v))
        .unwrap_or_else(|| "null".to_string())
}

fn json_instant(instant: Option<&DateTime<Utc>>) -> String {
    instant
        .map(|dt| format!("\"{}\"", dt.format("%Y-%m-%dT%H:%M:%SZ")))
        .unwrap_or_else(|| "null".to_string())
}

fn json_inputs(location: &Location) -> String {
    format!(
        r#""location":{},"latitude":{},"longitude":{},"#,
        json_string(&location.name),
        location.latitude,
        location.longitude
    )
}

fn format_json_record(location: &Location, record: &DayRecord, show_inputs: bool) -> String {
    format!(
        r#"{{{}"date":"{}","type":"{}","sunrise":{},"sunset":{},"dayLength":{:.4}}}"#,
        if show_inputs { json_inputs(location) } else { String::new() },
        record.date.format("%Y-%m-%d"),
        record.kind.label(),
        json_number(record.sunrise_local_hour),
        json_number(record.sunset_local_hour),
        record.day_length_hours
    ) + "\n"
}

fn format_json_event(location: &Location, row: &EventRow, show_inputs: bool) -> String {
    let event = &row.event;
    format!(
        r#"{{{}"date":"{}","type":"{}","sunrise":{},"transit":{},"sunset":{}}}"#,
        if show_inputs { json_inputs(location) } else { String::new() },
        event.date.format("%Y-%m-%d"),
        row.kind.label(),
        json_instant(event.sunrise_utc.as_ref()),
        json_instant(Some(&event.transit_utc)),
        json_instant(event.sunset_utc.as_ref())
    ) + "\n"
}

/// Left-aligns `text` to `width` terminal columns.
fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(UnicodeWidthStr::width(text));
    format!("{}{}", text, " ".repeat(fill))
}

fn format_header_section(entries: &[(&str, String)]) -> String {
    let label_width = entries
        .iter()
        .map(|(label, _)| UnicodeWidthStr::width(*label))
        .max()
        .unwrap_or(0);
    let mut section = String::new();
    for (label, value) in entries {
        section.push_str(&format!("  {} {}\n", pad(&format!("{}:", label), label_width + 1), value));
    }
    section.push('\n');
    section
}

fn border(widths: &[usize], left: char, middle: char, right: char) -> String {
    let mut line = String::new();
    line.push(left);
    for (i, width) in widths.iter().enumerate() {
        line.push_str(&"─".repeat(width + 2));
        if i < widths.len() - 1 {
            line.push(middle);
        }
    }
    line.push(right);
    line.push('\n');
    line
}

fn table_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let mut line = String::from('│');
    for (cell, width) in cells.zip(widths) {
        line.push_str(&format!(" {} │", pad(cell, *width)));
    }
    line.push('\n');
    line
}

fn format_table(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|cell| UnicodeWidthStr::width(cell.as_str()))
                .chain(std::iter::once(UnicodeWidthStr::width(*header)))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(rows.len() + 4);
    lines.push(border(&widths, '┌', '┬', '┐'));
    lines.push(table_row(headers.iter().copied(), &widths));
    lines.push(border(&widths, '├', '┼', '┤'));
    for row in rows {
        lines.push(table_row(row.iter().map(String::as_str), &widths));
    }
    lines.push(border(&widths, '└', '┴', '┘'));
    lines
}

fn format_text_day(
    location: &Location,
    rule_name: &str,
    horizon: Horizon,
    record: &DayRecord,
) -> Vec<String> {
    let header = [
        ("Location", location.to_string()),
        ("Time zone", rule_name.to_string()),
        ("Horizon", horizon.to_string()),
    ];
    vec![
        format_header_section(&header),
        format!("date      : {}\n", record.date.format("%Y-%m-%d")),
        format!("type      : {}\n", record.kind),
        format!(
            "sunrise   : {}\n",
            record.sunrise_local_hour.map(format_hour).unwrap_or_default()
        ),
        format!(
            "sunset    : {}\n",
            record.sunset_local_hour.map(format_hour).unwrap_or_default()
        ),
        format!("day length: {}\n", format_duration(record.day_length_hours)),
    ]
}

fn format_text_series(series: &AnnualSeries) -> Vec<String> {
    let header = [
        ("Location", series.location().to_string()),
        ("Year", series.year().to_string()),
        ("Time zone", series.rule_name().to_string()),
        ("Horizon", series.horizon().to_string()),
    ];

    let rows: Vec<Vec<String>> = series
        .iter()
        .map(|record| {
            vec![
                record.date.format("%Y-%m-%d").to_string(),
                record
                    .sunrise_local_hour
                    .map(format_hour)
                    .unwrap_or_else(|| MISSING.to_string()),
                record
                    .sunset_local_hour
                    .map(format_hour)
                    .unwrap_or_else(|| MISSING.to_string()),
                format_duration(record.day_length_hours),
                record.kind.to_string(),
            ]
        })
        .collect();

    let mut lines = vec![format_header_section(&header)];
    lines.extend(format_table(
        &["Date", "Sunrise", "Sunset", "Day length", "Type"],
        &rows,
    ));

    let mut summary = Vec::new();
    if let Some(longest) = series.longest_day() {
        summary.push((
            "Longest day",
            format!(
                "{} ({})",
                longest.date.format("%Y-%m-%d"),
                format_duration(longest.day_length_hours)
            ),
        ));
    }
    if let Some(shortest) = series.shortest_day() {
        summary.push((
            "Shortest day",
            format!(
                "{} ({})",
                shortest.date.format("%Y-%m-%d"),
                format_duration(shortest.day_length_hours)
            ),
        ));
    }
    if let Some(record) = series.earliest_sunrise()
        && let Some(hour) = record.sunrise_local_hour
    {
        summary.push((
            "Earliest sunrise",
            format!("{} ({})", record.date.format("%Y-%m-%d"), format_hour(hour)),
        ));
    }
    if let Some(record) = series.latest_sunset()
        && let Some(hour) = record.sunset_local_hour
    {
        summary.push((
            "Latest sunset",
            format!("{} ({})", record.date.format("%Y-%m-%d"), format_hour(hour)),
        ));
    }
    if series.polar_day_count() > 0 {
        summary.push(("Polar days", series.polar_day_count().to_string()));
    }
    if series.polar_night_count() > 0 {
        summary.push(("Polar nights", series.polar_night_count().to_string()));
    }

    lines.push("\n".to_string());
    let mut summary_section = format_header_section(&summary);
    summary_section.pop();
    lines.push(summary_section);
    lines
}

fn format_text_events(location: &Location, rows: &[EventRow]) -> Vec<String> {
    let format_time = |dt: &DateTime<Utc>| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string();
    let header = format_header_section(&[("Location", location.to_string())]);

    if let [row] = rows {
        let event = &row.event;
        return vec![
            header,
            format!("type   : {}\n", row.kind),
            format!(
                "sunrise: {}\n",
                event.sunrise_utc.as_ref().map(format_time).unwrap_or_default()
            ),
            format!("transit: {}\n", format_time(&event.transit_utc)),
            format!(
                "sunset : {}\n",
                event.sunset_utc.as_ref().map(format_time).unwrap_or_default()
            ),
        ];
    }

    let clock = |dt: Option<&DateTime<Utc>>| {
        dt.map(|d| d.format("%m-%d %H:%M").to_string())
            .unwrap_or_else(|| MISSING.to_string())
    };
    let table_rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.event.date.format("%Y-%m-%d").to_string(),
                clock(row.event.sunrise_utc.as_ref()),
                clock(Some(&row.event.transit_utc)),
                clock(row.event.sunset_utc.as_ref()),
                row.kind.to_string(),
            ]
        })
        .collect();

    let mut lines = vec![header];
    lines.extend(format_table(
        &["Date", "Sunrise (UTC)", "Transit (UTC)", "Sunset (UTC)", "Type"],
        &table_rows,
    ));
    lines
}
