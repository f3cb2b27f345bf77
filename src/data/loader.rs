use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;

use crate::data::datetime::parse_timezone;
use crate::error::{GaslensError, Result};
use crate::state::sample_series::SampleSeries;

/// One or more instrument export files parsed into a single series.
#[derive(Debug, Clone)]
pub struct InstrumentExport {
    pub series: SampleSeries,
    /// `TG##` model code, or `"Unknown"`.
    pub model: String,
    /// `KEY: value` lines preceding the data header (e.g. `SN`, `Timezone`).
    pub metadata: BTreeMap<String, String>,
}

impl InstrumentExport {
    pub fn serial(&self) -> &str {
        self.metadata.get("SN").map(String::as_str).unwrap_or("Unknown SN")
    }

    /// Timezone named in the `Timezone` metadata line, or UTC.
    pub fn timezone(&self) -> Tz {
        parse_timezone(self.metadata.get("Timezone").map(String::as_str))
    }
}

/// Find a `TG` model code followed by two digits.
fn find_model(text: &str) -> Option<String> {
    text.match_indices("TG").find_map(|(i, _)| {
        let digits = text.get(i + 2..i + 4)?;
        digits
            .chars()
            .all(|c| c.is_ascii_digit())
            .then(|| format!("TG{digits}"))
    })
}

fn numeric(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a tab-delimited export: metadata lines, a `DATAH` header row, a
/// `DATAU` units row, then data rows whose first field is a record tag.
///
/// Columns are named `"NAME (unit)"`. Rows with the wrong number of fields are
/// skipped, and columns with no numeric cell at all are dropped.
pub fn parse_export<R: Read>(reader: R, source: &Path, time_column: &str) -> Result<InstrumentExport> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        match result {
            Ok(record) => rows.push(record.iter().map(|s| s.trim().to_string()).collect()),
            Err(e) => tracing::warn!("{source:?}: unreadable line skipped: {e}"),
        }
    }

    let header_idx = rows
        .iter()
        .position(|r| r.first().is_some_and(|tag| tag == "DATAH"))
        .ok_or_else(|| GaslensError::MissingHeader(source.to_path_buf()))?;
    let units_idx = rows
        .iter()
        .position(|r| r.first().is_some_and(|tag| tag == "DATAU"))
        .ok_or_else(|| GaslensError::MalformedExport {
            path: source.to_path_buf(),
            detail: "no DATAU units line".to_string(),
        })?;

    let model = rows
        .first()
        .and_then(|r| find_model(&r.join("\t")))
        .or_else(|| source.file_name().and_then(|n| find_model(&n.to_string_lossy())))
        .unwrap_or_else(|| "Unknown".to_string());

    let mut metadata = BTreeMap::new();
    for row in &rows[..header_idx] {
        if let [key, value, ..] = row.as_slice() {
            metadata.insert(key.trim_end_matches(':').trim().to_string(), value.clone());
        }
    }

    let headers = &rows[header_idx][1..];
    let units = &rows[units_idx][1..];
    let names: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| match units.get(i) {
            Some(unit) => format!("{h} ({unit})"),
            None => h.clone(),
        })
        .collect();

    let data_start = header_idx.max(units_idx) + 1;
    let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); names.len()];
    let mut skipped = 0usize;
    for row in &rows[data_start..] {
        if row.len() != names.len() + 1 {
            skipped += 1;
            continue;
        }
        for (col, cell) in columns.iter_mut().zip(&row[1..]) {
            col.push(numeric(cell));
        }
    }
    if skipped > 0 {
        tracing::warn!("{source:?}: skipped {skipped} rows with a wrong field count");
    }

    let named: Vec<(String, Vec<Option<f64>>)> = names
        .into_iter()
        .zip(columns)
        .filter(|(name, values)| {
            let keep = name == time_column || values.iter().any(Option::is_some);
            if !keep {
                tracing::debug!("{source:?}: dropping non-numeric column {name:?}");
            }
            keep
        })
        .collect();

    let series = SampleSeries::from_columns(time_column, named)?;
    tracing::info!(
        "loaded {} rows, {} channels from {:?} (model {model})",
        series.len(),
        series.channels().len(),
        source
    );
    Ok(InstrumentExport {
        series,
        model,
        metadata,
    })
}

pub fn load_export(path: &Path, time_column: &str) -> Result<InstrumentExport> {
    let file = std::fs::File::open(path).map_err(|source| GaslensError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_export(file, path, time_column)
}

/// Load several exports of the same instrument and merge them into one
/// time-ordered series. Model and metadata come from the first file.
pub fn load_and_merge(paths: &[PathBuf], time_column: &str) -> Result<InstrumentExport> {
    let (first, rest) = paths
        .split_first()
        .ok_or_else(|| GaslensError::InvalidConfig("no input files given".to_string()))?;

    let mut merged = load_export(first, time_column)?;
    for path in rest {
        let next = load_export(path, time_column)?;
        if next.model != merged.model {
            tracing::warn!("{path:?} is model {}, expected {}", next.model, merged.model);
        }
        merged.series.append(next.series);
    }
    merged.series.sort_by_time();
    Ok(merged)
}
