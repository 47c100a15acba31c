use crate::error::{QoeError, Result};
use crate::signal::TimeSeries;
use csv::{ReaderBuilder, Trim};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// What to do with a field that does not parse as a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Abort the load with [`QoeError::DataFormat`].
    #[default]
    Fail,
    /// Keep the sample as NaN so it flows through every derived series.
    #[serde(rename = "nan")]
    NotANumber,
}

/// Parse comma-delimited samples, one value per field, in file order.
///
/// Records may carry a single value per line or several values per line;
/// blank fields and `#` comment lines are skipped. `source` is only used in
/// error messages.
pub fn parse_series<R: Read>(reader: R, source: &Path, policy: MalformedPolicy) -> Result<TimeSeries> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);
    let mut data = Vec::new();
    for record in reader.byte_records() {
        let record = record.map_err(|e| QoeError::io(source, e.into()))?;
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        for field in record.iter().filter(|f| !f.is_empty()) {
            let parsed = std::str::from_utf8(field)
                .ok()
                .and_then(|text| text.parse::<f64>().ok());
            match parsed {
                Some(value) => data.push(value),
                None if policy == MalformedPolicy::NotANumber => {
                    warn!(
                        "{}: line {} is not numeric ('{}'), keeping NaN",
                        source.display(),
                        line,
                        String::from_utf8_lossy(field)
                    );
                    data.push(f64::NAN);
                }
                None => {
                    return Err(QoeError::DataFormat {
                        path: source.to_path_buf(),
                        line,
                        value: String::from_utf8_lossy(field).into_owned(),
                    })
                }
            }
        }
    }
    if data.is_empty() {
        return Err(QoeError::EmptySeries {
            path: source.to_path_buf(),
        });
    }
    debug!("{}: loaded {} samples", source.display(), data.len());
    Ok(TimeSeries::per_second(data))
}

/// Read a per-second series from disk.
pub fn read_series(path: &Path, policy: MalformedPolicy) -> Result<TimeSeries> {
    let file = File::open(path).map_err(|e| QoeError::io(path, e))?;
    parse_series(file, path, policy)
}
