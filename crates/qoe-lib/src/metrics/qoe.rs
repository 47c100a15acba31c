use crate::error::{QoeError, Result};
use crate::signal::TimeSeries;
use serde::{Deserialize, Serialize};

/// Weight of each of the three sub-scores.
const TERM_WEIGHT: f64 = 1.0 / 3.0;

/// Normalization reference for the QoE formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QoeReference {
    /// Highest resolution rung; also caps the meaningful change magnitude.
    pub normalization_max: f64,
}

impl Default for QoeReference {
    fn default() -> Self {
        Self {
            normalization_max: 32.0,
        }
    }
}

/// Aggregate view of a scored session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QoeSummary {
    pub samples: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Number of rung switches in the resolution series.
    pub switches: usize,
    /// Finite scores outside [0, 100].
    pub out_of_range: usize,
}

/// Absolute rung change between consecutive seconds; the first sample is 0.
pub fn resolution_changes(resolution: &TimeSeries) -> TimeSeries {
    let mut data = Vec::with_capacity(resolution.len());
    if !resolution.is_empty() {
        data.push(0.0);
    }
    data.extend(resolution.data.windows(2).map(|w| (w[0] - w[1]).abs()));
    TimeSeries {
        fs: resolution.fs,
        data,
    }
}

/// Count of indices whose rung differs from the previous second.
pub fn switch_count(resolution: &TimeSeries) -> usize {
    resolution
        .data
        .windows(2)
        .filter(|w| !w[0].is_nan() && !w[1].is_nan() && w[0] != w[1])
        .count()
}

/// Composite per-second QoE in percent.
///
/// Each term is normalized to [0, 1/3]: resolution against
/// `normalization_max`, buffering as `1 - buffering`, and churn as
/// `1 - change / normalization_max`. Scores are not clamped, so values above
/// 100 or below 0 mean the reference does not match the observed rungs.
pub fn qoe_score(
    resolution: &TimeSeries,
    buffering: &TimeSeries,
    changes: &TimeSeries,
    reference: &QoeReference,
) -> Result<TimeSeries> {
    let expected = resolution.len();
    ensure_len("buffering", expected, buffering)?;
    ensure_len("resolution change", expected, changes)?;
    let max = reference.normalization_max;
    let data = resolution
        .data
        .iter()
        .zip(&buffering.data)
        .zip(&changes.data)
        .map(|((res, buf), change)| {
            let res_term = (res / max) * TERM_WEIGHT;
            let buf_term = (1.0 - buf) * TERM_WEIGHT;
            let change_term = (1.0 - change / max) * TERM_WEIGHT;
            (res_term + buf_term + change_term) * 100.0
        })
        .collect();
    Ok(TimeSeries {
        fs: resolution.fs,
        data,
    })
}

fn ensure_len(series: &'static str, expected: usize, ts: &TimeSeries) -> Result<()> {
    if ts.len() != expected {
        return Err(QoeError::LengthMismatch {
            series,
            expected,
            found: ts.len(),
        });
    }
    Ok(())
}

/// Summarize finite QoE samples; NaN samples are skipped.
pub fn summarize(qoe: &TimeSeries, resolution: &TimeSeries) -> QoeSummary {
    let finite: Vec<f64> = qoe.data.iter().copied().filter(|v| v.is_finite()).collect();
    let (mean, min, max) = if finite.is_empty() {
        (f64::NAN, f64::NAN, f64::NAN)
    } else {
        let sum: f64 = finite.iter().sum();
        let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (sum / finite.len() as f64, min, max)
    };
    QoeSummary {
        samples: qoe.len(),
        mean,
        min,
        max,
        switches: switch_count(resolution),
        out_of_range: finite.iter().filter(|v| !(0.0..=100.0).contains(*v)).count(),
    }
}
