use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::processing::classifier::{classify, Status};
use crate::processing::outliers::filter_outliers;
use crate::processing::spans::{Interval, OperationalSpan};
use crate::processing::statistics::WindowStats;
use crate::state::channel_spec::ChannelSpecs;
use crate::state::config::{AnalysisConfig, EvaluationMode};
use crate::state::sample_series::SampleSeries;

/// Per-channel results carried from one evaluation to the next.
///
/// A channel whose window holds no usable data keeps whatever status and
/// statistics it had, so a brief empty view does not reset it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WindowAccumulator {
    pub statuses: BTreeMap<String, Status>,
    pub stats: BTreeMap<String, WindowStats>,
}

impl WindowAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, channel: &str) -> Status {
        self.statuses.get(channel).copied().unwrap_or_default()
    }

    /// Most severe status across all channels.
    pub fn worst(&self) -> Status {
        Status::worst(self.statuses.values().copied())
    }
}

/// What a call to [`evaluate`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationOutcome {
    /// No sample survived masking; statuses untouched, statistics cleared.
    EmptyWindow,
    Evaluated { classified: usize, skipped: usize },
}

/// Rows whose timestamp lies in `window` (inclusive) and, for the running
/// modes, inside some span's running phase shortened by the shutdown threshold.
pub fn effective_mask(
    series: &SampleSeries,
    spans: &[OperationalSpan],
    window: Interval,
    config: &AnalysisConfig,
) -> Vec<bool> {
    let restrict = config.mode.restricts_to_running();
    let running: Vec<Interval> = spans
        .iter()
        .map(|s| Interval::new(s.running.start, s.running.end - config.shutdown_threshold))
        .collect();

    series
        .time
        .iter()
        .map(|&t| window.contains(t) && (!restrict || running.iter().any(|r| r.contains(t))))
        .collect()
}

/// Recorded values of `channel` under `mask`, outlier-filtered in IQR mode.
/// Error-code readings count as missing. `None` when the channel does not exist.
pub fn masked_values(
    series: &SampleSeries,
    channel: &str,
    mask: &[bool],
    config: &AnalysisConfig,
) -> Option<Vec<f64>> {
    let column = series.channel(channel)?;
    let values: Vec<f64> = column
        .iter()
        .zip(mask.iter())
        .filter_map(|(&v, &keep)| if keep { config.recorded(v) } else { None })
        .filter(|v| !v.is_nan())
        .collect();

    Some(match config.mode {
        EvaluationMode::Iqr => filter_outliers(&values),
        EvaluationMode::All | EvaluationMode::Running => values,
    })
}

/// Classify and summarize every channel with a tolerance spec over the
/// visible `window`, merging results into `acc`.
///
/// Pure apart from `acc`: nothing in `series`, `specs` or `spans` is modified.
pub fn evaluate(
    acc: &mut WindowAccumulator,
    series: &SampleSeries,
    specs: &ChannelSpecs,
    spans: &[OperationalSpan],
    window: Interval,
    config: &AnalysisConfig,
) -> EvaluationOutcome {
    let mask = effective_mask(series, spans, window, config);
    if !mask.iter().any(|&m| m) {
        tracing::debug!(
            "window {}..{} ({}) holds no samples; keeping previous statuses",
            window.start,
            window.end,
            config.mode.label()
        );
        acc.stats.clear();
        return EvaluationOutcome::EmptyWindow;
    }

    let mut classified = 0;
    let mut skipped = 0;
    for (channel, spec) in specs.iter() {
        let values = match masked_values(series, channel, &mask, config) {
            Some(values) if !values.is_empty() => values,
            Some(_) => {
                tracing::trace!("{channel}: no values in window; status kept");
                skipped += 1;
                continue;
            }
            None => {
                tracing::trace!("{channel}: not present in series");
                skipped += 1;
                continue;
            }
        };

        acc.statuses.insert(channel.clone(), classify(&values, spec));
        if let Some(stats) = WindowStats::compute(&values, spec) {
            acc.stats.insert(channel.clone(), stats);
        }
        classified += 1;
    }

    tracing::debug!("evaluated {classified} channels, skipped {skipped}");
    EvaluationOutcome::Evaluated { classified, skipped }
}
