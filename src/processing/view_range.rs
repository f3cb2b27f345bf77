use crate::processing::spans::{Interval, OperationalSpan};
use crate::processing::window::{effective_mask, masked_values};
use crate::state::config::AnalysisConfig;
use crate::state::sample_series::SampleSeries;

/// Value-axis limits that fit the visible `channels` inside `window`.
///
/// Uses the same sample selection as window evaluation, so in IQR mode a
/// single spike does not stretch the axis. A flat result is widened by one
/// unit each way; otherwise 5% padding is added at both ends. `None` when
/// no channel has data in the window.
pub fn fit_value_range<S: AsRef<str>>(
    series: &SampleSeries,
    channels: &[S],
    spans: &[OperationalSpan],
    window: Interval,
    config: &AnalysisConfig,
) -> Option<(f64, f64)> {
    let mask = effective_mask(series, spans, window, config);

    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for channel in channels {
        let Some(values) = masked_values(series, channel.as_ref(), &mask, config) else {
            continue;
        };
        for v in values {
            y_min = y_min.min(v);
            y_max = y_max.max(v);
        }
    }

    if !y_min.is_finite() || !y_max.is_finite() {
        return None;
    }
    if y_min == y_max {
        return Some((y_min - 1.0, y_max + 1.0));
    }
    let pad = (y_max - y_min) * 0.05;
    Some((y_min - pad, y_max + pad))
}
