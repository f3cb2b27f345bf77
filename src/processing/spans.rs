use serde::{Deserialize, Serialize};

use crate::error::{GaslensError, Result};
use crate::state::config::AnalysisConfig;
use crate::state::sample_series::SampleSeries;

/// Closed time interval in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
}

impl Interval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Checked constructor for user-supplied bounds: both finite, `start <= end`.
    pub fn from_bounds(start: f64, end: f64) -> Result<Self> {
        if !start.is_finite() || !end.is_finite() {
            return Err(GaslensError::InvalidConfig(format!(
                "window bounds must be finite numbers, got {start}..{end}"
            )));
        }
        if start > end {
            return Err(GaslensError::InvalidConfig(format!(
                "window start {start} is after end {end}"
            )));
        }
        Ok(Self::new(start, end))
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Startup, running and shutdown phases of one activity block.
///
/// The phases are contiguous: `startup.end == running.start` and, when a
/// shutdown phase exists, `running.end == shutdown.start`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperationalSpan {
    pub startup: Interval,
    pub running: Interval,
    /// `None` when the running phase reaches the end of the block.
    pub shutdown: Option<Interval>,
}

impl OperationalSpan {
    /// The whole activity block this span was derived from.
    pub fn block(&self) -> Interval {
        let end = self.shutdown.map_or(self.running.end, |s| s.end);
        Interval::new(self.startup.start, end)
    }
}

/// A maximal run of active samples, as positions into the time-ordered row list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block {
    first: usize,
    last: usize,
}

/// Split the time-ordered active rows into blocks wherever consecutive active
/// timestamps are more than `max_gap` apart.
fn activity_blocks(times: &[f64], active: &[bool], max_gap: f64) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut current: Option<Block> = None;

    for (pos, (&t, &is_active)) in times.iter().zip(active.iter()).enumerate() {
        if !is_active {
            continue;
        }
        current = match current {
            Some(block) if t - times[block.last] > max_gap => {
                blocks.push(block);
                Some(Block { first: pos, last: pos })
            }
            Some(block) => Some(Block { last: pos, ..block }),
            None => Some(Block { first: pos, last: pos }),
        };
    }
    blocks.extend(current);
    blocks
}

/// Partition each activity block of `series` into startup, running and
/// shutdown phases.
///
/// A block ends when the activity column stays empty for more than
/// `config.max_block_gap` seconds. Startup lasts until the first sample where
/// the cavity and enclosure temperatures both reach their warm-up thresholds.
/// The last `config.shutdown_threshold` seconds of the block are shutdown.
///
/// Blocks shorter than the shutdown threshold, and blocks that never warm up,
/// produce no span. A missing activity or temperature column yields no spans.
/// Rows with a non-finite timestamp are ignored, and error-code readings count
/// as not recorded.
///
/// When the shutdown threshold reaches back past the warm-up point, the running
/// phase collapses to zero length at the warm-up time and shutdown covers the
/// rest of the block.
pub fn detect_spans(series: &SampleSeries, config: &AnalysisConfig) -> Vec<OperationalSpan> {
    let columns = &config.columns;
    let Some(activity) = series.channel(&columns.activity) else {
        tracing::warn!("activity column {:?} not found; no spans", columns.activity);
        return Vec::new();
    };
    let (Some(cavity), Some(enclosure)) = (
        series.channel(&columns.cavity_temp),
        series.channel(&columns.enclosure_temp),
    ) else {
        tracing::warn!(
            "temperature columns {:?}/{:?} not found; no spans",
            columns.cavity_temp,
            columns.enclosure_temp
        );
        return Vec::new();
    };

    let mut order = series.time_order();
    order.retain(|&row| series.time[row].is_finite());
    let times: Vec<f64> = order.iter().map(|&row| series.time[row]).collect();
    let active: Vec<bool> = order
        .iter()
        .map(|&row| config.recorded(activity[row]).is_some())
        .collect();

    let blocks = activity_blocks(&times, &active, config.max_block_gap);
    let shutdown_threshold = config.shutdown_threshold;
    let warmup = config.warmup;
    let mut spans = Vec::with_capacity(blocks.len());

    for block in &blocks {
        let block_start = times[block.first];
        let block_end = times[block.last];

        if block_end - block_start < shutdown_threshold {
            tracing::debug!(
                "discarding block {block_start}..{block_end}: shorter than shutdown threshold {shutdown_threshold}"
            );
            continue;
        }

        let warm_pos = (block.first..=block.last).find(|&pos| {
            let row = order[pos];
            matches!(
                (config.recorded(cavity[row]), config.recorded(enclosure[row])),
                (Some(c), Some(e)) if c >= warmup.cavity && e >= warmup.enclosure
            )
        });
        let Some(warm_pos) = warm_pos else {
            tracing::debug!("discarding block {block_start}..{block_end}: never warmed up");
            continue;
        };
        let warm_time = times[warm_pos];

        let running_end = (block_end - shutdown_threshold).max(warm_time);
        let shutdown = if running_end == block_end {
            None
        } else {
            Some(Interval::new(running_end, block_end))
        };

        spans.push(OperationalSpan {
            startup: Interval::new(block_start, warm_time),
            running: Interval::new(warm_time, running_end),
            shutdown,
        });
    }

    tracing::info!(
        "detected {} operational spans from {} activity blocks",
        spans.len(),
        blocks.len()
    );
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::config::{ColumnIds, WarmupThresholds};

    fn config(shutdown_threshold: f64) -> AnalysisConfig {
        AnalysisConfig {
            shutdown_threshold,
            warmup: WarmupThresholds {
                cavity: 55.0,
                enclosure: 54.0,
            },
            columns: ColumnIds {
                time: "t".to_string(),
                activity: "ndx".to_string(),
                cavity_temp: "cavity".to_string(),
                enclosure_temp: "enclosure".to_string(),
            },
            ..AnalysisConfig::default()
        }
    }

    fn series(times: &[f64], cavity: impl Fn(f64) -> f64, enclosure: f64) -> SampleSeries {
        let n = times.len();
        SampleSeries::new("t", times.to_vec())
            .with_channel("ndx", (0..n).map(|i| Some(i as f64)).collect())
            .with_channel("cavity", times.iter().map(|&t| Some(cavity(t))).collect())
            .with_channel("enclosure", vec![Some(enclosure); n])
    }

    fn seconds(range: std::ops::RangeInclusive<u32>) -> Vec<f64> {
        range.map(f64::from).collect()
    }

    #[test]
    fn ramp_warms_up_near_block_end() {
        let times = seconds(0..=20);
        let spans = detect_spans(&series(&times, |t| 20.0 + 2.0 * t, 60.0), &config(2.0));
        assert_eq!(spans.len(), 1);
        let span = spans[0];
        assert_eq!(span.startup, Interval::new(0.0, 18.0));
        assert_eq!(span.running, Interval::new(18.0, 18.0));
        assert_eq!(span.shutdown, Some(Interval::new(18.0, 20.0)));
    }

    #[test]
    fn phases_are_contiguous() {
        let times = seconds(0..=100);
        let spans = detect_spans(&series(&times, |t| 40.0 + t, 60.0), &config(10.0));
        let span = spans[0];
        assert_eq!(span.startup, Interval::new(0.0, 15.0));
        assert_eq!(span.startup.end, span.running.start);
        assert_eq!(span.running.end, span.shutdown.unwrap().start);
        assert_eq!(span.shutdown.unwrap().duration(), 10.0);
        assert_eq!(span.block(), Interval::new(0.0, 100.0));
    }

    #[test]
    fn gaps_beyond_max_split_blocks() {
        let mut times = seconds(0..=30);
        times.extend(seconds(60..=90));
        let spans = detect_spans(&series(&times, |_| 60.0, 60.0), &config(2.0));
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].block(), Interval::new(0.0, 30.0));
        assert_eq!(spans[1].block(), Interval::new(60.0, 90.0));
        assert!(!spans[0].block().overlaps(&spans[1].block()));
        // Warm from the first sample: zero-length startup.
        assert_eq!(spans[1].startup.duration(), 0.0);
    }

    #[test]
    fn inactive_rows_bridge_small_gaps_only() {
        let times = seconds(0..=40);
        let mut s = series(&times, |_| 60.0, 60.0);
        let ndx = (0..=40)
            .map(|i| if (15..=24).contains(&i) { None } else { Some(i as f64) })
            .collect();
        s.push_channel("ndx", ndx);
        // Active at 14 then 25: gap 11 > 10.
        let spans = detect_spans(&s, &config(2.0));
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].block(), Interval::new(0.0, 14.0));
        assert_eq!(spans[1].block(), Interval::new(25.0, 40.0));
    }

    #[test]
    fn short_block_boundary() {
        let times = [0.0, 1.0, 2.0, 3.0, 4.0];
        let s = series(&times, |_| 60.0, 60.0);
        assert_eq!(detect_spans(&s, &config(4.0)).len(), 1);
        assert!(detect_spans(&s, &config(4.0 + 1e-9)).is_empty());
    }

    #[test]
    fn never_warm_block_is_dropped() {
        let times = seconds(0..=50);
        // Cavity warms but enclosure never does.
        let spans = detect_spans(&series(&times, |_| 70.0, 50.0), &config(2.0));
        assert!(spans.is_empty());
    }

    #[test]
    fn zero_threshold_has_no_shutdown() {
        let times = seconds(0..=10);
        let spans = detect_spans(&series(&times, |_| 60.0, 60.0), &config(0.0));
        assert_eq!(spans[0].running, Interval::new(0.0, 10.0));
        assert_eq!(spans[0].shutdown, None);
    }

    #[test]
    fn late_warmup_collapses_running() {
        let times = seconds(0..=20);
        let spans = detect_spans(&series(&times, |t| if t >= 19.0 { 60.0 } else { 20.0 }, 60.0), &config(5.0));
        let span = spans[0];
        assert_eq!(span.startup, Interval::new(0.0, 19.0));
        assert_eq!(span.running, Interval::new(19.0, 19.0));
        assert_eq!(span.shutdown, Some(Interval::new(19.0, 20.0)));
    }

    #[test]
    fn unsorted_rows_are_ordered_first() {
        let times = [5.0, 0.0, 10.0, 3.0];
        let s = SampleSeries::new("t", times.to_vec())
            .with_channel("ndx", vec![Some(1.0); 4])
            .with_channel("cavity", vec![Some(60.0), Some(20.0), Some(60.0), Some(60.0)])
            .with_channel("enclosure", vec![Some(60.0); 4]);
        let spans = detect_spans(&s, &config(2.0));
        assert_eq!(spans[0].startup, Interval::new(0.0, 3.0));
        assert_eq!(spans[0].shutdown, Some(Interval::new(8.0, 10.0)));
    }

    #[test]
    fn nan_timestamps_are_ignored() {
        let times: Vec<f64> = (0..40)
            .map(|i| if i % 3 == 0 { f64::NAN } else { f64::from(i) })
            .collect();
        let spans = detect_spans(&series(&times, |_| 60.0, 60.0), &config(2.0));
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].block(), Interval::new(1.0, 38.0));
        assert_eq!(spans[0].shutdown, Some(Interval::new(36.0, 38.0)));
    }

    #[test]
    fn error_code_readings_are_not_recorded() {
        let times = seconds(0..=30);
        let mut s = series(&times, |_| 60.0, 60.0);
        // Activity logged as the error code from 11 to 29 leaves 0..=10 plus 30.
        let ndx = (0..=30)
            .map(|i| Some(if (11..=29).contains(&i) { -9999.0 } else { f64::from(i) }))
            .collect();
        s.push_channel("ndx", ndx);
        // The cavity sensor reports the error code until t=4.
        let cavity = (0..=30)
            .map(|i| Some(if i < 4 { -9999.0 } else { 60.0 }))
            .collect();
        s.push_channel("cavity", cavity);

        let mut cfg = config(2.0);
        cfg.error_code = Some(-9999.0);
        let spans = detect_spans(&s, &cfg);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].startup, Interval::new(0.0, 4.0));
        assert_eq!(spans[0].block(), Interval::new(0.0, 10.0));

        cfg.error_code = None;
        assert_eq!(detect_spans(&s, &cfg)[0].block(), Interval::new(0.0, 30.0));
    }

    #[test]
    fn window_bounds_are_checked() {
        assert_eq!(Interval::from_bounds(1.0, 1.0).unwrap(), Interval::new(1.0, 1.0));
        for (start, end) in [(f64::NAN, 5.0), (0.0, f64::INFINITY), (f64::NEG_INFINITY, 0.0)] {
            let err = Interval::from_bounds(start, end).unwrap_err();
            assert!(matches!(err, GaslensError::InvalidConfig(ref msg) if msg.contains("finite")));
        }
        let err = Interval::from_bounds(5.0, 1.0).unwrap_err();
        assert!(matches!(err, GaslensError::InvalidConfig(ref msg) if msg.contains("after")));
    }

    #[test]
    fn missing_columns_yield_nothing() {
        let s = SampleSeries::new("t", seconds(0..=10));
        assert!(detect_spans(&s, &config(2.0)).is_empty());
    }
}
