use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::error::{GaslensError, Result};
use crate::state::sample_series::SampleSeries;

/// Closed interval `[low, high]` of acceptable channel values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f64; 2]", from = "[f64; 2]")]
pub struct Band {
    pub low: f64,
    pub high: f64,
}

impl Band {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

impl From<[f64; 2]> for Band {
    fn from([low, high]: [f64; 2]) -> Self {
        Band { low, high }
    }
}

impl From<Band> for [f64; 2] {
    fn from(band: Band) -> Self {
        [band.low, band.high]
    }
}

/// Tolerance file entry: `{"typical": [lo, hi], "absolute": [lo, hi], "autoplot": true}`.
/// A `null` bound disables that band.
#[derive(Debug, Clone, Default, Deserialize)]
struct RawChannelSpec {
    #[serde(default)]
    typical: Option<[Option<f64>; 2]>,
    #[serde(default)]
    absolute: Option<[Option<f64>; 2]>,
    #[serde(default)]
    autoplot: bool,
}

fn complete_band(raw: Option<[Option<f64>; 2]>) -> Option<Band> {
    match raw {
        Some([Some(low), Some(high)]) => Some(Band { low, high }),
        _ => None,
    }
}

impl From<RawChannelSpec> for ChannelSpec {
    fn from(raw: RawChannelSpec) -> Self {
        ChannelSpec {
            typical: complete_band(raw.typical),
            absolute: complete_band(raw.absolute),
            autoplot: raw.autoplot,
        }
    }
}

/// Two-tier tolerance for one channel. `absolute` is the outer hard limit,
/// `typical` the inner soft limit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawChannelSpec")]
pub struct ChannelSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typical: Option<Band>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absolute: Option<Band>,
    /// Plot this channel when a dataset is first opened.
    pub autoplot: bool,
}

impl ChannelSpec {
    pub fn typical(mut self, low: f64, high: f64) -> Self {
        self.typical = Some(Band::new(low, high));
        self
    }

    pub fn absolute(mut self, low: f64, high: f64) -> Self {
        self.absolute = Some(Band::new(low, high));
        self
    }
}

/// Tolerance specs keyed by channel name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelSpecs(pub BTreeMap<String, ChannelSpec>);

impl ChannelSpecs {
    pub fn from_json(json: &str) -> Result<Self> {
        let specs: ChannelSpecs = serde_json::from_str(json)?;
        specs.validate()?;
        Ok(specs)
    }

    pub fn insert(&mut self, channel: impl Into<String>, spec: ChannelSpec) {
        self.0.insert(channel.into(), spec);
    }

    pub fn get(&self, channel: &str) -> Option<&ChannelSpec> {
        self.0.get(channel)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ChannelSpec)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reject non-finite bounds and inverted bands.
    pub fn validate(&self) -> Result<()> {
        for (channel, spec) in &self.0 {
            for band in [spec.typical, spec.absolute].into_iter().flatten() {
                if !band.low.is_finite() || !band.high.is_finite() || band.low > band.high {
                    return Err(GaslensError::InvalidBand {
                        channel: channel.clone(),
                        low: band.low,
                        high: band.high,
                    });
                }
            }
        }
        Ok(())
    }

    /// Re-key specs onto the series' column names, matching after trimming
    /// surrounding whitespace and NFC normalization. Keys with no matching
    /// column are dropped.
    pub fn bind_to(&self, series: &SampleSeries) -> ChannelSpecs {
        let by_key: BTreeMap<String, &ChannelSpec> =
            self.0.iter().map(|(k, v)| (match_key(k), v)).collect();

        let mut bound = ChannelSpecs::default();
        for column in series.channel_names() {
            if let Some(spec) = by_key.get(&match_key(column)) {
                bound.insert(column, (*spec).clone());
            }
        }

        for key in by_key.keys() {
            if !series.channel_names().any(|c| match_key(c) == *key) {
                tracing::warn!("no column matches tolerance entry {key:?}");
            }
        }
        bound
    }

    /// Channels flagged for plotting on open, in name order.
    pub fn autoplot_channels(&self) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(_, spec)| spec.autoplot)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Comparison form of a channel name: trimmed, NFC composed.
fn match_key(name: &str) -> String {
    name.trim().nfc().collect()
}
