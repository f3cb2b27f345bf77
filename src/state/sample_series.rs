use serde::{Deserialize, Serialize};

use crate::error::{GaslensError, Result};

/// One numeric channel of a series. `None` marks a sample that was not recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Column-major table of instrument samples sharing one time axis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampleSeries {
    pub time_column: String,
    /// Elapsed seconds, one per row.
    pub time: Vec<f64>,
    channels: Vec<Channel>,
}

impl SampleSeries {
    pub fn new(time_column: impl Into<String>, time: Vec<f64>) -> Self {
        Self {
            time_column: time_column.into(),
            time,
            channels: Vec::new(),
        }
    }

    /// Build a series from raw named columns, picking `time_column` as the time axis.
    /// Rows without a timestamp are dropped.
    pub fn from_columns(time_column: &str, columns: Vec<(String, Vec<Option<f64>>)>) -> Result<Self> {
        let time_idx = columns
            .iter()
            .position(|(name, _)| name == time_column)
            .ok_or_else(|| GaslensError::MissingColumn(time_column.to_string()))?;

        let keep: Vec<bool> = columns[time_idx].1.iter().map(|t| t.is_some_and(f64::is_finite)).collect();
        let time: Vec<f64> = columns[time_idx].1.iter().flatten().copied().filter(|t| t.is_finite()).collect();

        let mut series = SampleSeries::new(time_column, time);
        for (i, (name, values)) in columns.into_iter().enumerate() {
            if i == time_idx {
                continue;
            }
            let values = values
                .into_iter()
                .zip(keep.iter())
                .filter(|&(_, &k)| k)
                .map(|(v, _)| v)
                .collect();
            series.push_channel(name, values);
        }
        Ok(series)
    }

    /// Add or replace a channel. Short columns are padded with absent values.
    pub fn push_channel(&mut self, name: impl Into<String>, mut values: Vec<Option<f64>>) {
        let name = name.into();
        values.resize(self.time.len(), None);
        if let Some(existing) = self.channels.iter_mut().find(|c| c.name == name) {
            existing.values = values;
        } else {
            self.channels.push(Channel { name, values });
        }
    }

    pub fn with_channel(mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        self.push_channel(name, values);
        self
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn channel(&self, name: &str) -> Option<&[Option<f64>]> {
        self.channels
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(|c| c.name.as_str())
    }

    /// Channel values with absent samples as NaN, ready for a plot line.
    pub fn plot_values(&self, name: &str) -> Option<Vec<f64>> {
        self.channel(name)
            .map(|values| values.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }

    /// Mark every value equal to the instrument error code as absent.
    /// Returns how many values were cleared.
    pub fn clean_error_codes(&mut self, error_code: f64) -> usize {
        let mut cleared = 0;
        for channel in &mut self.channels {
            for v in channel.values.iter_mut() {
                if *v == Some(error_code) {
                    *v = None;
                    cleared += 1;
                }
            }
        }
        if cleared > 0 {
            tracing::debug!("cleared {cleared} error-code values ({error_code})");
        }
        cleared
    }

    pub fn is_sorted(&self) -> bool {
        self.time.windows(2).all(|w| w[0] <= w[1])
    }

    /// Row indices in ascending time order. Stable for equal timestamps;
    /// NaN timestamps go last.
    pub fn time_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.time.len()).collect();
        if !self.is_sorted() {
            order.sort_by(|&a, &b| self.time[a].total_cmp(&self.time[b]));
        }
        order
    }

    /// Reorder all rows by ascending time.
    pub fn sort_by_time(&mut self) {
        if self.is_sorted() {
            return;
        }
        let order = self.time_order();
        self.time = order.iter().map(|&i| self.time[i]).collect();
        for channel in &mut self.channels {
            channel.values = order.iter().map(|&i| channel.values[i]).collect();
        }
    }

    /// Append the rows of `other`. Channels missing on either side are padded with absent values.
    pub fn append(&mut self, other: SampleSeries) {
        let old_len = self.time.len();
        let added = other.time.len();
        self.time.extend(other.time);

        for channel in &mut self.channels {
            channel.values.resize(old_len + added, None);
        }
        for incoming in other.channels {
            match self.channels.iter_mut().find(|c| c.name == incoming.name) {
                Some(existing) => {
                    existing.values.truncate(old_len);
                    existing.values.extend(incoming.values);
                    existing.values.resize(old_len + added, None);
                }
                None => {
                    let mut values = vec![None; old_len];
                    values.extend(incoming.values);
                    values.resize(old_len + added, None);
                    self.channels.push(Channel {
                        name: incoming.name,
                        values,
                    });
                }
            }
        }
    }
}
