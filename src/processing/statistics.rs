use serde::{Deserialize, Serialize};

use crate::state::channel_spec::ChannelSpec;

/// Summary of one channel's values inside an evaluation window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Values inside the typical band; `None` when no typical band is set.
    pub in_typical: Option<usize>,
    /// Values inside the absolute band; `None` when no absolute band is set.
    pub in_absolute: Option<usize>,
}

impl WindowStats {
    /// Compute statistics from values, ignoring NaN. `None` when nothing is left.
    pub fn compute(values: &[f64], spec: &ChannelSpec) -> Option<Self> {
        let vals: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if vals.is_empty() {
            return None;
        }

        let count = vals.len();
        let min = vals.iter().copied().fold(f64::INFINITY, f64::min);
        let max = vals.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = vals.iter().sum::<f64>() / count as f64;

        let in_typical = spec
            .typical
            .map(|band| vals.iter().filter(|&&v| band.contains(v)).count());
        let in_absolute = spec
            .absolute
            .map(|band| vals.iter().filter(|&&v| band.contains(v)).count());

        Some(WindowStats {
            count,
            min,
            max,
            mean,
            in_typical,
            in_absolute,
        })
    }

    /// Format as the multi-line block shown in the statistics window.
    pub fn report(&self, label: &str) -> String {
        let mut out = format!(
            "{}:\n  Mean: {:.2}\n  Min:  {:.2}\n  Max:  {:.2}\n",
            label, self.mean, self.min, self.max
        );
        if let Some(k) = self.in_typical {
            out.push_str(&format!("  In Typical: {}/{}\n", k, self.count));
        }
        if let Some(k) = self.in_absolute {
            out.push_str(&format!("  In Absolute: {}/{}\n", k, self.count));
        }
        out
    }
}
