use serde::{Deserialize, Serialize};

use crate::error::{GaslensError, Result};

/// Which samples feed classification and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationMode {
    /// Every sample in the visible window.
    All,
    /// Only samples inside running phases.
    Running,
    /// Running phases, then 1.5×IQR outlier exclusion per channel.
    Iqr,
}

impl Default for EvaluationMode {
    fn default() -> Self {
        EvaluationMode::Iqr
    }
}

impl EvaluationMode {
    pub fn label(&self) -> &'static str {
        match self {
            EvaluationMode::All => "None",
            EvaluationMode::Running => "Running",
            EvaluationMode::Iqr => "IQR",
        }
    }

    /// Whether the window is intersected with the running phases.
    pub fn restricts_to_running(&self) -> bool {
        matches!(self, EvaluationMode::Running | EvaluationMode::Iqr)
    }
}

/// Temperatures (°C) both sensors must reach before the instrument counts as warm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WarmupThresholds {
    pub cavity: f64,
    pub enclosure: f64,
}

impl Default for WarmupThresholds {
    fn default() -> Self {
        Self {
            cavity: 55.0,
            enclosure: 54.0,
        }
    }
}

/// Names of the columns the analysis needs to find in a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnIds {
    pub time: String,
    pub activity: String,
    pub cavity_temp: String,
    pub enclosure_temp: String,
}

impl Default for ColumnIds {
    fn default() -> Self {
        Self {
            time: "SECONDS (secs)".to_string(),
            activity: "NDX (num)".to_string(),
            cavity_temp: "CAVITY_T (C)".to_string(),
            enclosure_temp: "THERMAL_ENCLOSURE_T (C)".to_string(),
        }
    }
}

/// Tunables shared by every analysis call. Times are in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Plot discontinuity threshold.
    pub gap_threshold: f64,
    /// Largest gap between active samples that still belongs to one block.
    pub max_block_gap: f64,
    pub warmup: WarmupThresholds,
    /// Width of the shutdown phase at the end of each block.
    pub shutdown_threshold: f64,
    /// Instrument value meaning "not recorded".
    pub error_code: Option<f64>,
    pub mode: EvaluationMode,
    pub columns: ColumnIds,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            gap_threshold: 2.0,
            max_block_gap: 10.0,
            warmup: WarmupThresholds::default(),
            shutdown_threshold: 2.0,
            error_code: None,
            mode: EvaluationMode::default(),
            columns: ColumnIds::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// `value`, unless it is missing or equal to the error code.
    pub fn recorded(&self, value: Option<f64>) -> Option<f64> {
        value.filter(|v| self.error_code != Some(*v))
    }

    pub fn validate(&self) -> Result<()> {
        let durations = [
            ("gap_threshold", self.gap_threshold),
            ("max_block_gap", self.max_block_gap),
            ("shutdown_threshold", self.shutdown_threshold),
        ];
        for (name, value) in durations {
            if !value.is_finite() || value < 0.0 {
                return Err(GaslensError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if !self.warmup.cavity.is_finite() || !self.warmup.enclosure.is_finite() {
            return Err(GaslensError::InvalidConfig(
                "warm-up thresholds must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = AnalysisConfig::from_json(r#"{"shutdown_threshold": 5, "mode": "running"}"#)
            .unwrap();
        assert_eq!(config.shutdown_threshold, 5.0);
        assert_eq!(config.mode, EvaluationMode::Running);
        assert_eq!(config.max_block_gap, 10.0);
        assert_eq!(config.warmup, WarmupThresholds::default());
    }

    #[test]
    fn negative_threshold_rejected() {
        let err = AnalysisConfig::from_json(r#"{"max_block_gap": -1}"#).unwrap_err();
        assert!(matches!(err, GaslensError::InvalidConfig(_)));
    }

    #[test]
    fn error_code_reads_as_missing() {
        let config = AnalysisConfig {
            error_code: Some(-9999.0),
            ..AnalysisConfig::default()
        };
        assert_eq!(config.recorded(Some(-9999.0)), None);
        assert_eq!(config.recorded(Some(410.0)), Some(410.0));
        assert_eq!(config.recorded(None), None);
        assert_eq!(AnalysisConfig::default().recorded(Some(-9999.0)), Some(-9999.0));
    }

    #[test]
    fn only_running_and_iqr_restrict() {
        assert!(!EvaluationMode::All.restricts_to_running());
        assert!(EvaluationMode::Running.restricts_to_running());
        assert!(EvaluationMode::Iqr.restricts_to_running());
    }
}
