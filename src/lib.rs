//! Operational-phase detection and tolerance classification for gas-analyzer
//! telemetry.
//!
//! The [`processing`] modules are the analytical core: activity spans, windowed
//! band classification with optional IQR outlier exclusion, and gap-aware
//! plot series. [`data`] and [`report`] are the thin adapters the command-line
//! tool uses to feed the core and show its results.

pub mod data;
pub mod error;
pub mod processing;
pub mod report;
pub mod state;

pub use error::{GaslensError, Result};
pub use processing::classifier::{classify, Status};
pub use processing::gaps::split_at_gaps;
pub use processing::outliers::filter_outliers;
pub use processing::spans::{detect_spans, Interval, OperationalSpan};
pub use processing::statistics::WindowStats;
pub use processing::window::{evaluate, EvaluationOutcome, WindowAccumulator};
pub use state::channel_spec::{Band, ChannelSpec, ChannelSpecs};
pub use state::config::{AnalysisConfig, ColumnIds, EvaluationMode, WarmupThresholds};
pub use state::sample_series::SampleSeries;
