pub mod channel_spec;
pub mod config;
pub mod sample_series;
