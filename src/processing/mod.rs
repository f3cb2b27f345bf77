pub mod classifier;
pub mod gaps;
pub mod outliers;
pub mod spans;
pub mod statistics;
pub mod view_range;
pub mod window;
