pub mod datetime;
pub mod loader;
