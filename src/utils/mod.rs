//! Utils Module
pub mod telemetry;
pub mod truncate;

pub use telemetry::init_logging;
pub use truncate::truncate_text;
