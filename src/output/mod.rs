//! Output: exposition aggregation, persistence, and rollup statistics

pub mod aggregate;
pub mod stats;
pub mod store;

pub use aggregate::finalize;
pub use stats::{rollup, ExpoRollup, MergedStats};
pub use store::{ExpositionLock, ExpositionStore};
