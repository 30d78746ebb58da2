//! statlab-stats: the StatsEngine
//!
//! One module per analysis kind, all pure functions of
//! (dataset, parameters) -> result or structured error. No state survives
//! a call.

pub mod cleaning;
pub mod compare;
pub mod describe;
pub mod diagnostics;
pub mod distribution;
pub mod distributions;
pub mod goodness;
pub mod helpers;
pub mod hypothesis;
pub mod logistic;
pub mod power;
pub mod regression;

pub use statlab_core::{Dataset, StatError, StatResult};
