//! Multi-criteria product scoring: normalization, hybrid CRITIC weighting,
//! multiplicative utility aggregation and contextual re-scoring.

pub mod catalog;
pub mod config;
pub mod error;
pub mod scoring;
pub mod telemetry;
