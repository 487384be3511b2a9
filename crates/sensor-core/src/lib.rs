//! Domain types shared by the sensor statistics crates.
//!
//! Readings, accumulator keys and per-channel statistics, the eligibility
//! cutoff, report number formatting, the error type and CLI settings.

pub mod error;
pub mod formatting;
pub mod models;
pub mod period;
pub mod settings;
pub mod summation;
