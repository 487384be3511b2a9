//! Data layer for the sensor statistics pipeline.
//!
//! Responsible for decoding the pipe-delimited device export, partitioning
//! it across worker threads, aggregating per-device monthly statistics into
//! a shared accumulator table, and rendering the semicolon-delimited report.

pub mod aggregator;
pub mod analysis;
pub mod partition;
pub mod reader;
pub mod report;
pub mod table;

pub use sensor_core as core;
