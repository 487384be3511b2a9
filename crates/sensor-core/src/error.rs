use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the sensor statistics pipeline.
#[derive(Error, Debug)]
pub enum SensorError {
    /// The input file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The report (or run summary) could not be written.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The OS refused to start an aggregation worker thread.
    #[error("Failed to spawn aggregation worker {worker}: {source}")]
    WorkerSpawn {
        worker: usize,
        #[source]
        source: std::io::Error,
    },

    /// An aggregation worker panicked before finishing its slice.
    #[error("Aggregation worker {worker} panicked")]
    WorkerPanicked { worker: usize },

    /// A JSON document could not be produced.
    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the sensor crates.
pub type Result<T> = std::result::Result<T, SensorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = SensorError::FileRead {
            path: PathBuf::from("/data/devices.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/data/devices.csv"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_file_write() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err = SensorError::FileWrite {
            path: PathBuf::from("/out/sensor_stats.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to write file /out/sensor_stats.csv"));
        assert!(msg.contains("read-only"));
    }

    #[test]
    fn test_error_display_worker_spawn() {
        let io_err = std::io::Error::new(std::io::ErrorKind::OutOfMemory, "no threads left");
        let err = SensorError::WorkerSpawn {
            worker: 3,
            source: io_err,
        };
        assert_eq!(
            err.to_string(),
            "Failed to spawn aggregation worker 3: no threads left"
        );
    }

    #[test]
    fn test_error_display_worker_panicked() {
        let err = SensorError::WorkerPanicked { worker: 2 };
        assert_eq!(err.to_string(), "Aggregation worker 2 panicked");
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: SensorError = json_err.into();
        assert!(err.to_string().contains("Failed to serialize JSON"));
    }
}
