use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the field insights crates.
#[derive(Error, Debug)]
pub enum InsightsError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The delimited-text reader rejected the file contents.
    #[error("Failed to tokenize delimited text: {0}")]
    Csv(#[from] csv::Error),

    /// File bytes are not valid in the configured text encoding.
    #[error("File {path} is not valid {encoding} text")]
    EncodingMismatch { path: PathBuf, encoding: String },

    /// An encoding label that `encoding_rs` does not recognise.
    #[error("Unknown text encoding: {0}")]
    UnknownEncoding(String),

    /// None of the supplied paths yielded a readable file.
    #[error("No input files found")]
    NoInputFiles,

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A report could not be serialised.
    #[error("Failed to serialise JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the insights crates.
pub type Result<T> = std::result::Result<T, InsightsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = InsightsError::FileRead {
            path: PathBuf::from("/uploads/visitas.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/uploads/visitas.csv"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_encoding_mismatch() {
        let err = InsightsError::EncodingMismatch {
            path: PathBuf::from("estoque.csv"),
            encoding: "UTF-8".to_string(),
        };
        assert_eq!(err.to_string(), "File estoque.csv is not valid UTF-8 text");
    }

    #[test]
    fn test_error_display_unknown_encoding() {
        let err = InsightsError::UnknownEncoding("klingon-8".to_string());
        assert_eq!(err.to_string(), "Unknown text encoding: klingon-8");
    }

    #[test]
    fn test_error_display_config() {
        let err = InsightsError::Config("no paths given".to_string());
        assert_eq!(err.to_string(), "Configuration error: no paths given");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: InsightsError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: InsightsError = json_err.into();
        assert!(err.to_string().contains("Failed to serialise JSON"));
    }
}
