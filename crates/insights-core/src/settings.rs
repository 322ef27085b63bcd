use clap::Parser;
use std::path::PathBuf;

use crate::models::ALL_LOCATIONS;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Field-service and inventory analytics over messy spreadsheet exports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "field-insights",
    about = "Field-service and inventory analytics over messy spreadsheet exports",
    version
)]
pub struct Settings {
    /// Export files or directories to ingest, in upload order
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Text encoding of the exports (e.g. iso-8859-1, windows-1252, utf-8)
    #[arg(long, env = "FIELD_INSIGHTS_ENCODING", default_value = "iso-8859-1")]
    pub encoding: String,

    /// Restrict the dashboard to one location
    #[arg(long, default_value = ALL_LOCATIONS)]
    pub location: String,

    /// Open the detail view for this producer
    #[arg(long)]
    pub producer: Option<String>,

    /// Output format
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Parse files one after another instead of on parallel workers
    #[arg(long)]
    pub sequential: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Append log output to this file instead of stderr
    #[arg(long, env = "FIELD_INSIGHTS_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments and apply the `--debug` override.
    pub fn load() -> Self {
        Self::load_from_args(std::env::args_os())
    }

    /// Same as [`Settings::load`] with an explicit argument list.
    pub fn load_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut settings = Settings::parse_from(args);
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// `true` when output should be JSON.
    pub fn json_output(&self) -> bool {
        self.format == "json"
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::load_from_args(["field-insights", "visitas.csv"]);
        assert_eq!(s.paths, vec![PathBuf::from("visitas.csv")]);
        assert_eq!(s.encoding, "iso-8859-1");
        assert_eq!(s.location, ALL_LOCATIONS);
        assert!(s.producer.is_none());
        assert_eq!(s.format, "text");
        assert!(!s.sequential);
        assert_eq!(s.log_level, "INFO");
        assert!(!s.json_output());
    }

    #[test]
    fn test_multiple_paths_keep_order() {
        let s = Settings::load_from_args(["field-insights", "b.csv", "a.csv", "dir"]);
        let names: Vec<_> = s.paths.iter().map(|p| p.to_string_lossy().to_string()).collect();
        assert_eq!(names, vec!["b.csv", "a.csv", "dir"]);
    }

    #[test]
    fn test_debug_overrides_log_level() {
        let s = Settings::load_from_args(["field-insights", "--debug", "x.csv"]);
        assert_eq!(s.log_level, "DEBUG");
    }

    #[test]
    fn test_explicit_flags() {
        let s = Settings::load_from_args([
            "field-insights",
            "--encoding",
            "utf-8",
            "--location",
            "Jeceaba",
            "--producer",
            "Joao",
            "--format",
            "json",
            "--sequential",
            "x.csv",
        ]);
        assert_eq!(s.encoding, "utf-8");
        assert_eq!(s.location, "Jeceaba");
        assert_eq!(s.producer.as_deref(), Some("Joao"));
        assert!(s.json_output());
        assert!(s.sequential);
    }

    #[test]
    fn test_rejects_unknown_format() {
        let result = Settings::try_parse_from(["field-insights", "--format", "xml", "x.csv"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_requires_paths() {
        let result = Settings::try_parse_from(["field-insights"]);
        assert!(result.is_err());
    }
}
