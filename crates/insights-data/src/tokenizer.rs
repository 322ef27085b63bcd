//! Delimited-text discovery and tokenizing.
//!
//! Turns export files into rows of raw string cells. The rest of the
//! pipeline only sees the [`Tokenizer`] trait, so tests can feed rows from
//! memory.

use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use encoding_rs::Encoding;
use insights_core::error::{InsightsError, Result};
use tracing::{debug, warn};

/// Raw rows of one file, cells untrimmed.
pub type Rows = Vec<Vec<String>>;

const DELIMITER_CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];
const DELIMITER_SAMPLE_LINES: usize = 10;
const EXPORT_EXTENSIONS: [&str; 2] = ["csv", "txt"];

// ── UploadedFile ──────────────────────────────────────────────────────────────

/// A file handed to the ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Display name; schema detection inspects it (e.g. `silvicultura`).
    pub name: String,
    pub path: PathBuf,
}

impl UploadedFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Self { name, path }
    }
}

/// Produces rows of string cells for an uploaded file.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, file: &UploadedFile) -> Result<Rows>;
}

// ── Discovery ─────────────────────────────────────────────────────────────────

/// Expand `paths` into upload order.
///
/// Plain files are kept in the order given. Directories are walked
/// recursively for `.csv`/`.txt` files, sorted by path. Missing paths are
/// logged and skipped.
pub fn find_export_files(paths: &[PathBuf]) -> Vec<UploadedFile> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(UploadedFile::from_path(path));
        } else if path.is_dir() {
            let mut found: Vec<PathBuf> = walkdir::WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file() && is_export_file(entry.path()))
                .map(|entry| entry.into_path())
                .collect();
            found.sort();
            debug!("Found {} export files under {}", found.len(), path.display());
            files.extend(found.into_iter().map(UploadedFile::from_path));
        } else {
            warn!("Input path does not exist: {}", path.display());
        }
    }

    files
}

fn is_export_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| EXPORT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

// ── Encoding ──────────────────────────────────────────────────────────────────

/// Resolve a WHATWG encoding label (`utf-8`, `iso-8859-1`, `latin1`, ...).
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| InsightsError::UnknownEncoding(label.to_string()))
}

// ── CsvTokenizer ──────────────────────────────────────────────────────────────

/// Reads files from disk, decodes them and splits them with an auto-detected
/// delimiter.
#[derive(Debug, Clone, Copy)]
pub struct CsvTokenizer {
    encoding: &'static Encoding,
}

impl CsvTokenizer {
    pub fn new(encoding_label: &str) -> Result<Self> {
        Ok(Self {
            encoding: resolve_encoding(encoding_label)?,
        })
    }

    /// Canonical name of the configured encoding.
    pub fn encoding_name(&self) -> &'static str {
        self.encoding.name()
    }

    /// Decode `bytes` with the configured encoding.
    ///
    /// Bytes that are invalid in the encoding are an error rather than being
    /// replaced, so a wrong `--encoding` surfaces instead of producing
    /// mangled names.
    pub fn decode(&self, path: &Path, bytes: &[u8]) -> Result<String> {
        let (text, _, had_errors) = self.encoding.decode(bytes);
        if had_errors {
            return Err(InsightsError::EncodingMismatch {
                path: path.to_path_buf(),
                encoding: self.encoding.name().to_string(),
            });
        }
        Ok(text.into_owned())
    }

    /// Split decoded text into rows, dropping rows whose cells are all blank.
    pub fn tokenize_str(&self, content: &str) -> Result<Rows> {
        let delimiter = detect_delimiter(content);
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(content.as_bytes());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(rows)
    }
}

impl Tokenizer for CsvTokenizer {
    fn tokenize(&self, file: &UploadedFile) -> Result<Rows> {
        let bytes = std::fs::read(&file.path).map_err(|source| InsightsError::FileRead {
            path: file.path.clone(),
            source,
        })?;
        let content = self.decode(&file.path, &bytes)?;
        let rows = self.tokenize_str(&content)?;
        debug!("Tokenized {}: {} rows", file.name, rows.len());
        Ok(rows)
    }
}

/// Pick the delimiter whose per-line count is highest and most consistent
/// over the first lines. Defaults to `,`.
pub fn detect_delimiter(content: &str) -> u8 {
    let sample: Vec<&str> = content.lines().take(DELIMITER_SAMPLE_LINES).collect();
    if sample.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0.0f64;

    for &delimiter in &DELIMITER_CANDIDATES {
        let counts: Vec<f64> = sample
            .iter()
            .map(|line| line.bytes().filter(|&b| b == delimiter).count() as f64)
            .collect();
        let avg = counts.iter().sum::<f64>() / counts.len() as f64;
        let variance = counts.iter().map(|c| (c - avg).powi(2)).sum::<f64>() / counts.len() as f64;
        let score = avg / (1.0 + variance.sqrt());

        if score > best_score {
            best_score = score;
            best = delimiter;
        }
    }

    best
}

// ── Tests ─────────────────────────────────────────────────────────────────────
