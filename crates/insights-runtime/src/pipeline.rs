//! Batch ingestion: tokenize, detect, normalize, then merge.
//!
//! Each file is parsed in isolation with no shared mutable state, either on
//! tokio's blocking pool or inline when running sequentially. Results are
//! awaited in upload order and merged into the [`RecordStore`] on the calling
//! task, so both modes produce the same store.
//!
//! A file that cannot be read, is not recognised, or fails while being
//! normalised contributes nothing and yields a [`FileNotice`]; it never aborts
//! the batch.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use insights_core::coercion::DateSource;
use insights_data::normalizer::{NormalizedFile, RecordNormalizer};
use insights_data::schema::{SchemaDetector, SchemaKind};
use insights_data::tokenizer::{Tokenizer, UploadedFile};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::store::RecordStore;

// ── Report types ──────────────────────────────────────────────────────────────

/// Non-fatal, user-visible problem with one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileNotice {
    pub file: String,
    pub message: String,
}

/// What happened to one uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileOutcome {
    pub file: String,
    pub kind: SchemaKind,
    pub header_row: Option<usize>,
    pub visits: usize,
    pub inventory_items: usize,
    pub rows_skipped: usize,
    pub notice: Option<FileNotice>,
}

impl FileOutcome {
    fn failed(file: &UploadedFile, message: String) -> Self {
        Self {
            file: file.name.clone(),
            kind: SchemaKind::Unrecognized,
            header_row: None,
            visits: 0,
            inventory_items: 0,
            rows_skipped: 0,
            notice: Some(FileNotice {
                file: file.name.clone(),
                message,
            }),
        }
    }
}

/// One file's outcome plus the records it contributed.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFile {
    pub outcome: FileOutcome,
    pub records: NormalizedFile,
}

impl ParsedFile {
    fn failed(file: &UploadedFile, message: String) -> Self {
        Self {
            outcome: FileOutcome::failed(file, message),
            records: NormalizedFile::default(),
        }
    }
}

/// Summary of one ingestion batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    pub files: Vec<FileOutcome>,
    pub visits_added: usize,
    /// Size of the inventory snapshot that replaced the previous one, if any.
    pub inventory_replaced: Option<usize>,
}

impl IngestReport {
    pub fn notices(&self) -> impl Iterator<Item = &FileNotice> {
        self.files.iter().filter_map(|f| f.notice.as_ref())
    }
}

// ── IngestionPipeline ─────────────────────────────────────────────────────────

/// Parses batches of uploaded files and merges them into a [`RecordStore`].
///
/// Callers must not run two `ingest` calls against the same store
/// concurrently; the `&mut RecordStore` borrow enforces this.
#[derive(Clone)]
pub struct IngestionPipeline {
    tokenizer: Arc<dyn Tokenizer>,
    dates: Arc<dyn DateSource>,
    sequential: bool,
}

impl IngestionPipeline {
    pub fn new(tokenizer: Arc<dyn Tokenizer>, dates: Arc<dyn DateSource>) -> Self {
        Self {
            tokenizer,
            dates,
            sequential: false,
        }
    }

    /// Parse files one after another on the calling task.
    pub fn sequential(mut self, sequential: bool) -> Self {
        self.sequential = sequential;
        self
    }

    /// Parse a single file. Never fails; problems become a notice.
    pub fn parse_file(&self, file: &UploadedFile) -> ParsedFile {
        parse_one(self.tokenizer.as_ref(), self.dates.as_ref(), file)
    }

    /// Parse every file, in upload order.
    pub async fn parse_all(&self, files: Vec<UploadedFile>) -> Vec<ParsedFile> {
        if self.sequential {
            return files.iter().map(|file| self.parse_file(file)).collect();
        }

        let handles: Vec<_> = files
            .into_iter()
            .map(|file| {
                let tokenizer = Arc::clone(&self.tokenizer);
                let dates = Arc::clone(&self.dates);
                let task_file = file.clone();
                let handle = tokio::task::spawn_blocking(move || {
                    parse_one(tokenizer.as_ref(), dates.as_ref(), &task_file)
                });
                (file, handle)
            })
            .collect();

        let mut parsed = Vec::with_capacity(handles.len());
        for (file, handle) in handles {
            match handle.await {
                Ok(result) => parsed.push(result),
                Err(e) => {
                    warn!("Parse worker for {} failed: {}", file.name, e);
                    parsed.push(ParsedFile::failed(&file, format!("Parse worker failed: {e}")));
                }
            }
        }
        parsed
    }

    /// Parse `files` and merge the results into `store`.
    ///
    /// Visits are appended in upload order. Each non-empty inventory result
    /// replaces the snapshot, so the last inventory file wins.
    pub async fn ingest(&self, files: Vec<UploadedFile>, store: &mut RecordStore) -> IngestReport {
        let file_count = files.len();
        let parsed = self.parse_all(files).await;

        let mut report = IngestReport::default();
        for ParsedFile { outcome, records } in parsed {
            if let Some(notice) = &outcome.notice {
                warn!("{}: {}", notice.file, notice.message);
            }

            report.visits_added += records.visits.len();
            store.append_visits(records.visits);

            let inventory_len = records.inventory.len();
            if store.replace_inventory(records.inventory) {
                report.inventory_replaced = Some(inventory_len);
            }

            report.files.push(outcome);
        }

        info!(
            "Ingested {} files: {} visits added ({} total), {} notices",
            file_count,
            report.visits_added,
            store.visits().len(),
            report.notices().count()
        );
        report
    }
}

// ── Per-file parse ────────────────────────────────────────────────────────────

fn parse_one(tokenizer: &dyn Tokenizer, dates: &dyn DateSource, file: &UploadedFile) -> ParsedFile {
    let rows = match tokenizer.tokenize(file) {
        Ok(rows) => rows,
        Err(e) => return ParsedFile::failed(file, e.to_string()),
    };

    let normalized = panic::catch_unwind(AssertUnwindSafe(|| {
        let detection = SchemaDetector::detect(&rows, &file.name);
        let records = RecordNormalizer::new(dates).normalize_file(&detection, &rows);
        (detection, records)
    }));

    let (detection, records) = match normalized {
        Ok(result) => result,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            return ParsedFile::failed(file, format!("Failed while processing rows: {reason}"));
        }
    };

    let notice = if detection.kind() == SchemaKind::Unrecognized {
        Some(FileNotice {
            file: file.name.clone(),
            message: "No known header found; file skipped".to_string(),
        })
    } else {
        None
    };

    debug!(
        "{}: {} (header row {:?}), {} visits, {} inventory items",
        file.name,
        detection.kind(),
        detection.header_row,
        records.visits.len(),
        records.inventory.len()
    );

    ParsedFile {
        outcome: FileOutcome {
            file: file.name.clone(),
            kind: detection.kind(),
            header_row: detection.header_row,
            visits: records.visits.len(),
            inventory_items: records.inventory.len(),
            rows_skipped: records.rows_skipped,
            notice,
        },
        records,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
