use crate::error::ExtractError;
use crate::extractor::{extract_document_text, EntityRecognizer};
use crate::models::CatalogRecord;
use crate::store::CatalogStore;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

pub fn discover_pdf_files(folder: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(folder)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();

    files.sort_unstable();
    files
}

pub fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

pub struct SkippedPdf {
    pub path: PathBuf,
    pub reason: String,
}

pub struct IngestionReport {
    pub ingested: Vec<String>,
    pub skipped: Vec<SkippedPdf>,
    pub finished_at: DateTime<Utc>,
}

/// Best effort per file: a PDF that cannot be read, recognized, or stored
/// lands in the report with its reason instead of aborting the run.
pub async fn ingest_folder<R, S>(
    folder: &Path,
    recognizer: &R,
    store: &S,
) -> Result<IngestionReport, ExtractError>
where
    R: EntityRecognizer + Send + Sync,
    S: CatalogStore + Send + Sync,
{
    let files = discover_pdf_files(folder);

    if files.is_empty() {
        return Err(ExtractError::InvalidArgument(format!(
            "no pdf files found in {}",
            folder.display()
        )));
    }

    let mut ingested = Vec::new();
    let mut skipped = Vec::new();
    let mut seen_checksums = HashSet::new();

    for path in files {
        match ingest_one(&path, recognizer, store, &mut seen_checksums).await {
            Ok(Some(document_id)) => {
                info!(document_id = %document_id, "spec sheet ingested");
                ingested.push(document_id);
            }
            Ok(None) => skipped.push(SkippedPdf {
                reason: "duplicate content".to_string(),
                path,
            }),
            Err(reason) => {
                warn!(path = %path.display(), reason = %reason, "spec sheet skipped");
                skipped.push(SkippedPdf { path, reason });
            }
        }
    }

    Ok(IngestionReport {
        ingested,
        skipped,
        finished_at: Utc::now(),
    })
}

async fn ingest_one<R, S>(
    path: &Path,
    recognizer: &R,
    store: &S,
    seen_checksums: &mut HashSet<String>,
) -> Result<Option<String>, String>
where
    R: EntityRecognizer + Send + Sync,
    S: CatalogStore + Send + Sync,
{
    let document_id = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| format!("path missing filename: {}", path.display()))?
        .to_string();

    let bytes = fs::read(path).map_err(|error| error.to_string())?;
    if !seen_checksums.insert(digest_bytes(&bytes)) {
        return Ok(None);
    }

    let text = extract_document_text(&bytes).map_err(|error| error.to_string())?;
    let entities = recognizer
        .recognize_entities(&text)
        .await
        .map_err(|error| error.to_string())?;

    store
        .insert(&CatalogRecord::new(document_id.clone(), entities))
        .await
        .map_err(|error| error.to_string())?;

    Ok(Some(document_id))
}
