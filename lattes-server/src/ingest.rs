//! Curriculum ingestion pipeline
//!
//! A batch is a set of named documents (one upload request or one directory
//! import). Every document is extracted first; documents that cannot be read
//! are reported in [`IngestSummary::skipped`] and the rest of the batch goes
//! on. All persistable records are then written in a single transaction, so
//! a database error leaves the store untouched.

use std::path::Path;

use lattes_common::{extract_curriculum, CurriculumRecord, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::db::{insert_publication_if_absent, upsert_researcher};

/// One document submitted for ingestion
#[derive(Debug, Clone)]
pub struct CurriculumFile {
    pub filename: String,
    pub content: Vec<u8>,
}

impl CurriculumFile {
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// A document left out of the batch and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub filename: String,
    pub reason: String,
}

/// Counters reported after a batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub message: String,
    pub files_received: u64,
    pub files_processed: u64,
    pub researchers_added: u64,
    pub publications_added: u64,
    pub skipped: Vec<SkippedFile>,
}

impl IngestSummary {
    fn skip(&mut self, filename: &str, reason: impl Into<String>) {
        self.skipped.push(SkippedFile {
            filename: filename.to_string(),
            reason: reason.into(),
        });
    }
}

/// True for names ending in `.xml`, any case
pub fn is_xml_filename(filename: &str) -> bool {
    filename.to_ascii_lowercase().ends_with(".xml")
}

/// Extract and persist a batch of curriculum documents
#[tracing::instrument(skip_all, fields(batch_id = %Uuid::new_v4(), files = files.len()))]
pub async fn ingest_batch(pool: &SqlitePool, files: &[CurriculumFile]) -> Result<IngestSummary> {
    let mut summary = IngestSummary {
        files_received: files.len() as u64,
        ..Default::default()
    };

    let mut records: Vec<(&str, String, Vec<String>)> = Vec::new();
    for file in files {
        if !is_xml_filename(&file.filename) {
            debug!(filename = %file.filename, "Skipping non-XML file");
            summary.skip(&file.filename, "not an XML file");
            continue;
        }

        match extract_curriculum(&file.content) {
            Ok(CurriculumRecord {
                full_name: Some(full_name),
                titles,
            }) if !titles.is_empty() => {
                records.push((file.filename.as_str(), full_name, titles));
            }
            Ok(CurriculumRecord { full_name: None, .. }) => {
                debug!(filename = %file.filename, "No researcher data");
                summary.skip(&file.filename, "no researcher data");
            }
            Ok(_) => {
                debug!(filename = %file.filename, "No publications");
                summary.skip(&file.filename, "no publications");
            }
            Err(e) => {
                warn!(filename = %file.filename, "Failed to parse curriculum: {}", e);
                summary.skip(&file.filename, format!("parse error: {}", e));
            }
        }
    }

    // Write lock taken at BEGIN; concurrent batches wait on busy_timeout.
    // Dropping the transaction without commit rolls the whole batch back.
    let mut tx = pool.begin_with("BEGIN IMMEDIATE").await?;

    for (filename, full_name, titles) in &records {
        let researcher = upsert_researcher(&mut tx, full_name).await?;
        if researcher.created {
            summary.researchers_added += 1;
        }

        let mut added = 0u64;
        for title in titles {
            if insert_publication_if_absent(&mut tx, title, researcher.id).await? {
                added += 1;
            }
        }
        summary.publications_added += added;
        summary.files_processed += 1;

        debug!(
            filename,
            researcher = %full_name,
            titles = titles.len(),
            added,
            "Curriculum stored"
        );
    }

    tx.commit().await?;

    summary.message = format!("Successfully processed {} XML files", summary.files_processed);
    info!(
        processed = summary.files_processed,
        skipped = summary.skipped.len(),
        researchers_added = summary.researchers_added,
        publications_added = summary.publications_added,
        "Batch ingested"
    );

    Ok(summary)
}

/// Ingest every `.xml` file found under `dir`, recursively
///
/// Files are read in path order. Unreadable entries are reported as skipped.
pub async fn import_directory(pool: &SqlitePool, dir: &Path) -> Result<IngestSummary> {
    if !dir.is_dir() {
        return Err(lattes_common::Error::InvalidInput(format!(
            "Not a directory: {}",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    let mut unreadable = Vec::new();

    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                let name = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| dir.display().to_string());
                unreadable.push(SkippedFile {
                    filename: name,
                    reason: format!("read error: {}", e),
                });
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let filename = path
            .strip_prefix(dir)
            .unwrap_or(path)
            .display()
            .to_string();
        if !is_xml_filename(&filename) {
            continue;
        }

        match tokio::fs::read(path).await {
            Ok(content) => files.push(CurriculumFile::new(filename, content)),
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                unreadable.push(SkippedFile {
                    filename,
                    reason: format!("read error: {}", e),
                });
            }
        }
    }

    info!("Importing {} XML files from {}", files.len(), dir.display());

    let mut summary = ingest_batch(pool, &files).await?;
    summary.files_received += unreadable.len() as u64;
    summary.skipped.extend(unreadable);

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_xml_filename() {
        assert!(is_xml_filename("curriculo.xml"));
        assert!(is_xml_filename("CURRICULO.XML"));
        assert!(is_xml_filename("dir/sub/cv.Xml"));
        assert!(!is_xml_filename("curriculo.xml.zip"));
        assert!(!is_xml_filename("notes.txt"));
        assert!(!is_xml_filename("xml"));
        assert!(is_xml_filename(".xml"));
        assert!(is_xml_filename("dir/.XML"));
    }
}
