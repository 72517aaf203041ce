//! Metadata extractor - content fingerprint, size and page geometry of a PDF

use crate::command::{CommandRunner, ProcessError};
use docpreview_core::PreviewMetadata;
use md5::{Digest, Md5};
use regex::Regex;
use std::ffi::OsString;
use std::path::Path;
use std::sync::{Arc, LazyLock};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

static PAGE_SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Page size:\s+([0-9]+(?:\.[0-9]*)?) x ([0-9]+(?:\.[0-9]*)?) pts")
        .expect("page size pattern is valid")
});

const READ_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum MetadataError {
    /// Opening or reading the file failed
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Tool(#[from] ProcessError),

    #[error("Invalid pdfinfo output")]
    InvalidToolOutput,
}

impl MetadataError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, MetadataError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Page dimensions in PostScript points
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageSize {
    pub width: u32,
    pub height: u32,
}

/// Parse the first `Page size: W x H pts` line of pdfinfo output.
///
/// Decimal values are rounded. A captured value that still fails to parse
/// becomes 0; only a missing line is an error.
pub fn parse_page_size(output: &str) -> Result<PageSize, MetadataError> {
    let caps = PAGE_SIZE_RE
        .captures(output)
        .ok_or(MetadataError::InvalidToolOutput)?;

    Ok(PageSize {
        width: parse_points(&caps[1]),
        height: parse_points(&caps[2]),
    })
}

fn parse_points(value: &str) -> u32 {
    match value.parse::<f64>() {
        Ok(points) if points.is_finite() && points >= 0.0 => points.round() as u32,
        _ => 0,
    }
}

/// Hex-encoded MD5 of the file contents, read in chunks.
pub async fn content_hash(path: &Path) -> Result<String, MetadataError> {
    let mut file = File::open(path).await?;
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    let hash = hex::encode(hasher.finalize());
    if hash.is_empty() {
        return Ok("0".to_string());
    }
    Ok(hash)
}

pub struct MetadataExtractor {
    pdf_info_path: String,
    runner: Arc<dyn CommandRunner>,
}

impl MetadataExtractor {
    pub fn new(pdf_info_path: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            pdf_info_path: pdf_info_path.into(),
            runner,
        }
    }

    /// Build preview metadata for a rendered PDF.
    #[tracing::instrument(skip_all, fields(
        process.executable.path = %self.pdf_info_path,
        file = %path.display()
    ))]
    pub async fn extract(&self, path: &Path) -> Result<PreviewMetadata, MetadataError> {
        let content_hash = content_hash(path).await?;
        let content_size = tokio::fs::metadata(path).await?.len();
        let page = self.page_size(path).await?;

        tracing::debug!(
            content_hash = %content_hash,
            size_bytes = content_size,
            width = page.width,
            height = page.height,
            "Preview metadata extracted"
        );

        Ok(PreviewMetadata::pdf(
            content_hash,
            content_size,
            page.width,
            page.height,
        ))
    }

    async fn page_size(&self, path: &Path) -> Result<PageSize, MetadataError> {
        let args = [OsString::from(path.as_os_str())];
        let output = self.runner.run(&self.pdf_info_path, &args).await?;
        if !output.success() {
            return Err(ProcessError::failed(&self.pdf_info_path, &output).into());
        }
        parse_page_size(&output.stdout_lossy())
    }
}
