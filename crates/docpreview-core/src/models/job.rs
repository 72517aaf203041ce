use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CALLBACK_METHOD, PREVIEW_CONTENT_TYPE, STATUS_COMPLETED};

/// A conversion request accepted by the HTTP endpoint.
///
/// Created once per incoming request and consumed by exactly one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    pub bucket: String,
    pub key: String,
    pub callback_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_method: Option<String>,
}

impl JobRequest {
    /// HTTP method for the callback; `POST` when absent or blank.
    pub fn callback_method(&self) -> &str {
        match self.callback_method.as_deref().map(str::trim) {
            Some(method) if !method.is_empty() => method,
            _ => DEFAULT_CALLBACK_METHOD,
        }
    }
}

/// Metadata of the rendered preview file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewMetadata {
    pub content_hash: String,
    pub content_type: String,
    pub content_size: u64,
    pub width: u32,
    pub height: u32,
}

impl PreviewMetadata {
    pub fn pdf(content_hash: String, content_size: u64, width: u32, height: u32) -> Self {
        Self {
            content_hash,
            content_type: PREVIEW_CONTENT_TYPE.to_string(),
            content_size,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnails {
    pub preview: PreviewMetadata,
}

/// Outcome of a successful job, serialized as the callback body:
///
/// ```json
/// {"status":"completed","thumbnails":{"preview":{"content_hash":"..","content_type":"application/pdf","content_size":1,"width":842,"height":595}}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    pub status: String,
    pub thumbnails: Thumbnails,
}

impl JobResult {
    pub fn completed(preview: PreviewMetadata) -> Self {
        Self {
            status: STATUS_COMPLETED.to_string(),
            thumbnails: Thumbnails { preview },
        }
    }

    pub fn preview(&self) -> &PreviewMetadata {
        &self.thumbnails.preview
    }
}
