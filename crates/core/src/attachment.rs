//! Attachment metadata and download-reference resolution.
//!
//! Stored references come in two shapes: absolute filesystem paths written by
//! older uploaders (`D:\data\uploads\projects\teamA\spec.pdf`,
//! `/srv/portal/uploads/projects/teamA/spec.pdf`) and logical storage keys
//! (`uploads/projects/teamA/spec.pdf`, `spec.pdf`). Both resolve to the same
//! relative key (`teamA/spec.pdf`) that the storage collaborator serves. This
//! module performs no I/O.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{new_id, Actor, EmployeeId, EntityId, Timestamp};

/// Path segment that marks the start of the storage-relative part of a path.
pub const UPLOADS_SEGMENT: &str = "uploads";

/// Fixed key prefix stripped from every resolved reference.
pub const KEY_PREFIX: &str = "uploads/projects/";

/// Maximum length of an attachment's display name.
pub const MAX_ATTACHMENT_NAME_LENGTH: usize = 255;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: EntityId,
    pub name: String,
    /// Filesystem path or logical key exactly as recorded at upload time.
    pub stored_ref: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub uploaded_by: EmployeeId,
    pub uploaded_at: Timestamp,
}

/// Input for recording an attachment on a project, sprint, or deliverable.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAttachment {
    pub name: String,
    pub stored_ref: String,
    pub content_type: Option<String>,
    #[serde(default)]
    pub size_bytes: u64,
}

impl Attachment {
    pub fn new(input: &NewAttachment, actor: &Actor, at: Timestamp) -> Result<Self, CoreError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("attachment name is required".into()));
        }
        if name.chars().count() > MAX_ATTACHMENT_NAME_LENGTH {
            return Err(CoreError::Validation(format!(
                "attachment name exceeds {MAX_ATTACHMENT_NAME_LENGTH} characters"
            )));
        }
        // Reject references that can never be downloaded.
        resolve_download_reference(&input.stored_ref)?;

        Ok(Self {
            id: new_id(),
            name: name.to_string(),
            stored_ref: input.stored_ref.trim().to_string(),
            content_type: input
                .content_type
                .clone()
                .filter(|ct| !ct.trim().is_empty())
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            size_bytes: input.size_bytes,
            uploaded_by: actor.user_id.clone(),
            uploaded_at: at,
        })
    }

    pub fn download_reference(&self) -> Result<String, CoreError> {
        resolve_download_reference(&self.stored_ref)
    }
}

/// Normalize a stored reference into a storage-relative download key.
///
/// - A reference with a `/` or `\` separator, or a drive-letter prefix, is a
///   path: everything from the `uploads` segment onward is kept (the whole
///   path when there is no such segment), separators collapse to single
///   forward slashes, and a leading `uploads/projects/` is stripped.
/// - Anything else is already a logical key.
///
/// Empty references, references containing `..`, and references that reduce
/// to nothing fail with `InvalidAttachmentReference`.
pub fn resolve_download_reference(stored: &str) -> Result<String, CoreError> {
    let stored = stored.trim();
    if stored.is_empty() {
        return Err(CoreError::InvalidAttachmentReference(
            "stored reference is empty".into(),
        ));
    }

    let (has_drive, rest) = split_drive_prefix(stored);
    let segments: Vec<&str> = if has_drive || rest.contains(['/', '\\']) {
        let all: Vec<&str> = rest
            .split(['/', '\\'])
            .filter(|segment| !segment.is_empty())
            .collect();
        let start = all
            .iter()
            .position(|segment| *segment == UPLOADS_SEGMENT)
            .unwrap_or(0);
        all[start..].to_vec()
    } else {
        vec![rest]
    };

    if segments.iter().any(|segment| *segment == "..") {
        return Err(CoreError::InvalidAttachmentReference(format!(
            "'{stored}' escapes the storage root"
        )));
    }

    let key = segments.join("/");
    let key = key.strip_prefix(KEY_PREFIX).unwrap_or(&key);
    if key.is_empty() || key == KEY_PREFIX.trim_end_matches('/') {
        return Err(CoreError::InvalidAttachmentReference(format!(
            "'{stored}' does not name a file"
        )));
    }
    Ok(key.to_string())
}

/// Split a leading `X:` drive designator off a Windows path.
fn split_drive_prefix(path: &str) -> (bool, &str) {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        (true, &path[2..])
    } else {
        (false, path)
    }
}
