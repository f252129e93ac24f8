//! # Attachment Encoder
//!
//! Turns a locally selected image into a base64 payload ready for the chat
//! request. The size ceiling is enforced before any bytes are encoded.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use serde::Serialize;
use thiserror::Error;

/// Ceiling used by the image-intelligence flow (4 MiB).
pub const DEFAULT_MAX_ATTACHMENT_BYTES: u64 = 4 * 1024 * 1024;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EncodedImage {
    /// Standard-alphabet base64, no data-URI prefix.
    pub data: String,
    pub mime_type: String,
}

impl EncodedImage {
    /// `data:<mime>;base64,<data>`, the form the chat endpoint accepts as `imageUrl`.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("image is {size} bytes, the limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A file picked by the user, not yet encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    /// Reads an image from disk. The on-disk size is checked first so an
    /// oversized file is never loaded.
    pub fn read(path: &Path, limit: u64) -> Result<Self, AttachmentError> {
        let io_err = |source: io::Error| AttachmentError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mime_type = mime_guess::from_path(path)
            .first()
            .filter(|mime| mime.type_() == mime_guess::mime::IMAGE)
            .ok_or_else(|| AttachmentError::UnsupportedType(path.display().to_string()))?;

        let size = fs::metadata(path).map_err(io_err)?.len();
        if size > limit {
            return Err(AttachmentError::TooLarge { size, limit });
        }

        let bytes = fs::read(path).map_err(io_err)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            name,
            mime_type: mime_type.essence_str().to_string(),
            bytes,
        })
    }
}

/// Encodes a selected file, rejecting anything over `limit` bytes.
pub fn encode(file: &SelectedFile, limit: u64) -> Result<EncodedImage, AttachmentError> {
    let size = file.bytes.len() as u64;
    if size > limit {
        return Err(AttachmentError::TooLarge { size, limit });
    }
    if !file.mime_type.starts_with("image/") {
        return Err(AttachmentError::UnsupportedType(file.mime_type.clone()));
    }
    Ok(EncodedImage {
        data: base64::engine::general_purpose::STANDARD.encode(&file.bytes),
        mime_type: file.mime_type.clone(),
    })
}
