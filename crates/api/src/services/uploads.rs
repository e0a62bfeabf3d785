//! Product image storage on the local filesystem.
//!
//! Files are written under the configured upload directory with a random
//! name and served back by the static `/uploads` route.
//!
//! An upload is accepted only when its declared content type is on the image
//! allow-list and its leading bytes are that same format.

use std::path::PathBuf;

use thiserror::Error;
use url::Url;
use uuid::Uuid;

/// Largest accepted image, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Only JPEG, PNG, WebP and GIF images are allowed")]
    UnsupportedType,

    #[error("File content does not match its type")]
    ContentMismatch,

    #[error("File is empty")]
    Empty,

    #[error("File exceeds {max} bytes")]
    TooLarge { max: usize },

    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// Whether the client sent something unacceptable (as opposed to a
    /// server-side storage failure).
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageKind {
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl ImageKind {
    fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Gif => "gif",
        }
    }

    fn matches(self, bytes: &[u8]) -> bool {
        match self {
            Self::Jpeg => bytes.starts_with(&[0xFF, 0xD8, 0xFF]),
            Self::Png => bytes.starts_with(b"\x89PNG\r\n\x1a\n"),
            Self::Webp => bytes.starts_with(b"RIFF") && bytes.get(8..12) == Some(&b"WEBP"[..]),
            Self::Gif => bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a"),
        }
    }
}

/// Writes images to disk and builds their public URLs.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    public_base_url: Url,
}

impl UploadStore {
    #[must_use]
    pub const fn new(dir: PathBuf, public_base_url: Url) -> Self {
        Self {
            dir,
            public_base_url,
        }
    }

    /// Validate and store an image, returning its public URL.
    ///
    /// # Errors
    ///
    /// Returns a client error for unsupported, mismatched, empty or oversized
    /// files, and `UploadError::Io` if writing fails.
    pub async fn save(&self, content_type: &str, bytes: &[u8]) -> Result<String, UploadError> {
        let kind = ImageKind::from_content_type(content_type).ok_or(UploadError::UnsupportedType)?;
        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(UploadError::TooLarge {
                max: MAX_UPLOAD_BYTES,
            });
        }
        if !kind.matches(bytes) {
            return Err(UploadError::ContentMismatch);
        }

        let file_name = format!("{}.{}", Uuid::new_v4(), kind.extension());
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&file_name), bytes).await?;

        tracing::info!(file = %file_name, size = bytes.len(), "Image uploaded");
        Ok(self.public_url(&file_name))
    }

    fn public_url(&self, file_name: &str) -> String {
        format!(
            "{}/uploads/{file_name}",
            self.public_base_url.as_str().trim_end_matches('/')
        )
    }
}
