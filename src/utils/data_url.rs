//! Parsing and validation of the base64 data URLs produced by the camera
//! and audio capture widgets.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];
const AUDIO_TYPES: &[&str] = &[
    "audio/webm",
    "audio/ogg",
    "audio/wav",
    "audio/x-wav",
    "audio/mpeg",
    "audio/mp4",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataUrlError {
    #[error("Not a data URL")]
    NotDataUrl,

    #[error("Data URL must be base64 encoded")]
    NotBase64,

    #[error("Invalid base64 payload")]
    InvalidPayload,

    #[error("Unsupported media type: {0}")]
    UnsupportedType(String),

    #[error("Content does not match declared media type {0}")]
    ContentMismatch(String),

    #[error("Media exceeds {limit} bytes")]
    TooLarge { limit: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Audio,
}

impl MediaKind {
    fn allowed_types(&self) -> &'static [&'static str] {
        match self {
            MediaKind::Image => IMAGE_TYPES,
            MediaKind::Audio => AUDIO_TYPES,
        }
    }
}

/// A decoded `data:<mime>[;params];base64,<payload>` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    /// Lowercased media type without parameters
    pub mime: String,
    pub data: Vec<u8>,
}

impl DataUrl {
    pub fn parse(raw: &str) -> Result<Self, DataUrlError> {
        let rest = raw
            .trim()
            .strip_prefix("data:")
            .ok_or(DataUrlError::NotDataUrl)?;
        let (header, payload) = rest.split_once(',').ok_or(DataUrlError::NotDataUrl)?;

        let mut parts = header.split(';');
        let mime = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
        if !parts.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
            return Err(DataUrlError::NotBase64);
        }

        let data = STANDARD
            .decode(payload.trim())
            .map_err(|_| DataUrlError::InvalidPayload)?;

        Ok(Self { mime, data })
    }

    /// Parse `raw` and check it holds media of `kind` no larger than
    /// `max_bytes` once decoded.
    pub fn validate(raw: &str, kind: MediaKind, max_bytes: usize) -> Result<Self, DataUrlError> {
        let url = Self::parse(raw)?;

        if !kind.allowed_types().contains(&url.mime.as_str()) {
            return Err(DataUrlError::UnsupportedType(url.mime));
        }
        if url.data.len() > max_bytes {
            return Err(DataUrlError::TooLarge { limit: max_bytes });
        }
        if !matches_magic_bytes(&url.data, &url.mime) {
            return Err(DataUrlError::ContentMismatch(url.mime));
        }

        Ok(url)
    }
}

/// Validate leading bytes against the declared content type.
fn matches_magic_bytes(data: &[u8], content_type: &str) -> bool {
    match content_type {
        "image/jpeg" => data.len() >= 3 && data[..3] == [0xFF, 0xD8, 0xFF],
        "image/png" => data.len() >= 4 && data[..4] == [0x89, 0x50, 0x4E, 0x47],
        "image/gif" => data.len() >= 4 && data[..4] == [0x47, 0x49, 0x46, 0x38],
        "image/webp" => {
            data.len() >= 12 && data[..4] == *b"RIFF" && data[8..12] == *b"WEBP"
        }
        "audio/webm" => data.len() >= 4 && data[..4] == [0x1A, 0x45, 0xDF, 0xA3],
        "audio/ogg" => data.len() >= 4 && data[..4] == *b"OggS",
        "audio/wav" | "audio/x-wav" => {
            data.len() >= 12 && data[..4] == *b"RIFF" && data[8..12] == *b"WAVE"
        }
        "audio/mpeg" => {
            (data.len() >= 3 && data[..3] == *b"ID3")
                || (data.len() >= 2 && data[0] == 0xFF && data[1] & 0xE0 == 0xE0)
        }
        "audio/mp4" => data.len() >= 8 && data[4..8] == *b"ftyp",
        _ => false,
    }
}
