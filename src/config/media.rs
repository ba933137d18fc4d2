use super::parse_env;

const DEFAULT_MAX_MEDIA_BYTES: usize = 10 * 1024 * 1024; // 10 MB

#[derive(Debug, Clone, Copy)]
pub struct MediaConfig {
    /// Limit on each decoded image or audio payload
    pub max_bytes: usize,
    /// Limit on a whole request body. Base64 inflates media by a third and
    /// a report carries up to two files.
    pub body_limit: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self::with_max_bytes(DEFAULT_MAX_MEDIA_BYTES)
    }
}

impl MediaConfig {
    pub fn from_env() -> Self {
        match parse_env::<usize>("MEDIA_MAX_BYTES") {
            Some(max) if max > 0 => Self::with_max_bytes(max),
            _ => Self::default(),
        }
    }

    fn with_max_bytes(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            body_limit: max_bytes.saturating_mul(3) + 64 * 1024,
        }
    }
}
