use std::path::PathBuf;

use thiserror::Error;

use crate::notion::NotionError;

#[derive(Error, Debug)]
pub enum VidnoteError {
    #[error("Download failed for {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("Audio extraction failed for {url}: {reason}")]
    AudioExtractionFailed { url: String, reason: String },

    #[error("Transcription failed for {audio_path}: {reason}")]
    TranscriptionFailed { audio_path: PathBuf, reason: String },

    #[error("Summary generation failed: {reason}")]
    SummaryFailed { reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },

    #[error(transparent)]
    Notion(#[from] NotionError),
}

pub type Result<T> = std::result::Result<T, VidnoteError>;
