//! vidnote core library
//!
//! Extract audio from a video URL, transcribe and summarize it with an AI
//! provider, and file the result as a structured Notion page.

pub mod blocks;
pub mod cache;
pub mod config;
pub mod error;
pub mod format;
pub mod markdown;
pub mod notion;
pub mod persist;
pub mod pipeline;
pub mod provider;
pub mod types;

// Re-export commonly used items at crate root
pub use blocks::{Block, BlockKind, classify, summary_to_blocks};
pub use cache::{
    find_audio_in_cache, get_cache_dir, get_info_path, get_summary_path, get_transcript_path,
};
pub use config::Config;
pub use error::{Result, VidnoteError};
pub use format::{format_blocks_readable, format_report_readable, format_video_info};
pub use notion::{NotionClient, NotionError, NotionPage, PageStore};
pub use persist::{SummaryPage, persist_best_effort, persist_summary};
pub use pipeline::{
    extract_audio, fetch_video_info, load_json, save_json, summarize, transcribe_audio,
};
pub use provider::Provider;
pub use types::{ExtractedAudio, Summary, SummaryReport, Transcript, VideoInfo};
