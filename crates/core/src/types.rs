use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{blocks::Block, notion::NotionPage};

/// Metadata reported by `yt-dlp --dump-single-json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "duration")]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub upload_date: Option<String>,
    #[serde(default)]
    pub view_count: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub webpage_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExtractedAudio {
    pub path: PathBuf,
    pub info: VideoInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
}

impl Transcript {
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub text: String,
    /// False when the model ignored the JSON format and the raw reply was kept.
    pub structured: bool,
}

/// Everything produced for one video.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub url: String,
    pub info: VideoInfo,
    pub transcript: String,
    pub summary: String,
    pub blocks: Vec<Block>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notion_page: Option<NotionPage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_info_from_yt_dlp_json() {
        let info: VideoInfo = serde_json::from_str(
            r#"{"title": "Compound interest", "duration": 61.5, "uploader": "finance_guy",
                "view_count": 1200, "formats": [], "webpage_url": "https://example.com/v"}"#,
        )
        .unwrap();
        assert_eq!(info.title, "Compound interest");
        assert_eq!(info.duration_seconds, Some(61.5));
        assert_eq!(info.uploader.as_deref(), Some("finance_guy"));
        assert_eq!(info.view_count, Some(1200));
        assert!(info.description.is_none());
    }

    #[test]
    fn null_duration_is_none() {
        let info: VideoInfo = serde_json::from_str(r#"{"title": "Live", "duration": null}"#).unwrap();
        assert!(info.duration_seconds.is_none());
    }

    #[test]
    fn transcript_word_count() {
        let t = Transcript {
            text: "  one two\nthree\tfour ".into(),
        };
        assert_eq!(t.word_count(), 4);
    }
}
