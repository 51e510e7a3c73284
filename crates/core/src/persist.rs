use chrono::Local;

use crate::{
    blocks::Block,
    notion::{NotionError, NotionPage, PageRequest, PageStore},
    types::VideoInfo,
};

pub const DEFAULT_CATEGORY: &str = "Video";
const FALLBACK_TITLE: &str = "Video Summary";
const UNKNOWN_AUTHOR: &str = "Unknown";

/// Inputs for filing one summary page.
pub struct SummaryPage<'a> {
    pub url: &'a str,
    pub info: &'a VideoInfo,
    pub transcript: &'a str,
    pub summary_blocks: &'a [Block],
    pub title: Option<&'a str>,
    pub category: Option<&'a str>,
    pub author: Option<&'a str>,
}

pub fn page_title(custom: Option<&str>, video_title: &str) -> String {
    match custom.map(str::trim).filter(|t| !t.is_empty()) {
        Some(title) => title.to_string(),
        None if video_title.trim().is_empty() => FALLBACK_TITLE.to_string(),
        None => format!("Summary: {}", video_title.trim()),
    }
}

pub fn video_details(info: &VideoInfo, url: &str) -> String {
    let mut details = format!("Original Title: {}\nURL: {}", info.title, url);
    if let Some(duration) = info.duration_seconds.filter(|d| *d > 0.0) {
        details.push_str(&format!("\nDuration: {:.1} seconds", duration));
    }
    details
}

/// Page content: the converted summary, then the video details and the full
/// transcript.
pub fn page_children(summary_blocks: &[Block], info: &VideoInfo, url: &str, transcript: &str) -> Vec<Block> {
    let mut children = summary_blocks.to_vec();
    children.extend([
        Block::heading("Video Details"),
        Block::paragraph(video_details(info, url)),
        Block::heading("Full Transcript"),
        Block::paragraph(transcript),
    ]);
    children
}

impl SummaryPage<'_> {
    pub fn to_request(&self) -> PageRequest {
        let author = self
            .author
            .or(self.info.uploader.as_deref())
            .filter(|a| !a.trim().is_empty())
            .unwrap_or(UNKNOWN_AUTHOR);

        PageRequest {
            title: page_title(self.title, &self.info.title),
            category: self.category.unwrap_or(DEFAULT_CATEGORY).to_string(),
            author: author.to_string(),
            created_at: Local::now(),
            children: page_children(self.summary_blocks, self.info, self.url, self.transcript),
        }
    }
}

/// File the summary page. Errors are returned to the caller unchanged.
pub async fn persist_summary<S: PageStore>(
    store: &S,
    database_id: &str,
    page: &SummaryPage<'_>,
) -> Result<NotionPage, NotionError> {
    let page = store.create_page(database_id, &page.to_request()).await?;
    tracing::info!(page_id = %page.id, url = %page.url, "summary saved to Notion");
    Ok(page)
}

/// Persistence is secondary to producing the summary: a failure is logged and
/// reported as `None`, never as an error of the whole run. A page that was
/// created but not fully written is still returned.
pub async fn persist_best_effort<S: PageStore>(
    store: &S,
    database_id: &str,
    page: &SummaryPage<'_>,
) -> Option<NotionPage> {
    match persist_summary(store, database_id, page).await {
        Ok(page) => Some(page),
        Err(NotionError::Incomplete { page, source }) => {
            tracing::warn!(error = %source, page_id = %page.id, "summary page saved without all of its content");
            Some(page)
        }
        Err(e) => {
            tracing::warn!(error = %e, database_id, "could not save summary to Notion");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::blocks::BlockKind;

    #[derive(Default)]
    struct RecordingStore {
        fail: bool,
        fail_append: bool,
        requests: Mutex<Vec<(String, PageRequest)>>,
    }

    impl PageStore for RecordingStore {
        async fn create_page(
            &self,
            database_id: &str,
            page: &PageRequest,
        ) -> Result<NotionPage, NotionError> {
            self.requests
                .lock()
                .unwrap()
                .push((database_id.to_string(), page.clone()));
            if self.fail {
                return Err(NotionError::Api {
                    status: 401,
                    message: "API token is invalid.".into(),
                });
            }
            let created = NotionPage {
                id: "page-1".into(),
                url: "https://notion.so/page-1".into(),
            };
            if self.fail_append {
                return Err(NotionError::Incomplete {
                    page: created,
                    source: Box::new(NotionError::Api {
                        status: 503,
                        message: "Service Unavailable".into(),
                    }),
                });
            }
            Ok(created)
        }
    }

    fn info() -> VideoInfo {
        VideoInfo {
            title: "Index funds".into(),
            duration_seconds: Some(61.0),
            uploader: Some("investor".into()),
            ..Default::default()
        }
    }

    #[rstest]
    #[case(Some("Custom"), "Video", "Custom")]
    #[case(Some("   "), "Video", "Summary: Video")]
    #[case(None, "Video", "Summary: Video")]
    #[case(None, "", "Video Summary")]
    fn titles(#[case] custom: Option<&str>, #[case] video: &str, #[case] expected: &str) {
        assert_eq!(page_title(custom, video), expected);
    }

    #[test]
    fn details_include_duration_only_when_known() {
        assert_eq!(
            video_details(&info(), "https://x.test/v"),
            "Original Title: Index funds\nURL: https://x.test/v\nDuration: 61.0 seconds"
        );
        let no_duration = VideoInfo {
            duration_seconds: Some(0.0),
            ..info()
        };
        assert_eq!(
            video_details(&no_duration, "u"),
            "Original Title: Index funds\nURL: u"
        );
    }

    #[test]
    fn children_append_fixed_sections() {
        let summary = vec![Block::heading("Summary"), Block::paragraph("Body")];
        let children = page_children(&summary, &info(), "u", "the transcript");
        let kinds: Vec<BlockKind> = children.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![
                BlockKind::Heading,
                BlockKind::Paragraph,
                BlockKind::Heading,
                BlockKind::Paragraph,
                BlockKind::Heading,
                BlockKind::Paragraph,
            ]
        );
        assert_eq!(children[2].text, "Video Details");
        assert_eq!(children[4].text, "Full Transcript");
        assert_eq!(children[5].text, "the transcript");
    }

    fn page<'a>(info: &'a VideoInfo, blocks: &'a [Block]) -> SummaryPage<'a> {
        SummaryPage {
            url: "https://x.test/v",
            info,
            transcript: "words",
            summary_blocks: blocks,
            title: None,
            category: None,
            author: None,
        }
    }

    #[test]
    fn request_defaults_author_to_uploader() {
        let info = info();
        let request = page(&info, &[]).to_request();
        assert_eq!(request.title, "Summary: Index funds");
        assert_eq!(request.category, "Video");
        assert_eq!(request.author, "investor");

        let anonymous = VideoInfo {
            uploader: None,
            ..info
        };
        assert_eq!(page(&anonymous, &[]).to_request().author, "Unknown");
    }

    #[tokio::test]
    async fn persists_to_the_given_database() {
        let store = RecordingStore::default();
        let info = info();
        let blocks = [Block::heading("Summary")];
        let saved = persist_summary(&store, "db-9", &page(&info, &blocks)).await.unwrap();

        assert_eq!(saved.id, "page-1");
        let requests = store.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, "db-9");
        assert_eq!(requests[0].1.children.len(), 5);
    }

    #[tokio::test]
    async fn store_failure_is_swallowed_by_best_effort() {
        let store = RecordingStore {
            fail: true,
            ..Default::default()
        };
        let info = info();
        let summary = page(&info, &[]);

        assert!(matches!(
            persist_summary(&store, "db", &summary).await,
            Err(NotionError::Api { status: 401, .. })
        ));
        assert_eq!(persist_best_effort(&store, "db", &summary).await, None);
    }

    #[tokio::test]
    async fn partially_written_page_is_still_reported() {
        let store = RecordingStore {
            fail_append: true,
            ..Default::default()
        };
        let info = info();
        let summary = page(&info, &[]);

        assert!(matches!(
            persist_summary(&store, "db", &summary).await,
            Err(NotionError::Incomplete { .. })
        ));
        let saved = persist_best_effort(&store, "db", &summary).await;
        assert_eq!(saved.map(|p| p.id), Some("page-1".to_string()));
    }
}
