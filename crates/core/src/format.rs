use crate::{
    blocks::{Block, BlockKind},
    types::{SummaryReport, VideoInfo},
};

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

/// Render blocks as terminal text, the way they will look on the page
pub fn format_blocks_readable(blocks: &[Block]) -> String {
    let mut output = String::new();
    let mut number = 0;

    for block in blocks {
        match block.kind {
            BlockKind::Heading => {
                number = 0;
                output.push_str(&format!("\n## {}\n\n", block.text));
            }
            BlockKind::Paragraph => {
                number = 0;
                output.push_str(&format!("{}\n", block.text));
            }
            BlockKind::NumberedItem => {
                number += 1;
                output.push_str(&format!("{}. {}\n", number, block.text));
            }
            BlockKind::BulletedItem => {
                let indent = if block.parent.is_some() { "   " } else { "" };
                output.push_str(&format!("{}• {}\n", indent, block.text));
            }
        }
    }

    output.trim_start().to_string()
}

pub fn format_video_info(info: &VideoInfo) -> String {
    let mut output = format!("# {}\n\n", info.title);

    if let Some(duration) = info.duration_seconds {
        output.push_str(&format!("**Duration:** {}\n", format_timestamp(duration)));
    }
    if let Some(uploader) = &info.uploader {
        output.push_str(&format!("**Uploader:** {}\n", uploader));
    }
    if let Some(date) = &info.upload_date {
        output.push_str(&format!("**Uploaded:** {}\n", date));
    }
    if let Some(views) = info.view_count {
        output.push_str(&format!("**Views:** {}\n", views));
    }
    if let Some(description) = info.description.as_deref().filter(|d| !d.is_empty()) {
        output.push_str(&format!("\n{}\n", description));
    }

    output
}

/// Format a summary report as human-readable text
pub fn format_report_readable(report: &SummaryReport) -> String {
    let mut output = format_video_info(&report.info);
    output.push('\n');
    output.push_str(&format_blocks_readable(&report.blocks));

    if let Some(page) = &report.notion_page {
        output.push_str(&format!("\n**Notion:** {}\n", page.url));
    }

    output
}
