use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tokio::{fs, process::Command};

use crate::{
    config::Config,
    error::{Result, VidnoteError},
    provider::Provider,
    types::{ExtractedAudio, Summary, Transcript, VideoInfo},
};

pub const TRANSCRIPTION_MODEL: &str = "gpt-4o-transcribe";
const MIN_SUMMARY_TOKENS: usize = 300;
const MAX_SUMMARY_TOKENS: usize = 1000;

static SUMMARY_SYSTEM_PROMPT: &str = r#"You are a helpful assistant that summarizes video transcripts into notes.

Create concise summaries focused on key takeaways. No filler, and skip any sponsor segments or ads.

Format the summary so it reads well as a Notion page:
- Use numbered key points ("1.", "2.", ...), at most 20
- Put supporting details for a key point on the lines right after it, each starting with "•"
- Use plain sentences for any introduction or conclusion
- Do not use markdown headings, bold or italics

You MUST output ONLY valid JSON with this exact structure (no markdown, no explanation):
{"summary": "<the formatted summary, lines separated by \n>"}"#;

/// Fetch video metadata with yt-dlp, without downloading anything.
pub async fn fetch_video_info(url: &str) -> Result<VideoInfo> {
    tracing::debug!(url, "fetching video info");
    let output = Command::new("yt-dlp")
        .arg(url)
        .arg("--dump-single-json")
        .arg("--no-playlist")
        .arg("--no-warnings")
        .output()
        .await?;

    if !output.status.success() {
        return Err(VidnoteError::DownloadFailed {
            url: url.to_string(),
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(serde_json::from_slice(&output.stdout)?)
}

/// yt-dlp `--audio-quality` value. `best` maps to 192 kbit/s.
pub fn audio_quality_arg(quality: &str) -> &str {
    if quality.eq_ignore_ascii_case("best") {
        "192K"
    } else {
        quality
    }
}

/// Download the audio track of `url` into `work_dir` as `audio.<format>`.
pub async fn extract_audio(
    url: &str,
    work_dir: &Path,
    audio_format: &str,
    quality: &str,
) -> Result<ExtractedAudio> {
    let info = fetch_video_info(url).await?;
    tracing::info!(title = %info.title, duration = ?info.duration_seconds, "video found");

    let output_template = work_dir.join("audio.%(ext)s");
    let output = Command::new("yt-dlp")
        .arg(url)
        .arg("--no-playlist")
        .arg("-f")
        .arg("bestaudio/best")
        .arg("-x")
        .arg("--audio-format")
        .arg(audio_format)
        .arg("--audio-quality")
        .arg(audio_quality_arg(quality))
        .arg("--print")
        .arg("after_move:filepath")
        .arg("-o")
        .arg(&output_template)
        .output()
        .await?;

    if !output.status.success() {
        return Err(VidnoteError::AudioExtractionFailed {
            url: url.to_string(),
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let path = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| work_dir.join(format!("audio.{audio_format}")));

    if !path.exists() {
        return Err(VidnoteError::AudioExtractionFailed {
            url: url.to_string(),
            reason: format!(
                "Audio file not found after extraction. Expected: {}",
                path.display()
            ),
        });
    }

    Ok(ExtractedAudio { path, info })
}

/// Transcribe an audio file with the OpenAI transcription endpoint.
pub async fn transcribe_audio(
    http: &reqwest::Client,
    config: &Config,
    audio_path: &Path,
) -> Result<Transcript> {
    let api_key = config.openai_key()?;
    let bytes = fs::read(audio_path).await?;
    let file_name = audio_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio".to_string());

    let form = reqwest::multipart::Form::new()
        .text("model", TRANSCRIPTION_MODEL)
        .part(
            "file",
            reqwest::multipart::Part::bytes(bytes).file_name(file_name),
        );

    tracing::debug!(path = %audio_path.display(), "uploading audio for transcription");
    let response = http
        .post(config.transcription_url())
        .bearer_auth(api_key)
        .multipart(form)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(VidnoteError::TranscriptionFailed {
            audio_path: audio_path.to_path_buf(),
            reason: format!("{}: {}", status, response.text().await.unwrap_or_default()),
        });
    }

    let body = response.json::<Value>().await?;
    let text = body["text"]
        .as_str()
        .ok_or_else(|| VidnoteError::TranscriptionFailed {
            audio_path: audio_path.to_path_buf(),
            reason: format!("Invalid API response: {:?}", body),
        })?;

    Ok(Transcript {
        text: text.trim().to_string(),
    })
}

/// `max_tokens` for the summary: one per transcript word, clamped to 300..=1000.
pub fn summary_token_budget(transcript: &Transcript) -> usize {
    transcript
        .word_count()
        .clamp(MIN_SUMMARY_TOKENS, MAX_SUMMARY_TOKENS)
}

pub fn summary_request(model: &str, transcript: &Transcript) -> Value {
    json!({
        "model": model,
        "messages": [
            {
                "role": "system",
                "content": SUMMARY_SYSTEM_PROMPT,
            },
            {
                "role": "user",
                "content": format!(
                    "Please summarize this transcript focusing on key takeaways:\n\n{}",
                    transcript.text
                ),
            },
        ],
        "max_tokens": summary_token_budget(transcript),
        "temperature": 0.3,
    })
}

#[derive(Deserialize)]
struct SummaryPayload {
    summary: String,
}

/// Pull the summary out of a model reply. Replies that are not the requested
/// JSON object (fenced or not) are kept verbatim.
pub fn parse_summary(content: &str) -> Summary {
    let trimmed = content.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    match serde_json::from_str::<SummaryPayload>(unfenced) {
        Ok(payload) if !payload.summary.trim().is_empty() => Summary {
            text: payload.summary.trim().to_string(),
            structured: true,
        },
        _ => {
            tracing::debug!("summary reply is not JSON, using raw text");
            Summary {
                text: trimmed.to_string(),
                structured: false,
            }
        }
    }
}

/// Summarize a transcript with a chat-completion provider.
pub async fn summarize(
    http: &reqwest::Client,
    config: &Config,
    provider: &Provider,
    transcript: &Transcript,
) -> Result<Summary> {
    let api_key = config.provider_key(provider)?;
    let model = provider.config().model;

    tracing::debug!(provider = provider.name(), model, "requesting summary");
    let response = http
        .post(config.chat_url(provider))
        .bearer_auth(api_key)
        .json(&summary_request(model, transcript))
        .send()
        .await?
        .json::<Value>()
        .await?;

    let content = response["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| VidnoteError::SummaryFailed {
            reason: format!("Invalid API response: {:?}", response),
        })?;

    Ok(parse_summary(content))
}

pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json_content = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&json_content)?)
}

pub async fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let pretty_json = serde_json::to_string_pretty(value)?;
    fs::write(path, &pretty_json).await?;
    Ok(())
}
