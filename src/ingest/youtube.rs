//! YouTube transcript adapter.
//!
//! The watch page embeds the player response, whose `captions` object lists
//! every caption track. The chosen track's timed-text XML is downloaded and
//! flattened into one paragraph.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::{Client, header};
use serde::Deserialize;
use tracing::debug;

use super::html::strip_tags;
use super::web::USER_AGENT;
use super::{ContentKind, ContentLoader, IngestedContent, youtube_video_id};
use crate::{Error, Result};

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

static SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<text\b[^>]*>([\s\S]*?)</text>").expect("regex"));
static VIDEO_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""title":("(?:[^"\\]|\\.)*")"#).expect("regex"));
static VIDEO_AUTHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""author":("(?:[^"\\]|\\.)*")"#).expect("regex"));

/// One caption track advertised by the player response.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CaptionTrack {
    /// Timed-text URL for the track.
    #[serde(rename = "baseUrl")]
    pub base_url: String,

    /// BCP-47 language code, e.g. `pt` or `en-US`.
    #[serde(rename = "languageCode")]
    pub language_code: String,

    /// `asr` for auto-generated tracks.
    #[serde(default)]
    pub kind: Option<String>,
}

impl CaptionTrack {
    /// Returns true for automatically generated captions.
    pub fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }

    fn matches_language(&self, language: &str) -> bool {
        let code = self.language_code.to_ascii_lowercase();
        let language = language.to_ascii_lowercase();
        code == language
            || code
                .split_once('-')
                .is_some_and(|(primary, _)| primary == language)
    }
}

#[derive(Deserialize)]
struct Captions {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    renderer: Option<TracklistRenderer>,
}

#[derive(Deserialize)]
struct TracklistRenderer {
    #[serde(rename = "captionTracks", default)]
    caption_tracks: Vec<CaptionTrack>,
}

/// Title and channel of a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoInfo {
    /// Video title.
    pub title: String,
    /// Channel name.
    pub author: String,
}

/// Loads the transcript of a YouTube video.
#[derive(Debug, Clone)]
pub struct YoutubeTranscriptLoader {
    client: Client,
    languages: Vec<String>,
    add_video_info: bool,
}

impl YoutubeTranscriptLoader {
    /// Create a loader preferring `languages`, in order.
    pub fn new(languages: Vec<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {e}"),
                    Some(Box::new(e)),
                )
            })?;
        Ok(Self {
            client,
            languages,
            add_video_info: true,
        })
    }

    /// Whether the title and channel are prepended to the transcript.
    pub fn with_video_info(mut self, add_video_info: bool) -> Self {
        self.add_video_info = add_video_info;
        self
    }

    async fn get_text(&self, url: &str, source: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT_LANGUAGE, "pt-BR,pt;q=0.9,en;q=0.8")
            .send()
            .await
            .map_err(|e| Error::fetch(format!("request failed: {e}"), Some(source.to_string())))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch(
                format!("YouTube answered HTTP {status}"),
                Some(source.to_string()),
            ));
        }
        response.text().await.map_err(|e| {
            Error::fetch(format!("failed to read body: {e}"), Some(source.to_string()))
        })
    }
}

#[async_trait::async_trait]
impl ContentLoader for YoutubeTranscriptLoader {
    async fn load(&self, source: &str) -> Result<IngestedContent> {
        let video_id = youtube_video_id(source)
            .ok_or_else(|| Error::validation("not a YouTube video link", Some(source.to_string())))?;

        let page = self
            .get_text(&format!("{WATCH_URL}{video_id}"), source)
            .await?;
        let tracks = caption_tracks(&page)?;
        let track = select_track(&tracks, &self.languages).ok_or_else(|| {
            let available = tracks
                .iter()
                .map(|t| t.language_code.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            Error::extraction(format!(
                "no captions in {} (available: {available})",
                self.languages.join(", ")
            ))
        })?;
        debug!(video_id, language = %track.language_code, generated = track.is_generated(), "selected caption track");

        let xml = self.get_text(&track.base_url, source).await?;
        let transcript = transcript_text(&xml);
        if transcript.is_empty() {
            return Err(Error::extraction("caption track is empty"));
        }

        let text = match video_info(&page).filter(|_| self.add_video_info) {
            Some(info) => format!(
                "Título: {}\nCanal: {}\n\n{transcript}",
                info.title, info.author
            ),
            None => transcript,
        };
        Ok(IngestedContent::new(
            ContentKind::YoutubeTranscript,
            source,
            text,
        ))
    }
}

/// Read the caption track list out of a watch page.
pub fn caption_tracks(page: &str) -> Result<Vec<CaptionTrack>> {
    let Some((_, after)) = page.split_once("\"captions\":") else {
        if page.contains("class=\"g-recaptcha\"") {
            return Err(Error::fetch("YouTube is rate limiting this client", None));
        }
        if !page.contains("\"playabilityStatus\":") {
            return Err(Error::extraction("page is not a YouTube video"));
        }
        return Err(Error::extraction("video is unavailable or has no captions"));
    };
    let json = after
        .split_once(",\"videoDetails")
        .map(|(json, _)| json)
        .ok_or_else(|| Error::extraction("malformed player response"))?;
    let captions: Captions = serde_json::from_str(&json.replace('\n', "")).map_err(|e| {
        Error::serialization(format!("malformed caption list: {e}"), Some(Box::new(e)))
    })?;
    let tracks = captions
        .renderer
        .map(|r| r.caption_tracks)
        .unwrap_or_default();
    if tracks.is_empty() {
        return Err(Error::extraction("video has no captions"));
    }
    Ok(tracks)
}

/// Pick the first track in `languages` order, manual captions first.
pub fn select_track<'a>(tracks: &'a [CaptionTrack], languages: &[String]) -> Option<&'a CaptionTrack> {
    languages.iter().find_map(|language| {
        let (generated, manual): (Vec<&CaptionTrack>, Vec<&CaptionTrack>) = tracks
            .iter()
            .filter(|t| t.matches_language(language))
            .partition(|t| t.is_generated());
        manual.into_iter().chain(generated).next()
    })
}

/// Flatten timed-text XML into a single line of text.
pub fn transcript_text(xml: &str) -> String {
    SEGMENT
        .captures_iter(xml)
        .filter_map(|c| c.get(1))
        // Segments are escaped twice: `&amp;#39;` is an apostrophe.
        .map(|m| strip_tags(&html_escape::decode_html_entities(m.as_str())))
        .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Title and author from the `videoDetails` block of a watch page.
pub fn video_info(page: &str) -> Option<VideoInfo> {
    let (_, details) = page.split_once("\"videoDetails\":")?;
    let decode = |re: &Regex| -> Option<String> {
        let quoted = re.captures(details)?.get(1)?.as_str();
        serde_json::from_str::<String>(quoted).ok()
    };
    Some(VideoInfo {
        title: decode(&VIDEO_TITLE)?,
        author: decode(&VIDEO_AUTHOR)?,
    })
}
