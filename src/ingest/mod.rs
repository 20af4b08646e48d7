//! Content ingestion adapters.
//!
//! Each adapter turns an external resource into plain text for the prompt:
//!
//! - [`web`]: web pages, plus PDFs served over HTTP
//! - [`youtube`]: YouTube video transcripts
//! - [`pdf`]: local PDF files
//!
//! [`Ingestor`] picks the adapter for a link and records metrics and logs.

pub mod html;
pub mod pdf;
pub mod web;
pub mod youtube;

use std::fmt;
use std::sync::{Arc, LazyLock};
use std::time::Instant;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use crate::observability::{INGEST_BYTES, INGEST_DURATION, INGEST_FAILURES, INGEST_LOADS};
use crate::{Error, Result};

pub use pdf::{PdfLoader, extract_pdf_text};
pub use web::WebPageLoader;
pub use youtube::YoutubeTranscriptLoader;

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("regex"));
static YOUTUBE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:https?://)?(?:www\.)?(?:youtube\.com|youtu\.be)/(?:watch\?v=)?([\w-]{11})")
        .expect("regex")
});

/// Characters that end a sentence rather than a URL.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}', '>', '"', '\''];

/// What kind of resource a piece of content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// An HTML (or plain text) web page.
    WebPage,
    /// The transcript of a YouTube video.
    YoutubeTranscript,
    /// A PDF document.
    Pdf,
}

impl ContentKind {
    /// How the content is described to the model.
    pub fn prompt_label(self) -> &'static str {
        match self {
            ContentKind::WebPage => "da página web",
            ContentKind::YoutubeTranscript => "da transcrição do vídeo do YouTube",
            ContentKind::Pdf => "do documento PDF",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentKind::WebPage => "web page",
            ContentKind::YoutubeTranscript => "YouTube transcript",
            ContentKind::Pdf => "PDF",
        };
        f.write_str(name)
    }
}

/// Plain text extracted from an external resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedContent {
    /// The kind of resource.
    pub kind: ContentKind,
    /// The URL or path it was loaded from.
    pub source: String,
    /// The extracted text.
    pub text: String,
}

impl IngestedContent {
    /// Create new ingested content.
    pub fn new(kind: ContentKind, source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind,
            source: source.into(),
            text: text.into(),
        }
    }
}

/// Converts an external resource into plain text.
#[async_trait::async_trait]
pub trait ContentLoader: Send + Sync {
    /// Load the resource named by `source` (a URL or a path).
    async fn load(&self, source: &str) -> Result<IngestedContent>;
}

/// Returns the first `http(s)://` URL in `text`, without trailing punctuation.
///
/// A closing bracket is kept when the URL opened it, as in
/// `https://pt.wikipedia.org/wiki/Python_(linguagem_de_programação)`.
pub fn find_url(text: &str) -> Option<&str> {
    let mut url = URL_PATTERN.find(text)?.as_str();
    while let Some(last) = url.chars().last() {
        if !TRAILING_PUNCTUATION.contains(&last) || closes_a_bracket_in(url, last) {
            break;
        }
        url = &url[..url.len() - last.len_utf8()];
    }
    // "http://" alone is not a link.
    let (_, rest) = url.split_once("://")?;
    (!rest.is_empty()).then_some(url)
}

fn closes_a_bracket_in(url: &str, last: char) -> bool {
    let open = match last {
        ')' => '(',
        ']' => '[',
        '}' => '{',
        _ => return false,
    };
    let opened = url.chars().filter(|&c| c == open).count();
    let closed = url.chars().filter(|&c| c == last).count();
    closed <= opened
}

/// Returns true if `url` points at a YouTube video.
pub fn is_youtube_url(url: &str) -> bool {
    YOUTUBE_PATTERN.is_match(url)
}

/// The 11-character video id of a YouTube link.
pub fn youtube_video_id(url: &str) -> Option<&str> {
    YOUTUBE_PATTERN
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Parse `source` and require an `http` or `https` URL with a host.
pub fn validate_http_url(source: &str) -> Result<Url> {
    let url = Url::parse(source)?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        "http" | "https" => Err(Error::validation(
            "URL has no host",
            Some(source.to_string()),
        )),
        scheme => Err(Error::validation(
            format!("only http/https links can be read, got '{scheme}'"),
            Some(source.to_string()),
        )),
    }
}

/// Routes links and files to the right adapter.
#[derive(Clone)]
pub struct Ingestor {
    web: Arc<dyn ContentLoader>,
    youtube: Arc<dyn ContentLoader>,
    pdf: Arc<dyn ContentLoader>,
}

impl Ingestor {
    /// Create an ingestor with the network-backed adapters.
    ///
    /// `languages` orders the preferred transcript languages.
    pub fn new(languages: Vec<String>) -> Result<Self> {
        Ok(Self {
            web: Arc::new(WebPageLoader::new()?),
            youtube: Arc::new(YoutubeTranscriptLoader::new(languages)?),
            pdf: Arc::new(PdfLoader::new()),
        })
    }

    /// Create an ingestor from explicit adapters.
    pub fn with_loaders(
        web: Arc<dyn ContentLoader>,
        youtube: Arc<dyn ContentLoader>,
        pdf: Arc<dyn ContentLoader>,
    ) -> Self {
        Self { web, youtube, pdf }
    }

    /// Load the text behind a link, choosing the adapter from the URL.
    pub async fn load_url(&self, url: &str) -> Result<IngestedContent> {
        if is_youtube_url(url) {
            info!(url, "loading YouTube transcript");
            self.timed(self.youtube.as_ref(), url).await
        } else {
            info!(url, "loading web page");
            self.timed(self.web.as_ref(), url).await
        }
    }

    /// Load the text of a local PDF file.
    pub async fn load_pdf(&self, path: &str) -> Result<IngestedContent> {
        info!(path, "loading PDF");
        self.timed(self.pdf.as_ref(), path).await
    }

    async fn timed(&self, loader: &dyn ContentLoader, source: &str) -> Result<IngestedContent> {
        INGEST_LOADS.click();
        let start = Instant::now();
        let result = loader.load(source).await;
        INGEST_DURATION.add(start.elapsed().as_secs_f64());
        match &result {
            Ok(content) => {
                INGEST_BYTES.count(content.text.len() as u64);
                info!(source, kind = %content.kind, chars = content.text.chars().count(), "content loaded");
            }
            Err(err) => {
                INGEST_FAILURES.click();
                warn!(source, error = %err, "failed to load content");
            }
        }
        result
    }
}
