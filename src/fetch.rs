//! Resource fetching
//!
//! Downloads one absolute URL with category-appropriate request semantics
//! and efficient streaming. Every network problem is normalized into a
//! `FetchOutcome::Failure` value; nothing escapes this module as a panic
//! or a raw error.

use anyhow::{Context, Result};
use base64::Engine;
use futures::StreamExt;
use reqwest::Client;

use crate::config::InlineConfig;
use crate::constants::{ACCEPT_LANGUAGE, CHROME_USER_AGENT};
use crate::transform::is_svg_url;
use crate::types::ResourceCategory;

/// Outcome of fetching one resource, always returned as a value
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Success(FetchedBody),
    Failure(FetchFailure),
}

/// A fully streamed response body plus the transport metadata the
/// transformer needs
#[derive(Debug, Clone)]
pub struct FetchedBody {
    pub bytes: Vec<u8>,
    /// Declared `Content-Type`, parameters included
    pub content_type: Option<String>,
    /// Charset declared in the `Content-Type`, if any
    pub charset: Option<String>,
    /// Declared `Content-Encoding` (gzip, deflate, br)
    pub content_encoding: Option<String>,
}

/// A normalized fetch failure carrying the offending URL and cause
#[derive(Debug, Clone)]
pub struct FetchFailure {
    pub url: String,
    pub reason: String,
}

/// Per-category `Accept` header value, mirroring what Chrome sends for
/// the corresponding request destination
#[must_use]
pub fn accept_for(category: ResourceCategory) -> &'static str {
    match category {
        ResourceCategory::Image => "image/avif,image/webp,image/apng,image/*,*/*;q=0.8",
        ResourceCategory::Stylesheet => "text/css,*/*;q=0.1",
        ResourceCategory::Script => "*/*",
        ResourceCategory::Frame => {
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
        }
        ResourceCategory::Audio => "audio/webm,audio/ogg,audio/wav,audio/*;q=0.9,*/*;q=0.5",
        ResourceCategory::Video => "video/webm,video/ogg,video/*;q=0.9,*/*;q=0.5",
        ResourceCategory::Font | ResourceCategory::Other => "*/*",
    }
}

/// Category-aware resource downloader over a shared HTTP client
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    config: InlineConfig,
}

impl Fetcher {
    #[must_use]
    pub fn new(config: InlineConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Fetch one absolute URL.
    ///
    /// `referrer` is the page that referenced the resource. `data:` URLs
    /// are short-circuited and decoded locally, never sent to the network.
    pub async fn fetch(
        &self,
        url: &str,
        category: ResourceCategory,
        referrer: &str,
    ) -> FetchOutcome {
        if url.starts_with("data:") {
            return match decode_data_url(url) {
                Ok(body) => FetchOutcome::Success(body),
                Err(e) => FetchOutcome::Failure(FetchFailure {
                    url: url.to_string(),
                    reason: format!("{e:#}"),
                }),
            };
        }

        match self.fetch_remote(url, category, referrer).await {
            Ok(body) => FetchOutcome::Success(body),
            Err(e) => {
                // Preserve the full context chain in the recorded cause
                FetchOutcome::Failure(FetchFailure {
                    url: url.to_string(),
                    reason: format!("{e:#}"),
                })
            }
        }
    }

    /// Core download implementation: browser-like headers, streaming body
    /// accumulation, size cap enforced both from `Content-Length` and
    /// during the stream.
    async fn fetch_remote(
        &self,
        url: &str,
        category: ResourceCategory,
        referrer: &str,
    ) -> Result<FetchedBody> {
        let response = self
            .client
            .get(url)
            .timeout(self.config.timeout_for(category))
            .header("User-Agent", CHROME_USER_AGENT)
            .header("Accept", accept_for(category))
            .header("Accept-Language", ACCEPT_LANGUAGE)
            .header("Accept-Encoding", "gzip, deflate, br")
            .header("Referer", referrer)
            .send()
            .await
            .with_context(|| format!("Failed to download {category}"))?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "{category} download failed with status: {}",
                response.status()
            ));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        let content_encoding = response
            .headers()
            .get("content-encoding")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        let charset = content_type.as_deref().and_then(charset_of);

        // SVG payloads get the tighter text-asset cap
        let max_size = if is_svg_url(url) {
            self.config.max_svg_size.min(self.config.max_size_for(category))
        } else {
            self.config.max_size_for(category)
        };

        // Get expected size and enforce limit BEFORE downloading
        let expected_size = response.content_length().unwrap_or(0);
        if expected_size > max_size as u64 {
            return Err(anyhow::anyhow!(
                "{category} too large: {expected_size} bytes exceeds limit of {max_size} bytes"
            ));
        }

        // Pre-allocate buffer based on Content-Length
        let mut buffer = if expected_size > 0 {
            Vec::with_capacity(expected_size as usize)
        } else {
            Vec::new()
        };

        // Stream response with size checking (second line of defense)
        let mut stream = response.bytes_stream();
        let mut total_size = 0;

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.with_context(|| format!("Failed to read {category} chunk"))?;

            // Check BEFORE accumulating
            let new_total = total_size + chunk.len();
            if new_total > max_size {
                return Err(anyhow::anyhow!(
                    "{category} download exceeded size limit during download: {new_total} bytes (max: {max_size})"
                ));
            }

            buffer.extend_from_slice(&chunk);
            total_size = new_total;
        }

        Ok(FetchedBody {
            bytes: buffer,
            content_type,
            charset,
            content_encoding,
        })
    }
}

/// Decode a `data:` URL payload without touching the network
fn decode_data_url(url: &str) -> Result<FetchedBody> {
    let rest = url.strip_prefix("data:").context("Not a data URL")?;
    let (meta, payload) = rest
        .split_once(',')
        .context("data URL is missing the ',' separator")?;

    let mut content_type = None;
    let mut charset = None;
    let mut is_base64 = false;
    for (i, part) in meta.split(';').enumerate() {
        if part.eq_ignore_ascii_case("base64") {
            is_base64 = true;
        } else if let Some(cs) = part.strip_prefix("charset=") {
            charset = Some(cs.to_string());
        } else if i == 0 && !part.is_empty() {
            content_type = Some(part.to_string());
        }
    }

    let bytes = if is_base64 {
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .context("Invalid base64 payload in data URL")?
    } else {
        urlencoding::decode_binary(payload.as_bytes()).into_owned()
    };

    Ok(FetchedBody {
        bytes,
        content_type,
        charset,
        content_encoding: None,
    })
}

/// Extract the charset parameter from a Content-Type value
fn charset_of(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let param = param.trim();
        param
            .strip_prefix("charset=")
            .map(|cs| cs.trim_matches('"').to_string())
    })
}
