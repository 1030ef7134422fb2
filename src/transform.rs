//! Content transformation
//!
//! Category-specific policy turning fetched bytes into an embeddable
//! representation. Transport decompression happens here, before any
//! interpretation of the payload.

use std::io::Read;

use anyhow::{Context, Result};
use base64::Engine;
use kuchiki::traits::TendrilSink;
use url::Url;

use crate::error::{InlineError, InlineResult};
use crate::fetch::FetchedBody;
use crate::types::ResourceCategory;

/// The mutation to apply to the referencing node
#[derive(Debug, Clone)]
pub enum Embedding {
    /// Replace the source attribute value (data URI, or a kept absolute
    /// URL for oversize media)
    AttributeValue(String),
    /// Set the element's text content and drop the source attribute
    /// (scripts; angle brackets already escaped)
    ScriptText(String),
    /// Replace the `<link>` element with a `<style>` holding this text
    StyleSheet(String),
    /// Replace the element with the root `<svg>` of this markup
    SvgMarkup(String),
}

/// Transform a fetched body into the embedding for its category.
///
/// `url` is the resolved absolute URL the body came from; it drives SVG
/// detection and the MIME type fallback. Frames never reach this function,
/// they are inlined recursively by the engine.
pub fn transform(
    category: ResourceCategory,
    url: &str,
    body: FetchedBody,
    max_inline_media_bytes: Option<usize>,
) -> InlineResult<Embedding> {
    let decode_failure = |reason: String| InlineError::DecodeFailure {
        url: url.to_string(),
        reason,
    };

    let content_type = body.content_type.clone();
    let bytes = decode_transport(body.bytes, body.content_encoding.as_deref())
        .map_err(|e| decode_failure(format!("{e:#}")))?;

    match category {
        ResourceCategory::Image | ResourceCategory::Audio | ResourceCategory::Video => {
            if is_svg_url(url) {
                let text = String::from_utf8(bytes)
                    .map_err(|_| decode_failure("SVG content is not valid UTF-8".to_string()))?;
                let cleaned = clean_svg(text);

                // Validate there is an <svg> root before the engine splices it
                let fragment = kuchiki::parse_html().one(cleaned.clone());
                if fragment.select_first("svg").is_err() {
                    return Err(decode_failure("no <svg> root element found".to_string()));
                }
                return Ok(Embedding::SvgMarkup(cleaned));
            }

            if let Some(max_size) = max_inline_media_bytes
                && bytes.len() > max_size
            {
                // Keep the resolved URL rather than bloating the document
                log::debug!(
                    "{category} size ({} bytes) exceeds max_inline_media_bytes ({max_size} bytes), keeping as external URL: {url}",
                    bytes.len()
                );
                return Ok(Embedding::AttributeValue(url.to_string()));
            }

            let mime = best_guess_mime(content_type.as_deref(), url, category);
            Ok(Embedding::AttributeValue(encode_data_url(&mime, &bytes)))
        }

        ResourceCategory::Script => {
            let text = String::from_utf8(bytes)
                .map_err(|_| decode_failure("Script content is not valid UTF-8".to_string()))?;
            // Escape angle brackets so an embedded </script> cannot close
            // the container element
            Ok(Embedding::ScriptText(
                html_escape::encode_text(&text).into_owned(),
            ))
        }

        ResourceCategory::Stylesheet => {
            let text = String::from_utf8(bytes)
                .map_err(|_| decode_failure("CSS content is not valid UTF-8".to_string()))?;
            Ok(Embedding::StyleSheet(text))
        }

        ResourceCategory::Font | ResourceCategory::Other => {
            let mime = best_guess_mime(content_type.as_deref(), url, category);
            Ok(Embedding::AttributeValue(encode_data_url(&mime, &bytes)))
        }

        ResourceCategory::Frame => Err(decode_failure(
            "frame documents are inlined recursively, not transformed".to_string(),
        )),
    }
}

/// Apply declared transport decompression before interpreting the payload
fn decode_transport(bytes: Vec<u8>, encoding: Option<&str>) -> Result<Vec<u8>> {
    let Some(encoding) = encoding else {
        return Ok(bytes);
    };

    match encoding.trim().to_ascii_lowercase().as_str() {
        "" | "identity" => Ok(bytes),
        "gzip" | "x-gzip" => {
            let mut out = Vec::new();
            flate2::read::MultiGzDecoder::new(&bytes[..])
                .read_to_end(&mut out)
                .context("Failed to decode gzip body")?;
            Ok(out)
        }
        "deflate" => {
            let mut out = Vec::new();
            flate2::read::ZlibDecoder::new(&bytes[..])
                .read_to_end(&mut out)
                .context("Failed to decode deflate body")?;
            Ok(out)
        }
        "br" => {
            let mut out = Vec::new();
            brotli::Decompressor::new(&bytes[..], 4096)
                .read_to_end(&mut out)
                .context("Failed to decode brotli body")?;
            Ok(out)
        }
        other => {
            log::warn!("Unknown content-encoding '{other}', using body as-is");
            Ok(bytes)
        }
    }
}

/// Whether the resolved URL names an SVG document by file extension
#[must_use]
pub(crate) fn is_svg_url(url: &str) -> bool {
    let path = Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());
    path.to_ascii_lowercase().ends_with(".svg")
}

/// Clean SVG text for direct embedding in an HTML document
///
/// Strips the XML declaration and comments out an SVG DOCTYPE, neither of
/// which is valid inside HTML markup.
fn clean_svg(text: String) -> String {
    let mut cleaned = text;

    if let Some(start) = cleaned.find("<?xml")
        && let Some(end_offset) = cleaned[start..].find("?>")
    {
        cleaned.replace_range(start..start + end_offset + 2, "");
    }

    if let Some(doctype_start) = cleaned.find("<!DOCTYPE svg")
        && let Some(doctype_end_offset) = cleaned[doctype_start..].find('>')
    {
        let doctype_end = doctype_start + doctype_end_offset + 1;
        let doctype = &cleaned[doctype_start..doctype_end];
        let commented = format!("<!--{doctype}-->");
        cleaned.replace_range(doctype_start..doctype_end, &commented);
    }

    cleaned
}

/// Assemble a base64 data URI with a pre-sized buffer
fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    let encoded_capacity = base64::encoded_len(bytes.len(), true).unwrap_or(0);
    let mut encoded = String::with_capacity(encoded_capacity + 30 + mime.len());

    encoded.push_str("data:");
    encoded.push_str(mime);
    encoded.push_str(";base64,");

    // Use STANDARD encoding for better compatibility
    base64::engine::general_purpose::STANDARD.encode_string(bytes, &mut encoded);

    encoded
}

/// Best-guess MIME type: declared Content-Type, else the URL extension,
/// else a category default
fn best_guess_mime(content_type: Option<&str>, url: &str, category: ResourceCategory) -> String {
    if let Some(declared) = content_type
        && let Some(essence) = declared.split(';').next()
        && !essence.trim().is_empty()
    {
        return essence.trim().to_string();
    }

    let path = Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());
    if let Some(mime) = mime_for_path(&path) {
        return mime.to_string();
    }

    match category {
        ResourceCategory::Image => "image/jpeg".to_string(),
        ResourceCategory::Audio => "audio/mpeg".to_string(),
        ResourceCategory::Video => "video/mp4".to_string(),
        _ => "application/octet-stream".to_string(),
    }
}

/// MIME lookup by file extension for common web asset types
fn mime_for_path(path: &str) -> Option<&'static str> {
    let (_, extension) = path.rsplit_once('.')?;
    match extension.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "avif" => Some("image/avif"),
        "apng" => Some("image/apng"),
        "bmp" => Some("image/bmp"),
        "ico" => Some("image/x-icon"),
        "svg" => Some("image/svg+xml"),
        "mp3" => Some("audio/mpeg"),
        "ogg" | "oga" => Some("audio/ogg"),
        "wav" => Some("audio/wav"),
        "m4a" => Some("audio/mp4"),
        "mp4" => Some("video/mp4"),
        "webm" => Some("video/webm"),
        "mov" => Some("video/quicktime"),
        "woff" => Some("font/woff"),
        "woff2" => Some("font/woff2"),
        "ttf" => Some("font/ttf"),
        "otf" => Some("font/otf"),
        _ => None,
    }
}
