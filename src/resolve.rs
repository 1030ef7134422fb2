//! Relative URL resolution
//!
//! Pure resolution of possibly-relative resource references against the
//! page base URL, with the pass-through and query re-encoding rules the
//! fetcher depends on.

use url::Url;

use crate::error::{InlineError, InlineResult};

/// Resolve a potentially relative resource reference against a base URL.
///
/// References that already carry an `http`/`https` scheme, and `data:`
/// URIs, are returned unchanged. Everything else is resolved with standard
/// relative-reference rules (`.`/`..` segments, query, fragment).
///
/// After resolution the query string is re-encoded, fixing URLs from HTML
/// that have unencoded special characters (e.g. Google Fonts URLs with
/// `:`, `,`, `@`, `;` in query strings) that strict servers reject.
pub fn resolve_url(base_url: &str, reference: &str) -> InlineResult<String> {
    if reference.starts_with("data:") {
        return Ok(reference.to_string());
    }
    if reference.starts_with("http://") || reference.starts_with("https://") {
        // Validate but pass through unchanged
        Url::parse(reference).map_err(|e| InlineError::InvalidUrl {
            url: reference.to_string(),
            reason: e.to_string(),
        })?;
        return Ok(reference.to_string());
    }

    let base = Url::parse(base_url).map_err(|e| InlineError::InvalidUrl {
        url: base_url.to_string(),
        reason: format!("invalid base URL: {e}"),
    })?;
    let mut resolved = base.join(reference).map_err(|e| InlineError::InvalidUrl {
        url: reference.to_string(),
        reason: e.to_string(),
    })?;

    // Re-encode query string to fix unencoded special characters from HTML
    if resolved.query().is_some() {
        // Collect query pairs into owned strings to avoid borrow conflicts
        let query_pairs: Vec<(String, String)> = resolved
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        resolved.query_pairs_mut().clear();
        for (key, value) in query_pairs {
            resolved.query_pairs_mut().append_pair(&key, &value);
        }
    }

    Ok(resolved.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_url_resolution() {
        let result = resolve_url("https://example.com/path/page.html", "../styles/main.css");
        assert_eq!(result.unwrap(), "https://example.com/styles/main.css");
    }

    #[test]
    fn test_dot_dot_against_directory_base() {
        let result = resolve_url("https://ex.com/guides/x/", "../img/a.png");
        assert_eq!(result.unwrap(), "https://ex.com/guides/img/a.png");
    }

    #[test]
    fn test_absolute_reference_passes_through_unchanged() {
        let result = resolve_url("https://ex.com/x/", "https://cdn.ex.com/a.js");
        assert_eq!(result.unwrap(), "https://cdn.ex.com/a.js");
    }

    #[test]
    fn test_data_uri_passes_through_unchanged() {
        let data = "data:image/png;base64,AAAA";
        let result = resolve_url("https://example.com/", data);
        assert_eq!(result.unwrap(), data);
    }

    #[test]
    fn test_query_string_re_encoding() {
        // Font-service style query with characters strict servers reject raw
        let result = resolve_url(
            "https://www.example.com/",
            "/css2?family=Example+Sans:ital,wght@0,400;1,700&display=swap",
        )
        .unwrap();

        assert!(result.contains("%40"), "@ should be encoded as %40");
        assert!(result.contains("%3B"), "; should be encoded as %3B");
        assert!(result.contains("%2C"), ", should be encoded as %2C");
        assert!(result.starts_with("https://www.example.com/css2?"));
    }

    #[test]
    fn test_protocol_relative_reference() {
        let result = resolve_url("https://example.com/page", "//cdn.example.com/a.png");
        assert_eq!(result.unwrap(), "https://cdn.example.com/a.png");
    }

    #[test]
    fn test_invalid_base_is_typed_error() {
        let result = resolve_url("not a url", "a.png");
        assert!(matches!(result, Err(InlineError::InvalidUrl { .. })));
    }
}
