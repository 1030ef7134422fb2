//! Test utilities and helper functions for the singlepage test suite

use std::collections::HashMap;

use kuchiki::NodeRef;
use kuchiki::traits::TendrilSink;
use singlepage::{InlineError, PageRenderer, RenderFuture, RenderedPage};

/// Initialize logging for test runs (safe to call repeatedly)
#[allow(dead_code)]
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Parse an HTML string into a document tree
#[allow(dead_code)]
pub fn parse_document(html: &str) -> NodeRef {
    kuchiki::parse_html().one(html.to_string())
}

/// Creates a test HTML document with specified body content
#[allow(dead_code)]
pub fn create_test_html(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
</head>
<body>
    {body}
</body>
</html>"#
    )
}

/// A renderer backed by a fixed url -> markup map, standing in for the
/// browser-based collaborator
#[allow(dead_code)]
pub struct StaticRenderer {
    pages: HashMap<String, String>,
}

#[allow(dead_code)]
impl StaticRenderer {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
        }
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }
}

impl PageRenderer for StaticRenderer {
    fn render(&self, url: &str) -> RenderFuture {
        let page = self.pages.get(url).cloned();
        let url = url.to_string();
        Box::pin(async move {
            let html = page.ok_or_else(|| InlineError::RenderFailure {
                url: url.clone(),
                reason: "no fixture registered for URL".to_string(),
            })?;
            Ok(RenderedPage {
                document: kuchiki::parse_html().one(html),
                base_url: url,
                title: None,
            })
        })
    }
}

/// Collect the `src` attribute of every `<img>` in document order
#[allow(dead_code)]
pub fn image_sources(document: &NodeRef) -> Vec<String> {
    document
        .select("img")
        .expect("valid selector")
        .map(|img| {
            img.attributes
                .borrow()
                .get("src")
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}
