//! Resource classification
//!
//! Maps a tag name plus attribute context to a resource category. The
//! mapping is a fixed rule table: adding a new category is a data change,
//! never new control flow elsewhere in the engine.

use kuchiki::Attributes;

use crate::types::ResourceCategory;

/// One entry of the classification table
#[derive(Debug, Clone, Copy)]
pub struct ClassifyRule {
    /// Lowercase tag name the rule applies to
    pub tag: &'static str,
    /// Attribute holding the resource reference
    pub source_attr: &'static str,
    /// Required `rel` token, if any (`link` elements)
    pub requires_rel: Option<&'static str>,
    /// Category assigned when the rule matches
    pub category: ResourceCategory,
}

/// The fixed classification table, evaluated top to bottom per element
pub const CLASSIFY_RULES: &[ClassifyRule] = &[
    ClassifyRule {
        tag: "img",
        source_attr: "src",
        requires_rel: None,
        category: ResourceCategory::Image,
    },
    ClassifyRule {
        tag: "audio",
        source_attr: "src",
        requires_rel: None,
        category: ResourceCategory::Audio,
    },
    ClassifyRule {
        tag: "video",
        source_attr: "src",
        requires_rel: None,
        category: ResourceCategory::Video,
    },
    ClassifyRule {
        tag: "script",
        source_attr: "src",
        requires_rel: None,
        category: ResourceCategory::Script,
    },
    ClassifyRule {
        tag: "link",
        source_attr: "href",
        requires_rel: Some("stylesheet"),
        category: ResourceCategory::Stylesheet,
    },
    ClassifyRule {
        tag: "iframe",
        source_attr: "src",
        requires_rel: None,
        category: ResourceCategory::Frame,
    },
];

/// Classify an element by tag name and attributes.
///
/// Returns the matching rule, or `None` when the element carries no
/// qualifying resource reference (missing or empty source attribute,
/// wrong `rel`, or an unknown tag).
#[must_use]
pub fn classify(tag_name: &str, attributes: &Attributes) -> Option<&'static ClassifyRule> {
    CLASSIFY_RULES.iter().find(|rule| {
        rule.tag == tag_name
            && attributes
                .get(rule.source_attr)
                .is_some_and(|value| !value.trim().is_empty())
            && rule.requires_rel.is_none_or(|required| {
                attributes.get("rel").is_some_and(|rel| {
                    rel.split_ascii_whitespace()
                        .any(|token| token.eq_ignore_ascii_case(required))
                })
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kuchiki::traits::TendrilSink;

    fn classify_first(html: &str, tag: &str) -> Option<ResourceCategory> {
        let document = kuchiki::parse_html().one(html.to_string());
        let element = document.select_first(tag).ok()?;
        let attributes = element.attributes.borrow();
        classify(tag, &attributes).map(|rule| rule.category)
    }

    #[test]
    fn test_img_with_src_is_image() {
        let category = classify_first(r#"<img src="a.png">"#, "img");
        assert_eq!(category, Some(ResourceCategory::Image));
    }

    #[test]
    fn test_img_without_src_is_not_a_resource() {
        assert_eq!(classify_first(r#"<img alt="decorative">"#, "img"), None);
    }

    #[test]
    fn test_script_with_src_is_script() {
        let category = classify_first(r#"<script src="app.js"></script>"#, "script");
        assert_eq!(category, Some(ResourceCategory::Script));
    }

    #[test]
    fn test_inline_script_is_not_a_resource() {
        assert_eq!(
            classify_first(r#"<script>var x = 1;</script>"#, "script"),
            None
        );
    }

    #[test]
    fn test_stylesheet_link_requires_rel() {
        assert_eq!(
            classify_first(r#"<link rel="stylesheet" href="a.css">"#, "link"),
            Some(ResourceCategory::Stylesheet)
        );
        assert_eq!(
            classify_first(r#"<link rel="icon" href="favicon.ico">"#, "link"),
            None
        );
    }

    #[test]
    fn test_rel_matching_is_token_based_and_case_insensitive() {
        assert_eq!(
            classify_first(r#"<link rel="preload STYLESHEET" href="a.css">"#, "link"),
            Some(ResourceCategory::Stylesheet)
        );
    }

    #[test]
    fn test_iframe_is_frame() {
        assert_eq!(
            classify_first(r#"<iframe src="child.html"></iframe>"#, "iframe"),
            Some(ResourceCategory::Frame)
        );
    }

    #[test]
    fn test_media_elements() {
        assert_eq!(
            classify_first(r#"<audio src="a.mp3"></audio>"#, "audio"),
            Some(ResourceCategory::Audio)
        );
        assert_eq!(
            classify_first(r#"<video src="a.mp4"></video>"#, "video"),
            Some(ResourceCategory::Video)
        );
    }
}
