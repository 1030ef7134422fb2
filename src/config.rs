//! Configuration for inlining passes

use std::time::Duration;

use crate::constants::{DEFAULT_MAX_CONCURRENT_FETCHES, DEFAULT_MAX_FRAME_DEPTH};
use crate::types::ResourceCategory;

/// Configuration for download timeouts, size limits, and pass-wide bounds
#[derive(Debug, Clone)]
pub struct InlineConfig {
    /// Timeout for stylesheet downloads
    pub stylesheet_timeout: Duration,
    /// Timeout for script downloads
    pub script_timeout: Duration,
    /// Timeout for image/audio/video downloads
    pub media_timeout: Duration,
    /// Timeout for frame document downloads
    pub frame_timeout: Duration,

    /// Maximum size for stylesheet downloads (bytes)
    /// Based on 99th percentile of real-world CSS + margin
    /// Typical: 50-200KB, Large frameworks: 500KB-1MB
    pub max_stylesheet_size: usize,

    /// Maximum size for script downloads (bytes)
    /// Bundled application scripts routinely reach a few MB
    pub max_script_size: usize,

    /// Maximum size for image/audio/video downloads (bytes)
    /// Media larger than this is not fetched at all
    pub max_media_size: usize,

    /// Maximum size for SVG downloads (bytes)
    /// SVGs are text-based and should be small
    /// Typical: 5-50KB, Complex: 100-500KB
    pub max_svg_size: usize,

    /// Optional soft threshold for media inlining (bytes)
    ///
    /// Media that downloads successfully but exceeds this size keeps its
    /// resolved absolute URL instead of becoming a data URI. `None` inlines
    /// everything under `max_media_size`.
    pub max_inline_media_bytes: Option<usize>,

    /// Bound on simultaneous outstanding fetches within one pass
    pub max_concurrent_fetches: usize,

    /// Maximum frame nesting depth for recursive flattening
    pub max_frame_depth: usize,

    /// Optional deadline for the whole pass tree
    ///
    /// Once elapsed, resources not yet fetched are recorded as ordinary
    /// per-resource failures and the pass finishes with a consistent tree.
    pub deadline: Option<Duration>,
}

impl Default for InlineConfig {
    fn default() -> Self {
        Self {
            stylesheet_timeout: Duration::from_secs(30),
            script_timeout: Duration::from_secs(30),
            media_timeout: Duration::from_secs(60),
            frame_timeout: Duration::from_secs(60),

            // Reasonable defaults based on real-world usage
            max_stylesheet_size: 2 * 1024 * 1024, // 2MB
            max_script_size: 5 * 1024 * 1024,     // 5MB
            max_media_size: 5 * 1024 * 1024,      // 5MB
            max_svg_size: 1024 * 1024,            // 1MB

            max_inline_media_bytes: None,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            max_frame_depth: DEFAULT_MAX_FRAME_DEPTH,
            deadline: None,
        }
    }
}

impl InlineConfig {
    /// Download timeout for a resource category
    #[must_use]
    pub fn timeout_for(&self, category: ResourceCategory) -> Duration {
        match category {
            ResourceCategory::Stylesheet => self.stylesheet_timeout,
            ResourceCategory::Script => self.script_timeout,
            ResourceCategory::Frame => self.frame_timeout,
            ResourceCategory::Image
            | ResourceCategory::Audio
            | ResourceCategory::Video
            | ResourceCategory::Font
            | ResourceCategory::Other => self.media_timeout,
        }
    }

    /// Hard size cap for a resource category (bytes)
    #[must_use]
    pub fn max_size_for(&self, category: ResourceCategory) -> usize {
        match category {
            ResourceCategory::Stylesheet => self.max_stylesheet_size,
            ResourceCategory::Script => self.max_script_size,
            ResourceCategory::Frame => self.max_media_size,
            ResourceCategory::Image
            | ResourceCategory::Audio
            | ResourceCategory::Video
            | ResourceCategory::Font
            | ResourceCategory::Other => self.max_media_size,
        }
    }
}
