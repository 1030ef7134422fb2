//! Type definitions for resource inlining

/// The functional kind of a referenced asset.
///
/// The category determines request headers (Accept value, timeout, size
/// cap) and the embedding policy applied to the fetched bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceCategory {
    Image,
    Stylesheet,
    Script,
    Frame,
    Audio,
    Video,
    Font,
    Other,
}

impl std::fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceCategory::Image => write!(f, "image"),
            ResourceCategory::Stylesheet => write!(f, "stylesheet"),
            ResourceCategory::Script => write!(f, "script"),
            ResourceCategory::Frame => write!(f, "frame"),
            ResourceCategory::Audio => write!(f, "audio"),
            ResourceCategory::Video => write!(f, "video"),
            ResourceCategory::Font => write!(f, "font"),
            ResourceCategory::Other => write!(f, "other"),
        }
    }
}

/// Error information for a single failed resource
#[derive(Debug, Clone)]
pub struct InliningError {
    pub url: String,
    pub category: ResourceCategory,
    pub error: String,
}

/// Result of an inlining pass with success and failure tracking
#[derive(Debug, Clone, Default)]
pub struct InliningResult {
    pub successes: usize,
    pub failures: Vec<InliningError>,
}

impl InliningResult {
    /// Total number of resources processed
    #[must_use]
    pub fn total(&self) -> usize {
        self.successes + self.failures.len()
    }

    /// Check if any failures occurred
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Get failure rate as a ratio between 0.0 and 1.0
    #[must_use]
    pub fn failure_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.failures.len() as f64 / total as f64
        }
    }
}
