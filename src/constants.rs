//! Shared configuration constants for singlepage
//!
//! This module contains default values and configuration constants used
//! throughout the codebase to ensure consistency and avoid magic numbers.

/// Chrome user agent string sent with every resource request
///
/// Updated: 2025-01-29 to Chrome 132 (current stable)
/// Next update: 2025-04-29 (quarterly schedule)
///
/// Chrome releases new stable versions ~every 4 weeks.
/// Update quarterly to stay within reasonable version window.
///
/// Reference: https://chromiumdash.appspot.com/schedule
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Accept-Language value matching a typical English-locale browser
pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Default bound on simultaneous outstanding resource fetches
///
/// Matches the per-host connection budget of mainstream browsers.
/// Raising it speeds up resource-heavy pages at the cost of more
/// pressure on the origin server.
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 8;

/// Default maximum frame nesting depth: 8 levels
///
/// Frames are flattened transitively; the cycle guard stops re-entrant
/// URLs, and this cap stops pathological non-cyclic nesting chains.
pub const DEFAULT_MAX_FRAME_DEPTH: usize = 8;
