//! Page renderer seam
//!
//! Rendering a URL into a live DOM (browser control, script execution) is
//! an external collaborator concern. The engine consumes it through this
//! trait, both for the top-level document and for nested frames.

use futures::future::LocalBoxFuture;
use kuchiki::NodeRef;

use crate::error::InlineError;

/// A fully rendered page as handed over by the renderer
pub struct RenderedPage {
    /// Parsed document tree reflecting the loaded, script-executed DOM
    pub document: NodeRef,
    /// Final base URL after any redirects
    pub base_url: String,
    /// Page title, if one was present
    pub title: Option<String>,
}

/// Boxed future for render operations.
///
/// The DOM is `Rc`-based, so an inlining pass is a single-threaded future;
/// renderers box their work the same way.
pub type RenderFuture = LocalBoxFuture<'static, Result<RenderedPage, InlineError>>;

/// External collaborator that turns a URL into a rendered document.
///
/// Failures surface as `InlineError::RenderFailure`: fatal for the
/// top-level document, resource-local for a frame.
pub trait PageRenderer {
    fn render(&self, url: &str) -> RenderFuture;
}
