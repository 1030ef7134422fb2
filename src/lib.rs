//! singlepage: turn a rendered web page into one self-contained document.
//!
//! Given a live DOM tree and its base URL, the engine discovers every
//! external resource reference (images, stylesheets, scripts, media,
//! nested frames), fetches it with resource-appropriate request semantics,
//! and rewrites the tree in place so the serialized result renders with no
//! network access. Individual resource failures are logged and recorded,
//! never fatal.

pub mod classify;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod renderer;
pub mod resolve;
pub mod serialize;
pub mod transform;
pub mod types;

pub use classify::{CLASSIFY_RULES, ClassifyRule, classify};
pub use config::InlineConfig;
pub use engine::{CapturedPage, InlineEngine};
pub use error::{InlineError, InlineResult};
pub use fetch::{FetchFailure, FetchOutcome, FetchedBody, Fetcher, accept_for};
pub use renderer::{PageRenderer, RenderFuture, RenderedPage};
pub use resolve::resolve_url;
pub use serialize::serialize_document;
pub use transform::{Embedding, transform};
pub use types::{InliningError, InliningResult, ResourceCategory};
