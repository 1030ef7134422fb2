//! Inlining engine orchestration
//!
//! Traverses the DOM, classifies resource references, fetches and
//! transforms them with a bounded concurrent fan-out, rewrites the tree in
//! place, and recurses into nested frame documents. Per-resource failures
//! are recorded and logged; they never abort a pass.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::StreamExt;
use futures::future::LocalBoxFuture;
use kuchiki::NodeRef;
use kuchiki::traits::TendrilSink;
use parking_lot::Mutex;
use url::Url;

use crate::classify::classify;
use crate::config::InlineConfig;
use crate::error::{InlineError, InlineResult};
use crate::fetch::{FetchFailure, FetchOutcome, Fetcher};
use crate::renderer::PageRenderer;
use crate::resolve::resolve_url;
use crate::serialize::serialize_document;
use crate::transform::{Embedding, transform};
use crate::types::{InliningError, InliningResult, ResourceCategory};

/// A final self-contained page plus inlining statistics
#[derive(Debug, Clone)]
pub struct CapturedPage {
    pub html: String,
    pub title: Option<String>,
    pub result: InliningResult,
}

/// One qualifying resource reference, collected before any mutation
struct ResourceRef {
    node: NodeRef,
    category: ResourceCategory,
    source_attr: &'static str,
    raw_url: String,
}

/// Shared state for one pass tree, passed explicitly down the frame
/// recursion
struct PassContext {
    /// URLs currently being inlined somewhere up the recursion stack
    in_flight: Mutex<HashSet<String>>,
    /// Pass-tree deadline; fetches pending past it become failures
    deadline: Option<tokio::time::Instant>,
}

/// Orchestrator for document-inlining passes
pub struct InlineEngine {
    fetcher: Fetcher,
    config: InlineConfig,
    renderer: Option<Arc<dyn PageRenderer>>,
}

impl Default for InlineEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InlineEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(InlineConfig::default())
    }

    #[must_use]
    pub fn with_config(config: InlineConfig) -> Self {
        Self {
            fetcher: Fetcher::new(config.clone()),
            config,
            renderer: None,
        }
    }

    /// Attach the renderer used for nested frame documents (and by
    /// [`capture`](Self::capture) for the top-level page). Without one,
    /// frames are recorded as failures and embedded empty.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Render `url`, inline every resource, and serialize the result.
    ///
    /// A render failure for the top-level document is fatal and propagated
    /// as-is; everything past that point is best-effort.
    pub async fn capture(&self, url: &str) -> InlineResult<CapturedPage> {
        let Some(renderer) = self.renderer.as_ref() else {
            return Err(InlineError::RenderFailure {
                url: url.to_string(),
                reason: "no page renderer configured".to_string(),
            });
        };

        let page = renderer.render(url).await?;
        let result = self.inline(&page.document, &page.base_url).await?;
        let html = serialize_document(&page.document)?;
        Ok(CapturedPage {
            html,
            title: page.title,
            result,
        })
    }

    /// Inline every external resource of `document` in place.
    ///
    /// The tree is mutated destructively and remains consistent even when
    /// individual resources fail; serialize it afterwards with
    /// [`serialize_document`](crate::serialize::serialize_document).
    pub async fn inline(
        &self,
        document: &NodeRef,
        base_url: &str,
    ) -> InlineResult<InliningResult> {
        let base = Url::parse(base_url).map_err(|e| InlineError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        let ctx = PassContext {
            in_flight: Mutex::new(HashSet::from([base.to_string()])),
            deadline: self
                .config
                .deadline
                .map(|d| tokio::time::Instant::now() + d),
        };

        let stats = self.inline_pass(document.clone(), base, &ctx, 0).await;
        Ok(InliningResult {
            successes: stats.successes,
            failures: stats.failures,
        })
    }

    /// One pass over one document; frames recurse into nested passes that
    /// share `ctx`. Boxed because the recursion would otherwise make the
    /// future type infinite.
    fn inline_pass<'a>(
        &'a self,
        document: NodeRef,
        base: Url,
        ctx: &'a PassContext,
        depth: usize,
    ) -> LocalBoxFuture<'a, InliningResult> {
        Box::pin(async move {
            // Snapshot the work list before mutating: splices during the
            // apply phase must not skip or duplicate nodes
            let work = collect_resources(&document);
            log::debug!(
                "Inlining {} resources for base_url: {base} (depth {depth})",
                work.len()
            );

            // Fetch and transform everything except frames concurrently;
            // `buffered` bounds the fan-out and rejoins in document order
            let fetch_jobs = work.iter().enumerate().filter_map(|(index, reference)| {
                if reference.category == ResourceCategory::Frame {
                    return None;
                }
                let fetcher = self.fetcher.clone();
                let raw_url = reference.raw_url.clone();
                let base = base.clone();
                let category = reference.category;
                let deadline = ctx.deadline;
                let max_inline = self.config.max_inline_media_bytes;
                Some(async move {
                    let prepared =
                        prepare_embedding(&fetcher, &raw_url, &base, category, deadline, max_inline)
                            .await;
                    (index, prepared)
                })
            });
            let mut prepared: HashMap<usize, Result<Embedding, InliningError>> =
                futures::stream::iter(fetch_jobs)
                    .buffered(self.config.max_concurrent_fetches.max(1))
                    .collect::<Vec<_>>()
                    .await
                    .into_iter()
                    .collect();

            // Apply embeddings to the live tree sequentially, in document
            // order
            let mut stats = InliningResult::default();
            for (index, reference) in work.iter().enumerate() {
                if reference.category == ResourceCategory::Frame {
                    match self.process_frame(reference, &base, ctx, depth).await {
                        Ok(nested) => {
                            log::info!("Inlined frame document: {}", reference.raw_url);
                            stats.successes += 1 + nested.successes;
                            stats.failures.extend(nested.failures);
                        }
                        Err(failure) => self.record_failure(reference, failure, &mut stats),
                    }
                    continue;
                }

                let Some(outcome) = prepared.remove(&index) else {
                    continue;
                };
                match outcome.and_then(|embedding| apply_embedding(reference, embedding)) {
                    Ok(()) => {
                        log::debug!("Embedded {}: {}", reference.category, reference.raw_url);
                        stats.successes += 1;
                    }
                    Err(failure) => self.record_failure(reference, failure, &mut stats),
                }
            }
            stats
        })
    }

    /// Failure embedding policy: clear the source attribute, log, record,
    /// continue
    fn record_failure(
        &self,
        reference: &ResourceRef,
        failure: InliningError,
        stats: &mut InliningResult,
    ) {
        log::warn!(
            "Failed to inline {} from {}: {}",
            failure.category,
            failure.url,
            failure.error
        );
        if let Some(element) = reference.node.as_element() {
            element
                .attributes
                .borrow_mut()
                .insert(reference.source_attr, String::new());
        }
        stats.failures.push(failure);
    }

    /// Resolve, render, and recursively inline one frame, then splice the
    /// resulting document in place of the `<iframe>`.
    async fn process_frame(
        &self,
        reference: &ResourceRef,
        base: &Url,
        ctx: &PassContext,
        depth: usize,
    ) -> Result<InliningResult, InliningError> {
        let category = ResourceCategory::Frame;
        let to_failure = |url: &str, error: String| InliningError {
            url: url.to_string(),
            category,
            error,
        };

        let resolved = resolve_url(base.as_str(), &reference.raw_url)
            .map_err(|e| to_failure(&reference.raw_url, e.to_string()))?;

        if depth + 1 > self.config.max_frame_depth {
            return Err(to_failure(
                &resolved,
                format!("frame depth limit {} exceeded", self.config.max_frame_depth),
            ));
        }
        if let Some(deadline) = ctx.deadline
            && tokio::time::Instant::now() >= deadline
        {
            return Err(to_failure(&resolved, "pass deadline exceeded".to_string()));
        }
        let Some(renderer) = self.renderer.as_ref() else {
            return Err(to_failure(
                &resolved,
                "no page renderer configured for frame inlining".to_string(),
            ));
        };

        // Cycle guard: never re-enter a URL already being inlined somewhere
        // up the recursion stack
        let guard_key = Url::parse(&resolved)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| resolved.clone());
        if !ctx.in_flight.lock().insert(guard_key.clone()) {
            return Err(to_failure(
                &resolved,
                InlineError::CycleDetected {
                    url: resolved.clone(),
                }
                .to_string(),
            ));
        }

        let outcome = self
            .inline_frame(reference, &resolved, renderer.as_ref(), ctx, depth)
            .await;

        // Release so the same URL in a sibling frame is not misreported as
        // a cycle
        ctx.in_flight.lock().remove(&guard_key);
        outcome
    }

    async fn inline_frame(
        &self,
        reference: &ResourceRef,
        resolved: &str,
        renderer: &dyn PageRenderer,
        ctx: &PassContext,
        depth: usize,
    ) -> Result<InliningResult, InliningError> {
        let category = ResourceCategory::Frame;

        let page = renderer.render(resolved).await.map_err(|e| InliningError {
            url: resolved.to_string(),
            category,
            error: e.to_string(),
        })?;
        let frame_base = Url::parse(&page.base_url).map_err(|e| InliningError {
            url: page.base_url.clone(),
            category,
            error: format!("invalid frame base URL: {e}"),
        })?;

        // A document without a root element has nothing to splice and
        // nothing to inline; reject it before running the nested pass
        let Some(root) = page
            .document
            .children()
            .find(|child| child.as_element().is_some())
        else {
            return Err(InliningError {
                url: resolved.to_string(),
                category,
                error: "rendered frame document has no root element".to_string(),
            });
        };

        let nested = self
            .inline_pass(page.document.clone(), frame_base, ctx, depth + 1)
            .await;

        // Replace the iframe wholesale with the inlined document's root,
        // flattening the hierarchy
        reference.node.insert_before(root);
        reference.node.detach();

        Ok(nested)
    }
}

/// Traverse in document order and collect every node the classifier
/// recognizes. References that are already `data:` URIs are never
/// re-fetched.
fn collect_resources(document: &NodeRef) -> Vec<ResourceRef> {
    let mut work = Vec::new();
    for node in document.inclusive_descendants() {
        let Some(element) = node.as_element() else {
            continue;
        };
        let tag: &str = &element.name.local;
        let attributes = element.attributes.borrow();
        let Some(rule) = classify(tag, &attributes) else {
            continue;
        };
        let Some(raw_url) = attributes.get(rule.source_attr) else {
            continue;
        };
        if raw_url.starts_with("data:") {
            log::debug!("Skipping already-inline {} resource", rule.category);
            continue;
        }
        work.push(ResourceRef {
            node: node.clone(),
            category: rule.category,
            source_attr: rule.source_attr,
            raw_url: raw_url.to_string(),
        });
    }
    work
}

/// Resolve, fetch, and transform one non-frame resource. Runs inside the
/// bounded fan-out; touches no DOM state.
async fn prepare_embedding(
    fetcher: &Fetcher,
    raw_url: &str,
    base: &Url,
    category: ResourceCategory,
    deadline: Option<tokio::time::Instant>,
    max_inline_media_bytes: Option<usize>,
) -> Result<Embedding, InliningError> {
    let resolved = resolve_url(base.as_str(), raw_url).map_err(|e| InliningError {
        url: raw_url.to_string(),
        category,
        error: e.to_string(),
    })?;
    log::debug!("Processing {category}: {raw_url} -> {resolved}");

    let fetch = fetcher.fetch(&resolved, category, base.as_str());
    let outcome = match deadline {
        Some(deadline) => match tokio::time::timeout_at(deadline, fetch).await {
            Ok(outcome) => outcome,
            Err(_) => FetchOutcome::Failure(FetchFailure {
                url: resolved.clone(),
                reason: "pass deadline exceeded".to_string(),
            }),
        },
        None => fetch.await,
    };

    match outcome {
        FetchOutcome::Success(body) => {
            transform(category, &resolved, body, max_inline_media_bytes).map_err(|e| {
                InliningError {
                    url: resolved.clone(),
                    category,
                    error: e.to_string(),
                }
            })
        }
        FetchOutcome::Failure(failure) => Err(InliningError {
            url: failure.url,
            category,
            error: failure.reason,
        }),
    }
}

/// Apply one embedding to the live tree
fn apply_embedding(
    reference: &ResourceRef,
    embedding: Embedding,
) -> Result<(), InliningError> {
    let node = &reference.node;
    let Some(element) = node.as_element() else {
        return Err(InliningError {
            url: reference.raw_url.clone(),
            category: reference.category,
            error: "reference node is no longer an element".to_string(),
        });
    };

    match embedding {
        Embedding::AttributeValue(value) => {
            element
                .attributes
                .borrow_mut()
                .insert(reference.source_attr, value);
        }

        Embedding::ScriptText(text) => {
            while let Some(child) = node.first_child() {
                child.detach();
            }
            node.append(NodeRef::new_text(text));
            element.attributes.borrow_mut().remove(reference.source_attr);
        }

        Embedding::StyleSheet(css) => {
            let style_html = format!("<style type=\"text/css\">\n{css}\n</style>");
            let fragment = kuchiki::parse_html().one(style_html);
            let Ok(style) = fragment.select_first("style") else {
                return Err(InliningError {
                    url: reference.raw_url.clone(),
                    category: reference.category,
                    error: "failed to build inline style element".to_string(),
                });
            };
            node.insert_before(style.as_node().clone());
            node.detach();
        }

        Embedding::SvgMarkup(markup) => {
            let fragment = kuchiki::parse_html().one(markup);
            let Ok(svg) = fragment.select_first("svg") else {
                return Err(InliningError {
                    url: reference.raw_url.clone(),
                    category: reference.category,
                    error: "no <svg> root element found".to_string(),
                });
            };
            node.insert_before(svg.as_node().clone());
            node.detach();
        }
    }
    Ok(())
}
