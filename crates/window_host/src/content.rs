//! Content-provider contracts, static template routing, and in-memory adapters.

use std::{cell::RefCell, collections::HashMap, future::Future, pin::Pin, rc::Rc};

use futures::channel::oneshot;
use serde::{Deserialize, Serialize};

/// Object-safe boxed future used by [`ContentProvider`].
pub type ContentFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Request flags forwarded to the content provider alongside the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContentRequest {
    /// The caller asked for a forced reload of an already-open window.
    pub force: bool,
    /// The resulting window will be focused once rendered.
    pub activate: bool,
}

/// Host service producing the markup a window displays for an endpoint.
pub trait ContentProvider {
    /// Fetches markup for `endpoint`.
    ///
    /// Implementations must return an error for any failure; the runtime never retries.
    fn fetch<'a>(
        &'a self,
        endpoint: &'a str,
        request: &'a ContentRequest,
    ) -> ContentFuture<'a, Result<String, String>>;
}

/// Normalizes an endpoint by trimming whitespace and stripping leading slashes.
pub fn normalize_endpoint(endpoint: &str) -> String {
    endpoint.trim().trim_start_matches('/').to_string()
}

/// Builds the ordered list of template routes that may serve `endpoint`.
///
/// `team/details.html` yields `team/details.html`, `details.html`, `team/details`, `details`.
pub fn static_route_candidates(endpoint: &str) -> Vec<String> {
    let normalized = normalize_endpoint(endpoint);
    let mut candidates: Vec<String> = Vec::new();
    let mut push = |value: &str| {
        let item = value.trim();
        if !item.is_empty() && !candidates.iter().any(|c| c == item) {
            candidates.push(item.to_string());
        }
    };

    push(&normalized);
    let last_segment = normalized.rsplit('/').next().unwrap_or_default().to_string();
    push(&last_segment);
    if let Some(stripped) = normalized.strip_suffix(".html") {
        push(stripped);
    }
    if let Some(stripped) = last_segment.strip_suffix(".html") {
        push(stripped);
    }
    candidates
}

#[derive(Debug, Clone, Default)]
/// Content provider serving markup from a fixed set of route templates.
pub struct StaticTemplateProvider {
    routes: HashMap<String, String>,
}

impl StaticTemplateProvider {
    /// Creates a provider from `(route, markup)` pairs.
    pub fn new<I, R, M>(routes: I) -> Self
    where
        I: IntoIterator<Item = (R, M)>,
        R: Into<String>,
        M: Into<String>,
    {
        Self {
            routes: routes
                .into_iter()
                .map(|(route, markup)| (route.into().trim().to_string(), markup.into()))
                .collect(),
        }
    }

    /// Registers (or replaces) one route template.
    pub fn with_route(mut self, route: impl Into<String>, markup: impl Into<String>) -> Self {
        self.routes
            .insert(route.into().trim().to_string(), markup.into());
        self
    }

    /// Resolves the template for `endpoint` using [`static_route_candidates`].
    pub fn resolve(&self, endpoint: &str) -> Option<&str> {
        static_route_candidates(endpoint)
            .iter()
            .find_map(|candidate| self.routes.get(candidate))
            .map(String::as_str)
    }
}

impl ContentProvider for StaticTemplateProvider {
    fn fetch<'a>(
        &'a self,
        endpoint: &'a str,
        _request: &'a ContentRequest,
    ) -> ContentFuture<'a, Result<String, String>> {
        Box::pin(async move {
            self.resolve(endpoint)
                .map(str::to_string)
                .ok_or_else(|| format!("Static route not found: {endpoint}"))
        })
    }
}

/// Release handle for a fetch held open by [`MemoryContentProvider::hold`].
#[derive(Debug)]
pub struct ContentGate(oneshot::Sender<()>);

impl ContentGate {
    /// Lets the held fetch complete.
    pub fn release(self) {
        let _ = self.0.send(());
    }
}

#[derive(Debug, Default)]
struct MemoryContentState {
    markup: HashMap<String, String>,
    failures: HashMap<String, String>,
    held: HashMap<String, oneshot::Receiver<()>>,
    fetches: Vec<(String, ContentRequest)>,
}

#[derive(Debug, Clone, Default)]
/// In-memory content provider that records every fetch, for headless hosts and tests.
pub struct MemoryContentProvider {
    inner: Rc<RefCell<MemoryContentState>>,
}

impl MemoryContentProvider {
    /// Sets the markup returned for `endpoint`.
    pub fn set_markup(&self, endpoint: impl Into<String>, markup: impl Into<String>) {
        let endpoint = endpoint.into();
        let mut state = self.inner.borrow_mut();
        state.failures.remove(&endpoint);
        state.markup.insert(endpoint, markup.into());
    }

    /// Makes every subsequent fetch of `endpoint` fail with `message`.
    pub fn fail(&self, endpoint: impl Into<String>, message: impl Into<String>) {
        self.inner
            .borrow_mut()
            .failures
            .insert(endpoint.into(), message.into());
    }

    /// Holds the next fetch of `endpoint` pending until the returned gate is released or dropped.
    pub fn hold(&self, endpoint: impl Into<String>) -> ContentGate {
        let (tx, rx) = oneshot::channel();
        self.inner.borrow_mut().held.insert(endpoint.into(), rx);
        ContentGate(tx)
    }

    /// Number of fetches issued for `endpoint`.
    pub fn fetch_count(&self, endpoint: &str) -> usize {
        self.inner
            .borrow()
            .fetches
            .iter()
            .filter(|(issued, _)| issued == endpoint)
            .count()
    }

    /// All fetches issued so far, in order.
    pub fn fetches(&self) -> Vec<(String, ContentRequest)> {
        self.inner.borrow().fetches.clone()
    }
}

impl ContentProvider for MemoryContentProvider {
    fn fetch<'a>(
        &'a self,
        endpoint: &'a str,
        request: &'a ContentRequest,
    ) -> ContentFuture<'a, Result<String, String>> {
        Box::pin(async move {
            let gate = {
                let mut state = self.inner.borrow_mut();
                state
                    .fetches
                    .push((endpoint.to_string(), request.clone()));
                state.held.remove(endpoint)
            };
            if let Some(gate) = gate {
                let _ = gate.await;
            }

            let state = self.inner.borrow();
            if let Some(message) = state.failures.get(endpoint) {
                return Err(message.clone());
            }
            state
                .markup
                .get(endpoint)
                .cloned()
                .ok_or_else(|| format!("no content registered for {endpoint}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn route_candidates_cover_html_suffix_and_last_segment() {
        assert_eq!(
            static_route_candidates("/team/details.html"),
            vec![
                "team/details.html".to_string(),
                "details.html".to_string(),
                "team/details".to_string(),
                "details".to_string(),
            ]
        );
        assert_eq!(static_route_candidates("  about "), vec!["about".to_string()]);
        assert!(static_route_candidates("   ").is_empty());
    }

    #[test]
    fn static_provider_resolves_by_candidate_order() {
        let provider = StaticTemplateProvider::default()
            .with_route("details", "<div nd-window>short</div>")
            .with_route("team/details", "<div nd-window>full</div>");
        let request = ContentRequest::default();

        let markup = block_on(provider.fetch("team/details.html", &request)).expect("template");
        assert_eq!(markup, "<div nd-window>full</div>");

        let err = block_on(provider.fetch("missing", &request)).unwrap_err();
        assert_eq!(err, "Static route not found: missing");
    }

    #[test]
    fn memory_provider_records_fetches_and_failures() {
        let provider = MemoryContentProvider::default();
        provider.set_markup("a", "<div nd-window></div>");
        provider.fail("b", "boom");
        let request = ContentRequest {
            force: true,
            activate: false,
        };

        assert!(block_on(provider.fetch("a", &request)).is_ok());
        assert_eq!(block_on(provider.fetch("b", &request)), Err("boom".to_string()));
        assert_eq!(provider.fetch_count("a"), 1);
        assert_eq!(provider.fetches()[1], ("b".to_string(), request));
    }

    #[test]
    fn held_fetch_completes_after_release() {
        let provider = MemoryContentProvider::default();
        provider.set_markup("slow", "<div nd-window></div>");
        let gate = provider.hold("slow");
        let request = ContentRequest::default();

        let mut pool = futures::executor::LocalPool::new();
        let result = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&result);
        let task_provider = provider.clone();
        futures::task::LocalSpawnExt::spawn_local(&pool.spawner(), async move {
            let out = task_provider.fetch("slow", &request).await;
            *sink.borrow_mut() = Some(out);
        })
        .expect("spawn");

        pool.run_until_stalled();
        assert!(result.borrow().is_none());
        gate.release();
        pool.run_until_stalled();
        assert!(matches!(*result.borrow(), Some(Ok(_))));
    }
}
