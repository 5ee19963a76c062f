//! Window content providers backed by `fetch` and by in-page `<template data-route>` elements.

use window_host::{
    normalize_endpoint, ContentFuture, ContentProvider, ContentRequest, StaticTemplateProvider,
};

/// Header marking a request as a window-content request so servers can return bare fragments.
pub const MODAL_REQUEST_HEADER: &str = "X-Modal-Request";

#[derive(Debug, Clone, Default)]
/// Network content provider issuing uncached `GET {base_url}/{endpoint}` requests.
pub struct WebContentProvider {
    base_url: String,
}

impl WebContentProvider {
    /// Creates a provider resolving endpoints against the page origin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider resolving endpoints against `base_url`.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Returns the request URL for `endpoint`.
    pub fn resolve_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, normalize_endpoint(endpoint))
    }
}

impl ContentProvider for WebContentProvider {
    fn fetch<'a>(
        &'a self,
        endpoint: &'a str,
        _request: &'a ContentRequest,
    ) -> ContentFuture<'a, Result<String, String>> {
        let url = self.resolve_url(endpoint);
        Box::pin(async move {
            #[cfg(target_arch = "wasm32")]
            {
                fetch_text(&url).await
            }

            #[cfg(not(target_arch = "wasm32"))]
            {
                Err(format!("network content is unavailable off the browser: {url}"))
            }
        })
    }
}

#[cfg(target_arch = "wasm32")]
async fn fetch_text(url: &str) -> Result<String, String> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Request, RequestCache, RequestInit, Response};

    use crate::interop::js_error_to_string;

    let init = RequestInit::new();
    init.set_method("GET");
    init.set_cache(RequestCache::NoCache);
    let request = Request::new_with_str_and_init(url, &init).map_err(js_error_to_string)?;
    request
        .headers()
        .set(MODAL_REQUEST_HEADER, "1")
        .map_err(js_error_to_string)?;

    let window = web_sys::window().ok_or_else(|| "window unavailable".to_string())?;
    let response: Response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(js_error_to_string)?
        .dyn_into()
        .map_err(js_error_to_string)?;
    if !response.ok() {
        return Err(format!(
            "Failed to fetch window content: {}",
            response.status_text()
        ));
    }

    let text = JsFuture::from(response.text().map_err(js_error_to_string)?)
        .await
        .map_err(js_error_to_string)?;
    text.as_string()
        .ok_or_else(|| "window content response was not text".to_string())
}

#[derive(Debug, Clone, Copy, Default)]
/// Static-site content provider serving markup from `<template data-route="...">` elements.
///
/// Templates are read on every fetch so routes added after startup are picked up.
pub struct DomTemplateProvider;

impl DomTemplateProvider {
    /// Collects the route templates currently present in the document.
    pub fn collect_routes() -> StaticTemplateProvider {
        #[cfg(target_arch = "wasm32")]
        {
            StaticTemplateProvider::new(document_templates())
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            StaticTemplateProvider::default()
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn document_templates() -> Vec<(String, String)> {
    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        return Vec::new();
    };
    let Ok(nodes) = document.query_selector_all("template[data-route]") else {
        return Vec::new();
    };

    let mut routes = Vec::new();
    for index in 0..nodes.length() {
        let Some(node) = nodes.item(index) else {
            continue;
        };
        let Ok(element) = wasm_bindgen::JsCast::dyn_into::<web_sys::Element>(node) else {
            continue;
        };
        if let Some(route) = element.get_attribute("data-route") {
            if !route.trim().is_empty() {
                routes.push((route, element.inner_html()));
            }
        }
    }
    routes
}

impl ContentProvider for DomTemplateProvider {
    fn fetch<'a>(
        &'a self,
        endpoint: &'a str,
        request: &'a ContentRequest,
    ) -> ContentFuture<'a, Result<String, String>> {
        Box::pin(async move { Self::collect_routes().fetch(endpoint, request).await })
    }
}
