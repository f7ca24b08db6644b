//! Scripted in-memory [`Transport`] for tests.
//!
//! Replies are queued per URL (optionally per `page` query value) and served
//! in order; the last reply in a queue repeats. Unmatched requests get a 404.
//! Every request is recorded, and the number of simultaneously in-flight
//! requests is tracked so callers can assert on concurrency limits.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};

/// One scripted outcome.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// A response with the given status, headers, and body.
    Response {
        /// HTTP status code.
        status: u16,
        /// Extra headers on top of the default quota headers.
        headers: Vec<(String, String)>,
        /// Response body.
        body: String,
    },
    /// A transport-level failure.
    Fail(TransportError),
}

impl MockReply {
    /// A 200 response carrying `body` as JSON.
    pub fn json(body: serde_json::Value) -> Self {
        MockReply::Response {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    /// A response with an arbitrary status and text body.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        MockReply::Response {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// A read timeout.
    pub fn timeout() -> Self {
        MockReply::Fail(TransportError::Timeout("operation timed out".into()))
    }

    /// A TLS handshake failure.
    pub fn handshake() -> Self {
        MockReply::Fail(TransportError::Handshake("tls handshake eof".into()))
    }

    /// A non-retryable connection failure.
    pub fn refused() -> Self {
        MockReply::Fail(TransportError::Other("connection refused".into()))
    }

    /// Add a response header, overriding any default of the same name.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let MockReply::Response { headers, .. } = &mut self {
            headers.push((name.to_string(), value.to_string()));
        }
        self
    }
}

struct Route {
    url: String,
    page: Option<u32>,
    replies: VecDeque<MockReply>,
}

/// In-memory transport driven by scripted replies.
///
/// Only built for this crate's tests or with the `test-util` feature.
///
/// # Examples
///
/// ```ignore
/// use repopulse_github::mock::{MockReply, MockTransport};
///
/// let transport = MockTransport::new().reply(
///     "https://api.github.com/repos/o/r/languages",
///     MockReply::json(serde_json::json!({"Rust": 10})),
/// );
/// assert_eq!(transport.request_count(), 0);
/// ```
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<HttpRequest>>,
    latency: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// An empty transport that answers 404 to everything.
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            latency: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Simulated time each request spends in flight.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queue `reply` for requests to `url`.
    pub fn reply(self, url: &str, reply: MockReply) -> Self {
        self.push(url, None, reply);
        self
    }

    /// Queue `reply` for requests to `url` whose `page` parameter equals `page`.
    pub fn reply_page(self, url: &str, page: u32, reply: MockReply) -> Self {
        self.push(url, Some(page), reply);
        self
    }

    fn push(&self, url: &str, page: Option<u32>, reply: MockReply) {
        let mut routes = lock(&self.routes);
        match routes.iter_mut().find(|r| r.url == url && r.page == page) {
            Some(route) => route.replies.push_back(reply),
            None => routes.push(Route {
                url: url.to_string(),
                page,
                replies: VecDeque::from([reply]),
            }),
        }
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Number of requests received for `url`.
    pub fn requests_to(&self, url: &str) -> usize {
        lock(&self.requests).iter().filter(|r| r.url == url).count()
    }

    /// Highest number of requests that were in flight at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn next_reply(&self, request: &HttpRequest) -> MockReply {
        let page = request.query_param("page").and_then(|p| p.parse::<u32>().ok());
        let mut routes = lock(&self.routes);
        let index = routes
            .iter()
            .position(|r| r.url == request.url && r.page.is_some() && r.page == page)
            .or_else(|| {
                routes
                    .iter()
                    .position(|r| r.url == request.url && r.page.is_none())
            });
        let Some(index) = index else {
            return not_found();
        };

        let replies = &mut routes[index].replies;
        if replies.len() > 1 {
            replies.pop_front().unwrap_or_else(not_found)
        } else {
            replies.front().cloned().unwrap_or_else(not_found)
        }
    }
}

fn not_found() -> MockReply {
    MockReply::status(404, r#"{"message":"Not Found"}"#)
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("x-ratelimit-limit", HeaderValue::from_static("5000"));
    headers.insert("x-ratelimit-remaining", HeaderValue::from_static("4999"));
    headers.insert("x-ratelimit-reset", HeaderValue::from_static("1700000000"));
    headers
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let reply = self.next_reply(&request);
        lock(&self.requests).push(request);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match reply {
            MockReply::Fail(err) => Err(err),
            MockReply::Response {
                status,
                headers: extra,
                body,
            } => {
                let mut headers = default_headers();
                for (name, value) in extra {
                    if let (Ok(name), Ok(value)) = (
                        HeaderName::from_bytes(name.as_bytes()),
                        HeaderValue::from_str(&value),
                    ) {
                        headers.insert(name, value);
                    }
                }
                Ok(HttpResponse {
                    status,
                    headers,
                    body,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str, page: Option<u32>) -> HttpRequest {
        HttpRequest {
            url: url.into(),
            query: page
                .map(|p| vec![("page".to_string(), p.to_string())])
                .unwrap_or_default(),
            headers: HeaderMap::new(),
        }
    }

    #[tokio::test]
    async fn replies_are_served_in_order_and_last_repeats() {
        let transport = MockTransport::new()
            .reply("u", MockReply::timeout())
            .reply("u", MockReply::status(200, "ok"));

        assert!(transport.get(request("u", None)).await.is_err());
        let first = transport.get(request("u", None)).await.unwrap();
        let second = transport.get(request("u", None)).await.unwrap();
        assert_eq!(first.body, "ok");
        assert_eq!(second.body, "ok");
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn page_routes_take_precedence() {
        let transport = MockTransport::new()
            .reply("u", MockReply::status(200, "any"))
            .reply_page("u", 2, MockReply::status(200, "two"));

        assert_eq!(transport.get(request("u", Some(2))).await.unwrap().body, "two");
        assert_eq!(transport.get(request("u", Some(3))).await.unwrap().body, "any");
    }

    #[tokio::test]
    async fn unmatched_requests_get_404() {
        let transport = MockTransport::new();
        let response = transport.get(request("nowhere", None)).await.unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(transport.requests_to("nowhere"), 1);
    }
}
