//! Scripted in-memory transport for tests and doc examples.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{ApiRequest, ApiResponse, ApiTransport, Method, TransportError};

type Reply = Result<ApiResponse, TransportError>;

struct Scripted {
    delay: Duration,
    reply: Reply,
}

struct Route {
    method: Method,
    path: String,
    query: Option<Vec<(String, String)>>,
    replies: VecDeque<Scripted>,
}

impl Route {
    fn matches(&self, req: &ApiRequest) -> bool {
        self.method == req.method
            && self.path == req.path
            && self.query.as_ref().map_or(true, |q| *q == req.query)
    }

    /// Replies are consumed in order; the last one repeats forever.
    fn next(&mut self) -> Option<(Duration, Reply)> {
        if self.replies.len() > 1 {
            let s = self.replies.pop_front()?;
            return Some((s.delay, s.reply));
        }
        let last = self.replies.front()?;
        Some((last.delay, last.reply.clone()))
    }
}

/// Transport that answers from a script and records every request.
///
/// Unscripted requests get a 404. Routes are matched in registration order;
/// a route registered with a query only matches that exact query.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: Method, path: &str, query: Option<Vec<(String, String)>>, delay: Duration, reply: Reply) {
        let mut routes = self.routes.lock().unwrap();
        let scripted = Scripted { delay, reply };
        if let Some(route) = routes.iter_mut().find(|r| r.method == method && r.path == path && r.query == query) {
            route.replies.push_back(scripted);
            return;
        }
        routes.push(Route { method, path: path.to_string(), query, replies: VecDeque::from([scripted]) });
    }

    /// Script a reply for any query on `method path`.
    pub fn on(&self, method: Method, path: &str, reply: Reply) -> &Self {
        self.push(method, path, None, Duration::ZERO, reply);
        self
    }

    /// Script a reply delivered after `delay`.
    pub fn on_delayed(&self, method: Method, path: &str, delay: Duration, reply: Reply) -> &Self {
        self.push(method, path, None, delay, reply);
        self
    }

    /// Script a reply for one exact query string.
    pub fn on_query(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        delay: Duration,
        reply: Reply,
    ) -> &Self {
        let query = query.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        self.push(method, path, Some(query), delay, reply);
        self
    }

    /// Every request seen so far, in dispatch order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        self.requests().into_iter().filter(|r| r.path == path).collect()
    }
}

#[async_trait]
impl ApiTransport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let scripted = {
            let mut routes = self.routes.lock().unwrap();
            routes.iter_mut().find(|r| r.matches(&request)).and_then(Route::next)
        };
        match scripted {
            Some((delay, reply)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                reply
            }
            None => Ok(ApiResponse::new(404, serde_json::json!({"message": "no scripted route"}))),
        }
    }
}
