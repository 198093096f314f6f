use crate::error::HttpError;
use crate::http::HttpClient;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

/// A request observed by [`ScriptedHttp`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub bearer_token: Option<String>,
    pub form: Vec<(String, String)>,
}

impl RecordedRequest {
    /// Value of a form field, if present
    pub fn form_value(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Default)]
struct Route {
    queue: VecDeque<Result<Value, HttpError>>,
    fallback: Option<Result<Value, HttpError>>,
}

/// In-memory `HttpClient` for tests.
///
/// Responses are scripted per final path segment (`daily_sleep`, `sleep`,
/// `token`, ...). One-shot responses are consumed in order; once a route's queue
/// is empty its sticky response is used, and without one the request fails
/// with a network error.
#[derive(Default)]
pub struct ScriptedHttp {
    routes: Mutex<HashMap<String, Route>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedHttp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a one-shot response
    pub fn respond(&self, segment: &str, result: Result<Value, HttpError>) -> &Self {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(segment.to_string())
            .or_default()
            .queue
            .push_back(result);
        self
    }

    /// Response used whenever the route has no queued one-shot response
    pub fn respond_always(&self, segment: &str, result: Result<Value, HttpError>) -> &Self {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(segment.to_string())
            .or_default()
            .fallback = Some(result);
        self
    }

    /// Every request seen so far, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests whose final path segment matches
    pub fn count(&self, segment: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| last_segment(&r.url) == segment)
            .count()
    }

    fn record(&self, request: RecordedRequest) -> Result<Value, HttpError> {
        let segment = last_segment(&request.url).to_string();
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        let route = routes.entry(segment.clone()).or_default();

        route
            .queue
            .pop_front()
            .or_else(|| route.fallback.clone())
            .unwrap_or_else(|| {
                Err(HttpError::Network(format!(
                    "no scripted response for {}",
                    segment
                )))
            })
    }
}

impl HttpClient for ScriptedHttp {
    async fn get(&self, url: &str, bearer_token: &str) -> Result<Value, HttpError> {
        self.record(RecordedRequest {
            method: "GET",
            url: url.to_string(),
            bearer_token: Some(bearer_token.to_string()),
            form: Vec::new(),
        })
    }

    async fn post(&self, url: &str, form: &[(&str, &str)]) -> Result<Value, HttpError> {
        self.record(RecordedRequest {
            method: "POST",
            url: url.to_string(),
            bearer_token: None,
            form: form
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
    }
}

fn last_segment(url: &str) -> &str {
    let path = url.split('?').next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path)
}
