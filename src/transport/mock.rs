//! Recording in-memory transport for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{Method, Transport};
use crate::error::{RedmineError, Result};

/// A request seen by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

/// Answers requests from canned responses keyed by method and exact path.
/// Unrouted requests fail with a 404.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(String, String), Value>>,
    failures: Mutex<HashMap<(String, String), u16>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: Method, path: &str, body: Value) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), body);
        self
    }

    pub fn fail(&self, method: Method, path: &str, status: u16) -> &Self {
        self.failures
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), status);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_body(&self, method: Method) -> Option<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.method == method)
            .and_then(|r| r.body.clone())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            path: path.to_string(),
            body,
        });

        let key = (method.to_string(), path.to_string());
        if let Some(status) = self.failures.lock().unwrap().get(&key) {
            return Err(RedmineError::Api {
                status: *status,
                body: format!("{} {} failed", method, path),
            });
        }
        self.routes
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or_else(|| RedmineError::Api {
                status: 404,
                body: format!("no route for {} {}", method, path),
            })
    }
}
