//! Shared test helpers and a recording transport.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use parley::config::ClientConfig;
use parley::error::{ParleyError, Result};
use parley::transport::{AgentTransport, RawResponse};

pub const APP: &str = "search";
pub const USER: &str = "u_123";
pub const SESSION: &str = "s_123";

/// Config pointing at `base_url` with fixed identifiers.
pub fn test_config(base_url: &str) -> ClientConfig {
    ClientConfig::builder()
        .base_url(base_url)
        .app_name(APP)
        .user_id(USER)
        .session_id(SESSION)
        .initial_state(serde_json::json!({"key1": "value1", "key2": 42}))
        .build()
}

/// Base URL of a local port with nothing listening on it.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// A request the transport was asked to make.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: &'static str,
    pub url: Url,
    pub body: Option<Value>,
}

enum Scripted {
    Respond(RawResponse),
    TimeOut,
}

/// Transport that replays queued responses and records every call.
#[derive(Default)]
pub struct RecordingTransport {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a JSON response.
    pub fn respond(&self, status: u16, body: Value) {
        self.respond_raw(status, &body.to_string());
    }

    pub fn respond_raw(&self, status: u16, body: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Respond(RawResponse::new(status, body)));
    }

    /// Queue a failure where no response arrives.
    pub fn time_out(&self) {
        self.script.lock().unwrap().push_back(Scripted::TimeOut);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_body(&self) -> Option<Value> {
        self.calls().last().and_then(|call| call.body.clone())
    }

    fn next(&self, call: RecordedCall) -> Result<RawResponse> {
        self.calls.lock().unwrap().push(call);
        match self.script.lock().unwrap().pop_front() {
            Some(Scripted::Respond(resp)) => Ok(resp),
            Some(Scripted::TimeOut) => Err(ParleyError::Timeout(10)),
            None => Ok(RawResponse::new(500, "no scripted response")),
        }
    }
}

#[async_trait]
impl AgentTransport for RecordingTransport {
    async fn post_json(&self, url: &Url, body: &Value) -> Result<RawResponse> {
        self.next(RecordedCall {
            method: "POST",
            url: url.clone(),
            body: Some(body.clone()),
        })
    }

    async fn delete(&self, url: &Url) -> Result<RawResponse> {
        self.next(RecordedCall {
            method: "DELETE",
            url: url.clone(),
            body: None,
        })
    }
}
