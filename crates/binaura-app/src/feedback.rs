//! Feedback hook
//!
//! Fire-and-forget: submitting never blocks and never fails the session.
//! The HTTP sink posts on a short-lived thread and only logs the outcome;
//! `flush` lets a process that is about to exit wait for those threads.

use crate::error::{AppError, Result};
use crate::network::HttpClient;
use binaura::config::network::USER_AGENT;
use serde::Serialize;
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use std::time::{SystemTime, UNIX_EPOCH};

/// One piece of user feedback
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub text: String,
    /// Seconds since the Unix epoch
    pub timestamp: u64,
    pub user_agent: String,
}

impl Feedback {
    /// Feedback stamped with the current time; blank text is rejected
    pub fn new(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Config("Feedback text is empty".to_string()));
        }
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Ok(Self {
            text: text.to_string(),
            timestamp,
            user_agent: USER_AGENT.to_string(),
        })
    }
}

/// Destination for feedback
pub trait FeedbackSink: Send {
    fn submit(&self, feedback: Feedback);

    /// Wait for submissions still in flight (before the process exits)
    fn flush(&self) {}
}

/// Drops feedback (no endpoint configured)
#[derive(Debug, Default)]
pub struct NullFeedback;

impl FeedbackSink for NullFeedback {
    fn submit(&self, feedback: Feedback) {
        log::debug!("No feedback endpoint configured; dropped {} bytes", feedback.text.len());
    }
}

/// Posts feedback as JSON to an HTTP endpoint
pub struct HttpFeedbackSink {
    endpoint: String,
    client: HttpClient,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl HttpFeedbackSink {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Ok(Self {
            endpoint: endpoint.into(),
            client: HttpClient::new()?,
            in_flight: Mutex::new(Vec::new()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post synchronously
    pub fn send_blocking(&self, feedback: &Feedback) -> Result<()> {
        self.client.post_json(&self.endpoint, feedback)
    }
}

impl FeedbackSink for HttpFeedbackSink {
    fn submit(&self, feedback: Feedback) {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let spawned = thread::Builder::new()
            .name("feedback".to_string())
            .spawn(move || match client.post_json(&endpoint, &feedback) {
                Ok(()) => log::info!("Feedback sent"),
                Err(e) => log::warn!("Feedback failed: {}", e),
            });
        match spawned {
            Ok(handle) => {
                let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
                in_flight.retain(|h| !h.is_finished());
                in_flight.push(handle);
            }
            Err(e) => log::warn!("Feedback thread failed to start: {}", e),
        }
    }

    fn flush(&self) {
        let handles: Vec<_> = self
            .in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect();
        for handle in handles {
            let _ = handle.join();
        }
    }
}

/// Sink for the configured endpoint, or one that drops everything
pub fn sink_for(endpoint: Option<&str>) -> Box<dyn FeedbackSink> {
    match endpoint.map(str::trim).filter(|e| !e.is_empty()) {
        Some(endpoint) => match HttpFeedbackSink::new(endpoint) {
            Ok(sink) => Box::new(sink),
            Err(e) => {
                log::warn!("Feedback disabled: {}", e);
                Box::new(NullFeedback)
            }
        },
        None => Box::new(NullFeedback),
    }
}
