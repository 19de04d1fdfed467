//! Network operations
//!
//! HTTP client shared by the feedback hook.

pub mod client;

pub use client::HttpClient;
