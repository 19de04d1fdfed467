//! Binaura App Services
//!
//! Persistence for custom presets and settings, share links, the feedback
//! hook, and networking utilities. Depends on the `binaura` engine crate.

pub mod config;
pub mod data;
pub mod error;
pub mod feedback;
pub mod network;
pub mod share;
