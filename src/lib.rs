//! # Event relay
//!
//! Server-side glue for a community event site: form submissions are appended
//! to a spreadsheet, chat messages are relayed to a language-model API.
//!
//! Modules:
//! - `auth`: service-account JWT assertion and OAuth2 token exchange
//! - `cache`: access tokens and the optional single-slot token cache
//! - `sheets`: form-to-row mapping and spreadsheet append
//! - `chat`: chat relay and fixed-window rate limiter
//! - `config`: YAML configuration, secret sources and validation
//! - `server`: axum router and application state

pub mod auth;
pub mod cache;
pub mod chat;
pub mod config;
pub mod helpers;
pub mod observability;
pub mod resilience;
pub mod server;
pub mod sheets;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::config::settings::ServiceConfig;
