//! # QBO Core
//!
//! Connector core for QBO Bridge: OAuth token lifecycle, resilient
//! request execution, and the cached entity views built on top of it.
//!
//! The moving parts, bottom up:
//!
//! - [`store`] - pluggable token persistence (file-backed by default)
//! - [`oauth`] - the upstream token endpoint (refresh / code exchange)
//! - [`token_manager`] - single-flight refresh over shared token state
//! - [`client`] - circuit-breaker-gated, retrying GET executor
//! - [`cache`] - in-memory entity cache with substring search indexes
//! - [`fetch`] - entity fetch routines feeding the cache

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod oauth;
pub mod store;
pub mod token_manager;

pub use client::{CircuitBreaker, CircuitBreakerConfig, CircuitState, QboClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use store::{FileTokenStore, TokenStore};
pub use token_manager::TokenManager;
