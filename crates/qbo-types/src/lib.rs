//! # QBO Types
//!
//! Core types, models, and error definitions for QBO Bridge.
//!
//! This crate provides the foundational type system shared by the
//! connector core and the server:
//!
//! - **`error`** - The wire-visible failure taxonomy for QBO API calls
//! - **`models`** - Domain models (TokenState, QBO entities, cache views)
//!
//! All types are designed to be:
//! - **Serializable** via serde for API responses and persistence
//! - **Clone** for cheap sharing across async boundaries
//! - **PartialEq** for testing and comparison

pub mod error;
pub mod models;

pub use error::{ApiError, ApiResult, ErrorKind};
pub use models::{
    CacheSnapshot, CompanyInfo, CompanyInfoReply, Customer, EmailAddress, Invoice, Item,
    QueryReply, QueryResponse, TokenState, Vendor,
};
