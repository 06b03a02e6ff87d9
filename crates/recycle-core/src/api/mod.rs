//! REST API client module for the recycle backend.
//!
//! This module provides the `ApiClient` for exchanging user credentials
//! for a session token at the backend's `/login` endpoint.

pub mod client;
pub mod error;

pub use client::{ApiClient, DEFAULT_API_BASE_URL};
pub use error::ApiError;
