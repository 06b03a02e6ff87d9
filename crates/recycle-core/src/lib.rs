//! Core library for the recycle login client.
//!
//! - `api`: HTTP client for the backend's login endpoint
//! - `auth`: credentials, validation and the persisted session token
//! - `config`: on-disk configuration
//! - `login`: the login screen controller shared by every front end

pub mod api;
pub mod auth;
pub mod config;
pub mod login;

pub use api::{ApiClient, ApiError};
pub use auth::{Credentials, Session, ValidationError};
pub use config::Config;
pub use login::{LoginAlert, LoginFlow, Route, SubmitOutcome};
