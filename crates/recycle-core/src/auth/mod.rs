//! Authentication module for credentials and the persisted session.
//!
//! This module provides:
//! - `Credentials`: the login form pair and its local validation
//! - `Session`: the session token under a fixed storage key
//! - `KeyValueStore`: file, OS keychain and in-memory storage backends

pub mod credentials;
pub mod session;
pub mod store;

pub use credentials::{is_valid_email, Credentials, ValidationError};
pub use session::{Session, AUTH_TOKEN_KEY};
pub use store::{FileStore, KeyValueStore, KeyringStore, MemoryStore};
