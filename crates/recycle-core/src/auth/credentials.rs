use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Non-whitespace, "@", non-whitespace, ".", non-whitespace.
/// U+FEFF (byte order mark) counts as whitespace here; Unicode `\s` leaves it out.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@\x{FEFF}]+@[^\s@\x{FEFF}]+\.[^\s@\x{FEFF}]+$")
        .expect("email pattern compiles")
});

/// Local rejection of the login form, raised before any network call.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in all fields.")]
    MissingFields,

    #[error("Please enter a valid email address.")]
    InvalidEmail,
}

/// Email/password pair as typed into the login form.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Run the local checks in order: presence first, then email shape.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.is_empty() || self.password.is_empty() {
            return Err(ValidationError::MissingFields);
        }
        if !is_valid_email(&self.email) {
            return Err(ValidationError::InvalidEmail);
        }
        Ok(())
    }

    /// Email as sent to the backend
    pub fn normalized_email(&self) -> String {
        self.email.to_lowercase()
    }
}

// Keep the password out of logs and panic messages
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}
