//! Data models for the pet API.
//!
//! - `Dog`, `NewDog`, `DogPatch`: dog records and their create/update payloads
//! - `RegisterRequest`, `LoginRequest`, `AuthResponse`, `UserSummary`:
//!   authentication payloads
//!
//! Optional fields are true `Option`s: an absent field is never serialized,
//! which keeps "not supplied" distinct from `false` or `0`.

pub mod auth;
pub mod dog;

use thiserror::Error;

pub use auth::{AuthResponse, LoginRequest, RegisterRequest, UserSummary};
pub use dog::{Dog, DogPatch, NewDog};

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// A local input-constraint violation, detected before any request is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters")]
    PasswordTooShort,
}

pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(())
    }
}
