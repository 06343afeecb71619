//! REST API client module for the pet API.
//!
//! This module provides the `ApiClient` for registering, logging in, managing
//! dog records and reading the cats resource.
//!
//! Protected endpoints use bearer token authentication. The token is read
//! from the injected `CredentialStore` each time a request is built.

pub mod client;
pub mod error;

pub use client::{ApiClient, DeletePolicy};
pub use error::ApiError;
pub use reqwest::StatusCode;
