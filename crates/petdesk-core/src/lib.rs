//! Core library for petdesk.
//!
//! Provides the pieces the front end builds on:
//!
//! - `auth`: the Credential Store and the session gate
//! - `api`: the `ApiClient` for the pet API and its typed `ApiError`
//! - `models`: wire types for dogs and authentication
//! - `config`: persisted application configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, DeletePolicy};
pub use auth::{CredentialStore, Gate, Session};
pub use config::Config;
