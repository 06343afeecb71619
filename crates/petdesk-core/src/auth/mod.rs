//! Authentication module for the client session.
//!
//! This module provides:
//! - `CredentialStore`: owner of the single bearer token, with in-memory,
//!   file-backed and OS keychain implementations
//! - `Session`: the presence gate protected screens check before calling the API
//!
//! Tokens carry no expiry metadata. A stale token is only detected when the
//! server rejects it.

pub mod credentials;
pub mod session;

pub use credentials::{
    CredentialStore, FileCredentialStore, KeyringCredentialStore, MemoryCredentialStore,
};
pub use session::{Gate, Session};
