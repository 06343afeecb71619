use std::sync::Arc;

use tracing::info;

use crate::models::{AuthResponse, UserSummary};

use super::CredentialStore;

/// Outcome of the presence check a protected screen runs on entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    /// A credential is present; the screen may call protected operations.
    Proceed(String),
    /// No credential; the screen must send the user to login instead.
    RedirectToLogin,
}

impl Gate {
    pub fn is_redirect(&self) -> bool {
        matches!(self, Gate::RedirectToLogin)
    }
}

/// Client session built on a shared credential store.
///
/// The API client only reads the store; feeding a login/register result into
/// it and clearing it on logout happen here.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn CredentialStore>,
}

impl Session {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<dyn CredentialStore> {
        Arc::clone(&self.store)
    }

    /// Session presence flag.
    pub fn is_authenticated(&self) -> bool {
        self.store.is_present()
    }

    /// Presence check for protected screens.
    pub fn gate(&self) -> Gate {
        match self.store.get() {
            Some(token) => Gate::Proceed(token),
            None => Gate::RedirectToLogin,
        }
    }

    /// Store the token from a successful login or registration.
    pub fn begin<'a>(&self, auth: &'a AuthResponse) -> &'a UserSummary {
        self.store.set(&auth.access_token);
        info!(user_id = auth.user.id, "Session started");
        &auth.user
    }

    /// Log out. Safe to call when no session exists.
    pub fn end(&self) {
        self.store.clear();
        info!("Session ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryCredentialStore;

    fn auth_response(token: &str) -> AuthResponse {
        AuthResponse {
            access_token: token.to_string(),
            user: UserSummary {
                id: 1,
                email: "a@b.com".to_string(),
                name: None,
            },
        }
    }

    #[test]
    fn test_gate_redirects_without_credential() {
        let session = Session::new(Arc::new(MemoryCredentialStore::new()));
        assert!(!session.is_authenticated());
        assert_eq!(session.gate(), Gate::RedirectToLogin);
        assert!(session.gate().is_redirect());
    }

    #[test]
    fn test_begin_stores_token() {
        let store = Arc::new(MemoryCredentialStore::new());
        let session = Session::new(store.clone());
        let auth = auth_response("tok123");

        let user = session.begin(&auth);
        assert_eq!(user.email, "a@b.com");
        assert_eq!(store.get().as_deref(), Some("tok123"));
        assert_eq!(session.gate(), Gate::Proceed("tok123".to_string()));
    }

    #[test]
    fn test_end_is_idempotent() {
        let session = Session::new(Arc::new(MemoryCredentialStore::with_token("tok")));
        session.end();
        session.end();
        assert_eq!(session.gate(), Gate::RedirectToLogin);
    }
}
