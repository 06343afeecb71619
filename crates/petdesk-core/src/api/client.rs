//! API client for communicating with the pet REST API.
//!
//! Every request carries `Content-Type: application/json`. Protected
//! operations add `Authorization: Bearer <token>` when the credential store
//! holds a token and omit the header otherwise; the caller is expected to
//! have gated on session presence before calling them.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::CredentialStore;
use crate::config::Config;
use crate::models::{AuthResponse, Dog, DogPatch, LoginRequest, NewDog, RegisterRequest};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const REGISTER_PATH: &str = "/authentication/register";
const LOGIN_PATH: &str = "/authentication/login";
const DOGS_PATH: &str = "/dogs";
const CATS_PATH: &str = "/cats";

/// How `delete_dog` treats a 404 from the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// Surface 404 like any other client error.
    #[default]
    Strict,
    /// Treat 404 as already deleted.
    IgnoreNotFound,
}

/// Whether a request may carry the stored credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    None,
    Bearer,
}

/// API client for the pet service.
/// Clone is cheap - reqwest::Client and the credential store are both shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
    delete_policy: DeletePolicy,
}

impl ApiClient {
    /// Create a client for `base_url` with the default timeout and strict deletes.
    pub fn new(base_url: &str, credentials: Arc<dyn CredentialStore>) -> Result<Self, ApiError> {
        Self::build(
            base_url,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            credentials,
            DeletePolicy::default(),
        )
    }

    /// Create a client from the application configuration.
    pub fn from_config(config: &Config, credentials: Arc<dyn CredentialStore>) -> Result<Self, ApiError> {
        Self::build(
            &config.api_url(),
            config.request_timeout(),
            credentials,
            config.delete_policy,
        )
    }

    fn build(
        base_url: &str,
        timeout: Duration,
        credentials: Arc<dyn CredentialStore>,
        delete_policy: DeletePolicy,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            delete_policy,
        })
    }

    pub fn with_delete_policy(mut self, delete_policy: DeletePolicy) -> Self {
        self.delete_policy = delete_policy;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn headers(&self, auth: Auth) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if auth == Auth::Bearer {
            if let Some(token) = self.credentials.get() {
                match HeaderValue::from_str(&format!("Bearer {}", token)) {
                    Ok(mut value) => {
                        value.set_sensitive(true);
                        headers.insert(AUTHORIZATION, value);
                    }
                    // Sent without the header; the server's rejection surfaces as usual
                    Err(_) => warn!("Stored credential is not a valid header value"),
                }
            }
        }
        headers
    }

    fn request(&self, method: Method, path: &str, auth: Auth) -> RequestBuilder {
        let headers = self.headers(auth);
        debug!(
            method = %method,
            path = path,
            authenticated = headers.contains_key(AUTHORIZATION),
            "Sending request"
        );
        self.client.request(method, self.url(path)).headers(headers)
    }

    /// Check if response is successful, returning an error with the body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await?;
        warn!(
            status = status.as_u16(),
            body = %ApiError::truncate_for_log(&body),
            "Request failed"
        );
        Err(ApiError::from_status(status, body))
    }

    async fn send(request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        Self::check_response(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| ApiError::Decode { body, source })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = Self::send(self.request(Method::GET, path, Auth::Bearer)).await?;
        Self::decode(response).await
    }

    async fn send_json<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        auth: Auth,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = Self::send(self.request(method, path, auth).json(body)).await?;
        Self::decode(response).await
    }

    // ===== Authentication =====

    /// Register a new account. Sent without credentials.
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        request.validate()?;
        self.send_json(Method::POST, REGISTER_PATH, Auth::None, request).await
    }

    /// Log in. Sent without credentials.
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.send_json(Method::POST, LOGIN_PATH, Auth::None, request).await
    }

    // ===== Dogs =====

    pub async fn list_dogs(&self) -> Result<Vec<Dog>, ApiError> {
        self.get(DOGS_PATH).await
    }

    pub async fn get_dog(&self, id: i64) -> Result<Dog, ApiError> {
        self.get(&dog_path(id)).await
    }

    pub async fn create_dog(&self, dog: &NewDog) -> Result<Dog, ApiError> {
        dog.validate()?;
        self.send_json(Method::POST, DOGS_PATH, Auth::Bearer, dog).await
    }

    /// Send a partial update. Only the fields present in `patch` are sent.
    pub async fn update_dog(&self, id: i64, patch: &DogPatch) -> Result<Dog, ApiError> {
        patch.validate()?;
        self.send_json(Method::PUT, &dog_path(id), Auth::Bearer, patch).await
    }

    /// Delete a dog. A 404 is an error unless the client uses `DeletePolicy::IgnoreNotFound`.
    pub async fn delete_dog(&self, id: i64) -> Result<(), ApiError> {
        let path = dog_path(id);
        match Self::send(self.request(Method::DELETE, &path, Auth::Bearer)).await {
            Ok(_) => Ok(()),
            Err(ApiError::Client { status, .. })
                if status == StatusCode::NOT_FOUND
                    && self.delete_policy == DeletePolicy::IgnoreNotFound =>
            {
                debug!(id, "Dog already deleted");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    // ===== Cats =====

    /// Fetch the cats resource as raw text.
    pub async fn get_cats(&self) -> Result<String, ApiError> {
        let response = Self::send(self.request(Method::GET, CATS_PATH, Auth::Bearer)).await?;
        Ok(response.text().await?)
    }
}

fn dog_path(id: i64) -> String {
    format!("{}/{}", DOGS_PATH, id)
}
