//! End-to-end tests for `ApiClient` against a local HTTP server.
//!
//! The server records every request it receives and answers from a table of
//! canned responses keyed by `"METHOD /path"`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::Router;
use petdesk_core::auth::{CredentialStore, MemoryCredentialStore};
use petdesk_core::models::{DogPatch, LoginRequest, NewDog, RegisterRequest};
use petdesk_core::{ApiClient, ApiError, DeletePolicy, Gate, Session};

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    authorization: Option<String>,
    content_type: Option<String>,
    body: String,
}

#[derive(Clone)]
struct MockState {
    requests: Arc<Mutex<Vec<Recorded>>>,
    responses: Arc<HashMap<String, (u16, String)>>,
}

impl MockState {
    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

async fn handle(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .map(|v| v.to_str().unwrap().to_string())
    };
    state.requests.lock().unwrap().push(Recorded {
        method: method.to_string(),
        path: uri.path().to_string(),
        authorization: header_str(header::AUTHORIZATION),
        content_type: header_str(header::CONTENT_TYPE),
        body,
    });

    let key = format!("{} {}", method, uri.path());
    match state.responses.get(&key) {
        Some((status, body)) => (StatusCode::from_u16(*status).unwrap(), body.clone()),
        None => (StatusCode::NOT_FOUND, format!("no route for {}", key)),
    }
}

async fn start_server(routes: &[(&str, u16, &str)]) -> (String, MockState) {
    let responses: HashMap<String, (u16, String)> = routes
        .iter()
        .map(|(key, status, body)| (key.to_string(), (*status, body.to_string())))
        .collect();
    let state = MockState {
        requests: Arc::default(),
        responses: Arc::new(responses),
    };

    let app = Router::new().fallback(handle).with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), state)
}

fn client(base_url: &str, store: &Arc<MemoryCredentialStore>) -> ApiClient {
    ApiClient::new(base_url, store.clone()).unwrap()
}

const REX: &str = r#"{"id":7,"name":"Rex","breed":"Collie","age":3,"isActive":false}"#;

#[tokio::test]
async fn test_login_then_list_dogs_carries_bearer_token() {
    let (url, server) = start_server(&[
        (
            "POST /authentication/login",
            200,
            r#"{"accessToken":"tok123","user":{"id":1,"email":"a@b.com"}}"#,
        ),
        ("GET /dogs", 200, "[]"),
    ])
    .await;
    let store = Arc::new(MemoryCredentialStore::new());
    let session = Session::new(store.clone());
    let api = client(&url, &store);

    let auth = api
        .login(&LoginRequest::new("a@b.com", "secret1"))
        .await
        .unwrap();
    let user = session.begin(&auth);
    assert_eq!(user.id, 1);
    assert_eq!(store.get().as_deref(), Some("tok123"));

    let dogs = api.list_dogs().await.unwrap();
    assert!(dogs.is_empty());

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].path, "/authentication/login");
    assert_eq!(requests[0].authorization, None);
    let login_body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(
        login_body,
        serde_json::json!({"email": "a@b.com", "password": "secret1"})
    );
    assert_eq!(requests[1].method, "GET");
    assert_eq!(requests[1].path, "/dogs");
    assert_eq!(requests[1].authorization.as_deref(), Some("Bearer tok123"));
    assert_eq!(requests[1].content_type.as_deref(), Some("application/json"));
}

#[tokio::test]
async fn test_auth_endpoints_never_send_stored_credential() {
    let auth = r#"{"accessToken":"new","user":{"id":2,"email":"c@d.com","name":"Cee"}}"#;
    let (url, server) = start_server(&[
        ("POST /authentication/register", 201, auth),
        ("POST /authentication/login", 200, auth),
    ])
    .await;
    let store = Arc::new(MemoryCredentialStore::with_token("stale"));
    let api = client(&url, &store);

    let registered = api
        .register(&RegisterRequest::new("c@d.com", "secret1", Some("Cee".to_string())))
        .await
        .unwrap();
    assert_eq!(registered.user.name.as_deref(), Some("Cee"));
    api.login(&LoginRequest::new("c@d.com", "secret1")).await.unwrap();

    for request in server.requests() {
        assert_eq!(request.authorization, None);
        assert_eq!(request.content_type.as_deref(), Some("application/json"));
    }
    // The client never writes to the store itself
    assert_eq!(store.get().as_deref(), Some("stale"));
}

#[tokio::test]
async fn test_get_dog_not_found_surfaces_raw_body() {
    let (url, _server) = start_server(&[("GET /dogs/42", 404, "Dog not found")]).await;
    let store = Arc::new(MemoryCredentialStore::with_token("tok"));

    let err = client(&url, &store).get_dog(42).await.unwrap_err();
    assert_eq!(err.to_string(), "Dog not found");
    assert_eq!(err.message(), "Dog not found");
    assert!(err.is_not_found());
    assert!(matches!(err, ApiError::Client { .. }));
}

#[tokio::test]
async fn test_error_body_is_not_parsed() {
    let json_body = r#"{"message":"Unauthorized","statusCode":401}"#;
    let (url, _server) = start_server(&[
        ("GET /dogs", 401, json_body),
        ("GET /cats", 503, "  Service \u{e9}puis\u{e9} \n"),
    ])
    .await;
    let store = Arc::new(MemoryCredentialStore::with_token("tok"));
    let api = client(&url, &store);

    let err = api.list_dogs().await.unwrap_err();
    assert_eq!(err.message(), json_body);
    assert!(err.is_unauthorized());

    let err = api.get_cats().await.unwrap_err();
    assert_eq!(err.message(), "  Service \u{e9}puis\u{e9} \n");
    assert!(matches!(err, ApiError::Server { .. }));
}

#[tokio::test]
async fn test_update_dog_sends_only_supplied_fields() {
    let (url, server) = start_server(&[("PUT /dogs/7", 200, REX)]).await;
    let store = Arc::new(MemoryCredentialStore::with_token("tok"));

    let patch = DogPatch {
        is_active: Some(false),
        ..Default::default()
    };
    let dog = client(&url, &store).update_dog(7, &patch).await.unwrap();

    assert_eq!(dog.id, 7);
    assert_eq!(dog.name, "Rex");
    assert_eq!(dog.breed, "Collie");
    assert_eq!(dog.age, Some(3));
    assert_eq!(dog.is_active, Some(false));

    let requests = server.requests();
    assert_eq!(requests[0].method, "PUT");
    assert_eq!(requests[0].body, r#"{"isActive":false}"#);
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer tok"));
}

#[tokio::test]
async fn test_gate_without_credential_issues_no_request() {
    let (url, server) = start_server(&[("GET /dogs", 200, "[]")]).await;
    let store = Arc::new(MemoryCredentialStore::new());
    let session = Session::new(store.clone());
    let api = client(&url, &store);

    assert_eq!(store.get(), None);
    let redirected = match session.gate() {
        Gate::RedirectToLogin => true,
        Gate::Proceed(_) => {
            api.list_dogs().await.unwrap();
            false
        }
    };

    assert!(redirected);
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_absent_credential_omits_authorization_header() {
    let (url, server) = start_server(&[("GET /dogs", 200, "[]")]).await;
    let store = Arc::new(MemoryCredentialStore::new());

    client(&url, &store).list_dogs().await.unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].authorization, None);
}

#[tokio::test]
async fn test_list_dogs_preserves_order_and_absent_fields() {
    let body = r#"[{"id":2,"name":"Fido","breed":"Pug"},{"id":1,"name":"Ace","breed":"Lab","age":0,"isActive":true}]"#;
    let (url, _server) = start_server(&[("GET /dogs", 200, body)]).await;
    let store = Arc::new(MemoryCredentialStore::with_token("tok"));

    let dogs = client(&url, &store).list_dogs().await.unwrap();
    assert_eq!(dogs.iter().map(|d| d.id).collect::<Vec<_>>(), vec![2, 1]);
    assert_eq!(dogs[0].age, None);
    assert_eq!(dogs[0].is_active, None);
    assert_eq!(dogs[1].age, Some(0));
    assert_eq!(dogs[1].is_active, Some(true));
}

#[tokio::test]
async fn test_create_dog_returns_server_record() {
    let created = r#"{"id":99,"name":"Fido","breed":"Pug"}"#;
    let (url, server) = start_server(&[("POST /dogs", 201, created)]).await;
    let store = Arc::new(MemoryCredentialStore::with_token("tok"));

    let dog = client(&url, &store)
        .create_dog(&NewDog::new("Fido", "Pug"))
        .await
        .unwrap();
    assert_eq!(dog.id, 99);

    let sent: serde_json::Value = serde_json::from_str(&server.requests()[0].body).unwrap();
    assert_eq!(sent, serde_json::json!({"name": "Fido", "breed": "Pug"}));
}

#[tokio::test]
async fn test_invalid_input_is_rejected_before_sending() {
    let (url, server) = start_server(&[]).await;
    let store = Arc::new(MemoryCredentialStore::with_token("tok"));
    let api = client(&url, &store);

    let err = api
        .register(&RegisterRequest::new("a@b.com", "short", None))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    let err = api.create_dog(&NewDog::new("", "Pug")).await.unwrap_err();
    assert_eq!(err.message(), "Name is required");

    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_get_cats_returns_raw_text() {
    let (url, server) = start_server(&[("GET /cats", 200, "This action returns all cats")]).await;
    let store = Arc::new(MemoryCredentialStore::with_token("tok"));

    let cats = client(&url, &store).get_cats().await.unwrap();
    assert_eq!(cats, "This action returns all cats");
    assert_eq!(server.requests()[0].authorization.as_deref(), Some("Bearer tok"));
}

#[tokio::test]
async fn test_delete_dog_policies() {
    let (url, server) = start_server(&[
        ("DELETE /dogs/1", 200, ""),
        ("DELETE /dogs/2", 404, "Dog not found"),
    ])
    .await;
    let store = Arc::new(MemoryCredentialStore::with_token("tok"));
    let strict = client(&url, &store);

    strict.delete_dog(1).await.unwrap();
    let err = strict.delete_dog(2).await.unwrap_err();
    assert_eq!(err.message(), "Dog not found");

    let lenient = strict.clone().with_delete_policy(DeletePolicy::IgnoreNotFound);
    lenient.delete_dog(2).await.unwrap();

    assert_eq!(server.requests().len(), 3);
    assert!(server.requests().iter().all(|r| r.method == "DELETE"));
}

#[tokio::test]
async fn test_malformed_success_body_is_decode_error() {
    let (url, _server) = start_server(&[("GET /dogs/5", 200, r#"{"id":"five"}"#)]).await;
    let store = Arc::new(MemoryCredentialStore::with_token("tok"));

    let err = client(&url, &store).get_dog(5).await.unwrap_err();
    match err {
        ApiError::Decode { body, .. } => assert_eq!(body, r#"{"id":"five"}"#),
        other => panic!("expected decode error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let store = Arc::new(MemoryCredentialStore::with_token("tok"));
    let err = client(&format!("http://{}", addr), &store)
        .list_dogs()
        .await
        .unwrap_err();
    assert!(err.is_transport());
    assert_eq!(err.status(), None);
    assert_eq!(err.body(), None);
}
