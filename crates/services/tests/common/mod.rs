#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Json, Router,
    extract::{OriginalUri, Path, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::get,
};
use utils::api::users::{UpdateUserRequest, UserProfile};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Option<serde_json::Value>,
}

/// In-process stand-in for the user directory service.
#[derive(Clone, Default)]
pub struct DirectoryServer {
    pub users: Arc<Mutex<HashMap<String, UserProfile>>>,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
    pub required_token: Option<String>,
    pub lowercase_usernames: bool,
    pub fail_deletes: bool,
}

impl DirectoryServer {
    pub fn with_user(user_id: &str, profile: UserProfile) -> Self {
        let server = Self::default();
        server
            .users
            .lock()
            .unwrap()
            .insert(user_id.to_string(), profile);
        server
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<&'static str> {
        self.requests().iter().map(|r| r.method).collect()
    }

    fn record(
        &self,
        method: &'static str,
        uri: &axum::http::Uri,
        headers: &HeaderMap,
        body: Option<serde_json::Value>,
    ) -> Result<(), Response> {
        let authorization = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            path: uri.path().to_string(),
            authorization: authorization.clone(),
            body,
        });

        match &self.required_token {
            Some(token) if authorization.as_deref() != Some(format!("Bearer {token}").as_str()) => {
                Err((StatusCode::UNAUTHORIZED, "missing or invalid token").into_response())
            }
            _ => Ok(()),
        }
    }
}

async fn get_user(
    State(server): State<DirectoryServer>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(rejection) = server.record("GET", &uri, &headers, None) {
        return rejection;
    }
    if id == "garbled" {
        return (StatusCode::OK, "<html>not json</html>").into_response();
    }
    let user = server.users.lock().unwrap().get(&id).cloned();
    match user {
        Some(user) => Json(user).into_response(),
        None => (StatusCode::NOT_FOUND, "user not found").into_response(),
    }
}

async fn put_user(
    State(server): State<DirectoryServer>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<UpdateUserRequest>,
) -> Response {
    let body = serde_json::to_value(&request).ok();
    if let Err(rejection) = server.record("PUT", &uri, &headers, body) {
        return rejection;
    }
    let mut users = server.users.lock().unwrap();
    let Some(user) = users.get_mut(&id) else {
        return (StatusCode::NOT_FOUND, "user not found").into_response();
    };
    user.username = if server.lowercase_usernames {
        request.username.to_lowercase()
    } else {
        request.username
    };
    Json(user.clone()).into_response()
}

async fn delete_user(
    State(server): State<DirectoryServer>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(rejection) = server.record("DELETE", &uri, &headers, None) {
        return rejection;
    }
    if server.fail_deletes {
        return (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable").into_response();
    }
    match server.users.lock().unwrap().remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => (StatusCode::NOT_FOUND, "user not found").into_response(),
    }
}

/// Serves the directory on an ephemeral port and returns its base url.
pub async fn spawn(server: DirectoryServer) -> String {
    let users = Router::new().route(
        "/v0/user/{id}",
        get(get_user).put(put_user).delete(delete_user),
    );
    let app = Router::new()
        .merge(users.clone())
        .nest("/api", users)
        .with_state(server);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// A base url nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn alice() -> UserProfile {
    UserProfile {
        id: 2,
        username: "alice".to_string(),
        email: "alice@x.com".to_string(),
        email_verified: true,
        picture_url: None,
        created_via: "google".to_string(),
        auth_providers: vec!["google".to_string()],
        phone_number: None,
    }
}
