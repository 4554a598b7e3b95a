mod common;

use std::time::Duration;

use common::{DirectoryServer, alice, closed_port_url, spawn};
use secrecy::SecretString;
use services::services::directory_client::{
    DirectoryError, UserDirectory, UserDirectoryClient, UserTarget,
};
use utils::api::users::UpdateUserRequest;

fn client() -> UserDirectoryClient {
    UserDirectoryClient::new(Duration::from_secs(5)).unwrap()
}

fn token(value: &str) -> Option<SecretString> {
    Some(SecretString::new(value.into()))
}

#[tokio::test]
async fn fetch_forwards_bearer_token() {
    let server = DirectoryServer {
        required_token: Some("good-token".into()),
        ..DirectoryServer::with_user("2", alice())
    };
    let base = spawn(server.clone()).await;

    let target = UserTarget::new(&base, "2", token("good-token")).unwrap();
    let profile = client().fetch_user(&target).await.unwrap();

    assert_eq!(profile, alice());
    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/v0/user/2");
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some("Bearer good-token")
    );
}

#[tokio::test]
async fn no_credential_means_no_header() {
    let server = DirectoryServer::with_user("2", alice());
    let base = spawn(server.clone()).await;

    let target = UserTarget::new(&base, "2", None).unwrap();
    client().fetch_user(&target).await.unwrap();

    assert_eq!(server.requests()[0].authorization, None);
}

#[tokio::test]
async fn keeps_base_path_prefix() {
    let server = DirectoryServer::with_user("2", alice());
    let base = spawn(server.clone()).await;

    let target = UserTarget::new(&format!("{base}/api"), "2", None).unwrap();
    client().fetch_user(&target).await.unwrap();

    assert_eq!(server.requests()[0].path, "/api/v0/user/2");
}

#[tokio::test]
async fn classifies_failures() {
    let server = DirectoryServer {
        required_token: Some("good-token".into()),
        ..DirectoryServer::with_user("2", alice())
    };
    let base = spawn(server).await;
    let client = client();

    let wrong_token = UserTarget::new(&base, "2", token("stale")).unwrap();
    assert_eq!(
        client.fetch_user(&wrong_token).await.unwrap_err(),
        DirectoryError::Auth
    );

    let missing = UserTarget::new(&base, "99", token("good-token")).unwrap();
    assert_eq!(
        client.fetch_user(&missing).await.unwrap_err(),
        DirectoryError::Http {
            status: 404,
            body: "user not found".into(),
        }
    );

    let garbled = UserTarget::new(&base, "garbled", token("good-token")).unwrap();
    assert!(matches!(
        client.fetch_user(&garbled).await,
        Err(DirectoryError::Serde(_))
    ));
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let target = UserTarget::new(&closed_port_url().await, "2", None).unwrap();
    assert!(matches!(
        client().fetch_user(&target).await,
        Err(DirectoryError::Transport(_))
    ));
}

#[tokio::test]
async fn update_sends_json_body() {
    let server = DirectoryServer::with_user("2", alice());
    let base = spawn(server.clone()).await;
    let target = UserTarget::new(&base, "2", token("t")).unwrap();

    let updated = client()
        .update_user(
            &target,
            &UpdateUserRequest {
                username: "alice2".into(),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.username, "alice2");
    assert_eq!(updated.email, "alice@x.com");
    let request = &server.requests()[0];
    assert_eq!(request.method, "PUT");
    assert_eq!(request.authorization.as_deref(), Some("Bearer t"));
    assert_eq!(
        request.body,
        Some(serde_json::json!({ "username": "alice2" }))
    );
}

#[tokio::test]
async fn delete_accepts_empty_success() {
    let server = DirectoryServer::with_user("2", alice());
    let base = spawn(server.clone()).await;
    let target = UserTarget::new(&base, "2", None).unwrap();
    let client = client();

    client.delete_user(&target).await.unwrap();
    assert!(matches!(
        client.fetch_user(&target).await,
        Err(DirectoryError::Http { status: 404, .. })
    ));
    assert_eq!(server.methods(), vec!["DELETE", "GET"]);
}

#[tokio::test]
async fn delete_reports_server_errors() {
    let server = DirectoryServer {
        fail_deletes: true,
        ..DirectoryServer::with_user("2", alice())
    };
    let base = spawn(server).await;
    let target = UserTarget::new(&base, "2", None).unwrap();

    assert_eq!(
        client().delete_user(&target).await.unwrap_err(),
        DirectoryError::Http {
            status: 500,
            body: "database unavailable".into(),
        }
    );
}
