//! HTTP client for the user directory service.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;
use utils::api::users::{UpdateUserRequest, UserProfile};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("unauthorized")]
    Auth,
    #[error("json error: {0}")]
    Serde(String),
    #[error("url error: {0}")]
    Url(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("service url is empty")]
    EmptyUrl,
    #[error("user id is empty")]
    EmptyUserId,
    #[error("invalid service url: {0}")]
    InvalidUrl(String),
}

/// Identifies one user record on one directory service, plus the credential
/// used to reach it.
#[derive(Debug, Clone)]
pub struct UserTarget {
    base: Url,
    user_id: String,
    credential: Option<Arc<SecretString>>,
}

impl UserTarget {
    pub fn new(
        service_url: &str,
        user_id: &str,
        credential: Option<SecretString>,
    ) -> Result<Self, TargetError> {
        let service_url = service_url.trim();
        if service_url.is_empty() {
            return Err(TargetError::EmptyUrl);
        }
        if user_id.trim().is_empty() {
            return Err(TargetError::EmptyUserId);
        }

        let base = Url::parse(service_url).map_err(|e| TargetError::InvalidUrl(e.to_string()))?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(TargetError::InvalidUrl(format!(
                "{service_url} is not an http(s) base url"
            )));
        }

        Ok(Self {
            base,
            user_id: user_id.to_string(),
            credential: credential.map(Arc::new),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    /// True when both targets would issue identical requests.
    pub fn same_as(&self, other: &UserTarget) -> bool {
        let same_credential = match (&self.credential, &other.credential) {
            (None, None) => true,
            (Some(a), Some(b)) => a.expose_secret() == b.expose_secret(),
            _ => false,
        };
        self.base == other.base && self.user_id == other.user_id && same_credential
    }

    /// `{base}/v0/user/{user_id}`, appended to whatever path the base already has.
    pub fn user_url(&self) -> Result<Url, DirectoryError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| DirectoryError::Url(format!("{} cannot be a base", self.base)))?
            .pop_if_empty()
            .extend(["v0", "user", self.user_id.as_str()]);
        Ok(url)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.credential {
            Some(token) => req.bearer_auth(token.expose_secret()),
            None => req,
        }
    }
}

/// Operations the profile panel needs from the user directory.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn fetch_user(&self, target: &UserTarget) -> Result<UserProfile, DirectoryError>;
    async fn update_user(
        &self,
        target: &UserTarget,
        request: &UpdateUserRequest,
    ) -> Result<UserProfile, DirectoryError>;
    async fn delete_user(&self, target: &UserTarget) -> Result<(), DirectoryError>;
}

#[derive(Debug, Clone)]
pub struct UserDirectoryClient {
    http: Client,
}

impl UserDirectoryClient {
    pub fn new(timeout: Duration) -> Result<Self, DirectoryError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("profile-panel/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl UserDirectory for UserDirectoryClient {
    async fn fetch_user(&self, target: &UserTarget) -> Result<UserProfile, DirectoryError> {
        let url = target.user_url()?;
        debug!(%url, "fetching user profile");

        let res = target
            .authorize(self.http.get(url))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(res).await
    }

    async fn update_user(
        &self,
        target: &UserTarget,
        request: &UpdateUserRequest,
    ) -> Result<UserProfile, DirectoryError> {
        let url = target.user_url()?;
        debug!(%url, "updating user profile");

        let res = target
            .authorize(self.http.put(url))
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(res).await
    }

    async fn delete_user(&self, target: &UserTarget) -> Result<(), DirectoryError> {
        let url = target.user_url()?;
        debug!(%url, "deleting user");

        let res = target
            .authorize(self.http.delete(url))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(DirectoryError::Auth),
            s => Err(http_error(s, res).await),
        }
    }
}

async fn read_json<T>(res: Response) -> Result<T, DirectoryError>
where
    T: DeserializeOwned,
{
    match res.status() {
        s if s.is_success() => res
            .json::<T>()
            .await
            .map_err(|e| DirectoryError::Serde(e.to_string())),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(DirectoryError::Auth),
        s => Err(http_error(s, res).await),
    }
}

async fn http_error(status: StatusCode, res: Response) -> DirectoryError {
    let body = res.text().await.unwrap_or_default();
    DirectoryError::Http {
        status: status.as_u16(),
        body,
    }
}

fn map_reqwest_error(e: reqwest::Error) -> DirectoryError {
    if e.is_timeout() {
        DirectoryError::Timeout
    } else {
        DirectoryError::Transport(e.to_string())
    }
}
