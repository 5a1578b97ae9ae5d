//! A `reqwest`-based [`RemoteItemClient`] over a plain JSON request/response
//! API. The wire format is a transport detail: swapping this module for a
//! different one (gRPC, a different REST shape, ...) never touches the
//! reconciler, which only sees the trait.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::client::{NewRemoteItem, RemoteItem, RemoteItemClient, SharedToken};
use crate::error::{Error, Result};

/// The header carrying the session token on every authenticated request.
/// This is the transport's name for the logical `"token"` metadata key.
const TOKEN_HEADER: &str = "X-Vault-Token";

pub struct HttpItemClient {
    http: Client,
    base_url: String,
    token: SharedToken,
}

impl HttpItemClient {
    pub fn new(base_url: impl Into<String>, token: SharedToken) -> Self {
        HttpItemClient {
            http: Client::new(),
            base_url: base_url.into(),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    login: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Serialize, Deserialize)]
struct ItemDto {
    #[serde(default)]
    id: i64,
    data: String,
    create_time: DateTime<Utc>,
    update_time: DateTime<Utc>,
}

impl ItemDto {
    fn from_new(item: &NewRemoteItem) -> Self {
        ItemDto {
            id: 0,
            data: BASE64.encode(&item.data),
            create_time: item.create_time,
            update_time: item.update_time,
        }
    }

    fn from_remote(item: &RemoteItem) -> Self {
        ItemDto {
            id: item.id,
            data: BASE64.encode(&item.data),
            create_time: item.create_time,
            update_time: item.update_time,
        }
    }

    fn into_remote(self) -> Result<RemoteItem> {
        let data = BASE64
            .decode(self.data)
            .map_err(|e| Error::Internal(format!("malformed base64 item data: {e}")))?;
        Ok(RemoteItem {
            id: self.id,
            data,
            create_time: self.create_time,
            update_time: self.update_time,
        })
    }
}

#[derive(Deserialize)]
struct CreateItemResponse {
    id: i64,
}

/// Status mapping for item-service calls and `register`: `401`/`403` here
/// mean the caller's session token is missing or invalid.
fn status_to_error(status: StatusCode) -> Error {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Unauthenticated,
        StatusCode::NOT_FOUND => Error::NotFound,
        StatusCode::CONFLICT => Error::AlreadyExists,
        StatusCode::BAD_REQUEST => Error::InvalidCredentials,
        _ => Error::Internal(format!("unexpected status {status}")),
    }
}

/// Status mapping specific to `login`: unlike every other call, a `401`
/// here means a bad login/password pair, not an invalid session token —
/// there is no token yet to be invalid.
fn login_status_to_error(status: StatusCode) -> Error {
    match status {
        StatusCode::NOT_FOUND => Error::UserNotFound,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::BAD_REQUEST => {
            Error::InvalidCredentials
        }
        _ => Error::Internal(format!("unexpected status {status}")),
    }
}

fn transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::DeadlineExceeded
    } else {
        Error::Transport(err.to_string())
    }
}

#[async_trait]
impl RemoteItemClient for HttpItemClient {
    async fn create_item(&self, item: NewRemoteItem, deadline: Duration) -> Result<i64> {
        let resp = self
            .http
            .post(self.url("/v1/items"))
            .timeout(deadline)
            .header(TOKEN_HEADER, self.token.get())
            .json(&ItemDto::from_new(&item))
            .send()
            .await
            .map_err(transport_error)?;
        if !resp.status().is_success() {
            return Err(status_to_error(resp.status()));
        }
        let body: CreateItemResponse = resp.json().await.map_err(transport_error)?;
        Ok(body.id)
    }

    async fn get_item(&self, id: i64, deadline: Duration) -> Result<RemoteItem> {
        let resp = self
            .http
            .get(self.url(&format!("/v1/items/{id}")))
            .timeout(deadline)
            .header(TOKEN_HEADER, self.token.get())
            .send()
            .await
            .map_err(transport_error)?;
        if !resp.status().is_success() {
            return Err(status_to_error(resp.status()));
        }
        let dto: ItemDto = resp.json().await.map_err(transport_error)?;
        dto.into_remote()
    }

    async fn update_item(&self, item: RemoteItem, deadline: Duration) -> Result<()> {
        let resp = self
            .http
            .put(self.url(&format!("/v1/items/{}", item.id)))
            .timeout(deadline)
            .header(TOKEN_HEADER, self.token.get())
            .json(&ItemDto::from_remote(&item))
            .send()
            .await
            .map_err(transport_error)?;
        if !resp.status().is_success() {
            return Err(status_to_error(resp.status()));
        }
        Ok(())
    }

    async fn delete_item(&self, id: i64, deadline: Duration) -> Result<()> {
        let resp = self
            .http
            .delete(self.url(&format!("/v1/items/{id}")))
            .timeout(deadline)
            .header(TOKEN_HEADER, self.token.get())
            .send()
            .await
            .map_err(transport_error)?;
        if !resp.status().is_success() {
            return Err(status_to_error(resp.status()));
        }
        Ok(())
    }

    async fn list_items(&self, deadline: Duration) -> Result<Vec<RemoteItem>> {
        let resp = self
            .http
            .get(self.url("/v1/items"))
            .timeout(deadline)
            .header(TOKEN_HEADER, self.token.get())
            .send()
            .await
            .map_err(transport_error)?;
        if !resp.status().is_success() {
            return Err(status_to_error(resp.status()));
        }
        let dtos: Vec<ItemDto> = resp.json().await.map_err(transport_error)?;
        dtos.into_iter().map(ItemDto::into_remote).collect()
    }

    async fn register(&self, login: &str, password: &str, deadline: Duration) -> Result<()> {
        let resp = self
            .http
            .post(self.url("/v1/users/register"))
            .timeout(deadline)
            .json(&LoginRequest { login, password })
            .send()
            .await
            .map_err(transport_error)?;
        if !resp.status().is_success() {
            return Err(status_to_error(resp.status()));
        }
        Ok(())
    }

    async fn login(&self, login: &str, password: &str, deadline: Duration) -> Result<String> {
        let resp = self
            .http
            .post(self.url("/v1/users/login"))
            .timeout(deadline)
            .json(&LoginRequest { login, password })
            .send()
            .await
            .map_err(transport_error)?;
        if !resp.status().is_success() {
            return Err(login_status_to_error(resp.status()));
        }
        let body: LoginResponse = resp.json().await.map_err(transport_error)?;
        Ok(body.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_maps_unauthorized_to_invalid_credentials_not_unauthenticated() {
        // login has no token to invalidate yet; a 401 here means the
        // login/password pair was wrong, not that a session expired.
        assert!(matches!(
            login_status_to_error(StatusCode::UNAUTHORIZED),
            Error::InvalidCredentials
        ));
    }

    #[test]
    fn login_maps_not_found_to_user_not_found() {
        assert!(matches!(login_status_to_error(StatusCode::NOT_FOUND), Error::UserNotFound));
    }

    #[test]
    fn item_calls_map_unauthorized_to_unauthenticated() {
        assert!(matches!(status_to_error(StatusCode::UNAUTHORIZED), Error::Unauthenticated));
    }

    #[test]
    fn register_maps_conflict_to_already_exists() {
        assert!(matches!(status_to_error(StatusCode::CONFLICT), Error::AlreadyExists));
    }
}
