use std::sync::Arc;
use std::time::Duration;

use crate::client::{RemoteItemClient, SharedToken};
use crate::error::Result;

/// Client-side session state: holds the token issued on [`Authenticator::login`]
/// (empty means logged out) and is the only writer of the [`SharedToken`]
/// every [`RemoteItemClient`] call reads from to attach auth metadata.
pub struct Authenticator<C: RemoteItemClient + ?Sized> {
    client: Arc<C>,
    token: SharedToken,
}

impl<C: RemoteItemClient + ?Sized> Authenticator<C> {
    /// `token` is the same [`SharedToken`] the item client reads from when
    /// decorating outbound requests.
    pub fn new(client: Arc<C>, token: SharedToken) -> Self {
        Authenticator { client, token }
    }

    /// Logs in, storing the returned token. Previous token is kept on
    /// failure.
    pub async fn login(&self, login: &str, password: &str, deadline: Duration) -> Result<()> {
        let token = self.client.login(login, password, deadline).await?;
        self.token.set(token);
        Ok(())
    }

    /// Registers a user on the server. Never alters the local token state.
    pub async fn register(&self, login: &str, password: &str, deadline: Duration) -> Result<()> {
        self.client.register(login, password, deadline).await
    }

    /// Clears the local token. No RPC is made; the server session, if any,
    /// simply expires.
    pub fn logout(&self) {
        self.token.clear();
    }

    pub fn current_token(&self) -> String {
        self.token.get()
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.is_set()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{NewRemoteItem, RemoteItem};
    use crate::error::{Error, Result as ClientResult};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeClient {
        logins: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl RemoteItemClient for FakeClient {
        async fn create_item(&self, _item: NewRemoteItem, _deadline: Duration) -> ClientResult<i64> {
            unimplemented!()
        }
        async fn get_item(&self, _id: i64, _deadline: Duration) -> ClientResult<RemoteItem> {
            unimplemented!()
        }
        async fn update_item(&self, _item: RemoteItem, _deadline: Duration) -> ClientResult<()> {
            unimplemented!()
        }
        async fn delete_item(&self, _id: i64, _deadline: Duration) -> ClientResult<()> {
            unimplemented!()
        }
        async fn list_items(&self, _deadline: Duration) -> ClientResult<Vec<RemoteItem>> {
            unimplemented!()
        }
        async fn register(&self, _login: &str, _password: &str, _deadline: Duration) -> ClientResult<()> {
            Ok(())
        }
        async fn login(&self, login: &str, password: &str, _deadline: Duration) -> ClientResult<String> {
            self.logins.lock().unwrap().push((login.to_string(), password.to_string()));
            if password == "correct" {
                Ok("tok-123".to_string())
            } else {
                Err(Error::InvalidCredentials)
            }
        }
    }

    #[tokio::test]
    async fn login_success_sets_token() {
        let client = Arc::new(FakeClient { logins: Mutex::new(Vec::new()) });
        let token = SharedToken::new();
        let auth = Authenticator::new(client, token.clone());

        assert!(!auth.is_logged_in());
        auth.login("alice", "correct", Duration::from_secs(1)).await.unwrap();
        assert!(auth.is_logged_in());
        assert_eq!(auth.current_token(), "tok-123");
        assert_eq!(token.get(), "tok-123");
    }

    #[tokio::test]
    async fn login_failure_keeps_previous_token() {
        let client = Arc::new(FakeClient { logins: Mutex::new(Vec::new()) });
        let token = SharedToken::new();
        token.set("old-token".to_string());
        let auth = Authenticator::new(client, token);

        let err = auth.login("alice", "wrong", Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials));
        assert_eq!(auth.current_token(), "old-token");
    }

    #[tokio::test]
    async fn logout_clears_token_without_an_rpc() {
        let client = Arc::new(FakeClient { logins: Mutex::new(Vec::new()) });
        let token = SharedToken::new();
        token.set("tok".to_string());
        let auth = Authenticator::new(client, token);

        auth.logout();
        assert!(!auth.is_logged_in());
    }
}
