use chrono::Utc;
use http::Method;
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::{
    blob::BlobStore,
    dispatcher::{Dispatcher, Request},
    error::Result,
    prompt::Prompt,
    session::SessionToken,
    user::User,
};

const USERS_PATH: &str = "/v1/api/user";
const IMPORT_USERS_PATH: &str = "/v1/api/user/ImportUsers";
const DELETE_USERS_PATH: &str = "/v1/api/user/DeleteUsers";

/// The user operations available to an authenticated session
pub struct Operations<'a> {
    pub dispatcher: &'a Dispatcher,
    pub api_host: &'a str,
    pub token: &'a SessionToken,
    pub blobs: &'a BlobStore,
}

impl Operations<'_> {
    fn request<'r>(&'r self, method: Method, path: &'r str) -> Request<'r> {
        Request::new(method, self.api_host, path).token(self.token)
    }

    /// Fetches every user and saves them to the export file
    pub async fn export(&self) -> Result<Value> {
        let users = self
            .dispatcher
            .dispatch(self.request(Method::GET, USERS_PATH))
            .await?;

        self.blobs.write_export(&users).await?;

        Ok(users)
    }

    /// Sends users to import; the service answers with the users it could not
    /// import
    pub async fn import<T: Serialize>(&self, users: &[T]) -> Result<Value> {
        let request = self
            .request(Method::PUT, IMPORT_USERS_PATH)
            .payload(users)?;

        self.dispatcher.dispatch(request).await
    }

    /// Deletes users by id; the service answers with the ids it could not
    /// delete
    pub async fn delete(&self, ids: &[String]) -> Result<Value> {
        let request = self
            .request(Method::POST, DELETE_USERS_PATH)
            .payload(ids)?;

        self.dispatcher.dispatch(request).await
    }

    /// Creates a single user
    ///
    /// There is no endpoint for one user, so this is an import of one.
    pub async fn create(&self, user: User) -> Result<Value> {
        self.import(&[user]).await
    }
}

/// Builds a new user, asking for every field not given
pub async fn new_user<R, W>(
    prompt: &mut Prompt<R, W>,
    username: Option<&str>,
    profileid: Option<&str>,
    profilename: Option<&str>,
) -> Result<User>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let username = match username {
        Some(username) => username.to_string(),
        None => prompt.ask_required("Enter username: ").await?,
    };
    let profileid = match profileid {
        Some(profileid) => profileid.to_string(),
        None => prompt.ask_required("Enter profileid: ").await?,
    };
    let profilename = match profilename {
        Some(profilename) => profilename.to_string(),
        None => prompt.ask_required("Enter profilename: ").await?,
    };

    User::new_agent(
        username.trim(),
        profileid.trim(),
        profilename.trim(),
        Utc::now(),
    )
}
