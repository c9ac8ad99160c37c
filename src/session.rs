use std::fmt;

use http::Method;
use serde_json::Value;

use crate::{
    credentials::Credentials,
    dispatcher::{Dispatcher, Request},
    error::{Error, Result},
};

const AUTH_PATH: &str = "/v1/Auth";
const SET_COOKIE: &str = "Set-Cookie";
const TOKEN_MARKER: &str = "access_token=";

/// The cookie captured from the auth service
///
/// It is kept as the full `Set-Cookie` string and replayed verbatim as the
/// `Cookie` header of every later call.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(cookie: impl Into<String>) -> Self {
        Self(cookie.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// Exchanges the credentials for a session token
pub async fn acquire(
    dispatcher: &Dispatcher,
    auth_host: &str,
    credentials: &Credentials,
) -> Result<SessionToken> {
    let request = Request::new(Method::POST, auth_host, AUTH_PATH).payload(credentials)?;

    let response = dispatcher
        .dispatch(request)
        .await
        .map_err(|err| Error::Authentication(err.to_string()))?;

    let token = extract_token(&response)
        .ok_or_else(|| Error::Authentication("no access token found".to_string()))?;

    tracing::info!(host = auth_host, "session acquired");

    Ok(token)
}

/// Finds the first `Set-Cookie` value carrying an access token
///
/// The auth service reports its headers inside the response body as a list of
/// `{"key": .., "value": [..]}` entries.
pub fn extract_token(response: &Value) -> Option<SessionToken> {
    response
        .get("headers")?
        .as_array()?
        .iter()
        .filter(|header| header.get("key").and_then(Value::as_str) == Some(SET_COOKIE))
        .filter_map(|header| header.get("value").and_then(Value::as_array))
        .flatten()
        .filter_map(Value::as_str)
        .find(|cookie| cookie.contains(TOKEN_MARKER))
        .map(SessionToken::new)
}
