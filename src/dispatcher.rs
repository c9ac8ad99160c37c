use std::time::Duration;

use http::{
    header::{CONTENT_TYPE, COOKIE},
    HeaderMap, HeaderValue, Method,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    error::{Error, Result},
    session::SessionToken,
    url_builder::URLBuilder,
};

const APPLICATION_JSON: &str = "application/json";

/// A single call against one of the remote services
///
/// The payload is kept as JSON so that what goes over the wire is exactly its
/// serialization, `null` included.
#[derive(Debug)]
pub struct Request<'a> {
    pub method: Method,
    pub host: &'a str,
    pub path: &'a str,
    pub payload: Option<Value>,
    pub token: Option<&'a SessionToken>,
}

impl<'a> Request<'a> {
    pub fn new(method: Method, host: &'a str, path: &'a str) -> Self {
        Self {
            method,
            host,
            path,
            payload: None,
            token: None,
        }
    }

    /// Sets the request payload
    pub fn payload<T: Serialize + ?Sized>(mut self, payload: &T) -> Result<Self> {
        self.payload = Some(serde_json::to_value(payload)?);
        Ok(self)
    }

    /// Authenticates the request with a session token
    pub fn token(mut self, token: &'a SessionToken) -> Self {
        self.token = Some(token);
        self
    }

    /// The JSON text sent as the request body
    ///
    /// A request without a payload still carries a body: the literal `null`.
    pub fn body(&self) -> String {
        match &self.payload {
            Some(payload) => payload.to_string(),
            None => Value::Null.to_string(),
        }
    }
}

/// Sends JSON requests and parses JSON replies
pub struct Dispatcher {
    client: reqwest::Client,
    http_hostnames: Vec<String>,
}

impl Dispatcher {
    pub fn new(http_hostnames: Vec<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            http_hostnames,
        })
    }

    /// Sends the request and returns the parsed response body
    ///
    /// The status code is not interpreted: whatever JSON the service replies
    /// with is handed back to the caller.
    pub async fn dispatch(&self, request: Request<'_>) -> Result<Value> {
        let http_request = self.build(&request)?;

        tracing::debug!(
            method = %request.method,
            url = %http_request.url(),
            authenticated = request.token.is_some(),
            "dispatching request"
        );

        let response = self.client.execute(http_request).await?;
        let status = response.status();

        if status.is_success() {
            tracing::debug!(%status, "response received");
        } else {
            tracing::warn!(%status, path = request.path, "service replied with an error status");
        }

        let bytes = response.bytes().await?;

        parse_body(&bytes)
    }

    fn build(&self, request: &Request<'_>) -> Result<reqwest::Request> {
        let url = URLBuilder::from_host(request.host, request.path, &self.http_hostnames)
            .map(|builder| builder.build())
            .map_err(|err| Error::Validation(format!("invalid endpoint {}: {err:#}", request.host)))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));

        if let Some(token) = request.token {
            let cookie = HeaderValue::from_str(token.as_str())
                .map_err(|_| Error::Validation("session token is not a valid header value".into()))?;
            headers.insert(COOKIE, cookie);
        }

        let http_request = self
            .client
            .request(request.method.clone(), url)
            .headers(headers)
            .body(request.body())
            .build()?;

        Ok(http_request)
    }
}

/// Parses a response body, treating an empty body as an empty object
pub fn parse_body(bytes: &[u8]) -> Result<Value> {
    if bytes.is_empty() {
        return Ok(json!({}));
    }

    Ok(serde_json::from_slice(bytes)?)
}
