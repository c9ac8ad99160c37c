use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// The credential object posted to the auth service
///
/// Its fields are not interpreted; the object is forwarded exactly as loaded.
#[derive(Clone, Serialize)]
#[serde(transparent)]
pub struct Credentials(Map<String, Value>);

impl Credentials {
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read(path).await?;
        let value: Value = serde_json::from_slice(&content)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(Error::Validation(
                "credentials must be a JSON object".to_string(),
            )),
        }
    }
}
