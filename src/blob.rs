use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::{
    error::{Error, Result},
    user::User,
};

const EXPORT_FILE: &str = "exportUsers.json";
const IMPORT_FILE: &str = "importUsers.json";
const DELETE_FILE: &str = "deleteUsers.json";

/// A user read from the import file
///
/// Serializes as the JSON it was read from, so fields `User` does not model
/// and explicit nulls reach the service untouched.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ImportedUser {
    #[serde(skip)]
    pub user: User,
    pub raw: Value,
}

/// The JSON files batch operations read from and write to
pub struct BlobStore {
    dir: PathBuf,
}

impl BlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn export_path(&self) -> PathBuf {
        self.dir.join(EXPORT_FILE)
    }

    pub fn import_path(&self) -> PathBuf {
        self.dir.join(IMPORT_FILE)
    }

    pub fn delete_path(&self) -> PathBuf {
        self.dir.join(DELETE_FILE)
    }

    /// Writes the exported users as a 2-space indented array
    pub async fn write_export(&self, users: &Value) -> Result<PathBuf> {
        if !users.is_array() {
            return Err(Error::Validation(
                "expected an array of users to export".to_string(),
            ));
        }

        let path = self.export_path();
        let content = serde_json::to_string_pretty(users)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, content).await?;

        Ok(path)
    }

    /// Reads and validates the users to import
    pub async fn read_import(&self) -> Result<Vec<ImportedUser>> {
        let path = self.import_path();
        let items = read_array(&path).await?;

        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let user: User = serde_json::from_value(item.clone()).map_err(|err| {
                    Error::Validation(format!("{}: user {index}: {err}", path.display()))
                })?;

                user.validate().map_err(|err| {
                    Error::Validation(format!("{}: user {index}: {err}", path.display()))
                })?;

                Ok(ImportedUser { user, raw: item })
            })
            .collect()
    }

    /// Reads the ids of the users to delete
    pub async fn read_delete(&self) -> Result<Vec<String>> {
        let path = self.delete_path();
        let items = read_array(&path).await?;

        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::String(id) if !id.trim().is_empty() => Ok(id),
                other => Err(Error::Validation(format!(
                    "{}: entry {index} is not a user id: {other}",
                    path.display()
                ))),
            })
            .collect()
    }
}

async fn read_array(path: &Path) -> Result<Vec<Value>> {
    let content = tokio::fs::read(path).await?;
    let value: Value = serde_json::from_slice(&content)?;

    match value {
        Value::Array(items) => Ok(items),
        _ => Err(Error::Validation(format!(
            "{}: expected a JSON array",
            path.display()
        ))),
    }
}
