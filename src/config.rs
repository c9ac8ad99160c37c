use std::{
    env,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::{fs::File, io::AsyncReadExt};

/// Where to reach the remote services and where to keep the user blobs
#[derive(Debug, Clone)]
pub struct Config {
    pub auth_host: String,
    pub api_host: String,
    pub http_hostnames: Vec<String>,
    pub users_dir: PathBuf,
    pub request_timeout: Option<Duration>,
}

const AUTH_HOST: &str = "oauth.contactcanvas.com";
const API_HOST: &str = "api.contactcanvas.com";
const USERS_DIR: &str = "users";

fn default_http_hostnames() -> Vec<String> {
    vec!["localhost".to_string(), "127.0.0.1".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Config {
            auth_host: AUTH_HOST.to_string(),
            api_host: API_HOST.to_string(),
            http_hostnames: default_http_hostnames(),
            users_dir: PathBuf::from(USERS_DIR),
            request_timeout: None,
        }
    }
}

impl Config {
    /// Loads the settings file from the config home, falling back to defaults
    /// when there is none
    pub async fn load() -> Result<Self> {
        let path = get_config_home()?
            .join("davinci-users")
            .join("config.json");

        match File::open(&path).await {
            Ok(mut file) => Self::load_from_file(&mut file).await,
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err).context("open config file"),
        }
    }

    pub async fn load_from_path(path: &Path) -> Result<Self> {
        let mut file = File::open(path).await.context("open config file")?;
        Self::load_from_file(&mut file).await
    }

    async fn load_from_file(file: &mut File) -> Result<Self> {
        let mut dest = Vec::new();
        file.read_to_end(&mut dest).await?;

        let config_file: ConfigFile = serde_json::from_slice(&dest).context("parse config file")?;

        Ok(Config {
            auth_host: config_file.auth_host.unwrap_or(AUTH_HOST.to_string()),
            api_host: config_file.api_host.unwrap_or(API_HOST.to_string()),
            http_hostnames: config_file
                .http_hostnames
                .unwrap_or_else(default_http_hostnames),
            users_dir: config_file
                .users_dir
                .unwrap_or_else(|| PathBuf::from(USERS_DIR)),
            request_timeout: config_file.request_timeout_secs.map(Duration::from_secs),
        })
    }
}

fn get_config_home() -> Result<PathBuf> {
    match env::var("XDG_CONFIG_HOME") {
        Ok(path) => Ok(Path::new(&path).to_path_buf()),
        Err(_) => Ok(homedir::my_home()?.context("home dir")?.join(".config")),
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    auth_host: Option<String>,
    api_host: Option<String>,
    http_hostnames: Option<Vec<String>>,
    users_dir: Option<PathBuf>,
    request_timeout_secs: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_host":"127.0.0.1:9000","request_timeout_secs":5}"#)
            .unwrap();

        let config = Config::load_from_path(&path).await.unwrap();

        assert_eq!(config.api_host, "127.0.0.1:9000");
        assert_eq!(config.auth_host, AUTH_HOST);
        assert_eq!(config.users_dir, PathBuf::from("users"));
        assert_eq!(config.http_hostnames, default_http_hostnames());
        assert_eq!(config.request_timeout, Some(Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        let error = Config::load_from_path(&path).await.unwrap_err();
        assert_eq!(error.to_string(), "parse config file");
    }
}
