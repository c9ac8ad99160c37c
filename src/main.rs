use std::{
    env,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use colored::Colorize;
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{
    blob::BlobStore, config::Config, credentials::Credentials, dispatcher::Dispatcher,
    operations::Operations, prompt::Prompt,
};

mod blob;
mod config;
mod credentials;
mod dispatcher;
mod error;
mod menu;
mod operations;
mod prompt;
mod session;
#[cfg(test)]
mod test_server;
mod url_builder;
mod user;

const CREDENTIALS_FILE: &str = "config.json";

/// How an interactive session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Exited,
    AuthenticationFailed,
}

impl Outcome {
    fn code(self) -> u8 {
        match self {
            Self::Exited => 0,
            Self::AuthenticationFailed => 1,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match env::var("DAVINCI_CONFIG") {
        Ok(path) => Config::load_from_path(Path::new(&path)).await?,
        Err(_) => Config::load().await?,
    };

    let credentials_path = env::var("DAVINCI_CREDENTIALS")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(CREDENTIALS_FILE));
    let credentials = Credentials::load(&credentials_path)
        .await
        .with_context(|| format!("load credentials from {}", credentials_path.display()))?;

    let dispatcher = Dispatcher::new(config.http_hostnames.clone(), config.request_timeout)
        .context("build HTTP client")?;

    let mut prompt = Prompt::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout());
    let outcome = run_session(&config, &dispatcher, &credentials, &mut prompt).await?;

    Ok(ExitCode::from(outcome.code()))
}

/// Authenticates, then hands the prompt to the menu
///
/// A failed authentication is reported on stderr and the menu is never shown.
async fn run_session<R, W>(
    config: &Config,
    dispatcher: &Dispatcher,
    credentials: &Credentials,
    prompt: &mut Prompt<R, W>,
) -> error::Result<Outcome>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let token = match session::acquire(dispatcher, &config.auth_host, credentials).await {
        Ok(token) => token,
        Err(err) => {
            tracing::error!(error = %err, "authentication failed");
            eprintln!("{} Unable to authenticate: {}", "✗".red().bold(), err);
            return Ok(Outcome::AuthenticationFailed);
        }
    };
    prompt
        .say(&format!("{} Successfully authenticated.", "✓".green().bold()))
        .await?;

    let blobs = BlobStore::new(config.users_dir.clone());
    let operations = Operations {
        dispatcher,
        api_host: &config.api_host,
        token: &token,
        blobs: &blobs,
    };

    menu::run(&operations, prompt).await?;

    Ok(Outcome::Exited)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::{Reply, TestServer};
    use serde_json::json;

    struct Fixture {
        server: TestServer,
        config: Config,
        dispatcher: Dispatcher,
        credentials: Credentials,
        _dir: tempfile::TempDir,
    }

    impl Fixture {
        async fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let server = TestServer::start().await;
            let config = Config {
                auth_host: server.host().to_string(),
                api_host: server.host().to_string(),
                users_dir: dir.path().join("users"),
                ..Config::default()
            };

            Self {
                dispatcher: Dispatcher::new(config.http_hostnames.clone(), None).unwrap(),
                credentials: Credentials::from_value(json!({"clientId": "c"})).unwrap(),
                server,
                config,
                _dir: dir,
            }
        }

        async fn run(&self, input: &'static [u8]) -> (Outcome, String) {
            let mut prompt = Prompt::new(BufReader::new(input), Vec::new());
            let outcome = run_session(&self.config, &self.dispatcher, &self.credentials, &mut prompt)
                .await
                .unwrap();

            (outcome, String::from_utf8(prompt.output().clone()).unwrap())
        }
    }

    #[tokio::test]
    async fn reply_without_token_exits_with_one_and_no_menu() {
        let fixture = Fixture::new().await;
        fixture.server.reply(Reply::json(200, r#"{"headers":[]}"#));

        let (outcome, output) = fixture.run(b"5\n").await;

        assert_eq!(outcome, Outcome::AuthenticationFailed);
        assert_eq!(outcome.code(), 1);
        assert!(output.is_empty(), "{output}");
        assert_eq!(fixture.server.requests().len(), 1);
    }

    #[tokio::test]
    async fn authenticated_session_exits_with_zero() {
        let fixture = Fixture::new().await;
        fixture.server.reply(Reply::json(
            200,
            r#"{"headers":[{"key":"Set-Cookie","value":["access_token=t; Path=/"]}]}"#,
        ));

        let (outcome, output) = fixture.run(b"5\n").await;

        assert_eq!(outcome, Outcome::Exited);
        assert_eq!(outcome.code(), 0);
        assert!(output.contains("Successfully authenticated."));
        assert!(output.contains(menu::MENU));
        assert_eq!(fixture.server.requests()[0].path, "/v1/Auth");
    }
}
