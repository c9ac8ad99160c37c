use std::fmt;

use colored::Colorize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::{
    blob::ImportedUser,
    error::Result,
    operations::{new_user, Operations},
    prompt::Prompt,
};

pub const MENU: &str = "What do you want to do?\n\
                        (1) Export users\n\
                        (2) Import users\n\
                        (3) Delete users\n\
                        (4) Create new user\n\
                        (5) Exit\n";

/// A menu entry that talks to the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Export,
    Import,
    Delete,
    Create,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Export => "export",
            Self::Import => "import",
            Self::Delete => "delete",
            Self::Create => "create",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Run(Operation),
    Exit,
}

impl Choice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::Run(Operation::Export)),
            "2" => Some(Self::Run(Operation::Import)),
            "3" => Some(Self::Run(Operation::Delete)),
            "4" => Some(Self::Run(Operation::Create)),
            "5" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Runs the menu until the user exits or the input is closed
///
/// A failed operation is reported and the menu is shown again; only a failure
/// of the prompt itself ends the loop with an error.
pub async fn run<R, W>(operations: &Operations<'_>, prompt: &mut Prompt<R, W>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        let Some(input) = prompt.ask(MENU).await? else {
            tracing::info!("input closed, exiting");
            return Ok(());
        };

        let Some(choice) = Choice::parse(&input) else {
            tracing::warn!(input = %input, "invalid input");
            prompt.say("Invalid input").await?;
            continue;
        };

        let Choice::Run(operation) = choice else {
            return Ok(());
        };

        match perform(operation, operations, prompt).await {
            Ok(()) => tracing::info!(%operation, "operation completed"),
            Err(err) => {
                tracing::error!(%operation, error = %err, "operation failed");
                prompt
                    .say(&format!("{} Failed to execute operation: {}", "✗".red().bold(), err))
                    .await?;
            }
        }
    }
}

async fn perform<R, W>(
    operation: Operation,
    operations: &Operations<'_>,
    prompt: &mut Prompt<R, W>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    match operation {
        Operation::Export => {
            let users = operations.export().await?;
            let count = users.as_array().map_or(0, Vec::len);
            prompt
                .say(&format!(
                    "{} Exported {} users to {}",
                    "✓".green().bold(),
                    count,
                    operations.blobs.export_path().display()
                ))
                .await
        }

        Operation::Import => {
            let users = operations.blobs.read_import().await?;
            prompt.say(&format!("Importing {} users:", users.len())).await?;
            for ImportedUser { user, .. } in &users {
                let role = user
                    .role()
                    .map(|role| role.to_string())
                    .unwrap_or_else(|| user.roleid.clone());
                prompt.say(&format!("  - {} [{}]", user.email, role)).await?;
            }

            let report = operations.import(&users).await?;
            report_result(prompt, "Import", &report).await
        }

        Operation::Delete => {
            let ids = operations.blobs.read_delete().await?;
            prompt
                .say(&format!("Deleting {} users: {}", ids.len(), ids.join(", ")))
                .await?;

            let report = operations.delete(&ids).await?;
            report_result(prompt, "Delete", &report).await
        }

        Operation::Create => {
            let user = new_user(prompt, None, None, None).await?;
            prompt.say(&format!("Creating {}", serde_json::to_string(&user)?)).await?;

            let report = operations.create(user).await?;
            report_result(prompt, "Create", &report).await
        }
    }
}

async fn report_result<R, W>(prompt: &mut Prompt<R, W>, operation: &str, report: &Value) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    prompt
        .say(&format!("{} {} finished, service replied: {}", "✓".green().bold(), operation, report))
        .await
}
