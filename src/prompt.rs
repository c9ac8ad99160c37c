use std::io::{Error as IoError, ErrorKind};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::Result;

/// Line-oriented questions and answers over a reader/writer pair
pub struct Prompt<R, W> {
    input: R,
    out: W,
}

impl<R, W> Prompt<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(input: R, out: W) -> Self {
        Self { input, out }
    }

    /// Shows the question and waits for one line of input
    ///
    /// Returns `None` once the input is closed. Bytes that are not UTF-8 are
    /// replaced with U+FFFD.
    pub async fn ask(&mut self, question: &str) -> Result<Option<String>> {
        self.out.write_all(question.as_bytes()).await?;
        self.out.flush().await?;

        let mut line = Vec::new();
        if self.input.read_until(b'\n', &mut line).await? == 0 {
            return Ok(None);
        }

        if line.ends_with(b"\n") {
            line.pop();
            if line.ends_with(b"\r") {
                line.pop();
            }
        }

        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }

    /// Like `ask`, but a closed input is an error
    pub async fn ask_required(&mut self, question: &str) -> Result<String> {
        self.ask(question).await?.ok_or_else(|| {
            IoError::new(ErrorKind::UnexpectedEof, "input closed while waiting for an answer").into()
        })
    }

    pub async fn say(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.write_all(b"\n").await?;
        self.out.flush().await?;
        Ok(())
    }

    #[cfg(test)]
    pub fn output(&self) -> &W {
        &self.out
    }
}
