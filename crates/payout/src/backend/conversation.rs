//! Expect-style conversation with a long-lived wallet shell
//!
//! ```text
//!            spawn            send_line()           expect() matched
//!   ──────> AwaitingPrompt ──────────────> AwaitingProgress ───────────> AwaitingPrompt
//!                 │                              │
//!                 │ finish() exited in time      │ exited / timed out / io error
//!                 ▼                              ▼
//!               Done                           Failed
//! ```
//!
//! Reads are bounded by `read_timeout`; nothing blocks forever on a wallet
//! that stops talking.

use std::{
    process::{ExitStatus, Stdio},
    time::Duration,
};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    process::{Child, ChildStdin, ChildStdout, Command},
    task::JoinHandle,
    time::timeout,
};
use tracing::debug;

const READ_CHUNK: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationState {
    /// Waiting for the wallet to show a prompt
    AwaitingPrompt,
    /// A line was sent; waiting for the wallet to finish with it
    AwaitingProgress,
    Done,
    Failed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConversationError {
    #[error("failed to start process: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("process i/o failed: {0}")]
    Io(#[source] std::io::Error),

    #[error("process exited with output: {output}")]
    Exited { output: String },

    #[error("timed out waiting for process, output so far: {output}")]
    TimedOut { output: String },
}

impl ConversationError {
    /// Whatever the process printed before things went wrong
    pub fn output(&self) -> Option<&str> {
        match self {
            ConversationError::Exited { output } | ConversationError::TimedOut { output } => {
                Some(output)
            }
            _ => None,
        }
    }
}

pub struct Conversation {
    child: Child,
    stdin: ChildStdin,
    stdout: ChildStdout,
    /// Reads stderr to the end while the process runs
    stderr: Option<JoinHandle<String>>,
    pending: String,
    read_timeout: Duration,
    state: ConversationState,
}

impl Conversation {
    pub fn spawn(mut command: Command, read_timeout: Duration) -> Result<Self, ConversationError> {
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(ConversationError::Spawn)?;

        let missing = || ConversationError::Spawn(std::io::Error::other("stdio was not piped"));
        let stdin = child.stdin.take().ok_or_else(missing)?;
        let stdout = child.stdout.take().ok_or_else(missing)?;
        let stderr = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut bytes = Vec::new();
                if let Err(e) = stderr.read_to_end(&mut bytes).await {
                    debug!("Reading process stderr failed: {}", e);
                }
                String::from_utf8_lossy(&bytes).into_owned()
            })
        });

        Ok(Self {
            child,
            stdin,
            stdout,
            stderr,
            pending: String::new(),
            read_timeout,
            state: ConversationState::AwaitingPrompt,
        })
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    fn fail(&mut self, err: ConversationError) -> ConversationError {
        debug!("Conversation failed: {}", err);
        self.state = ConversationState::Failed(err.to_string());
        err
    }

    pub async fn send_line(&mut self, line: &str) -> Result<(), ConversationError> {
        let write = async {
            self.stdin.write_all(line.as_bytes()).await?;
            self.stdin.write_all(b"\n").await?;
            self.stdin.flush().await
        };
        if let Err(e) = write.await {
            return Err(self.fail(ConversationError::Io(e)));
        }
        self.state = ConversationState::AwaitingProgress;
        Ok(())
    }

    /// Read until `done` accepts everything received since the last match,
    /// and return that text
    pub async fn expect<F>(&mut self, done: F) -> Result<String, ConversationError>
    where
        F: Fn(&str) -> bool,
    {
        let mut buf = [0u8; READ_CHUNK];
        loop {
            if done(&self.pending) {
                self.state = ConversationState::AwaitingPrompt;
                return Ok(std::mem::take(&mut self.pending));
            }

            let read = match timeout(self.read_timeout, self.stdout.read(&mut buf)).await {
                Ok(Ok(n)) => n,
                Ok(Err(e)) => return Err(self.fail(ConversationError::Io(e))),
                Err(_) => {
                    let output = std::mem::take(&mut self.pending);
                    return Err(self.fail(ConversationError::TimedOut { output }));
                }
            };
            if read == 0 {
                let mut output = std::mem::take(&mut self.pending);
                output.push_str(&self.drain_stderr().await);
                return Err(self.fail(ConversationError::Exited { output }));
            }
            self.pending.push_str(&String::from_utf8_lossy(&buf[..read]));
        }
    }

    /// Everything the process wrote to stderr, once it has closed it
    pub async fn drain_stderr(&mut self) -> String {
        let Some(mut collector) = self.stderr.take() else {
            return String::new();
        };
        match timeout(self.read_timeout, &mut collector).await {
            Ok(Ok(text)) => text,
            _ => {
                collector.abort();
                String::new()
            }
        }
    }

    /// Send `exit_command` and give the process `wait` to exit before
    /// killing it
    pub async fn finish(
        mut self,
        exit_command: &str,
        wait: Duration,
    ) -> Result<ExitStatus, ConversationError> {
        self.send_line(exit_command).await?;
        match timeout(wait, self.child.wait()).await {
            Ok(Ok(status)) => {
                self.state = ConversationState::Done;
                Ok(status)
            }
            Ok(Err(e)) => Err(self.fail(ConversationError::Io(e))),
            Err(_) => {
                let _ = self.child.kill().await;
                let output = std::mem::take(&mut self.pending);
                Err(self.fail(ConversationError::TimedOut { output }))
            }
        }
    }
}

/// Whether `output` ends at the shell prompt `prompt`
pub fn ends_with_prompt(output: &str, prompt: &str) -> bool {
    output.trim_end().ends_with(prompt)
}

/// Whether `output` ends at a passphrase prompt or any `>` prompt
pub fn is_password_prompt(output: &str) -> bool {
    output.contains("Password:") || output.trim_end().ends_with('>')
}

/// Message of the first line containing `marker`: the text after that
/// line's first space
pub fn find_error_line<'a>(output: &'a str, marker: &str) -> Option<&'a str> {
    output
        .lines()
        .find(|line| line.contains(marker))
        .map(|line| {
            let line = line.trim();
            line.split_once(' ').map(|(_, rest)| rest.trim()).unwrap_or(line)
        })
}
