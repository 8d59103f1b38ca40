//! Spawning commands and collecting their output.
//!
//! The argv handed to [`tokio::process::Command`] here comes from the same
//! [`Command::command_and_flat_args`] flattening that rendering uses, so what gets executed is
//! exactly what [`Command::render`] prints.

use std::error::Error;
use std::fmt::Display;
use std::fmt::Write;
use std::process::ExitStatus;
use std::process::Stdio;

use command_group::AsyncCommandGroup;
use command_group::AsyncGroupChild;
use miette::Context;
use miette::IntoDiagnostic;
use nix::sys::signal::pthread_sigmask;
use nix::sys::signal::SigSet;
use nix::sys::signal::SigmaskHow;
use nix::sys::signal::Signal;
use serde::de::DeserializeOwned;
use tokio::process::Child;
use tokio::process::Command as TokioCommand;
use tracing::instrument;

use crate::command::Command;
use crate::print::LineWrapping;
use crate::print::PrintOptions;

/// A command exited with a non-zero status.
///
/// Carries the rendered command line and, when the command was run with captured output, its
/// stderr, so callers can branch on the cause rather than on a generic message.
#[derive(Debug)]
pub struct ExitStatusError {
    /// The exit status the command finished with.
    pub status: ExitStatus,
    /// The command, rendered on one line.
    pub command_line: String,
    /// Captured stderr, if the command was run with captured output.
    pub stderr: Option<String>,
}

impl Display for ExitStatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "`{}` failed: {}", self.command_line, self.status)?;
        if let Some(stderr) = &self.stderr {
            let stderr = stderr.trim();
            if !stderr.is_empty() {
                write!(f, "\n\nStderr: {stderr}")?;
            }
        }
        Ok(())
    }
}

impl Error for ExitStatusError {}

impl miette::Diagnostic for ExitStatusError {}

/// The captured streams and exit status of a finished command.
#[derive(Debug)]
pub struct CapturedOutput {
    /// The exit status. Always successful; a non-zero exit is reported as [`ExitStatusError`]
    /// instead.
    pub status: ExitStatus,
    /// Everything the command wrote to stdout, as UTF-8 text.
    pub stdout: String,
    /// Everything the command wrote to stderr, as UTF-8 text.
    pub stderr: String,
}

/// A spawned child process paired with its command line.
///
/// Completion is a first-class part of this value rather than something attached to the child
/// handle after the fact: [`SpawnedCommand::wait_for_success`] resolves exactly once per spawn.
/// The stdio channels, when piped, are available through [`SpawnedCommand::child`].
#[derive(Debug)]
pub struct SpawnedCommand {
    /// The child process handle.
    pub child: Child,
    /// The command, rendered on one line, for logs and error messages.
    command_line: String,
}

impl SpawnedCommand {
    /// The rendered command line this child was launched from.
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    /// Wait for the child to exit.
    ///
    /// A zero exit status is success; anything else is an [`ExitStatusError`]. If the child's
    /// stdio is piped, the caller is responsible for draining stdout and stderr before waiting,
    /// or the child may block on a full pipe.
    pub async fn wait_for_success(&mut self) -> miette::Result<()> {
        let status = self
            .child
            .wait()
            .await
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to wait for `{}`", self.command_line))?;
        tracing::debug!(command = %self.command_line, %status, "Command exited");

        if status.success() {
            Ok(())
        } else {
            Err(ExitStatusError {
                status,
                command_line: self.command_line.clone(),
                stderr: None,
            }
            .into())
        }
    }
}

/// A child process running detached in its own process group.
///
/// Dropping this value does not kill the child; it keeps running in the background, unaffected
/// by `SIGINT` sent to the parent's terminal.
pub struct DetachedCommand {
    /// The process-group child handle.
    pub child: AsyncGroupChild,
    /// The command, rendered on one line.
    command_line: String,
}

impl DetachedCommand {
    /// The rendered command line this child was launched from.
    pub fn command_line(&self) -> &str {
        &self.command_line
    }
}

impl Command {
    /// Build a [`tokio::process::Command`] from this command's canonical argv.
    ///
    /// The caller can adjust stdio, environment, and working directory before spawning.
    pub fn as_tokio_command(&self) -> TokioCommand {
        let (program, args) = self.command_and_flat_args();
        let mut command = TokioCommand::new(program);
        command.args(args);
        command
    }

    /// This command rendered on one line, for logs and error messages.
    fn command_line(&self) -> String {
        self.render(&PrintOptions {
            line_wrapping: LineWrapping::Inline,
            ..Default::default()
        })
    }

    /// Spawn this command with inherited stdio.
    ///
    /// Launch failures, like a missing executable or denied permission, are reported here,
    /// wrapped with the rendered command line.
    #[instrument(level = "debug", skip_all)]
    pub fn spawn(&self) -> miette::Result<SpawnedCommand> {
        let command_line = self.command_line();
        tracing::debug!("$ {command_line}");
        let child = self
            .as_tokio_command()
            .spawn()
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to start `{command_line}`"))?;
        Ok(SpawnedCommand {
            child,
            command_line,
        })
    }

    /// Spawn this command with stdin, stdout, and stderr piped.
    #[instrument(level = "debug", skip_all)]
    pub fn spawn_piped(&self) -> miette::Result<SpawnedCommand> {
        let command_line = self.command_line();
        tracing::debug!("$ {command_line}");
        let child = self
            .as_tokio_command()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to start `{command_line}`"))?;
        Ok(SpawnedCommand {
            child,
            command_line,
        })
    }

    /// Run this command to completion, capturing stdout and stderr.
    ///
    /// Both streams are fully drained before the exit status is reported. A non-zero exit is an
    /// [`ExitStatusError`] carrying the captured stderr.
    #[instrument(level = "debug", skip_all)]
    pub async fn output(&self) -> miette::Result<CapturedOutput> {
        let command_line = self.command_line();
        tracing::debug!("$ {command_line}");
        let output = self
            .as_tokio_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to execute `{command_line}`"))?;

        let stdout = String::from_utf8(output.stdout)
            .into_diagnostic()
            .wrap_err_with(|| format!("`{command_line}` wrote invalid UTF-8 to stdout"))?;
        let stderr = String::from_utf8(output.stderr)
            .into_diagnostic()
            .wrap_err_with(|| format!("`{command_line}` wrote invalid UTF-8 to stderr"))?;

        let mut message = format!("`{command_line}` ");
        if output.status.success() {
            message.push_str("finished successfully");
        } else {
            write!(message, "failed: {}", output.status)
                .expect("Writing to a `String` never fails");
        }
        tracing::debug!("{message}");

        if output.status.success() {
            Ok(CapturedOutput {
                status: output.status,
                stdout,
                stderr,
            })
        } else {
            Err(ExitStatusError {
                status: output.status,
                command_line,
                stderr: Some(stderr),
            }
            .into())
        }
    }

    /// Run this command to completion and deserialize its stdout as a single JSON document.
    pub async fn output_json<T: DeserializeOwned>(&self) -> miette::Result<T> {
        let output = self.output().await?;
        serde_json::from_str(&output.stdout)
            .into_diagnostic()
            .wrap_err_with(|| {
                format!(
                    "Failed to deserialize JSON from `{}` stdout",
                    self.command_line()
                )
            })
    }

    /// Spawn this command detached: in its own process group, with stdio attached to the null
    /// device, and without inheriting `SIGINT` from the calling process.
    #[instrument(level = "debug", skip_all)]
    pub fn spawn_detached(&self) -> miette::Result<DetachedCommand> {
        let command_line = self.command_line();
        tracing::debug!("$ {command_line} &");
        let child = spawn_without_inheriting_sigint(|| {
            self.as_tokio_command()
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .group_spawn()
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to start `{command_line}`"))
        })?;
        Ok(DetachedCommand {
            child,
            command_line,
        })
    }
}

fn spawn_without_inheriting_sigint<T>(
    spawn: impl FnOnce() -> miette::Result<T>,
) -> miette::Result<T> {
    // See: https://github.com/rust-lang/rust/pull/100737#issuecomment-1445257548
    let mut old_signal_mask = SigSet::empty();
    pthread_sigmask(
        SigmaskHow::SIG_SETMASK,
        Some(&SigSet::from_iter(std::iter::once(Signal::SIGINT))),
        Some(&mut old_signal_mask),
    )
    .into_diagnostic()?;

    let result = spawn();

    pthread_sigmask(SigmaskHow::SIG_SETMASK, Some(&old_signal_mask), None).into_diagnostic()?;

    result
}
