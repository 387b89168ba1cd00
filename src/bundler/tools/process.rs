//! Bounded execution of external programs.
//!
//! Synchronous capability calls (`install_name_tool`, `codesign`, `hdiutil`,
//! `brew`) go through [`run`], which enforces a timeout with `wait-timeout`.
//! Long-running steps (CMake, the deployer, `git clone`, the launch probe) go
//! through [`run_streaming`], which forwards output to the log as it arrives
//! and also honours the run's cancellation token.

use crate::bundler::{Error, Result};
use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio_util::sync::CancellationToken;
use wait_timeout::ChildExt;

/// Default budget for a single synchronous tool call.
pub const TOOL_TIMEOUT: Duration = Duration::from_secs(120);

/// Captured result of a finished command.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

fn describe(command: &Command) -> String {
    let mut parts = vec![command.get_program().to_string_lossy().into_owned()];
    parts.extend(command.get_args().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

fn spawn_error(program: &str, e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::NotFound {
        Error::MissingPrerequisite {
            tool: program.to_string(),
            hint: "install it or add it to PATH".to_string(),
        }
    } else {
        Error::GenericError(format!("failed to execute {program}: {e}"))
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Runs `command` to completion, killing it after `timeout`.
pub fn run(mut command: Command, timeout: Duration) -> Result<CommandOutput> {
    let program = command.get_program().to_string_lossy().into_owned();
    let description = describe(&command);
    log::debug!("Running: {}", description);

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| spawn_error(&program, e))?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = match child.wait_timeout(timeout)? {
        Some(status) => status,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::Timeout {
                command: description,
                seconds: timeout.as_secs(),
            });
        }
    };

    Ok(CommandOutput {
        status,
        stdout: stdout.join().unwrap_or_default(),
        stderr: stderr.join().unwrap_or_default(),
    })
}

/// Logs `pipe` line by line until EOF. Bytes that are not UTF-8 are logged
/// lossily; the pipe is always drained so the child never sees a closed reader.
async fn forward_lines<R: AsyncRead + Unpin>(pipe: Option<R>, level: log::Level, label: &str) {
    let Some(pipe) = pipe else { return };
    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                log::log!(level, "[{}] {}", label, line.trim_end_matches(['\r', '\n']));
            }
            Err(e) => {
                log::debug!("[{}] output stream closed: {}", label, e);
                break;
            }
        }
    }
}

/// Runs `command`, streaming its output to the log, until it exits, the
/// timeout elapses, or `cancel` fires.
///
/// Returns the exit status; interpreting it is the caller's business.
pub async fn run_streaming(
    mut command: tokio::process::Command,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<ExitStatus> {
    let std_command = command.as_std();
    let program = std_command.get_program().to_string_lossy().into_owned();
    let description = describe(std_command);
    log::debug!("Running: {}", description);

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| spawn_error(&program, e))?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let label = program.clone();

    let pump = async move {
        tokio::join!(
            forward_lines(stdout, log::Level::Info, &label),
            forward_lines(stderr, log::Level::Warn, &label)
        );
    };

    let outcome = tokio::select! {
        result = tokio::time::timeout(timeout, async {
            pump.await;
            child.wait().await
        }) => result,
        _ = cancel.cancelled() => {
            let _ = child.kill().await;
            return Err(Error::Cancelled);
        }
    };

    match outcome {
        Ok(status) => Ok(status?),
        Err(_elapsed) => {
            let _ = child.kill().await;
            Err(Error::Timeout {
                command: description,
                seconds: timeout.as_secs(),
            })
        }
    }
}
