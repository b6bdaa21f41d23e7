//! External command execution.
//!
//! Commands run through the platform shell with the replicated tree as working
//! directory. Their stdout and stderr go straight to ours; nothing is captured.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, warn};

use super::RunError;
use super::cancel::CancelToken;

/// Everything needed to run one external command.
#[derive(Debug, Clone)]
pub struct CommandSpec<'a> {
  pub cmd: &'a str,
  pub cwd: &'a Path,
  pub env: &'a [(&'a str, &'a str)],
  pub shell: Option<&'a str>,
  pub timeout: Option<Duration>,
  /// Hand our stdin to the child so it can prompt. Otherwise it reads EOF.
  pub inherit_stdin: bool,
}

/// Run a command to completion.
///
/// The command runs through the platform shell (`/bin/sh -c` by default on Unix):
/// - Working directory is `spec.cwd`
/// - `spec.env` is added on top of the inherited environment
/// - stdout and stderr are inherited; stdin only when `spec.inherit_stdin` is set
///
/// The child is killed if `timeout` expires or `cancel` fires first.
///
/// # Arguments
///
/// * `spec` - Command line, working directory, extra environment and limits
/// * `cancel` - Batch cancellation token; an already cancelled token means the command never starts
///
/// # Returns
///
/// `Ok(())` when the command exits with status 0. Otherwise the [`RunError`]
/// says whether it failed, timed out, was cancelled or could not be started.
pub async fn run_command(spec: &CommandSpec<'_>, cancel: &CancelToken) -> Result<(), RunError> {
  let cmd = spec.cmd.to_string();
  let cwd = spec.cwd.to_path_buf();

  if cancel.is_cancelled() {
    return Err(RunError::Cancelled { cmd, cwd });
  }

  info!(cmd = %cmd, cwd = ?cwd, "executing command");

  let (shell_cmd, shell_args) = get_shell(spec.shell);

  let mut command = Command::new(&shell_cmd);
  command
    .args(&shell_args)
    .arg(spec.cmd)
    .current_dir(spec.cwd)
    .stdin(if spec.inherit_stdin { Stdio::inherit() } else { Stdio::null() })
    .stdout(Stdio::inherit())
    .stderr(Stdio::inherit())
    .kill_on_drop(true);

  for (key, value) in spec.env {
    command.env(key, value);
  }

  debug!(shell = %shell_cmd, "spawning process");

  let mut child = command.spawn().map_err(|e| RunError::Spawn {
    cmd: cmd.clone(),
    cwd: cwd.clone(),
    source: e,
  })?;

  // TODO: kill the whole process group on timeout so grandchildren of the shell do not outlive the store.
  let status = tokio::select! {
    status = child.wait() => status.map_err(|e| RunError::Wait { cmd: cmd.clone(), source: e })?,
    _ = deadline(spec.timeout) => {
      warn!(cmd = %cmd, "command timed out, killing");
      kill(&mut child, &cmd).await;
      return Err(RunError::TimedOut {
        cmd,
        cwd,
        timeout: spec.timeout.unwrap_or_default(),
      });
    }
    _ = cancel.cancelled() => {
      warn!(cmd = %cmd, "command cancelled, killing");
      kill(&mut child, &cmd).await;
      return Err(RunError::Cancelled { cmd, cwd });
    }
  };

  if !status.success() {
    return Err(RunError::CommandFailed {
      cmd,
      cwd,
      code: status.code(),
    });
  }

  Ok(())
}

async fn deadline(timeout: Option<Duration>) {
  match timeout {
    Some(duration) => tokio::time::sleep(duration).await,
    None => std::future::pending::<()>().await,
  }
}

async fn kill(child: &mut tokio::process::Child, cmd: &str) {
  if let Err(e) = child.kill().await {
    warn!(cmd = %cmd, error = %e, "failed to kill command");
  }
}

/// Get the shell command and arguments for the current platform.
///
/// An explicit shell gets the argument style its name suggests; otherwise
/// `/bin/sh -c` on Unix and `cmd.exe /C` on Windows.
pub(crate) fn get_shell(override_shell: Option<&str>) -> (String, Vec<String>) {
  if let Some(shell) = override_shell {
    let args = if shell.contains("powershell") || shell.contains("pwsh") {
      vec!["-NoProfile".to_string(), "-Command".to_string()]
    } else if shell.contains("cmd") {
      vec!["/C".to_string()]
    } else {
      vec!["-c".to_string()]
    };
    return (shell.to_string(), args);
  }

  #[cfg(unix)]
  {
    ("/bin/sh".to_string(), vec!["-c".to_string()])
  }

  #[cfg(windows)]
  {
    ("cmd.exe".to_string(), vec!["/C".to_string()])
  }
}
