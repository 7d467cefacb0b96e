//! Child shell runner.
//!
//! 在子 shell 中执行生成的脚本；收到 HUP/INT/TERM/QUIT 时取消并杀掉子进程。

use std::path::Path;
use std::process::{ExitStatus, Stdio};

use anyhow::{Context, Result};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Run `sh <script>` to completion and return its exit code. Termination
/// signals received meanwhile kill the child.
pub fn run_script(script: &Path) -> Result<i32> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;
    rt.block_on(async {
        let cancel = CancellationToken::new();
        let listener = tokio::spawn(cancel_on_signal(cancel.clone()));
        let code = run_with_cancel(script, cancel).await;
        listener.abort();
        code
    })
}

/// Run `sh <script>` until it exits or `cancel` fires.
pub async fn run_with_cancel(script: &Path, cancel: CancellationToken) -> Result<i32> {
    tracing::debug!("running {} in child shell", script.display());
    let mut child = Command::new("/usr/bin/env")
        .arg("sh")
        .arg(script)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to spawn shell for {}", script.display()))?;

    tokio::select! {
        status = child.wait() => {
            let status = status.context("failed to wait for child shell")?;
            Ok(exit_code(status))
        }
        _ = cancel.cancelled() => {
            tracing::debug!("cancelled, killing child shell");
            // kill() also reaps the child
            if let Err(e) = child.kill().await {
                tracing::warn!("failed to kill child shell: {}", e);
            }
            Ok(1)
        }
    }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

#[cfg(unix)]
async fn cancel_on_signal(cancel: CancellationToken) {
    use tokio::signal::unix::{signal, SignalKind};

    let (Ok(mut hup), Ok(mut int), Ok(mut term), Ok(mut quit)) = (
        signal(SignalKind::hangup()),
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
        signal(SignalKind::quit()),
    ) else {
        tracing::debug!("unable to install signal handlers");
        return;
    };
    let name = tokio::select! {
        _ = hup.recv() => "SIGHUP",
        _ = int.recv() => "SIGINT",
        _ = term.recv() => "SIGTERM",
        _ = quit.recv() => "SIGQUIT",
    };
    tracing::warn!("got signal {}", name);
    cancel.cancel();
}

#[cfg(not(unix))]
async fn cancel_on_signal(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::warn!("got ctrl-c");
        cancel.cancel();
    }
}
