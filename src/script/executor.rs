//! Script executor - runs a verification script as a bash child process.
//!
//! The script body is written to a uniquely named temp file behind a
//! `#!/bin/bash` header and run with `bash <file>`. The temp file is a
//! `TempPath`, so it is removed on every exit path, including early
//! returns and cancellation.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, warn};
use tempfile::TempPath;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::result::{ScriptError, ScriptResult};

/// Header written before every script body
pub const SHEBANG: &str = "#!/bin/bash\n\n";

/// How long to keep draining pipes after the child was killed.
const OUTPUT_GRACE: Duration = Duration::from_millis(500);

/// Runs script bodies in a bash child process.
#[derive(Debug, Clone)]
pub struct ScriptExecutor {
    shell: String,
    timeout: Option<Duration>,
    temp_dir: Option<PathBuf>,
    working_dir: Option<PathBuf>,
}

impl Default for ScriptExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptExecutor {
    pub fn new() -> Self {
        Self {
            shell: "bash".to_string(),
            timeout: None,
            temp_dir: None,
            working_dir: None,
        }
    }

    /// Kill scripts that run longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Create temp scripts in `dir` instead of the system temp directory
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Run scripts from `dir` instead of the current directory
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Run `script` and capture its stdout, stderr and exit status.
    ///
    /// Failures never escape as `Err`: they are reported in `ScriptResult::error`.
    pub async fn run(&self, cancel: &CancellationToken, script: &str) -> ScriptResult {
        let path = match self.write_script(script) {
            Ok(path) => path,
            Err(e) => return ScriptResult::failed(ScriptError::Setup(e.to_string())),
        };
        debug!("Running script {}", path.display());

        let result = self.execute(cancel, &path).await;

        if let Err(e) = path.close() {
            warn!("Failed to remove temp script: {}", e);
        }
        result
    }

    fn write_script(&self, script: &str) -> std::io::Result<TempPath> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("xof-").suffix(".sh");
        let mut file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        file.write_all(SHEBANG.as_bytes())?;
        file.write_all(script.as_bytes())?;
        file.flush()?;
        file.as_file().sync_all()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.as_file().set_permissions(std::fs::Permissions::from_mode(0o700))?;
        }

        // Closes the handle; the path stays owned and is deleted on drop.
        Ok(file.into_temp_path())
    }

    async fn execute(&self, cancel: &CancellationToken, path: &Path) -> ScriptResult {
        let mut cmd = Command::new(&self.shell);
        cmd.arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so background jobs die with the script.
        #[cfg(unix)]
        cmd.process_group(0);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => return ScriptResult::failed(ScriptError::Spawn(e.to_string())),
        };
        let group = child.id();

        let stdout = OutputBuffer::default();
        let stderr = OutputBuffer::default();
        let mut stdout_task = child.stdout.take().map(|pipe| tokio::spawn(read_pipe(pipe, stdout.clone())));
        let mut stderr_task = child.stderr.take().map(|pipe| tokio::spawn(read_pipe(pipe, stderr.clone())));

        let timeout = self.timeout;
        let deadline = async move {
            match timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };

        // The script is done only when it exited and both pipes closed;
        // a background job can keep them open after bash returns.
        let finished = async {
            let status = child.wait().await;
            wait_closed(stdout_task.as_mut()).await;
            wait_closed(stderr_task.as_mut()).await;
            status
        };

        let stop = tokio::select! {
            biased;
            () = cancel.cancelled() => Stop::Cancelled,
            () = deadline => Stop::TimedOut,
            status = finished => Stop::Finished(status),
        };

        let error = match stop {
            Stop::Finished(Ok(status)) => exit_error(status),
            Stop::Finished(Err(e)) => Some(ScriptError::Wait(e.to_string())),
            Stop::Cancelled => {
                debug!("Cancellation requested; killing script");
                terminate(&mut child, group).await;
                Some(ScriptError::Cancelled)
            }
            Stop::TimedOut => {
                let ms = timeout.map(|t| t.as_millis() as u64).unwrap_or_default();
                debug!("Script exceeded {}ms; killing it", ms);
                terminate(&mut child, group).await;
                Some(ScriptError::TimedOut(ms))
            }
        };

        if error.as_ref().is_some_and(|e| matches!(e, ScriptError::Cancelled | ScriptError::TimedOut(_))) {
            drain_after_kill(stdout_task).await;
            drain_after_kill(stderr_task).await;
        }

        ScriptResult {
            stdout: stdout.text(),
            stderr: stderr.text(),
            error,
        }
    }
}

enum Stop {
    Finished(std::io::Result<ExitStatus>),
    Cancelled,
    TimedOut,
}

/// Bytes read from one pipe so far, shared with its reader task.
#[derive(Debug, Clone, Default)]
struct OutputBuffer(Arc<Mutex<Vec<u8>>>);

impl OutputBuffer {
    fn push(&self, bytes: &[u8]) {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).extend_from_slice(bytes);
    }

    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap_or_else(|e| e.into_inner())).into_owned()
    }
}

fn exit_error(status: ExitStatus) -> Option<ScriptError> {
    if status.success() {
        None
    } else {
        Some(status.code().map(ScriptError::Exit).unwrap_or(ScriptError::Terminated))
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(mut pipe: R, sink: OutputBuffer) {
    let mut chunk = [0u8; 8192];
    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => sink.push(&chunk[..n]),
            Err(e) => {
                warn!("Failed to read script output: {}", e);
                break;
            }
        }
    }
}

async fn wait_closed(task: Option<&mut JoinHandle<()>>) {
    if let Some(task) = task
        && let Err(e) = task.await
    {
        warn!("Output reader task failed: {}", e);
    }
}

/// Kill the script's whole process group, then the shell itself.
async fn terminate(child: &mut Child, group: Option<u32>) {
    #[cfg(unix)]
    if let Some(pgid) = group.and_then(|id| i32::try_from(id).ok()) {
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;
        // ESRCH only means every member already exited.
        if let Err(e) = killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
            debug!("killpg({}) failed: {}", pgid, e);
        }
    }
    #[cfg(not(unix))]
    let _ = group;

    if let Err(e) = child.kill().await {
        debug!("Failed to kill script shell: {}", e);
    }
}

/// Give reader tasks a short grace period to see EOF after a kill.
async fn drain_after_kill(task: Option<JoinHandle<()>>) {
    let Some(task) = task else {
        return;
    };
    if task.is_finished() {
        return;
    }
    let abort = task.abort_handle();
    if tokio::time::timeout(OUTPUT_GRACE, task).await.is_err() {
        abort.abort();
        warn!("Script output still open after {}ms; dropping the rest", OUTPUT_GRACE.as_millis());
    }
}
