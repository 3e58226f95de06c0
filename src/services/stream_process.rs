// Stream Process Service
// Supervises the BUTT streaming client process

use std::path::PathBuf;
use std::process::Stdio;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};

use crate::models::Settings;

pub const BUTT_BINARY: &str = "butt";

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("BUTT is already running")]
    AlreadyRunning,

    #[error("BUTT is not running")]
    NotRunning,

    #[error("BUTT executable not found: {}", .0.display())]
    ExecutableNotFound(PathBuf),

    #[error("Failed to start BUTT: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Failed to signal BUTT: {0}")]
    Signal(String),

    #[error("Failed to wait for BUTT: {0}")]
    Wait(#[source] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Running,
}

/// Owns at most one BUTT child process
pub struct StreamSupervisor {
    child: Option<Child>,
    binary_path: Option<PathBuf>,
}

impl StreamSupervisor {
    pub fn new() -> Self {
        Self {
            child: None,
            binary_path: None,
        }
    }

    /// Use an explicit BUTT executable instead of searching for one
    pub fn with_binary_path(mut self, path: PathBuf) -> Self {
        self.binary_path = Some(path);
        self
    }

    /// Locate the BUTT executable
    /// Checks in order: explicit path, working directory, PATH
    pub fn find_binary(&self) -> PathBuf {
        if let Some(ref path) = self.binary_path {
            return path.clone();
        }

        let local_names: &[&str] = if cfg!(target_os = "windows") {
            &["butt.exe", "butt"]
        } else {
            &["butt"]
        };

        if let Ok(cwd) = std::env::current_dir() {
            for name in local_names {
                let candidate = cwd.join(name);
                if candidate.is_file() {
                    log::debug!("Found BUTT in working directory: {:?}", candidate);
                    return candidate;
                }
            }
        }

        if let Ok(which_path) = which::which(BUTT_BINARY) {
            log::debug!("Found BUTT in PATH: {:?}", which_path);
            return which_path;
        }

        PathBuf::from(BUTT_BINARY)
    }

    /// Command line for BUTT in daemon mode
    pub fn build_args(settings: &Settings) -> Vec<String> {
        vec![
            "-s".to_string(),
            settings.source_password.clone(),
            "-h".to_string(),
            settings.host(),
            "-p".to_string(),
            settings.port_number().to_string(),
            "-m".to_string(),
            settings.mount(),
            "-t".to_string(),
            settings.stream_title.clone(),
            "-d".to_string(),
            settings.stream_description.clone(),
            "-g".to_string(),
            settings.stream_genre.clone(),
            "-b".to_string(),
            settings.bitrate.as_str().to_string(),
            "-c".to_string(),
            settings.channels.as_str().to_string(),
            "-r".to_string(),
            settings.samplerate.as_str().to_string(),
            "-D".to_string(),
        ]
    }

    /// Current state; a child that exited on its own is reaped here
    pub fn state(&mut self) -> StreamState {
        let Some(child) = self.child.as_mut() else {
            return StreamState::Idle;
        };

        match child.try_wait() {
            Ok(None) => StreamState::Running,
            Ok(Some(status)) => {
                log::info!("BUTT exited on its own ({status})");
                self.child = None;
                StreamState::Idle
            }
            Err(e) => {
                log::warn!("Failed to query BUTT process state: {e}");
                StreamState::Running
            }
        }
    }

    pub fn is_running(&mut self) -> bool {
        self.state() == StreamState::Running
    }

    /// PID of the running child, if any
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    /// Spawn BUTT with arguments derived from `settings`
    pub fn start(&mut self, settings: &Settings) -> Result<u32, ProcessError> {
        if self.is_running() {
            return Err(ProcessError::AlreadyRunning);
        }

        let binary_path = self.find_binary();
        let args = Self::build_args(settings);
        log::info!(
            "Starting BUTT from {:?} for {}:{}{}",
            binary_path,
            settings.host(),
            settings.port_number(),
            settings.mount()
        );

        let mut child = Command::new(&binary_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ProcessError::ExecutableNotFound(binary_path.clone())
                } else {
                    ProcessError::Spawn(e)
                }
            })?;

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_output(stdout, "stdout"));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_output(stderr, "stderr"));
        }

        let pid = child.id().unwrap_or_default();
        self.child = Some(child);
        log::info!("BUTT started (pid {pid})");
        Ok(pid)
    }

    /// Ask BUTT to terminate and wait until it has exited
    ///
    /// There is no forced kill and no timeout: a BUTT that ignores the
    /// termination request keeps this call waiting.
    pub async fn stop(&mut self) -> Result<(), ProcessError> {
        if !self.is_running() {
            return Err(ProcessError::NotRunning);
        }
        let Some(mut child) = self.child.take() else {
            return Err(ProcessError::NotRunning);
        };

        log::info!("Stopping BUTT process");
        if let Err(e) = terminate(&mut child) {
            self.child = Some(child);
            return Err(e);
        }

        let status = child.wait().await.map_err(ProcessError::Wait)?;
        log::info!("BUTT stopped ({status})");
        Ok(())
    }
}

impl Default for StreamSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
fn terminate(child: &mut Child) -> Result<(), ProcessError> {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return Ok(());
    };

    match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        // Exited between the state check and the signal
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(ProcessError::Signal(e.to_string())),
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) -> Result<(), ProcessError> {
    child
        .start_kill()
        .map_err(|e| ProcessError::Signal(e.to_string()))
}

async fn forward_output<R>(reader: R, stream: &'static str)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        log::debug!("[butt:{stream}] {line}");
    }
}
