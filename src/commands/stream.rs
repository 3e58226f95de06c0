// Stream Commands
// Start and stop BUTT

use crate::commands::Notice;
use crate::services::{ProcessError, StreamState};
use crate::state::AppState;

/// Launch BUTT with the settings currently being edited
pub fn start_stream(state: &mut AppState) -> Notice {
    match state.supervisor.start(&state.settings) {
        Ok(pid) => Notice::info("Start Stream", format!("BUTT started successfully (pid {pid}).")),
        Err(ProcessError::AlreadyRunning) => Notice::warning("Start Stream", "BUTT is already running."),
        Err(ProcessError::ExecutableNotFound(path)) => Notice::critical(
            "Start Stream Error",
            format!(
                "BUTT executable not found ({}). Make sure 'butt' is in your PATH or set CASTDECK_BUTT_PATH.",
                path.display()
            ),
        ),
        Err(e) => Notice::critical("Start Stream Error", format!("Failed to start BUTT: {e}")),
    }
}

/// Terminate BUTT and wait for it to exit
pub async fn stop_stream(state: &mut AppState) -> Notice {
    match state.supervisor.stop().await {
        Ok(()) => Notice::info("Stop Stream", "BUTT stopped successfully."),
        Err(ProcessError::NotRunning) => Notice::warning("Stop Stream", "BUTT is not running."),
        Err(e) => Notice::critical("Stop Stream Error", e.to_string()),
    }
}

pub fn stream_state_label(state: &mut AppState) -> String {
    match state.supervisor.state() {
        StreamState::Running => match state.supervisor.pid() {
            Some(pid) => format!("Streaming (pid {pid})"),
            None => "Streaming".to_string(),
        },
        StreamState::Idle => "Idle".to_string(),
    }
}
