// castdeck
// Console front-end: settings API, live stats poller and the command loop

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;

use castdeck::commands::{self, server, settings, split_command, split_set_args, stream, Notice};
use castdeck::config::AppConfig;
use castdeck::logging::{init_logger, log_path};
use castdeck::models::Settings;
use castdeck::services::{
    bind_settings_api, settings_url, spawn_settings_api, spawn_stats_poller, IcecastClient,
    SettingsError, SettingsManager, StreamSupervisor, SETTINGS_PORT_TRIES,
};
use castdeck::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

// ============================================================================
// Output
// ============================================================================

fn print_notice(notice: &Notice) {
    println!("{notice}");
}

fn prompt() {
    print!("castdeck> ");
    let _ = std::io::stdout().flush();
}

// ============================================================================
// Command Handler
// ============================================================================

async fn invoke_command(state: &mut AppState, command: &str, args: &str) -> Flow {
    match command {
        "" => {}
        "start" => print_notice(&stream::start_stream(state)),
        "stop" => print_notice(&stream::stop_stream(state).await),
        "status" => {
            println!("Status: {}", stream::stream_state_label(state));
            println!("{}", server::describe_live_stats(state));
        }
        "stats" => {
            if !server::refresh_live_stats(state).await {
                println!("Live statistics unavailable; showing last values.");
            }
            println!("{}", server::describe_live_stats(state));
        }
        "test" => print_notice(&server::test_connection(state).await),
        "mount" => print_notice(&server::check_mount(state).await),
        "meta" => print_notice(&server::update_metadata(state).await),
        "admin" => print_notice(&server::test_admin(state).await),
        "open-admin" => {
            for notice in server::open_admin(state).await {
                print_notice(&notice);
            }
        }
        "open-url" => {
            if let Some(notice) = settings::open_stream_url(state) {
                print_notice(&notice);
            }
        }
        "show" => println!("{}", settings::describe(&state.settings)),
        "set" => {
            let (key, value) = split_set_args(args);
            if key.is_empty() {
                println!("Usage: set <key> <value>");
            } else {
                print_notice(&settings::set_field(state, key, value));
            }
        }
        "save" => print_notice(&settings::save_settings(state)),
        "load" => print_notice(&settings::load_settings(state)),
        "api" => print_notice(&settings::test_settings_api(state).await),
        "open-settings" => {
            if let Some(notice) = settings::open_settings_url(state) {
                print_notice(&notice);
            }
        }
        "help" | "?" => println!("{}", commands::HELP),
        "quit" | "exit" => return Flow::Quit,
        other => println!("Unknown command '{other}'. Type 'help' for a list."),
    }
    Flow::Continue
}

// ============================================================================
// Startup & Shutdown
// ============================================================================

fn load_initial_settings(manager: &SettingsManager) -> Settings {
    let (settings, error) = manager.load_or_default();
    match error {
        None => log::info!("Settings loaded from {}", manager.path().display()),
        Some(SettingsError::NotFound(_)) => {}
        Some(e) => println!("Failed to load settings ({e}); using defaults."),
    }
    settings
}

/// Waits for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log::info!("Shutdown signal received");
}

/// Stop a running BUTT before the process exits
async fn shutdown(state: &mut AppState) {
    if state.supervisor.is_running() {
        println!("Stopping BUTT...");
        print_notice(&stream::stop_stream(state).await);
    }
    log::info!("castdeck stopped");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env();
    init_logger(&config.log_dir, config.log_level)?;
    log::info!("Starting castdeck (log file {})", log_path(&config.log_dir).display());

    let manager = SettingsManager::new(config.settings_path.clone());
    let initial_settings = load_initial_settings(&manager);

    let mut supervisor = StreamSupervisor::new();
    if let Some(path) = config.butt_path.clone() {
        supervisor = supervisor.with_binary_path(path);
    }

    let mut state = AppState::new(initial_settings, supervisor, IcecastClient::new(), manager.clone());

    // Settings API
    match bind_settings_api(config.settings_port, SETTINGS_PORT_TRIES).await {
        Ok(listener) => {
            let addr = listener.local_addr()?;
            state.settings_api_url = settings_url(addr);
            spawn_settings_api(listener, Arc::new(manager));
            log::info!("Settings API listening on http://{addr}");
        }
        Err(e) => {
            log::error!("Failed to start settings API: {e}");
            println!("Settings API unavailable: {e}");
        }
    }

    // Live stats
    let (_poller, mut stats_rx) = spawn_stats_poller(
        state.client.clone(),
        config.poll_interval,
        state.subscribe_poll_target(),
    );
    let mut poller_alive = true;

    println!("castdeck - Icecast/BUTT controller");
    if !state.settings_api_url.is_empty() {
        println!("Settings API: {}", state.settings_api_url);
    }
    println!("Type 'help' for commands.");
    prompt();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown_requested = shutdown_signal();
    tokio::pin!(shutdown_requested);

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let (command, args) = split_command(&line);
                    if invoke_command(&mut state, command, args).await == Flow::Quit {
                        break;
                    }
                    prompt();
                }
                Ok(None) => {
                    log::info!("Console input closed");
                    break;
                }
                Err(e) => {
                    log::error!("Failed to read console input: {e}");
                    break;
                }
            },
            changed = stats_rx.changed(), if poller_alive => {
                if changed.is_err() {
                    log::warn!("Live stats poller exited");
                    poller_alive = false;
                    continue;
                }
                let latest = stats_rx.borrow_and_update().clone();
                if let Some(stats) = latest {
                    state.apply_stats(stats);
                }
            }
            _ = &mut shutdown_requested => {
                println!();
                break;
            }
        }
    }

    shutdown(&mut state).await;
    Ok(())
}
