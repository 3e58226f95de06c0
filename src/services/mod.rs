// castdeck Services
// Business logic layer

mod icecast_client;
mod live_stats;
mod mount_resolver;
mod settings_api;
mod settings_manager;
mod stream_process;

pub use icecast_client::*;
pub use live_stats::*;
pub use mount_resolver::*;
pub use settings_api::*;
pub use settings_manager::*;
pub use stream_process::*;
