// castdeck
// Console controller for an Icecast server and the BUTT streaming client

pub mod commands;
pub mod config;
pub mod logging;
pub mod models;
pub mod services;
pub mod state;
