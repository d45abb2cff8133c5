pub mod authenticator;
pub mod cli;
pub mod client;
pub mod config;
pub mod editor;
pub mod logging;
pub mod plugins;
pub mod server;
pub mod store;
