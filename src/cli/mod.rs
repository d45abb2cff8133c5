mod commands;

pub use commands::*;

use crate::authenticator::Slice;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "headerauth",
    version,
    about = "Trusted-header SSO authenticator configuration"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the reference config backend.
    Serve(ServeOpts),
    /// Load an authenticator configuration and print its form.
    Show(ShowOpts),
    /// Change fields of an authenticator configuration and save it.
    Set(SetOpts),
    /// List the registered authenticator panels.
    Panels(PanelsOpts),
    Config(ConfigOpts),
    Version,
}

#[derive(clap::Args)]
pub struct ServeOpts {
    #[arg(short, long)]
    pub config: Option<String>,
    #[arg(short, long)]
    pub port: Option<u16>,
    #[arg(short, long)]
    pub bind: Option<String>,
}

#[derive(clap::Args)]
pub struct ShowOpts {
    #[arg(short, long)]
    pub config: Option<String>,
    /// `sso` or `trusted-headers`.
    pub slice: Slice,
    /// Base URL of the backend, overrides `client.baseUrl`.
    #[arg(long, env = "HEADERAUTH_URL")]
    pub url: Option<String>,
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args)]
pub struct SetOpts {
    #[arg(short, long)]
    pub config: Option<String>,
    pub slice: Slice,
    /// Field assignments such as `username_header=X-User` or `auto_create_user=true`.
    #[arg(required = true, value_name = "FIELD=VALUE")]
    pub assignments: Vec<String>,
    #[arg(long, env = "HEADERAUTH_URL")]
    pub url: Option<String>,
}

#[derive(clap::Args)]
pub struct PanelsOpts {
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args)]
pub struct ConfigOpts {
    #[arg(short, long)]
    pub config: Option<String>,
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    Show,
    Validate,
    Init,
}
