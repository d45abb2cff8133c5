use clap::Parser;
use headerauth::cli::{self, Cli, Commands, ConfigAction};
use headerauth::config::{validate_config, validate_config_object, Config};
use headerauth::logging::{self, LogHandle};
use headerauth::server::ConfigServer;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let logs = logging::init(&Default::default());

    match cli.command {
        Commands::Serve(opts) => {
            let config = load(logs.as_ref(), opts.config.as_deref())?;
            validate_config_object(&config)?;
            info!("Starting headerauth config server");
            let server = ConfigServer::new(&config, opts.port, opts.bind.as_deref())?;
            server.run_until_shutdown().await?;
        }
        Commands::Show(opts) => {
            let mut config = load(logs.as_ref(), opts.config.as_deref())?;
            if let Some(url) = opts.url {
                config.client.base_url = url;
            }
            cli::show(&config.client, opts.slice, opts.json).await?;
        }
        Commands::Set(opts) => {
            let mut config = load(logs.as_ref(), opts.config.as_deref())?;
            if let Some(url) = opts.url {
                config.client.base_url = url;
            }
            cli::set(&config.client, opts.slice, &opts.assignments).await?;
        }
        Commands::Panels(opts) => {
            cli::panels(opts.json)?;
        }
        Commands::Config(opts) => {
            let config = load(logs.as_ref(), opts.config.as_deref())?;
            match opts.action {
                ConfigAction::Show => {
                    println!("{}", serde_json::to_string_pretty(&config)?);
                }
                ConfigAction::Validate => {
                    let errors = validate_config(&config);
                    for error in &errors {
                        eprintln!("{error}");
                    }
                    if !errors.is_empty() {
                        anyhow::bail!("{} configuration error(s)", errors.len());
                    }
                    info!("Configuration is valid");
                }
                ConfigAction::Init => {
                    let path = opts.config.as_deref().unwrap_or("headerauth.json");
                    Config::write_default(path)?;
                    info!("Configuration file created at {}", path);
                }
            }
        }
        Commands::Version => {
            println!("headerauth {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

/// Load configuration and switch logging to its settings.
fn load(logs: Option<&LogHandle>, path: Option<&str>) -> anyhow::Result<Config> {
    let config = Config::load(path)?;
    if let Some(logs) = logs {
        logs.apply(&config.logging)?;
    }
    Ok(config)
}
