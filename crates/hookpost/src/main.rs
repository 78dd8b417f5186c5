use anyhow::{bail, Context};
use clap::Parser;
use owo_colors::OwoColorize;
use tokio::runtime::Runtime;

use hookpost::cli::{Cli, Commands, DestinationArgs};
use hookpost::config::{Config, Profile};
use hookpost::logging;
use hookpost::notifier::{Endpoint, Notifier, DEFAULT_API_URL};
use hookpost::transport::DEFAULT_TIMEOUT;

use tabled::settings::Style;
use tabled::{Table, Tabled};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let rt = Runtime::new()?;
    rt.block_on(async {
        match cli.command {
            Commands::Send {
                destination,
                message,
            } => {
                let config;
                let profile = match &destination.profile {
                    Some(name) => {
                        config = Config::load(cli.config.clone())?;
                        Some(config.profile(name)?)
                    }
                    None => None,
                };

                let endpoint = resolve_endpoint(&destination, profile)?;
                let timeout = destination
                    .timeout
                    .map(std::time::Duration::from_secs)
                    .or_else(|| profile.map(Profile::timeout))
                    .unwrap_or(DEFAULT_TIMEOUT);

                let msg = message.build(profile).context("Building message")?;
                let notifier = Notifier::new(timeout)?;

                // The notifier already logged the cause at WARN.
                match notifier.send(&endpoint, &msg).await {
                    Ok(()) => println!("{} message sent", "✓".green()),
                    Err(_) => {
                        eprintln!("{} message not sent", "✗".red());
                        std::process::exit(2);
                    }
                }
            }
            Commands::Preview { profile, message } => {
                let config;
                let defaults = match &profile {
                    Some(name) => {
                        config = Config::load(cli.config.clone())?;
                        Some(config.profile(name)?)
                    }
                    None => None,
                };
                let msg = message.build(defaults).context("Building message")?;
                println!("{}", serde_json::to_string_pretty(&msg)?);
            }
            Commands::Profiles => {
                let config = Config::load_or_default(cli.config.clone())?;

                #[derive(Tabled)]
                struct Row {
                    #[tabled(rename = "profile")]
                    name: String,
                    kind: &'static str,
                    channel: String,
                    username: String,
                }

                let rows: Vec<Row> = config
                    .profiles
                    .iter()
                    .map(|(name, p)| Row {
                        name: name.clone(),
                        kind: p.kind(),
                        channel: p.channel.clone().unwrap_or_default(),
                        username: p.username.clone().unwrap_or_default(),
                    })
                    .collect();

                let mut table = Table::new(rows);
                table.with(Style::modern());
                println!("{}", table);
            }
            Commands::Version { json } => {
                if json {
                    let info = serde_json::json!({
                        "version": env!("CARGO_PKG_VERSION"),
                        "commit": option_env!("GIT_SHA").unwrap_or("unknown"),
                        "build_date": option_env!("BUILD_DATE").unwrap_or("unknown"),
                    });
                    println!("{}", serde_json::to_string_pretty(&info)?);
                } else {
                    println!(
                        "hookpost {} (commit: {}, built: {})",
                        env!("CARGO_PKG_VERSION"),
                        option_env!("GIT_SHA").unwrap_or("unknown"),
                        option_env!("BUILD_DATE").unwrap_or("unknown"),
                    );
                }
            }
        }
        Ok(())
    })
}

/// Explicit flags win over the profile target.
fn resolve_endpoint(dest: &DestinationArgs, profile: Option<&Profile>) -> anyhow::Result<Endpoint> {
    if let Some(url) = &dest.webhook {
        return Ok(Endpoint::webhook(url.clone()));
    }
    if let Some(token) = &dest.token {
        return Ok(Endpoint::Api {
            url: dest
                .api_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            token: token.clone(),
        });
    }
    match profile {
        Some(p) => Ok(p.endpoint()),
        None => bail!("No destination: pass --profile, --webhook or --token"),
    }
}
