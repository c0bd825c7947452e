mod inspect;
mod reconcile;
mod serve;
mod util;

use clap::{Arg, Command};

use storyboard::{config, Config};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cmd().get_matches();

    // Config file given explicitly has to exist, otherwise the default
    // location is tried and defaults are used if nothing is found there.
    let config: Config = match matches.get_one::<String>("config") {
        Some(path) => config::load_required(path)?,
        None => config::load()?,
    };
    let mut config = config.with_port_from_env()?;

    if let Some(level) = matches.get_one::<String>("verbosity") {
        config.tracing.level = storyboard::tracing::Level::from(level.as_str());
    }

    match matches.subcommand() {
        Some(("serve", m)) => serve::run(m, config).await?,
        Some(("images", m)) => inspect::images(m, &config)?,
        Some(("stats", m)) => inspect::stats(m, &config)?,
        Some(("reconcile", m)) => reconcile::run(m, &config)?,
        _ => unreachable!("subcommand is required"),
    }

    Ok(())
}

pub fn cmd() -> Command {
    Command::new("storyboard")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .infer_subcommands(true)
        .version(VERSION)
        .about("Image storyboard gallery backend")
        .subcommand(serve::cmd())
        .subcommand(inspect::images_cmd())
        .subcommand(inspect::stats_cmd())
        .subcommand(reconcile::cmd())
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("PATH")
                .global(true)
                .help("Path to the config file"),
        )
        .arg(
            Arg::new("verbosity")
                .long("verbosity")
                .short('v')
                .display_order(100)
                .value_name("level")
                .value_parser(["trace", "debug", "info", "warn", "error", "none"])
                .global(true)
                .help("Set the verbosity of the log output"),
        )
}
