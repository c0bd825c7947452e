use anyhow::Result;
use clap::{Arg, ArgMatches, Command};

use storyboard::Config;

pub fn cmd() -> Command {
    Command::new("serve")
        .about("Start the web server")
        .display_order(10)
        .arg(
            Arg::new("address")
                .long("address")
                .short('a')
                .value_name("ADDR")
                .help("Address to listen on, overrides config and PORT"),
        )
}

pub async fn run(matches: &ArgMatches, mut config: Config) -> Result<()> {
    if let Some(address) = matches.get_one::<String>("address") {
        config.address = address.parse()?;
    }
    storyboard::start(config).await?;
    Ok(())
}
