use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};

use storyboard::Config;

use crate::util;

pub fn images_cmd() -> Command {
    Command::new("images")
        .about("Print catalog entries as json")
        .display_order(20)
        .arg(
            Arg::new("favorites")
                .long("favorites")
                .short('f')
                .action(ArgAction::SetTrue)
                .help("Only list favorites"),
        )
}

pub fn stats_cmd() -> Command {
    Command::new("stats")
        .about("Print catalog statistics as json")
        .display_order(21)
}

pub fn images(matches: &ArgMatches, config: &Config) -> Result<()> {
    let store = util::open_store(config);
    let favorites_only = matches.get_flag("favorites");
    let images = store
        .images()
        .iter()
        .filter(|i| !favorites_only || i.is_favorite)
        .collect::<Vec<_>>();
    println!("{}", serde_json::to_string_pretty(&images)?);
    Ok(())
}

pub fn stats(_matches: &ArgMatches, config: &Config) -> Result<()> {
    let store = util::open_store(config);
    println!("{}", serde_json::to_string_pretty(store.stats())?);
    Ok(())
}
