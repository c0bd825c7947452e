use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};

use storyboard::{reconcile, Config};

use crate::util;

pub fn cmd() -> Command {
    Command::new("reconcile")
        .about("Compare the catalog with the blob directory")
        .display_order(30)
        .arg(
            Arg::new("prune")
                .long("prune")
                .action(ArgAction::SetTrue)
                .help("Delete blob files no entry refers to"),
        )
}

pub fn run(matches: &ArgMatches, config: &Config) -> Result<()> {
    let store = util::open_store(config);
    let blobs = util::open_blobs(config)?;

    let report = reconcile::reconcile(&store, &blobs)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if matches.get_flag("prune") && !report.orphaned_blobs.is_empty() {
        let removed = reconcile::prune(&blobs, &report);
        println!("removed {removed} orphaned blob(s)");
    }
    Ok(())
}
