use clap::ArgMatches;
use tracing::error;

mod domains;
mod helpers;
mod intents;
mod watch;
mod widgets;

pub fn run_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    match matches.subcommand() {
        Some(("watch", sub_matches)) => watch::handle_watch_command(sub_matches),
        Some(("widgets", sub_matches)) => widgets::handle_widgets_command(sub_matches),
        Some(("domains", _)) => domains::handle_domains_command(),
        _ => {
            error!(event = "cli.command_unknown");
            Err("Unknown command".into())
        }
    }
}
